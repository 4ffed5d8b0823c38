// Running accumulators for one layout pass.
//
// Holds the world positions and parent -> child edges committed so far.
// Later placements are checked against everything in here; nothing is ever
// relaxed or backtracked, so insertion order shapes the final layout.

use std::collections::HashMap;

use glam::DVec3;

use super::geometry::segments_intersect;
use super::spatial_grid::SpatialGrid;
use crate::tree::NodeId;

/// A committed edge between a parent and one of its children.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedEdge {
    pub parent: NodeId,
    pub child: NodeId,
    pub start: DVec3,
    pub end: DVec3,
}

impl PlacedEdge {
    pub fn touches(&self, nid: NodeId) -> bool {
        self.parent == nid || self.child == nid
    }
}

#[derive(Debug, Clone)]
pub struct PlacedSet {
    positions: HashMap<NodeId, DVec3>,
    grid: SpatialGrid,
    edges: Vec<PlacedEdge>,
    /// child -> index into `edges`; every child has exactly one parent edge
    edge_of: HashMap<NodeId, usize>,
}

impl PlacedSet {
    pub fn new(cell_size: f64) -> Self {
        Self {
            positions: HashMap::new(),
            grid: SpatialGrid::new(cell_size),
            edges: Vec::new(),
            edge_of: HashMap::new(),
        }
    }

    pub fn edges(&self) -> &[PlacedEdge] {
        &self.edges
    }

    /// Commit a node position, replacing any earlier one for the same node.
    pub fn place(&mut self, nid: NodeId, p: DVec3) {
        if let Some(old) = self.positions.insert(nid, p) {
            self.grid.remove(nid, old);
        }
        self.grid.insert(nid, p);
    }

    /// Commit the edge from `parent` to `child`, replacing the child's previous edge.
    pub fn connect(&mut self, parent: NodeId, child: NodeId, start: DVec3, end: DVec3) {
        let edge = PlacedEdge { parent, child, start, end };
        match self.edge_of.get(&child) {
            Some(&i) => self.edges[i] = edge,
            None => {
                self.edge_of.insert(child, self.edges.len());
                self.edges.push(edge);
            }
        }
    }

    /// Commit a child position together with its edge from the parent.
    pub fn place_child(&mut self, parent: NodeId, parent_pos: DVec3, child: NodeId, p: DVec3) {
        self.place(child, p);
        self.connect(parent, child, parent_pos, p);
    }

    /// True if any placed node other than `ignore` is closer than `min_distance` to `p`.
    pub fn collides(&self, p: DVec3, min_distance: f64, ignore: &[NodeId]) -> bool {
        self.grid.any_within(p, min_distance, ignore)
    }

    /// True if the segment `start-end` crosses any placed edge.
    ///
    /// Edges touching `node` or `parent` share an endpoint with the segment
    /// and are skipped: they are adjacent, not crossing.
    pub fn crosses(&self, start: DVec3, end: DVec3, buffer: f64, node: NodeId, parent: NodeId) -> bool {
        self.edges
            .iter()
            .filter(|e| !e.touches(node) && !e.touches(parent))
            .any(|e| segments_intersect(start, end, e.start, e.end, buffer))
    }
}
