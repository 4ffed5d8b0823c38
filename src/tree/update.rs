//! In-place updates driven by interaction: expansion flags and dragging.
//!
//! None of these run the layout engine. Changing expansion never touches
//! stored relative positions, so collapsing and re-expanding a subtree
//! brings it back exactly where it was.

use glam::DVec3;

use crate::tree::{NodeId, NodeTree};

impl NodeTree {
    /// Set a node's expansion flag. The center always stays expanded.
    /// Returns true if the flag changed.
    pub fn set_expanded(&mut self, nid: NodeId, expanded: bool) -> bool {
        if nid == self.root && !expanded {
            return false;
        }
        let node = self.get_mut(nid);
        let changed = node.expanded != expanded;
        node.expanded = expanded;
        changed
    }

    /// Flip a node's expansion flag and return the new state.
    pub fn toggle_expanded(&mut self, nid: NodeId) -> bool {
        let expanded = !self.get(nid).expanded;
        self.set_expanded(nid, expanded);
        self.get(nid).expanded
    }

    /// Expand every node that has children.
    pub fn expand_all(&mut self) {
        for node in &mut self.nodes {
            if !node.children.is_empty() {
                node.expanded = true;
            }
        }
    }

    /// Collapse everything except the center, leaving only the branches visible.
    pub fn collapse_all(&mut self) {
        let root = self.root;
        for node in &mut self.nodes {
            node.expanded = node.nid == root;
        }
    }

    /// Expand every ancestor of a node so that it becomes visible.
    /// Returns the ancestors whose flag changed, nearest first.
    pub fn reveal(&mut self, nid: NodeId) -> Vec<NodeId> {
        let mut opened = Vec::new();
        let mut cur = self.get(nid).parent;
        while let Some(p) = cur {
            if self.set_expanded(p, true) {
                opened.push(p);
            }
            cur = self.get(p).parent;
        }
        opened
    }

    /// Raw override of a node's relative position.
    pub fn set_relative_position(&mut self, nid: NodeId, position: DVec3) {
        self.get_mut(nid).position = position;
    }

    /// Move a node so its world position becomes `world`.
    ///
    /// Descendants keep their relative positions, so their world positions
    /// shift by the same delta. Returns that delta.
    pub fn drag_to(&mut self, nid: NodeId, world: DVec3) -> DVec3 {
        let current = self.world_position(nid);
        let delta = world - current;
        self.get_mut(nid).position += delta;
        delta
    }
}
