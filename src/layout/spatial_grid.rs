// Spatial hash grid for collision queries.
//
// Instead of checking a candidate against every placed node, placed points
// are bucketed into cubic cells. A radius query only visits the cells the
// query sphere's bounding box touches.

use std::collections::HashMap;

use glam::DVec3;

use crate::tree::NodeId;

type Cell = (i64, i64, i64);

/// A spatial hash grid of placed node positions.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    /// Edge length of each cubic cell.
    cell_size: f64,
    cells: HashMap<Cell, Vec<(NodeId, DVec3)>>,
}

impl SpatialGrid {
    /// Cell size should be roughly the largest expected query radius.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: if cell_size.is_finite() && cell_size > 1e-6 { cell_size } else { 1.0 },
            cells: HashMap::new(),
        }
    }

    fn cell_of(&self, p: DVec3) -> Cell {
        let c = (p / self.cell_size).floor();
        (c.x as i64, c.y as i64, c.z as i64)
    }

    pub fn insert(&mut self, nid: NodeId, p: DVec3) {
        let cell = self.cell_of(p);
        self.cells.entry(cell).or_default().push((nid, p));
    }

    /// Remove a node previously inserted at `p`.
    pub fn remove(&mut self, nid: NodeId, p: DVec3) {
        let cell = self.cell_of(p);
        if let Some(items) = self.cells.get_mut(&cell) {
            items.retain(|(n, _)| *n != nid);
            if items.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }

    /// Nodes strictly closer than `radius` to `p`, in no particular order.
    pub fn query(&self, p: DVec3, radius: f64) -> Vec<(NodeId, DVec3)> {
        let (x0, y0, z0) = self.cell_of(p - DVec3::splat(radius));
        let (x1, y1, z1) = self.cell_of(p + DVec3::splat(radius));

        let mut result = Vec::new();
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                for cz in z0..=z1 {
                    let Some(items) = self.cells.get(&(cx, cy, cz)) else {
                        continue;
                    };
                    result.extend(items.iter().filter(|(_, q)| q.distance(p) < radius).copied());
                }
            }
        }
        result
    }

    /// Check whether any node other than those in `ignore` lies closer than `radius`.
    pub fn any_within(&self, p: DVec3, radius: f64, ignore: &[NodeId]) -> bool {
        self.query(p, radius).iter().any(|(n, _)| !ignore.contains(n))
    }
}
