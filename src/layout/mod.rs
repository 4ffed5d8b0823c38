// Collision-aware radial layout for expandable node trees.
//
// Goals:
// - Every visible node gets a world position such that siblings and cousins
//   keep their distance, parent -> child edges do not cross, and distance
//   from the hub grows with every generation
// - Greedy and order-sensitive: branches and children are placed in their
//   given order, later nodes see earlier nodes' final positions, nothing is
//   relaxed or backtracked afterwards
// - Total: every node always gets a position, dense input degrades to
//   overlap instead of failing
// - Reproducible: all jitter comes from an injected random source
//
// Submodules:
// - geometry: distances, 2D segment crossing, hierarchical distance floor
// - spatial_grid: bucketed point index for collision queries
// - placed: running position/edge accumulators of one pass
// - search: safe position for a single node
// - plan: wedge per node and ring radius per level
// - radial: distribution of a parent's children around it
// - reposition: full and partial passes over the tree
//
// Output:
// - LayoutResult with new relative positions addressed by NodeId.

use glam::DVec3;
use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::tree::{NodeId, NodeTree};

pub mod geometry;
mod placed;
mod plan;
mod radial;
mod reposition;
mod search;
mod spatial_grid;

pub use placed::{PlacedEdge, PlacedSet};
pub use plan::LayoutPlan;
pub use radial::{ArrangeRequest, ArrangedChild, Slot, arrange_children_around_parent, working_radius};
pub use reposition::{reposition_subtree, reposition_tree};
pub use search::{Placement, SearchContext, SearchOutcome, find_safe_position};
pub use spatial_grid::SpatialGrid;

/// Every tunable of the layout engine. Distances are in world units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Minimum increase in distance from the hub between a node and its parent.
    pub generation_gap: f64,
    /// Added to every minimum distance to account for the rendered glow/halo.
    pub glow_buffer: f64,
    /// Margin (world units) within which a near miss still counts as an edge crossing.
    pub intersection_buffer: f64,

    /// Minimum separation for top-level branches.
    pub branch_min_distance: f64,
    /// Minimum separation below the branches: `base + step * level`.
    pub level_min_distance_base: f64,
    pub level_min_distance_step: f64,

    /// Radius at which branches are arranged around the center.
    pub branch_radius: f64,
    /// Radius at which deeper children are arranged: `base + step * level`.
    pub child_radius_base: f64,
    pub child_radius_step: f64,
    /// Widest arc a non-center node's children may spread over, in radians.
    pub child_arc_limit: f64,

    /// Angles sampled around the parent per search radius.
    pub search_angle_samples: usize,
    /// Radius increment when every angle at the current radius fails.
    pub search_radius_step: f64,
    /// How far past the base radius the search may grow.
    pub search_max_radius_growth: f64,
    /// Jitter on the axis perpendicular to the layout plane during search.
    pub search_z_jitter: f64,

    /// Angular offsets tried per child by the arranger.
    pub arrange_attempts: usize,
    pub arrange_radius_jitter: f64,
    pub arrange_z_jitter: f64,

    /// Arranger score for a candidate that collides with a placed node.
    pub collision_penalty: f64,
    /// Arranger score for a candidate whose edge crosses a placed edge.
    pub crossing_penalty: f64,
    /// Arranger tie-break per radian of deviation from the ideal slot.
    pub angular_penalty: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            generation_gap: 0.8,
            glow_buffer: 0.6,
            intersection_buffer: 0.5,
            branch_min_distance: 2.8,
            level_min_distance_base: 1.4,
            level_min_distance_step: 0.15,
            branch_radius: 5.0,
            child_radius_base: 3.0,
            child_radius_step: 0.2,
            child_arc_limit: std::f64::consts::TAU / 3.0,
            search_angle_samples: 32,
            search_radius_step: 0.3,
            search_max_radius_growth: 4.0,
            search_z_jitter: 0.15,
            arrange_attempts: 16,
            arrange_radius_jitter: 0.1,
            arrange_z_jitter: 0.1,
            collision_penalty: 1000.0,
            crossing_penalty: 2000.0,
            angular_penalty: 1.0,
        }
    }
}

impl LayoutConfig {
    /// Base minimum separation for a node at `level` (branches are level 1).
    pub fn min_distance_for_level(&self, level: usize) -> f64 {
        if level <= 1 {
            self.branch_min_distance
        } else {
            self.level_min_distance_base + self.level_min_distance_step * level as f64
        }
    }

    /// Radius at which children at `level` are arranged around their parent.
    pub fn radius_for_level(&self, level: usize) -> f64 {
        if level <= 1 {
            self.branch_radius
        } else {
            self.child_radius_base + self.child_radius_step * level as f64
        }
    }

    pub fn effective_min_distance(&self, min_distance: f64) -> f64 {
        min_distance + self.glow_buffer
    }

    /// Number of radius increments the search may take past the base radius.
    pub fn search_growth_steps(&self) -> usize {
        if self.search_radius_step <= 0.0 {
            return 0;
        }
        (self.search_max_radius_growth / self.search_radius_step + 1e-9).floor() as usize
    }

    /// Spatial grid cell size: the widest separation any level asks for.
    pub(crate) fn grid_cell_size(&self) -> f64 {
        self.effective_min_distance(self.branch_min_distance.max(self.min_distance_for_level(2)))
    }
}

/// New relative positions for every node, addressed by `NodeId`.
/// Hidden nodes keep their stored position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutResult {
    pub positions: Vec<DVec3>,
    /// Nodes placed during the pass.
    pub placed: usize,
    /// Nodes that exhausted the search and took the fallback position.
    pub fallbacks: usize,
}

impl LayoutResult {
    pub fn position(&self, nid: NodeId) -> DVec3 {
        self.positions[nid.0]
    }

    pub fn apply_to(&self, tree: &mut NodeTree) {
        for (node, &p) in tree.nodes.iter_mut().zip(&self.positions) {
            node.position = p;
        }
    }
}

impl NodeTree {
    /// Copy of the tree with relative positions replaced by a layout result.
    pub fn with_positions(&self, result: &LayoutResult) -> NodeTree {
        let mut out = self.clone();
        result.apply_to(&mut out);
        out
    }
}

/// A layout configuration bundled with its random source.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    pub cfg: LayoutConfig,
    rng: StdRng,
}

impl LayoutEngine {
    pub fn new(cfg: LayoutConfig, rng: StdRng) -> Self {
        Self { cfg, rng }
    }

    /// Reproducible engine: the same seed gives the same layout.
    pub fn seeded(seed: u64) -> Self {
        Self::new(LayoutConfig::default(), StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(LayoutConfig::default(), StdRng::from_entropy())
    }

    pub fn reposition(&mut self, tree: &NodeTree) -> LayoutResult {
        reposition_tree(tree, &self.cfg, &mut self.rng)
    }

    /// Full pass; returns an updated copy and leaves the input untouched.
    pub fn layout(&mut self, tree: &NodeTree) -> NodeTree {
        let result = self.reposition(tree);
        debug!("layout: placed {} nodes, {} fallbacks", result.placed, result.fallbacks);
        tree.with_positions(&result)
    }

    /// Partial pass over the subtree rooted at `nid`; everything else stays fixed.
    pub fn layout_subtree(&mut self, tree: &NodeTree, nid: NodeId) -> NodeTree {
        let result = reposition_subtree(tree, nid, &self.cfg, &mut self.rng);
        debug!(
            "layout_subtree({}): placed {} nodes, {} fallbacks",
            tree.get(nid).id,
            result.placed,
            result.fallbacks
        );
        tree.with_positions(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_scaling() {
        let cfg = LayoutConfig::default();
        assert_eq!(cfg.min_distance_for_level(1), 2.8);
        assert!((cfg.min_distance_for_level(2) - 1.7).abs() < 1e-12);
        assert!((cfg.min_distance_for_level(4) - 2.0).abs() < 1e-12);
        assert_eq!(cfg.radius_for_level(1), 5.0);
        assert!((cfg.radius_for_level(3) - 3.6).abs() < 1e-12);
        assert!((cfg.effective_min_distance(2.8) - 3.4).abs() < 1e-12);
        assert!((cfg.child_arc_limit - 2.0 * std::f64::consts::PI / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_search_growth_steps() {
        let cfg = LayoutConfig::default();
        assert_eq!(cfg.search_growth_steps(), 13);

        let cfg = LayoutConfig { search_radius_step: 0.5, ..LayoutConfig::default() };
        assert_eq!(cfg.search_growth_steps(), 8);
    }

    #[test]
    fn test_config_partial_json_override() {
        let cfg: LayoutConfig = serde_json::from_str(r#"{ "generation_gap": 1.5 }"#).unwrap();
        assert_eq!(cfg.generation_gap, 1.5);
        assert_eq!(cfg.search_angle_samples, 32);
    }
}
