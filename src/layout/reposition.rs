// Tree repositioning: walks the visible tree depth-first and places it.
//
// Before walking, a LayoutPlan assigns every visible node a direction
// around the hub and every level a ring radius. Order of work for every
// expanded node:
// 1. arrange all of its children around it, each aimed at its planned spot
//    on its level's ring (committed immediately)
// 2. for each child in order: re-check it with the safe position search,
//    then descend into it
//
// Branches and children are processed in their given order, and the
// position/edge accumulators are shared by the whole pass, so later nodes
// always see earlier nodes' final positions. Collapsed subtrees are never
// visited: their stored positions are kept and they are not obstacles.

use glam::DVec3;
use log::debug;
use rand::Rng;

use super::geometry::{distance_from_origin, planar_angle, point_on_circle};
use super::placed::PlacedSet;
use super::plan::LayoutPlan;
use super::radial::{ArrangeRequest, Slot, arrange_children_around_parent};
use super::search::{SearchContext, SearchOutcome, find_safe_position};
use super::{LayoutConfig, LayoutResult};
use crate::tree::{NodeId, NodeTree};

/// Offset between the plan and the placed position of a partial pass's subtree root.
#[derive(Debug, Clone, Copy, Default)]
struct Anchor {
    rotation: f64,
    lift: f64,
}

struct Pass<'a, R: Rng + ?Sized> {
    tree: &'a NodeTree,
    cfg: &'a LayoutConfig,
    rng: &'a mut R,
    origin: DVec3,
    plan: LayoutPlan,
    anchor: Anchor,
    placed: PlacedSet,
    /// World positions, updated as nodes are placed
    world: Vec<DVec3>,
    /// Relative positions handed back to the caller
    relative: Vec<DVec3>,
    count: usize,
    fallbacks: usize,
}

impl<'a, R: Rng + ?Sized> Pass<'a, R> {
    fn new(tree: &'a NodeTree, cfg: &'a LayoutConfig, rng: &'a mut R) -> Self {
        let world = tree.world_positions();
        let origin = world[tree.root.0];
        Self {
            tree,
            cfg,
            rng,
            origin,
            plan: LayoutPlan::new(tree, cfg),
            anchor: Anchor::default(),
            placed: PlacedSet::new(cfg.grid_cell_size()),
            relative: tree.nodes.iter().map(|n| n.position).collect(),
            world,
            count: 0,
            fallbacks: 0,
        }
    }

    /// Re-check a node against everything placed so far and commit it.
    fn place_node(&mut self, nid: NodeId) {
        let node = self.tree.get(nid);
        let Some(parent) = node.parent else {
            return;
        };
        let parent_pos = self.world[parent.0];
        let min_distance = self.cfg.min_distance_for_level(node.level);

        let placement = {
            let ctx = SearchContext { placed: &self.placed, cfg: self.cfg, origin: self.origin };
            find_safe_position(&ctx, parent_pos, self.world[nid.0], min_distance, nid, parent, &mut *self.rng)
        };

        self.world[nid.0] = placement.position;
        self.relative[nid.0] = placement.position - parent_pos;
        self.placed.place_child(parent, parent_pos, nid, placement.position);
        self.count += 1;
        if placement.outcome == SearchOutcome::Fallback {
            self.fallbacks += 1;
        }
    }

    /// Slot aiming `child` at its planned spot on the ring of `level`.
    fn slot(&self, child: NodeId, level: usize, parent_pos: DVec3) -> Slot {
        let ring = self.plan.ring(level) + self.anchor.lift;
        let angle = self.plan.direction(child) + self.anchor.rotation;
        let target = point_on_circle(self.origin, ring, angle, 0.0);
        Slot::toward(parent_pos, target)
    }

    /// Arrange an expanded node's children, then descend into each of them.
    fn layout_children(&mut self, nid: NodeId) {
        let tree = self.tree;
        let node = tree.get(nid);
        if !node.expanded || node.children.is_empty() {
            return;
        }

        let child_level = node.level + 1;
        let parent_pos = self.world[nid.0];
        let slots: Vec<Slot> = node.children.iter().map(|&c| self.slot(c, child_level, parent_pos)).collect();
        let req = ArrangeRequest {
            parent_id: nid,
            parent: parent_pos,
            children: &node.children,
            slots: &slots,
            min_distance: self.cfg.min_distance_for_level(child_level),
        };

        // Only the final re-check in place_node counts toward the result.
        let arranged = arrange_children_around_parent(&req, &mut self.placed, self.cfg, self.origin, &mut *self.rng);
        for child in &arranged {
            self.world[child.nid.0] = child.position;
        }

        for &child in &node.children {
            self.place_node(child);
            self.layout_children(child);
        }
    }

    /// Align the plan with where the subtree root of a partial pass ended up.
    fn anchor_at(&mut self, nid: NodeId) {
        let p = self.world[nid.0];
        let level = self.tree.get(nid).level;
        self.anchor = Anchor {
            rotation: planar_angle(self.origin, p) - self.plan.direction(nid),
            lift: distance_from_origin(p, self.origin) - self.plan.ring(level),
        };
    }

    /// Seed the accumulators with every visible node outside `subtree`.
    fn seed_fixed(&mut self, subtree: NodeId) {
        for nid in self.tree.visible_nodes() {
            if nid == subtree || self.tree.is_ancestor(subtree, nid) {
                continue;
            }
            let p = self.world[nid.0];
            match self.tree.get(nid).parent {
                Some(parent) => self.placed.place_child(parent, self.world[parent.0], nid, p),
                None => self.placed.place(nid, p),
            }
        }
    }

    fn finish(self) -> LayoutResult {
        LayoutResult { positions: self.relative, placed: self.count, fallbacks: self.fallbacks }
    }
}

/// Full layout pass over every visible node.
///
/// The center keeps its position; everything below it is re-placed. The
/// result is order-sensitive: reordering branches or children changes the
/// layout.
pub fn reposition_tree<R: Rng + ?Sized>(tree: &NodeTree, cfg: &LayoutConfig, rng: &mut R) -> LayoutResult {
    let mut pass = Pass::new(tree, cfg, rng);
    let root = tree.root;
    pass.placed.place(root, pass.origin);
    pass.layout_children(root);

    debug!(
        "reposition_tree: {} of {} nodes placed, {} edges, {} fallbacks, outer ring {:.2}",
        pass.count,
        tree.len(),
        pass.placed.edges().len(),
        pass.fallbacks,
        pass.plan.ring(pass.plan.depth())
    );
    pass.finish()
}

/// Partial layout pass: re-place the subtree rooted at `nid` while every
/// other visible node stays fixed and acts as an obstacle.
///
/// A hidden subtree is left untouched.
pub fn reposition_subtree<R: Rng + ?Sized>(
    tree: &NodeTree,
    nid: NodeId,
    cfg: &LayoutConfig,
    rng: &mut R,
) -> LayoutResult {
    if nid == tree.root {
        return reposition_tree(tree, cfg, rng);
    }

    let mut pass = Pass::new(tree, cfg, rng);
    if !tree.is_visible(nid) {
        return pass.finish();
    }

    pass.seed_fixed(nid);
    pass.place_node(nid);
    pass.anchor_at(nid);
    pass.layout_children(nid);

    debug!(
        "reposition_subtree({}): {} nodes placed, {} fallbacks",
        tree.get(nid).id,
        pass.count,
        pass.fallbacks
    );
    pass.finish()
}
