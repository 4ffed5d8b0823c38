// Angular plan of a layout pass.
//
// Every visible node below the center gets a wedge of directions around the
// hub, and every level gets a ring radius:
//
// - A node's wedge is sized by the room its subtree needs: the larger of
//   its own footprint on its ring and the sum of its children's wedges.
// - Children split their parent's wedge in order. Below the center they are
//   kept to an arc of at most `child_arc_limit` around the parent's own
//   direction, so a fan opens outward.
// - Rings start one working radius apart. While some fan does not fit its
//   arc, every ring is scaled up by the same factor.
// - Finally each ring is pushed out far enough that an edge to the most
//   offset child never dips back inside its parent's ring.
//
// A child is aimed at the center of its wedge on its level's ring. Wedges
// of different subtrees never overlap, so their edges stay apart.

use std::f64::consts::TAU;

use glam::DVec3;

use super::LayoutConfig;
use super::geometry::planar_angle;
use super::radial::working_radius;
use crate::tree::{NodeId, NodeTree};

const MAX_SCALE_ROUNDS: usize = 64;
/// Extra growth per scaling round so a fan never lands exactly on its limit.
const RING_SLACK: f64 = 1.01;

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPlan {
    /// Planned angle around the hub, indexed by `NodeId`. Hidden nodes keep 0.
    directions: Vec<f64>,
    /// Ring radius per level; index 0 is the hub itself.
    rings: Vec<f64>,
}

/// Shortest angular distance between two directions.
fn angle_between(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(TAU);
    d.min(TAU - d)
}

fn has_visible_children(tree: &NodeTree, nid: NodeId) -> bool {
    let node = tree.get(nid);
    node.expanded && !node.children.is_empty()
}

/// Distance margin covering the arranger's radius jitter on both nodes of a pair.
fn jitter_margin(cfg: &LayoutConfig) -> f64 {
    2.0 * cfg.arrange_radius_jitter
}

/// Minimum distance between ring `level - 1` and ring `level`.
fn ring_step(tree: &NodeTree, visible: &[NodeId], cfg: &LayoutConfig, level: usize) -> f64 {
    let min_distance = cfg.min_distance_for_level(level);
    let widest = visible
        .iter()
        .filter(|&&nid| tree.get(nid).level + 1 == level && has_visible_children(tree, nid))
        .map(|&nid| working_radius(cfg, cfg.radius_for_level(level), tree.get(nid).children.len(), min_distance))
        .fold(0.0, f64::max);

    let margin = jitter_margin(cfg);
    widest
        .max(cfg.effective_min_distance(min_distance) + margin)
        .max(cfg.generation_gap + margin)
}

/// Angle a node at `level` occupies on a ring of radius `ring`.
fn footprint(cfg: &LayoutConfig, level: usize, ring: f64) -> f64 {
    let chord = cfg.effective_min_distance(cfg.min_distance_for_level(level)) + 2.0 * jitter_margin(cfg);
    2.0 * (chord / (2.0 * ring)).min(1.0).asin()
}

fn subtree_need(tree: &NodeTree, nid: NodeId, cfg: &LayoutConfig, rings: &[f64], need: &mut [f64]) -> f64 {
    let node = tree.get(nid);
    let mut children = 0.0;
    if node.expanded {
        for &child in &node.children {
            children += subtree_need(tree, child, cfg, rings, need);
        }
    }
    let own = if nid == tree.root { 0.0 } else { footprint(cfg, node.level, rings[node.level]) };
    need[nid.0] = own.max(children);
    need[nid.0]
}

/// How far the children of `nid` overflow the arc they may use (> 1 means they do not fit).
fn crowding(tree: &NodeTree, nid: NodeId, cfg: &LayoutConfig, need: &[f64]) -> Option<f64> {
    if !has_visible_children(tree, nid) {
        return None;
    }
    let limit = if nid == tree.root { TAU } else { cfg.child_arc_limit };
    let total: f64 = tree.get(nid).children.iter().map(|c| need[c.0]).sum();
    Some(total / limit)
}

fn assign(
    tree: &NodeTree,
    nid: NodeId,
    start: f64,
    arc: f64,
    cfg: &LayoutConfig,
    need: &[f64],
    directions: &mut [f64],
) {
    let children = &tree.get(nid).children;
    let total: f64 = children.iter().map(|c| need[c.0]).sum();
    let mut cursor = start;
    for &child in children {
        let share = if total > 0.0 { arc * need[child.0] / total } else { arc / children.len() as f64 };
        let center = cursor + share / 2.0;
        directions[child.0] = center;
        if has_visible_children(tree, child) {
            let inner = share.min(cfg.child_arc_limit);
            assign(tree, child, center - inner / 2.0, inner, cfg, need, directions);
        }
        cursor += share;
    }
}

impl LayoutPlan {
    pub fn new(tree: &NodeTree, cfg: &LayoutConfig) -> Self {
        let visible = tree.visible_nodes();
        let depth = visible.iter().map(|&nid| tree.get(nid).level).max().unwrap_or(0);

        let steps: Vec<f64> = (0..=depth).map(|level| ring_step(tree, &visible, cfg, level)).collect();
        let mut rings = vec![0.0; depth + 1];
        for level in 1..=depth {
            rings[level] = rings[level - 1] + steps[level];
        }

        let mut need = vec![0.0; tree.len()];
        for _ in 0..MAX_SCALE_ROUNDS {
            subtree_need(tree, tree.root, cfg, &rings, &mut need);
            let worst = visible
                .iter()
                .filter_map(|&nid| crowding(tree, nid, cfg, &need))
                .fold(1.0, f64::max);
            if worst <= 1.0 + 1e-12 {
                break;
            }
            for level in 1..=depth {
                rings[level] = (rings[level] * worst * RING_SLACK).max(rings[level - 1] + steps[level]);
            }
        }
        subtree_need(tree, tree.root, cfg, &rings, &mut need);

        let mut directions = vec![0.0; tree.len()];
        let root = tree.get(tree.root);
        if let Some(&first) = root.children.first().filter(|_| root.expanded) {
            let total: f64 = root.children.iter().map(|c| need[c.0]).sum();
            let first_share = if total > 0.0 { TAU * need[first.0] / total } else { TAU / root.children.len() as f64 };
            // The first branch stays centered on its stored direction.
            let start = planar_angle(DVec3::ZERO, tree.get(first).position) - first_share / 2.0;
            assign(tree, tree.root, start, TAU, cfg, &need, &mut directions);
        }

        for level in 2..=depth {
            let spread = visible
                .iter()
                .filter(|&&nid| tree.get(nid).level == level)
                .filter_map(|&nid| {
                    let parent = tree.get(nid).parent?;
                    Some(angle_between(directions[nid.0], directions[parent.0]))
                })
                .fold(0.0, f64::max);
            let cos = spread.cos();
            let mut ring = rings[level].max(rings[level - 1] + steps[level]);
            if cos > 1e-3 {
                ring = ring.max((rings[level - 1] + jitter_margin(cfg)) / cos);
            }
            rings[level] = ring;
        }

        LayoutPlan { directions, rings }
    }

    /// Planned angle of `nid` around the hub.
    pub fn direction(&self, nid: NodeId) -> f64 {
        self.directions[nid.0]
    }

    /// Ring radius of `level`. Levels past the deepest visible one continue at its radius.
    pub fn ring(&self, level: usize) -> f64 {
        self.rings.get(level).or(self.rings.last()).copied().unwrap_or(0.0)
    }

    pub fn depth(&self) -> usize {
        self.rings.len().saturating_sub(1)
    }
}
