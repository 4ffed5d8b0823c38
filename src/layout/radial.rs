// Radial arrangement of a parent's children.
//
// Every child comes with a slot: an angle and a radius around the parent,
// usually aimed at the child's planned spot on its level's ring. For each
// child in order, a handful of angular offsets from its slot are scored:
//
//   collision with a placed node   +collision_penalty
//   edge crossing a placed edge    +crossing_penalty
//   deviation from the ideal slot  +angular_penalty per radian
//
// The lowest score wins, so every child is always placed; a clean
// candidate ends the scan early. The winner then goes through the safe
// position search and is committed before the next sibling is scored.

use std::f64::consts::PI;

use glam::DVec3;
use log::trace;
use rand::Rng;

use super::LayoutConfig;
use super::geometry::{planar_angle, point_on_circle};
use super::placed::PlacedSet;
use super::search::{SearchContext, SearchOutcome, find_safe_position, jitter};
use crate::tree::NodeId;

/// Where a child should go, relative to its parent in the x/y plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub angle: f64,
    pub radius: f64,
}

impl Slot {
    /// Slot that points from `from` straight at `to`.
    pub fn toward(from: DVec3, to: DVec3) -> Self {
        Slot { angle: planar_angle(from, to), radius: (to - from).truncate().length() }
    }
}

/// One parent and the children to distribute around it.
#[derive(Debug, Clone, Copy)]
pub struct ArrangeRequest<'a> {
    pub parent_id: NodeId,
    /// World position of the parent
    pub parent: DVec3,
    /// In distribution order
    pub children: &'a [NodeId],
    /// One per child
    pub slots: &'a [Slot],
    /// Base minimum separation of the children (before the glow buffer)
    pub min_distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrangedChild {
    pub nid: NodeId,
    /// World position
    pub position: DVec3,
    pub outcome: SearchOutcome,
}

/// Radius at which `count` children fit around the parent without touching by construction.
pub fn working_radius(cfg: &LayoutConfig, base_radius: f64, count: usize, min_distance: f64) -> f64 {
    let floor = base_radius.max(cfg.generation_gap);
    let spread = count as f64 * cfg.effective_min_distance(min_distance) / (2.2 * PI);
    floor.max(spread)
}

/// Offset of the `k`-th arranger attempt: 0, +d, -d, +2d, -2d, ... up to +-pi.
fn attempt_offset(k: usize, attempts: usize) -> f64 {
    let rings = (attempts.saturating_sub(1)).div_ceil(2).max(1) as f64;
    let steps = k.div_ceil(2) as f64;
    let magnitude = (steps * PI / rings).min(PI);
    if k % 2 == 1 { magnitude } else { -magnitude }
}

/// Distribute `req.children` around the parent and commit them into `placed`.
///
/// Children placed earlier in the call are obstacles for later ones.
pub fn arrange_children_around_parent<R: Rng + ?Sized>(
    req: &ArrangeRequest<'_>,
    placed: &mut PlacedSet,
    cfg: &LayoutConfig,
    origin: DVec3,
    rng: &mut R,
) -> Vec<ArrangedChild> {
    let effective_min = cfg.effective_min_distance(req.min_distance);
    let mut out = Vec::with_capacity(req.children.len());

    for (&child, slot) in req.children.iter().zip(req.slots) {
        let radius = slot.radius.max(cfg.generation_gap);

        let raw = {
            let ctx = SearchContext { placed: &*placed, cfg, origin };
            let mut best: Option<(f64, DVec3)> = None;

            for k in 0..cfg.arrange_attempts.max(1) {
                let offset = attempt_offset(k, cfg.arrange_attempts);
                let r = radius + jitter(rng, cfg.arrange_radius_jitter);
                let dz = jitter(rng, cfg.arrange_z_jitter);
                let candidate = point_on_circle(req.parent, r, slot.angle + offset, dz);
                let corrected = ctx.correct(candidate, req.parent);

                let mut penalty = 0.0;
                if ctx.collides(corrected, effective_min, child, req.parent_id) {
                    penalty += cfg.collision_penalty;
                }
                if ctx.crosses(req.parent, corrected, child, req.parent_id) {
                    penalty += cfg.crossing_penalty;
                }
                let score = penalty + offset.abs() * cfg.angular_penalty;

                if best.is_none_or(|(s, _)| score < s) {
                    best = Some((score, candidate));
                }
                if penalty == 0.0 {
                    break;
                }
            }

            let (score, candidate) = best.unwrap_or((0.0, point_on_circle(req.parent, radius, slot.angle, 0.0)));
            trace!("arrange child {} of {}: score {:.3}", child.0, req.parent_id.0, score);

            find_safe_position(&ctx, req.parent, candidate, req.min_distance, child, req.parent_id, rng)
        };

        placed.place_child(req.parent_id, req.parent, child, raw.position);
        out.push(ArrangedChild { nid: child, position: raw.position, outcome: raw.outcome });
    }

    out
}
