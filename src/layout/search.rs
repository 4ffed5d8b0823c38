// Safe position search for a single node.
//
// Tries, in order:
// 1. the preferred position (after the hierarchical distance floor)
// 2. evenly spaced angles around the parent at the same radius
// 3. the same angles at growing radii
// 4. a deterministic fallback straight out from the parent
//
// The search never fails. Under pathological density the fallback may
// still overlap or cross; that is accepted.

use glam::DVec3;
use log::warn;
use rand::Rng;

use super::LayoutConfig;
use super::geometry::{
    FALLBACK_DIRECTION, enforce_hierarchical_distance, planar_angle, point_on_circle,
};
use super::placed::PlacedSet;
use crate::tree::NodeId;

/// Shared, read-only inputs of a search.
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    pub placed: &'a PlacedSet,
    pub cfg: &'a LayoutConfig,
    /// World position of the hub that distance-from-origin is measured from
    pub origin: DVec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The corrected preferred position was already safe.
    Preferred,
    /// An angular sample passed; `growth` is the number of radius increments taken.
    Sampled { growth: usize },
    /// Nothing passed within the search bounds.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: DVec3,
    pub outcome: SearchOutcome,
}

impl SearchContext<'_> {
    /// Hierarchical distance floor relative to `parent`.
    pub fn correct(&self, candidate: DVec3, parent: DVec3) -> DVec3 {
        enforce_hierarchical_distance(candidate, parent, self.origin, self.cfg.generation_gap)
    }

    pub fn collides(&self, candidate: DVec3, effective_min: f64, node: NodeId, parent_id: NodeId) -> bool {
        self.placed.collides(candidate, effective_min, &[node, parent_id])
    }

    pub fn crosses(&self, parent: DVec3, candidate: DVec3, node: NodeId, parent_id: NodeId) -> bool {
        self.placed.crosses(parent, candidate, self.cfg.intersection_buffer, node, parent_id)
    }

    /// No collision and no crossing.
    pub fn is_safe(&self, parent: DVec3, candidate: DVec3, effective_min: f64, node: NodeId, parent_id: NodeId) -> bool {
        !self.collides(candidate, effective_min, node, parent_id)
            && !self.crosses(parent, candidate, node, parent_id)
    }
}

/// Symmetric jitter in `[-magnitude, magnitude]`.
pub(crate) fn jitter<R: Rng + ?Sized>(rng: &mut R, magnitude: f64) -> f64 {
    if magnitude > 0.0 {
        rng.gen_range(-magnitude..=magnitude)
    } else {
        0.0
    }
}

/// Offset of the `k`-th of `n` evenly spaced samples, nearest first:
/// 0, +1, -1, +2, -2, ... slots away from the starting angle.
fn sample_offset(k: usize, n: usize) -> f64 {
    let slot = std::f64::consts::TAU / n.max(1) as f64;
    let steps = k.div_ceil(2) as f64;
    if k % 2 == 1 { steps * slot } else { -steps * slot }
}

/// Find a safe position for `node`, a child of `parent_id` sitting at `parent`.
///
/// `existing` positions and edges come from `ctx.placed`. The node's own
/// entry and its parent are never counted as obstacles, and edges touching
/// either of them are never counted as crossings.
pub fn find_safe_position<R: Rng + ?Sized>(
    ctx: &SearchContext<'_>,
    parent: DVec3,
    preferred: DVec3,
    min_distance: f64,
    node: NodeId,
    parent_id: NodeId,
    rng: &mut R,
) -> Placement {
    let cfg = ctx.cfg;
    let effective_min = cfg.effective_min_distance(min_distance);

    let corrected = ctx.correct(preferred, parent);
    if ctx.is_safe(parent, corrected, effective_min, node, parent_id) {
        return Placement { position: corrected, outcome: SearchOutcome::Preferred };
    }

    let base_radius = parent.distance(corrected).max(cfg.generation_gap);
    let base_angle = planar_angle(parent, corrected);
    let samples = cfg.search_angle_samples.max(1);

    for growth in 0..=cfg.search_growth_steps() {
        let radius = base_radius + growth as f64 * cfg.search_radius_step;
        for k in 0..samples {
            let angle = base_angle + sample_offset(k, samples);
            let dz = jitter(rng, cfg.search_z_jitter);
            let candidate = ctx.correct(point_on_circle(parent, radius, angle, dz), parent);
            if ctx.is_safe(parent, candidate, effective_min, node, parent_id) {
                return Placement { position: candidate, outcome: SearchOutcome::Sampled { growth } };
            }
        }
    }

    let dir = (corrected - parent).try_normalize().unwrap_or(FALLBACK_DIRECTION);
    let fallback = ctx.correct(parent + dir * (base_radius + 2.0 * effective_min), parent);
    warn!("no safe position for node {} after full search, using fallback", node.0);
    Placement { position: fallback, outcome: SearchOutcome::Fallback }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const ROOT: NodeId = NodeId(0);

    fn ctx<'a>(placed: &'a PlacedSet, cfg: &'a LayoutConfig) -> SearchContext<'a> {
        SearchContext { placed, cfg, origin: DVec3::ZERO }
    }

    #[test]
    fn test_sample_offsets_cover_every_slot_once() {
        let n = 32;
        let mut slots: Vec<i64> = (0..n)
            .map(|k| (sample_offset(k, n) / (std::f64::consts::TAU / n as f64)).round() as i64)
            .collect();
        assert_eq!(&slots[..5], &[0, 1, -1, 2, -2]);
        slots.sort();
        slots.dedup();
        assert_eq!(slots.len(), n);
        assert_eq!(*slots.last().unwrap(), 16);
    }

    #[test]
    fn test_free_preferred_position_is_kept() {
        let cfg = LayoutConfig::default();
        let mut placed = PlacedSet::new(3.0);
        placed.place(ROOT, DVec3::ZERO);
        let mut rng = StdRng::seed_from_u64(1);

        let preferred = DVec3::new(5.0, 0.0, 0.0);
        let p = find_safe_position(&ctx(&placed, &cfg), DVec3::ZERO, preferred, 2.8, NodeId(1), ROOT, &mut rng);
        assert_eq!(p.outcome, SearchOutcome::Preferred);
        assert_eq!(p.position, preferred);
    }

    #[test]
    fn test_preferred_inside_floor_is_pushed_out() {
        let cfg = LayoutConfig::default();
        let mut placed = PlacedSet::new(3.0);
        let parent = DVec3::new(4.0, 0.0, 0.0);
        placed.place(ROOT, DVec3::ZERO);
        placed.place_child(ROOT, DVec3::ZERO, NodeId(1), parent);
        let mut rng = StdRng::seed_from_u64(1);

        // Preferred point sits closer to the hub than the parent.
        let p = find_safe_position(
            &ctx(&placed, &cfg),
            parent,
            DVec3::new(2.0, 3.0, 0.0),
            1.7,
            NodeId(2),
            NodeId(1),
            &mut rng,
        );
        assert!(p.position.length() >= parent.length() + cfg.generation_gap - 1e-9);
    }

    #[test]
    fn test_collision_moves_node_away() {
        let cfg = LayoutConfig::default();
        let mut placed = PlacedSet::new(3.0);
        placed.place(ROOT, DVec3::ZERO);
        let obstacle = DVec3::new(5.0, 0.0, 0.0);
        placed.place_child(ROOT, DVec3::ZERO, NodeId(1), obstacle);
        let mut rng = StdRng::seed_from_u64(7);

        let p = find_safe_position(&ctx(&placed, &cfg), DVec3::ZERO, obstacle, 2.8, NodeId(2), ROOT, &mut rng);
        assert!(matches!(p.outcome, SearchOutcome::Sampled { .. }));
        assert!(p.position.distance(obstacle) >= cfg.effective_min_distance(2.8));
        assert!(p.position.length() >= cfg.generation_gap);
    }

    #[test]
    fn test_crossing_edge_is_avoided() {
        let cfg = LayoutConfig::default();
        let mut placed = PlacedSet::new(3.0);
        placed.place(ROOT, DVec3::ZERO);
        // A foreign edge running vertically across x = 3.
        placed.place(NodeId(5), DVec3::new(3.0, -6.0, 0.0));
        placed.place_child(NodeId(5), DVec3::new(3.0, -6.0, 0.0), NodeId(6), DVec3::new(3.0, 6.0, 0.0));
        let mut rng = StdRng::seed_from_u64(3);

        let p = find_safe_position(
            &ctx(&placed, &cfg),
            DVec3::ZERO,
            DVec3::new(6.0, 0.0, 0.0),
            2.8,
            NodeId(1),
            ROOT,
            &mut rng,
        );
        assert_ne!(p.outcome, SearchOutcome::Preferred);
        assert!(!placed.crosses(DVec3::ZERO, p.position, cfg.intersection_buffer, NodeId(1), ROOT));
    }

    #[test]
    fn test_hopeless_search_falls_back_deterministically() {
        let cfg = LayoutConfig {
            search_angle_samples: 4,
            search_max_radius_growth: 0.0,
            ..LayoutConfig::default()
        };
        let mut placed = PlacedSet::new(3.0);
        // Obstacles on every one of the four sampled directions.
        for (i, p) in [
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(0.0, 2.0, 0.0),
            DVec3::new(-2.0, 0.0, 0.0),
            DVec3::new(0.0, -2.0, 0.0),
        ]
        .into_iter()
        .enumerate()
        {
            placed.place(NodeId(10 + i), p);
        }
        let mut rng = StdRng::seed_from_u64(0);

        let p = find_safe_position(
            &ctx(&placed, &cfg),
            DVec3::ZERO,
            DVec3::new(2.0, 0.0, 0.0),
            1.4,
            NodeId(1),
            ROOT,
            &mut rng,
        );
        assert_eq!(p.outcome, SearchOutcome::Fallback);
        // base radius 2 + twice the effective minimum (2 * 2.0)
        assert!((p.position - DVec3::new(6.0, 0.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn test_search_is_reproducible_with_same_seed() {
        let cfg = LayoutConfig::default();
        let mut placed = PlacedSet::new(3.0);
        placed.place(ROOT, DVec3::ZERO);
        placed.place_child(ROOT, DVec3::ZERO, NodeId(1), DVec3::new(5.0, 0.0, 0.0));

        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            find_safe_position(
                &ctx(&placed, &cfg),
                DVec3::ZERO,
                DVec3::new(5.0, 0.0, 0.0),
                2.8,
                NodeId(2),
                ROOT,
                &mut rng,
            )
        };
        assert_eq!(run(42), run(42));
    }
}
