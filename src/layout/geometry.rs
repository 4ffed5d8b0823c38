// Geometric predicates shared by the search and the arranger.
//
// - Distances are plain Euclidean in 3D.
// - Edge crossing is tested on the x/y projection only; the layout is a
//   roughly planar radial fan, z only carries small jitter.
// - Every function is total: degenerate input (zero-length directions,
//   parallel segments) falls back to a fixed answer instead of NaN.

use glam::{DVec2, DVec3};

/// Direction used when a vector has no usable direction of its own.
pub const FALLBACK_DIRECTION: DVec3 = DVec3::X;

/// Determinant below which two segments are treated as parallel.
pub const PARALLEL_EPSILON: f64 = 1e-4;

pub fn distance_3d(a: DVec3, b: DVec3) -> f64 {
    a.distance(b)
}

/// Distance from the hub. `origin` is the center's world position.
pub fn distance_from_origin(p: DVec3, origin: DVec3) -> f64 {
    p.distance(origin)
}

/// Angle of `p` around `center` in the x/y plane.
pub fn planar_angle(center: DVec3, p: DVec3) -> f64 {
    let d = p - center;
    d.y.atan2(d.x)
}

/// Point at `radius` from `center` in direction `angle` (x/y plane), lifted by `dz`.
pub fn point_on_circle(center: DVec3, radius: f64, angle: f64, dz: f64) -> DVec3 {
    center + DVec3::new(radius * angle.cos(), radius * angle.sin(), dz)
}

/// Parametric 2D crossing test between segments `a1-a2` and `b1-b2`.
///
/// `buffer` is in world units. It is converted into a fraction of the
/// shorter segment and widens the accepted parameter range `[0, 1]` on both
/// segments, so near misses within the margin count as crossings.
pub fn segments_intersect(a1: DVec3, a2: DVec3, b1: DVec3, b2: DVec3, buffer: f64) -> bool {
    let p = a1.truncate();
    let r = a2.truncate() - p;
    let q = b1.truncate();
    let s = b2.truncate() - q;

    let denom = r.perp_dot(s);
    if denom.abs() < PARALLEL_EPSILON {
        return false;
    }

    let shorter = r.length().min(s.length());
    if shorter <= f64::EPSILON {
        return false;
    }
    let margin = buffer.max(0.0) / shorter;

    let qp: DVec2 = q - p;
    let t = qp.perp_dot(s) / denom;
    let u = qp.perp_dot(r) / denom;

    let lo = -margin;
    let hi = 1.0 + margin;
    (lo..=hi).contains(&t) && (lo..=hi).contains(&u)
}

/// Push `candidate` outward so it sits at least `gap` further from the hub than `parent`.
///
/// A candidate that already satisfies the constraint is returned unchanged.
/// Otherwise it keeps its direction from the hub and is rescaled to the
/// minimum allowed distance, which leaves its angular placement intact.
pub fn enforce_hierarchical_distance(candidate: DVec3, parent: DVec3, origin: DVec3, gap: f64) -> DVec3 {
    let required = distance_from_origin(parent, origin) + gap;
    if distance_from_origin(candidate, origin) >= required {
        return candidate;
    }

    let dir = (candidate - origin)
        .try_normalize()
        .or_else(|| (candidate - parent).try_normalize())
        .unwrap_or(FALLBACK_DIRECTION);

    origin + dir * required
}
