//! Minimum enclosing circle.
//!
//! Incremental Welzl construction: points are inserted one by one; whenever
//! a point falls outside the current candidate, the minimal circle is rebuilt
//! with that point pinned to the boundary, recursing through the 2-point
//! diameter and 3-point circumcircle base cases. The insertion order is
//! shuffled with a fixed-seed generator, which gives the expected-linear
//! running time without any cross-call state.

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::pointset::PointSeq;
use crate::GeomError;

/// Relative slack for the "already inside" test. Keeps floating round-off
/// from forcing needless rebuilds; the base-case circles themselves are
/// computed exactly from their support points.
const CONTAINS_EPS: f64 = 1e-10;

/// A circle: center and radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: [f32; 2],
    pub radius: f32,
}

/// Find the smallest circle containing every point of `points`.
///
/// Degenerate inputs collapse naturally: one point (or all identical) gives
/// a zero-radius circle, two points give their diameter circle, colinear
/// points give the diameter circle of the extreme pair. An obtuse triangle
/// is enclosed by the diameter circle of its longest side, an acute one by
/// its circumcircle.
pub fn min_enclosing_circle(points: &PointSeq) -> Result<Circle, GeomError> {
    if points.is_empty() {
        return Err(GeomError::EmptyInput { needed: 1, got: 0 });
    }
    let pts = points.as_f64();

    let mut order: Vec<usize> = (0..pts.len()).collect();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    order.shuffle(&mut rng);

    let (center, radius) = welzl(&pts, &order);
    Ok(Circle {
        center: [center[0] as f32, center[1] as f32],
        radius: radius as f32,
    })
}

fn welzl(pts: &[[f64; 2]], order: &[usize]) -> ([f64; 2], f64) {
    let mut c = (pts[order[0]], 0.0);
    for i in 1..order.len() {
        let p = pts[order[i]];
        if !contains(c, p) {
            c = with_one_boundary(pts, &order[..i], p);
        }
    }
    c
}

/// Minimal circle over `order` with `q` on the boundary.
fn with_one_boundary(pts: &[[f64; 2]], order: &[usize], q: [f64; 2]) -> ([f64; 2], f64) {
    let mut c = (q, 0.0);
    for (i, &oi) in order.iter().enumerate() {
        let p = pts[oi];
        if !contains(c, p) {
            c = with_two_boundary(pts, &order[..i], p, q);
        }
    }
    c
}

/// Minimal circle over `order` with `q1` and `q2` on the boundary.
fn with_two_boundary(pts: &[[f64; 2]], order: &[usize], q1: [f64; 2], q2: [f64; 2]) -> ([f64; 2], f64) {
    let mut c = diameter_circle(q1, q2);
    for &oi in order {
        let p = pts[oi];
        if !contains(c, p) {
            c = circumcircle(q1, q2, p);
        }
    }
    c
}

#[inline]
fn contains(c: ([f64; 2], f64), p: [f64; 2]) -> bool {
    let dx = p[0] - c.0[0];
    let dy = p[1] - c.0[1];
    let r = c.1 * (1.0 + CONTAINS_EPS);
    dx * dx + dy * dy <= r * r
}

fn diameter_circle(a: [f64; 2], b: [f64; 2]) -> ([f64; 2], f64) {
    let center = [(a[0] + b[0]) * 0.5, (a[1] + b[1]) * 0.5];
    let dx = a[0] - center[0];
    let dy = a[1] - center[1];
    (center, (dx * dx + dy * dy).sqrt())
}

/// Circle through three points. Near-colinear triples fall back to the
/// diameter circle of the farthest pair.
fn circumcircle(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> ([f64; 2], f64) {
    let bx = b[0] - a[0];
    let by = b[1] - a[1];
    let cx = c[0] - a[0];
    let cy = c[1] - a[1];
    let d = 2.0 * (bx * cy - by * cx);

    let b_sq = bx * bx + by * by;
    let c_sq = cx * cx + cy * cy;
    // Degeneracy scale: compare the doubled triangle area against the
    // squared extent of the triple.
    if d.abs() <= f64::EPSILON * (b_sq + c_sq) {
        let dist2 = |p: [f64; 2], q: [f64; 2]| {
            let dx = p[0] - q[0];
            let dy = p[1] - q[1];
            dx * dx + dy * dy
        };
        let mut far = (a, b);
        let mut far_d = dist2(a, b);
        for pair in [(a, c), (b, c)] {
            let d2 = dist2(pair.0, pair.1);
            if d2 > far_d {
                far_d = d2;
                far = pair;
            }
        }
        return diameter_circle(far.0, far.1);
    }

    let ux = (cy * b_sq - by * c_sq) / d;
    let uy = (bx * c_sq - cx * b_sq) / d;
    let center = [a[0] + ux, a[1] + uy];
    (center, (ux * ux + uy * uy).sqrt())
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::prelude::*;

    fn circle_of(pts: &[[f32; 2]]) -> Circle {
        min_enclosing_circle(&PointSeq::from_f32(pts)).unwrap()
    }

    #[test]
    fn obtuse_triangle_uses_diameter_circle() {
        // The apex lies inside the circle spanned by the base diameter.
        let c = circle_of(&[[0.0, 0.0], [10.0, 0.0], [5.0, 1.0]]);
        assert_relative_eq!(c.center[0], 5.0, epsilon = 1e-3);
        assert_relative_eq!(c.center[1], 0.0, epsilon = 1e-3);
        assert_relative_eq!(c.radius, 5.0, epsilon = 1e-3);
    }

    #[test]
    fn right_triangle_apex_on_diameter_circle() {
        let c = circle_of(&[[0.0, 0.0], [10.0, 0.0], [5.0, 5.0]]);
        assert_relative_eq!(c.center[0], 5.0, epsilon = 1e-3);
        assert_relative_eq!(c.center[1], 0.0, epsilon = 1e-3);
        assert_relative_eq!(c.radius, 5.0, epsilon = 1e-3);
    }

    #[test]
    fn acute_triangle_uses_circumcircle() {
        let c = circle_of(&[[0.0, 0.0], [10.0, 0.0], [5.0, 10.0]]);
        assert_relative_eq!(c.center[0], 5.0, epsilon = 1e-3);
        assert_relative_eq!(c.center[1], 3.75, epsilon = 1e-3);
        assert_relative_eq!(c.radius, 6.25, epsilon = 1e-3);
    }

    #[test]
    fn colinear_and_duplicate_points() {
        let c = circle_of(&[[0.0, 0.0], [10.0, 0.0], [3.0, 0.0]]);
        assert_relative_eq!(c.center[0], 5.0, epsilon = 1e-3);
        assert_relative_eq!(c.radius, 5.0, epsilon = 1e-3);

        let c = circle_of(&[[0.0, 0.0], [10.0, 0.0], [10.0, 0.0]]);
        assert_relative_eq!(c.center[0], 5.0, epsilon = 1e-3);
        assert_relative_eq!(c.radius, 5.0, epsilon = 1e-3);

        let c = circle_of(&[[10.0, 0.0], [10.0, 0.0], [10.0, 0.0]]);
        assert_relative_eq!(c.center[0], 10.0, epsilon = 1e-3);
        assert_relative_eq!(c.center[1], 0.0, epsilon = 1e-3);
        assert_relative_eq!(c.radius, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn near_duplicate_cluster_regression() {
        // A tight 5-point cluster: the exact minimal radius is ~2.10246.
        let c = circle_of(&[
            [85.0, 1415.0],
            [87.0, 1415.0],
            [89.0, 1414.0],
            [89.0, 1414.0],
            [87.0, 1412.0],
        ]);
        assert_relative_eq!(c.center[0], 86.9, epsilon = 1e-3);
        assert_relative_eq!(c.center[1], 1414.1, epsilon = 1e-3);
        assert_relative_eq!(c.radius, 2.1024551, epsilon = 1e-3);
    }

    #[test]
    fn two_boundary_points_and_interior_point_recover_known_circle() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..50 {
            let center = [rng.gen_range(0.0..1000.0f64), rng.gen_range(0.0..1000.0)];
            let radius: f64 = rng.gen_range(1.0..500.0);
            let angle: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
            let on = |a: f64| {
                [
                    (center[0] + radius * a.cos()) as f32,
                    (center[1] + radius * a.sin()) as f32,
                ]
            };
            // Two diametral points and one strictly inside.
            let x = rng.gen_range(-radius * 0.9..radius * 0.9);
            let y_bound = (radius * radius - x * x).sqrt() * 0.9;
            let inner = [
                (center[0] + x) as f32,
                (center[1] + rng.gen_range(-y_bound..y_bound)) as f32,
            ];
            let c = circle_of(&[on(angle), on(angle + std::f64::consts::PI), inner]);
            assert_relative_eq!(c.center[0] as f64, center[0], epsilon = 1e-2);
            assert_relative_eq!(c.center[1] as f64, center[1], epsilon = 1e-2);
            assert_relative_eq!(c.radius as f64, radius, epsilon = 1e-2);
        }
    }

    #[test]
    fn random_clouds_contained_and_minimal() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..40 {
            let n = rng.gen_range(1..200);
            let pts: Vec<[f32; 2]> = (0..n)
                .map(|_| [rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0)])
                .collect();
            let c = circle_of(&pts);
            let center = [c.center[0] as f64, c.center[1] as f64];
            let radius = c.radius as f64;

            let mut boundary = 0;
            let mut max_pair_dist = 0.0f64;
            let mut near: Vec<[f64; 2]> = Vec::new();
            for p in &pts {
                let d = ((p[0] as f64 - center[0]).powi(2) + (p[1] as f64 - center[1]).powi(2))
                    .sqrt();
                assert!(d <= radius * (1.0 + 1e-3) + 1e-9, "point outside circle");
                if d >= radius * (1.0 - 1e-3) - 1e-9 {
                    boundary += 1;
                    near.push([p[0] as f64, p[1] as f64]);
                }
            }
            for i in 0..near.len() {
                for j in (i + 1)..near.len() {
                    let d = ((near[i][0] - near[j][0]).powi(2)
                        + (near[i][1] - near[j][1]).powi(2))
                    .sqrt();
                    max_pair_dist = max_pair_dist.max(d);
                }
            }
            // Minimality: either >= 3 support points, or 2 diametral ones,
            // or the whole cloud collapsed to one point.
            assert!(
                boundary >= 3
                    || (boundary == 2 && max_pair_dist >= 2.0 * radius * (1.0 - 1e-3))
                    || radius <= 1e-9,
                "circle not minimal: {} boundary points, max pair dist {}, r {}",
                boundary,
                max_pair_dist,
                radius
            );
        }
    }
}
