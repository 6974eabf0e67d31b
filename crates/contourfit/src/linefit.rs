//! Robust 2-D line fitting.
//!
//! Minimizes Σ ρ(rᵢ) over the perpendicular residuals rᵢ, where ρ is one of
//! six loss kernels, via iteratively reweighted least squares: each round
//! solves a weighted orthogonal regression (weighted centroid + dominant
//! eigenvector of the weighted scatter matrix) and re-weights the points by
//! w(r) = ρ'(r)/r. The loop carries a fixed iteration cap and stops early
//! once the direction and offset settle below the caller's thresholds.

use nalgebra::Matrix2;
use serde::{Deserialize, Serialize};

use crate::pointset::PointSeq;
use crate::GeomError;

/// Hard cap on reweighting rounds within one attempt.
const MAX_ITERS: usize = 30;

/// Number of randomized restarts for the non-quadratic kernels. IRLS is a
/// local method; restarting from random weightings and keeping the lowest
/// total loss makes the minimizer robust to gross outliers.
const MAX_ATTEMPTS: usize = 10;

/// Distance kernel ρ for the residual weighting.
///
/// The tuning constants are the standard 95%-efficiency values for each
/// kernel; they apply when the caller passes `param == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceKind {
    /// ρ(r) = |r|
    L1,
    /// ρ(r) = r²/2 — plain least squares, no reweighting.
    L2,
    /// ρ(r) = 2(√(1+r²/2) − 1)
    L12,
    /// ρ(r) = c²(|r|/c − ln(1+|r|/c)), c = 1.3998
    Fair,
    /// ρ(r) = c²/2(1 − exp(−(r/c)²)), c = 2.9846
    Welsch,
    /// ρ(r) = r²/2 for |r| < c, else c(|r| − c/2), c = 1.345
    Huber,
}

/// A fitted line: unit direction plus a point on the line.
///
/// The direction's sign is not specified beyond unit length; callers that
/// care about a particular orientation must normalize it themselves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedLine {
    pub dir: [f32; 2],
    pub point: [f32; 2],
}

impl FittedLine {
    /// Perpendicular distance from `p` to the line.
    pub fn distance(&self, p: [f64; 2]) -> f64 {
        let dx = p[0] - self.point[0] as f64;
        let dy = p[1] - self.point[1] as f64;
        (dx * self.dir[1] as f64 - dy * self.dir[0] as f64).abs()
    }
}

/// Fit a line to `points` minimizing the `dist` loss over perpendicular
/// residuals.
///
/// `param` is the kernel tuning constant (0 selects the kernel default);
/// `reps` and `aeps` are the convergence thresholds for the line offset and
/// angle respectively (0 selects 0.01). Fewer than 2 points is an error,
/// and a sequence whose points are all identical has no direction and fails
/// with [`GeomError::DegenerateFit`].
pub fn fit_line(
    points: &PointSeq,
    dist: DistanceKind,
    param: f64,
    reps: f64,
    aeps: f64,
) -> Result<FittedLine, GeomError> {
    let n = points.len();
    if n < 2 {
        return Err(GeomError::EmptyInput { needed: 2, got: n });
    }
    let pts = points.as_f64();
    if pts.iter().all(|p| *p == pts[0]) {
        return Err(GeomError::DegenerateFit(
            "all points identical, line direction undefined".into(),
        ));
    }

    let reps = if reps > 0.0 { reps } else { 0.01 };
    let aeps = if aeps > 0.0 { aeps } else { 0.01 };
    let c = kernel_scale(dist, param);

    // Randomized restarts use a per-call generator with a fixed seed, so
    // results are reproducible and no state leaks across calls.
    use rand::prelude::*;
    let mut rng = StdRng::seed_from_u64(0x11f1);
    let attempts = if dist == DistanceKind::L2 {
        1
    } else {
        MAX_ATTEMPTS
    };

    let mut best: Option<(f64, [f64; 2], [f64; 2])> = None;
    let mut weights = vec![1.0f64; n];

    for attempt in 0..attempts {
        if attempt > 0 {
            for w in weights.iter_mut() {
                *w = rng.gen_range(0.05..1.0);
            }
        } else {
            weights.fill(1.0);
        }
        normalize_weights(&mut weights);
        let (mut dir, mut origin) = weighted_fit(&pts, &weights)?;

        if dist != DistanceKind::L2 {
            for iter in 0..MAX_ITERS {
                for (w, p) in weights.iter_mut().zip(&pts) {
                    let r = residual(*p, dir, origin);
                    *w = kernel_weight(dist, c, r);
                }
                normalize_weights(&mut weights);

                let (new_dir, new_origin) = weighted_fit(&pts, &weights)?;

                // Angle settles when the directions are parallel up to
                // sign; offset settles when the new origin stays on the
                // old line.
                let angle_delta = 1.0 - (new_dir[0] * dir[0] + new_dir[1] * dir[1]).abs();
                let offset_delta = residual(new_origin, dir, origin);
                dir = new_dir;
                origin = new_origin;
                if angle_delta < aeps && offset_delta < reps {
                    break;
                }
                if iter + 1 == MAX_ITERS {
                    tracing::debug!(kind = ?dist, attempt, "line fit hit the iteration cap");
                }
            }
        }

        let cost: f64 = pts
            .iter()
            .map(|&p| kernel_loss(dist, c, residual(p, dir, origin)))
            .sum();
        if best.as_ref().is_none_or(|(b, _, _)| cost < *b) {
            best = Some((cost, dir, origin));
        }
        // A near-exact fit cannot be improved by further restarts.
        if cost <= 1e-12 * n as f64 {
            break;
        }
    }

    let (_, dir, origin) = best.expect("at least one attempt ran");
    Ok(FittedLine {
        dir: [dir[0] as f32, dir[1] as f32],
        point: [origin[0] as f32, origin[1] as f32],
    })
}

#[inline]
fn residual(p: [f64; 2], dir: [f64; 2], origin: [f64; 2]) -> f64 {
    let dx = p[0] - origin[0];
    let dy = p[1] - origin[1];
    (dx * dir[1] - dy * dir[0]).abs()
}

/// Default tuning constant for each kernel.
fn kernel_scale(dist: DistanceKind, param: f64) -> f64 {
    if param > 0.0 {
        return param;
    }
    match dist {
        DistanceKind::Fair => 1.3998,
        DistanceKind::Welsch => 2.9846,
        DistanceKind::Huber => 1.345,
        _ => 1.0,
    }
}

/// Loss ρ(r) for the kernel, used to rank restart attempts.
fn kernel_loss(dist: DistanceKind, c: f64, r: f64) -> f64 {
    match dist {
        DistanceKind::L1 => r,
        DistanceKind::L2 => 0.5 * r * r,
        DistanceKind::L12 => 2.0 * ((1.0 + 0.5 * r * r).sqrt() - 1.0),
        DistanceKind::Fair => c * c * (r / c - (1.0 + r / c).ln()),
        DistanceKind::Welsch => 0.5 * c * c * (1.0 - (-(r / c) * (r / c)).exp()),
        DistanceKind::Huber => {
            if r < c {
                0.5 * r * r
            } else {
                c * (r - 0.5 * c)
            }
        }
    }
}

/// Weight w(r) = ρ'(r)/r for the kernel.
fn kernel_weight(dist: DistanceKind, c: f64, r: f64) -> f64 {
    const R_EPS: f64 = 1e-10;
    let r = r.max(R_EPS);
    match dist {
        DistanceKind::L1 => 1.0 / r,
        DistanceKind::L2 => 1.0,
        DistanceKind::L12 => 1.0 / (1.0 + r * r / 2.0).sqrt(),
        DistanceKind::Fair => 1.0 / (1.0 + r / c),
        DistanceKind::Welsch => (-(r / c) * (r / c)).exp(),
        DistanceKind::Huber => {
            if r < c {
                1.0
            } else {
                c / r
            }
        }
    }
}

fn normalize_weights(weights: &mut [f64]) {
    let sum: f64 = weights.iter().sum();
    if sum > 0.0 {
        let inv = 1.0 / sum;
        for w in weights.iter_mut() {
            *w *= inv;
        }
    }
}

/// Weighted orthogonal regression: weighted centroid plus the dominant
/// eigenvector of the 2×2 weighted scatter matrix.
fn weighted_fit(pts: &[[f64; 2]], weights: &[f64]) -> Result<([f64; 2], [f64; 2]), GeomError> {
    let w_sum: f64 = weights.iter().sum();
    if w_sum <= 0.0 {
        return Err(GeomError::DegenerateFit("zero total weight".into()));
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    for (p, w) in pts.iter().zip(weights) {
        cx += w * p[0];
        cy += w * p[1];
    }
    cx /= w_sum;
    cy /= w_sum;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (p, w) in pts.iter().zip(weights) {
        let dx = p[0] - cx;
        let dy = p[1] - cy;
        sxx += w * dx * dx;
        sxy += w * dx * dy;
        syy += w * dy * dy;
    }

    let scatter = Matrix2::new(sxx, sxy, sxy, syy);
    let eigen = scatter.symmetric_eigen();
    let dominant = if eigen.eigenvalues[0] >= eigen.eigenvalues[1] {
        0
    } else {
        1
    };
    let v = eigen.eigenvectors.column(dominant);
    let norm = (v[0] * v[0] + v[1] * v[1]).sqrt();
    if !norm.is_finite() || norm <= 0.0 {
        return Err(GeomError::DegenerateFit("scatter matrix collapsed".into()));
    }
    Ok(([v[0] / norm, v[1] / norm], [cx, cy]))
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::prelude::*;

    const ALL_KINDS: [DistanceKind; 6] = [
        DistanceKind::L1,
        DistanceKind::L2,
        DistanceKind::L12,
        DistanceKind::Fair,
        DistanceKind::Welsch,
        DistanceKind::Huber,
    ];

    #[test]
    fn exact_line_recovered_by_every_kernel() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            let v0 = [rng.gen_range(1.0..100.0f64), rng.gen_range(1.0..100.0)];
            let v1 = [rng.gen_range(1.0..100.0f64), rng.gen_range(1.0..100.0)];
            let norm = (v1[0] * v1[0] + v1[1] * v1[1]).sqrt();
            let v1n = [v1[0] / norm, v1[1] / norm];

            let num = rng.gen_range(30..100);
            let pts: Vec<[f32; 2]> = (0..num)
                .map(|i| {
                    [
                        (v0[0] + v1[0] * i as f64) as f32,
                        (v0[1] + v1[1] * i as f64) as f32,
                    ]
                })
                .collect();
            let seq = PointSeq::from_f32(&pts);

            for kind in ALL_KINDS {
                let line = fit_line(&seq, kind, 0.0, 0.01, 0.01).unwrap();
                // direction matches up to sign
                let dot = (line.dir[0] as f64) * v1n[0] + (line.dir[1] as f64) * v1n[1];
                assert_relative_eq!(dot.abs(), 1.0, epsilon = 1e-2);
                // the reported point lies on the original line
                let d = line.distance([line.point[0] as f64, line.point[1] as f64]);
                assert!(d < 1e-6);
                let dx = line.point[0] as f64 - v0[0];
                let dy = line.point[1] as f64 - v0[1];
                let offset = (dx * v1n[1] - dy * v1n[0]).abs();
                assert!(offset < 0.5, "{:?}: point off line by {}", kind, offset);
            }
        }
    }

    #[test]
    fn near_horizontal_cluster_keeps_horizontal_direction() {
        // Five integer points spread along x with a 4-pixel y band: the L1
        // fit must not tilt toward the outlier rows.
        let seq = PointSeq::from_i32(&[
            [432, 654],
            [370, 656],
            [390, 656],
            [410, 656],
            [348, 658],
        ]);
        let line = fit_line(&seq, DistanceKind::L1, 0.0, 0.01, 0.01).unwrap();
        assert!(
            line.dir[0].abs() >= line.dir[1].abs() * 4.0,
            "direction {:?} not horizontal enough",
            line.dir
        );
    }

    #[test]
    fn near_vertical_cluster_keeps_vertical_direction() {
        let seq = PointSeq::from_f32(&[
            [1224.0, 576.0],
            [1234.0, 683.0],
            [1215.0, 471.0],
            [1184.0, 137.0],
            [1079.0, 377.0],
            [1239.0, 788.0],
        ]);
        let line = fit_line(&seq, DistanceKind::Welsch, 0.0, 0.01, 0.01).unwrap();
        assert!(
            line.dir[1].abs() >= line.dir[0].abs() * 4.0,
            "direction {:?} not vertical enough",
            line.dir
        );
    }

    #[test]
    fn robust_kernels_downweight_outliers() {
        // 40 points on y = x plus two gross outliers; the Welsch fit should
        // stay within a degree of the true direction.
        let mut pts: Vec<[f32; 2]> = (0..40).map(|i| [i as f32, i as f32]).collect();
        pts.push([10.0, 300.0]);
        pts.push([30.0, -250.0]);
        let line = fit_line(
            &PointSeq::from_f32(&pts),
            DistanceKind::Welsch,
            0.0,
            0.01,
            0.01,
        )
        .unwrap();
        let dot = (line.dir[0] as f64 + line.dir[1] as f64) / 2.0f64.sqrt();
        assert!(dot.abs() > 0.999, "direction {:?} dragged by outliers", line.dir);
    }

    #[test]
    fn degenerate_inputs_error() {
        assert!(matches!(
            fit_line(
                &PointSeq::from_f32(&[[1.0, 1.0]]),
                DistanceKind::L2,
                0.0,
                0.0,
                0.0
            ),
            Err(GeomError::EmptyInput { .. })
        ));
        assert!(matches!(
            fit_line(
                &PointSeq::from_i32(&[[3, 3], [3, 3], [3, 3]]),
                DistanceKind::Huber,
                0.0,
                0.0,
                0.0
            ),
            Err(GeomError::DegenerateFit(_))
        ));
    }

    #[test]
    fn integer_input_promotes_cleanly() {
        let pts: Vec<[i32; 2]> = (0..50).map(|i| [i, 2 * i + 7]).collect();
        let line = fit_line(&PointSeq::from_i32(&pts), DistanceKind::Fair, 0.0, 0.01, 0.01).unwrap();
        let slope = line.dir[1] / line.dir[0];
        assert_relative_eq!(slope, 2.0, epsilon = 1e-3);
    }
}
