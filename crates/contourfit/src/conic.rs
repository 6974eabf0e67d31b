//! Ellipse fitting by direct least squares.
//!
//! Implements:
//! - Direct conic fit (Fitzgibbon et al., "Direct Least Square Fitting of
//!   Ellipses", 1999) with centroid/√2 coordinate normalization.
//! - Conversion between general conic coefficients and geometric ellipse
//!   parameters, and back.
//! - The public [`fit_ellipse`] entry point returning the descriptor in
//!   rotated-rectangle form (center, full axis lengths, angle in degrees).

use nalgebra::{DMatrix, Matrix3, Vector3, Vector6};

use crate::pointset::PointSeq;
use crate::rect::RotatedRect;
use crate::GeomError;

// ── Types ──────────────────────────────────────────────────────────────────

/// General conic: A x² + B xy + C y² + D x + E y + F = 0.
/// Stored as [A, B, C, D, E, F].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConicCoeffs(pub [f64; 6]);

/// Geometric ellipse parameters: center, semi-axes, rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    pub cx: f64,
    pub cy: f64,
    /// Semi-major axis length.
    pub a: f64,
    /// Semi-minor axis length.
    pub b: f64,
    /// Rotation of the major axis from +x, in radians, in (−π/2, π/2].
    pub angle: f64,
}

impl ConicCoeffs {
    /// Algebraic distance of a point (x, y) to this conic.
    pub fn algebraic_distance(&self, x: f64, y: f64) -> f64 {
        let [a, b, c, d, e, f] = self.0;
        a * x * x + b * x * y + c * y * y + d * x + e * y + f
    }

    /// Whether the conic represents an ellipse (discriminant B²−4AC < 0).
    pub fn is_ellipse(&self) -> bool {
        let [a, b, c, ..] = self.0;
        b * b - 4.0 * a * c < 0.0
    }

    /// Convert to geometric parameters; `None` if not a proper ellipse.
    pub fn to_ellipse(&self) -> Option<Ellipse> {
        conic_to_ellipse(self)
    }
}

impl Ellipse {
    /// Basic validity: positive semi-axes, finite values.
    pub fn is_valid(&self) -> bool {
        self.a > 0.0
            && self.b > 0.0
            && self.a.is_finite()
            && self.b.is_finite()
            && self.cx.is_finite()
            && self.cy.is_finite()
            && self.angle.is_finite()
    }

    /// Convert to conic coefficients.
    pub fn to_conic(&self) -> ConicCoeffs {
        let cos_a = self.angle.cos();
        let sin_a = self.angle.sin();
        let a2 = self.a * self.a;
        let b2 = self.b * self.b;

        let ca = cos_a * cos_a / a2 + sin_a * sin_a / b2;
        let cb = 2.0 * cos_a * sin_a * (1.0 / a2 - 1.0 / b2);
        let cc = sin_a * sin_a / a2 + cos_a * cos_a / b2;
        let cd = -2.0 * ca * self.cx - cb * self.cy;
        let ce = -cb * self.cx - 2.0 * cc * self.cy;
        let cf =
            ca * self.cx * self.cx + cb * self.cx * self.cy + cc * self.cy * self.cy - 1.0;

        ConicCoeffs([ca, cb, cc, cd, ce, cf])
    }

    /// Sample `n` points on the boundary.
    pub fn sample_points(&self, n: usize) -> Vec<[f64; 2]> {
        let cos_a = self.angle.cos();
        let sin_a = self.angle.sin();
        (0..n)
            .map(|i| {
                let t = std::f64::consts::TAU * (i as f64) / (n as f64);
                let px = self.a * t.cos();
                let py = self.b * t.sin();
                [
                    self.cx + cos_a * px - sin_a * py,
                    self.cy + sin_a * px + cos_a * py,
                ]
            })
            .collect()
    }

    /// Descriptor in rotated-rectangle form: full axis lengths, degrees.
    pub fn to_rotated_rect(&self) -> RotatedRect {
        let mut deg = self.angle.to_degrees();
        while deg >= 90.0 {
            deg -= 180.0;
        }
        while deg < -90.0 {
            deg += 180.0;
        }
        RotatedRect {
            center: [self.cx as f32, self.cy as f32],
            size: [(2.0 * self.a) as f32, (2.0 * self.b) as f32],
            angle: deg as f32,
        }
    }
}

// ── Public fit ─────────────────────────────────────────────────────────────

/// Fit an ellipse to `points` by direct algebraic least squares.
///
/// Requires at least 5 points (the degrees of freedom of a conic). The
/// result carries the full axis lengths — `size[0]` is the major axis —
/// and the major-axis angle in degrees. Ill-conditioned input (colinear or
/// near-degenerate point sets, or data whose best conic is a hyperbola or
/// parabola) fails with [`GeomError::DegenerateFit`]; the fit never returns
/// NaN or infinite parameters.
pub fn fit_ellipse(points: &PointSeq) -> Result<RotatedRect, GeomError> {
    let n = points.len();
    if n < 5 {
        return Err(GeomError::EmptyInput { needed: 5, got: n });
    }
    let pts = points.as_f64();
    let ellipse = fit_ellipse_direct(&pts).ok_or_else(|| {
        GeomError::DegenerateFit("no ellipse fits the point set".into())
    })?;
    Ok(ellipse.to_rotated_rect())
}

/// Direct least-squares fit on raw `f64` points; `None` when the solve
/// fails or the best conic is not an ellipse.
pub(crate) fn fit_ellipse_direct(points: &[[f64; 2]]) -> Option<Ellipse> {
    let n = points.len();
    if n < 5 {
        return None;
    }

    // Normalize for numerical stability: shift to the centroid, scale so
    // the mean distance from it is √2.
    let (mean_x, mean_y, scale) = normalization_params(points);

    // Design matrix D = [x², xy, y², x, y, 1] in normalized coordinates.
    let mut d = DMatrix::<f64>::zeros(n, 6);
    for (i, &[px, py]) in points.iter().enumerate() {
        let x = (px - mean_x) * scale;
        let y = (py - mean_y) * scale;
        d[(i, 0)] = x * x;
        d[(i, 1)] = x * y;
        d[(i, 2)] = y * y;
        d[(i, 3)] = x;
        d[(i, 4)] = y;
        d[(i, 5)] = 1.0;
    }

    // Scatter matrix S = Dᵀ D, partitioned into 3×3 blocks:
    //   S = [S11  S12]
    //       [S21  S22]
    let s = d.transpose() * &d;
    let s11 = s.fixed_view::<3, 3>(0, 0).into_owned();
    let s12 = s.fixed_view::<3, 3>(0, 3).into_owned();
    let s22 = s.fixed_view::<3, 3>(3, 3).into_owned();

    // Constraint matrix for the ellipse condition 4AC − B² > 0:
    //   C1 = [[0, 0, 2], [0, -1, 0], [2, 0, 0]]
    let c1 = Matrix3::new(0.0, 0.0, 2.0, 0.0, -1.0, 0.0, 2.0, 0.0, 0.0);

    // Reduce to the 3×3 generalized eigenproblem
    //   (S11 − S12 S22⁻¹ S21) a1 = λ C1 a1.
    let s22_inv = s22.try_inverse()?;
    let m = s11 - s12 * s22_inv * s12.transpose();
    let c1_inv = c1.try_inverse()?;
    let system = c1_inv * m;

    let a1 = solve_constrained_eigen(&system)?;
    let a2 = -s22_inv * s12.transpose() * a1;

    let coeffs_norm = Vector6::new(a1[0], a1[1], a1[2], a2[0], a2[1], a2[2]);
    let coeffs = denormalize_conic(&coeffs_norm, mean_x, mean_y, scale);

    let conic = ConicCoeffs(coeffs);
    if !conic.is_ellipse() {
        return None;
    }
    let ellipse = conic.to_ellipse()?;
    if !ellipse.is_valid() {
        return None;
    }
    Some(ellipse)
}

// ── Conversion: conic → ellipse ────────────────────────────────────────────

/// Convert general conic coefficients to geometric ellipse parameters.
/// Returns `None` if the conic does not describe a proper ellipse.
fn conic_to_ellipse(c: &ConicCoeffs) -> Option<Ellipse> {
    let [a, b, c_coeff, d, e, f] = c.0;

    let disc = b * b - 4.0 * a * c_coeff;
    if disc >= 0.0 {
        return None;
    }

    // Center from the gradient zero:
    //   2A·cx + B·cy + D = 0
    //   B·cx + 2C·cy + E = 0
    let denom = 4.0 * a * c_coeff - b * b; // = −disc > 0
    let cx = (b * e - 2.0 * c_coeff * d) / denom;
    let cy = (b * d - 2.0 * a * e) / denom;

    // Rotation from the quadratic part.
    let angle = if (a - c_coeff).abs() < 1e-15 {
        if b > 0.0 {
            std::f64::consts::FRAC_PI_4
        } else if b < 0.0 {
            -std::f64::consts::FRAC_PI_4
        } else {
            0.0
        }
    } else {
        0.5 * b.atan2(a - c_coeff)
    };

    // Semi-axes from the eigenvalues of the quadratic part.
    let sum = a + c_coeff;
    let diff = ((a - c_coeff).powi(2) + b * b).sqrt();
    let lambda1 = (sum + diff) / 2.0;
    let lambda2 = (sum - diff) / 2.0;

    // Conic value at the center.
    let f_center = a * cx * cx + b * cx * cy + c_coeff * cy * cy + d * cx + e * cy + f;
    if f_center.abs() < 1e-15 {
        return None;
    }

    let a_sq = -f_center / lambda1;
    let b_sq = -f_center / lambda2;
    if a_sq <= 0.0 || b_sq <= 0.0 {
        return None;
    }

    let (mut semi_a, mut semi_b) = (a_sq.sqrt(), b_sq.sqrt());
    let mut angle = angle;
    if semi_a < semi_b {
        std::mem::swap(&mut semi_a, &mut semi_b);
        angle += std::f64::consts::FRAC_PI_2;
    }

    // Normalize the angle to (−π/2, π/2].
    let pi = std::f64::consts::PI;
    while angle > pi / 2.0 {
        angle -= pi;
    }
    while angle <= -pi / 2.0 {
        angle += pi;
    }

    Some(Ellipse {
        cx,
        cy,
        a: semi_a,
        b: semi_b,
        angle,
    })
}

// ── Constrained eigen solve ────────────────────────────────────────────────

/// Eigenvector of the reduced system satisfying the ellipse constraint
/// aᵀ C1 a > 0.
///
/// The matrix is generally not symmetric, so the eigenvalues come from the
/// characteristic cubic and each eigenvector from the adjugate null-vector
/// of the shifted matrix.
fn solve_constrained_eigen(system: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let a = system;
    let tr = a[(0, 0)] + a[(1, 1)] + a[(2, 2)];
    let minor_sum = a[(0, 0)] * a[(1, 1)] - a[(0, 1)] * a[(1, 0)] + a[(0, 0)] * a[(2, 2)]
        - a[(0, 2)] * a[(2, 0)]
        + a[(1, 1)] * a[(2, 2)]
        - a[(1, 2)] * a[(2, 1)];
    let det = a.determinant();

    // λ³ − tr·λ² + minor_sum·λ − det = 0
    let eigenvalues = solve_cubic_real(1.0, -tr, minor_sum, -det);

    let mut best: Option<Vector3<f64>> = None;
    let mut best_ev = f64::MAX;
    for &ev in &eigenvalues {
        let shifted = system - Matrix3::identity() * ev;
        let Some(v) = null_vector_3x3(&shifted) else {
            continue;
        };
        // Ellipse constraint: 4 v₀ v₂ − v₁² > 0.
        let constraint = 4.0 * v[0] * v[2] - v[1] * v[1];
        if constraint > 0.0 && ev.abs() < best_ev {
            best_ev = ev.abs();
            best = Some(v);
        }
    }
    best
}

/// Null vector of a (near-)singular 3×3 matrix: the largest-norm row of the
/// adjugate, which for a rank-2 matrix is proportional to the null vector.
fn null_vector_3x3(m: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let cofactors = [
        Vector3::new(
            m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)],
            -(m[(1, 0)] * m[(2, 2)] - m[(1, 2)] * m[(2, 0)]),
            m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)],
        ),
        Vector3::new(
            -(m[(0, 1)] * m[(2, 2)] - m[(0, 2)] * m[(2, 1)]),
            m[(0, 0)] * m[(2, 2)] - m[(0, 2)] * m[(2, 0)],
            -(m[(0, 0)] * m[(2, 1)] - m[(0, 1)] * m[(2, 0)]),
        ),
        Vector3::new(
            m[(0, 1)] * m[(1, 2)] - m[(0, 2)] * m[(1, 1)],
            -(m[(0, 0)] * m[(1, 2)] - m[(0, 2)] * m[(1, 0)]),
            m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)],
        ),
    ];

    let mut best = &cofactors[0];
    let mut best_norm = best.norm_squared();
    for c in &cofactors[1..] {
        let n = c.norm_squared();
        if n > best_norm {
            best = c;
            best_norm = n;
        }
    }
    if best_norm < 1e-30 {
        return None;
    }
    Some(best / best_norm.sqrt())
}

/// Real roots of a x³ + b x² + c x + d = 0 (one or three).
fn solve_cubic_real(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    // Depressed cubic t³ + pt + q = 0 with x = t − b/(3a).
    let a_inv = 1.0 / a;
    let b_ = b * a_inv;
    let c_ = c * a_inv;
    let d_ = d * a_inv;

    let p = c_ - b_ * b_ / 3.0;
    let q = 2.0 * b_ * b_ * b_ / 27.0 - b_ * c_ / 3.0 + d_;

    let disc = -4.0 * p * p * p - 27.0 * q * q;
    let shift = -b_ / 3.0;

    if disc >= 0.0 {
        // Three real roots (possibly repeated).
        let r = (-p / 3.0).sqrt();
        let cos_arg = if r.abs() < 1e-15 {
            0.0
        } else {
            (-q / (2.0 * r * r * r)).clamp(-1.0, 1.0)
        };
        let theta = cos_arg.acos();
        let two_r = 2.0 * r;
        vec![
            two_r * (theta / 3.0).cos() + shift,
            two_r * ((theta + 2.0 * std::f64::consts::PI) / 3.0).cos() + shift,
            two_r * ((theta + 4.0 * std::f64::consts::PI) / 3.0).cos() + shift,
        ]
    } else {
        // One real root (Cardano).
        let sqrt_disc = (q * q / 4.0 + p * p * p / 27.0).sqrt();
        let u = (-q / 2.0 + sqrt_disc).cbrt();
        let v = (-q / 2.0 - sqrt_disc).cbrt();
        vec![u + v + shift]
    }
}

// ── Normalization ──────────────────────────────────────────────────────────

/// Centroid and scale such that the mean distance from the centroid is √2.
fn normalization_params(points: &[[f64; 2]]) -> (f64, f64, f64) {
    let n = points.len() as f64;
    let mean_x: f64 = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let mean_y: f64 = points.iter().map(|p| p[1]).sum::<f64>() / n;

    let mean_dist: f64 = points
        .iter()
        .map(|p| ((p[0] - mean_x).powi(2) + (p[1] - mean_y).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    let scale = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    (mean_x, mean_y, scale)
}

/// Map conic coefficients fitted in normalized coordinates
/// x' = s(x − mx), y' = s(y − my) back to the original frame.
fn denormalize_conic(c: &Vector6<f64>, mx: f64, my: f64, s: f64) -> [f64; 6] {
    let [a_, b_, c_, d_, e_, f_] = [c[0], c[1], c[2], c[3], c[4], c[5]];
    let s2 = s * s;

    let a = a_ * s2;
    let b = b_ * s2;
    let c = c_ * s2;
    let d = -2.0 * a_ * s2 * mx - b_ * s2 * my + d_ * s;
    let e = -b_ * s2 * mx - 2.0 * c_ * s2 * my + e_ * s;
    let f =
        a_ * s2 * mx * mx + b_ * s2 * mx * my + c_ * s2 * my * my - d_ * s * mx - e_ * s * my + f_;

    [a, b, c, d, e, f]
}

// ── Tests ──────────────────────────────────────────────────────────────────
