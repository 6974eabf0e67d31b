//! Minimum-area enclosing rectangle.
//!
//! Rotating calipers over the convex hull: the minimal rectangle has one
//! side aligned with a hull edge, so it suffices to evaluate the bounding
//! box of the hull in each edge-aligned frame and keep the smallest.

use serde::{Deserialize, Serialize};

use crate::hull::{convex_hull, Orientation};
use crate::pointset::PointSeq;
use crate::GeomError;

/// A rotated rectangle: center, side lengths, and rotation angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotatedRect {
    /// Center of mass of the corners.
    pub center: [f32; 2],
    /// Side lengths: `size[0]` along the `angle` axis, `size[1]` across it.
    pub size: [f32; 2],
    /// Rotation of the `size[0]` axis from +x, in degrees, in [-90, 90).
    pub angle: f32,
}

impl RotatedRect {
    /// The 4 corners, in counter-clockwise order starting from
    /// `center - u*size[0]/2 - v*size[1]/2`.
    pub fn corners(&self) -> [[f32; 2]; 4] {
        let a = (self.angle as f64).to_radians();
        let (sin, cos) = a.sin_cos();
        let u = [cos, sin];
        let v = [-sin, cos];
        let hw = self.size[0] as f64 * 0.5;
        let hh = self.size[1] as f64 * 0.5;
        let c = [self.center[0] as f64, self.center[1] as f64];
        let corner = |su: f64, sv: f64| {
            [
                (c[0] + su * hw * u[0] + sv * hh * v[0]) as f32,
                (c[1] + su * hw * u[1] + sv * hh * v[1]) as f32,
            ]
        };
        [
            corner(-1.0, -1.0),
            corner(1.0, -1.0),
            corner(1.0, 1.0),
            corner(-1.0, 1.0),
        ]
    }
}

/// Find the smallest-area rotated rectangle enclosing `points`.
///
/// Degenerate inputs produce valid degenerate rectangles: a single point
/// (or all-identical points) gives a zero-size rectangle at that point, a
/// colinear set gives a zero-width rectangle along the segment. Only an
/// empty sequence is an error.
pub fn min_area_rect(points: &PointSeq) -> Result<RotatedRect, GeomError> {
    if points.is_empty() {
        return Err(GeomError::EmptyInput { needed: 1, got: 0 });
    }

    let hull = convex_hull(points, Orientation::CounterClockwise);
    let verts = hull.points(points);

    match verts.len() {
        1 => Ok(RotatedRect {
            center: [verts[0][0] as f32, verts[0][1] as f32],
            size: [0.0, 0.0],
            angle: 0.0,
        }),
        2 => {
            let (a, b) = (verts[0], verts[1]);
            let dx = b[0] - a[0];
            let dy = b[1] - a[1];
            let len = (dx * dx + dy * dy).sqrt();
            Ok(RotatedRect {
                center: [((a[0] + b[0]) * 0.5) as f32, ((a[1] + b[1]) * 0.5) as f32],
                size: [len as f32, 0.0],
                angle: normalize_deg(dy.atan2(dx).to_degrees()) as f32,
            })
        }
        _ => Ok(calipers(&verts)),
    }
}

/// Evaluate every edge-aligned frame and keep the minimum-area box.
fn calipers(verts: &[[f64; 2]]) -> RotatedRect {
    let m = verts.len();
    let mut best_area = f64::INFINITY;
    let mut best = RotatedRect {
        center: [0.0, 0.0],
        size: [0.0, 0.0],
        angle: 0.0,
    };

    for i in 0..m {
        let a = verts[i];
        let b = verts[(i + 1) % m];
        let ex = b[0] - a[0];
        let ey = b[1] - a[1];
        let len = (ex * ex + ey * ey).sqrt();
        if len <= 0.0 {
            continue;
        }
        let u = [ex / len, ey / len];
        let v = [-u[1], u[0]];

        let mut s_min = f64::INFINITY;
        let mut s_max = f64::NEG_INFINITY;
        let mut t_min = f64::INFINITY;
        let mut t_max = f64::NEG_INFINITY;
        for p in verts {
            let rx = p[0] - a[0];
            let ry = p[1] - a[1];
            let s = rx * u[0] + ry * u[1];
            let t = rx * v[0] + ry * v[1];
            s_min = s_min.min(s);
            s_max = s_max.max(s);
            t_min = t_min.min(t);
            t_max = t_max.max(t);
        }

        let w = s_max - s_min;
        let h = t_max - t_min;
        let area = w * h;
        if area < best_area {
            best_area = area;
            let sc = (s_min + s_max) * 0.5;
            let tc = (t_min + t_max) * 0.5;
            let cx = a[0] + sc * u[0] + tc * v[0];
            let cy = a[1] + sc * u[1] + tc * v[1];
            let mut angle = u[1].atan2(u[0]).to_degrees();
            angle = normalize_deg(angle);
            best = RotatedRect {
                center: [cx as f32, cy as f32],
                size: [w as f32, h as f32],
                angle: angle as f32,
            };
        }
    }

    best
}

/// Reduce an angle to [-90, 90) by half-turns; the axis is undirected, so
/// the size components are unaffected.
fn normalize_deg(mut angle: f64) -> f64 {
    while angle >= 90.0 {
        angle -= 180.0;
    }
    while angle < -90.0 {
        angle += 180.0;
    }
    angle
}

// ── Tests ──────────────────────────────────────────────────────────────────
