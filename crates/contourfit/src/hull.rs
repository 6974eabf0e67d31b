//! Strictly convex hull of a 2-D point sequence.
//!
//! Andrew's monotone chain: lexicographic sort (x, then y), then lower and
//! upper chains built with strict turn tests. Collinear points are excluded,
//! so no three consecutive hull vertices are ever collinear and every hull
//! vertex is an extreme point of the input.
//!
//! Integer input is evaluated with exact 64-bit cross products (exact for
//! coordinate magnitudes up to 2³⁰, far beyond typical image dimensions);
//! floating input is evaluated in `f64` regardless of storage precision, so
//! an integer point set and its floating promotion produce identical hulls.

use crate::pointset::PointSeq;

/// Traversal orientation of the hull polygon.
///
/// The orientation is defined in the mathematical frame (x right, y up).
/// Image contours live in a y-down frame, where the on-screen sense is the
/// mirror image: a `CounterClockwise` hull appears clockwise on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Clockwise,
    CounterClockwise,
}

/// Convex hull as an ordered list of indices into the source sequence.
///
/// Indices always reference the original (unsorted) input order. When the
/// input is the border of a simple polygon, the indices are monotonic in
/// contour order, with at most one wrap — the precondition of the convexity
/// defects analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hull {
    pub indices: Vec<usize>,
}

impl Hull {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Materialize the hull vertices from the source sequence (point form).
    pub fn points(&self, seq: &PointSeq) -> Vec<[f64; 2]> {
        self.indices.iter().map(|&i| seq.get_f64(i)).collect()
    }
}

/// Compute the convex hull of `points` with the requested orientation.
///
/// Degenerate conventions (consumed as-is by the enclosing-shape finders):
/// - 0 points → empty hull;
/// - 1 point, or all points identical → one vertex (first occurrence);
/// - 2 distinct points, or a fully colinear set → the two lexicographic
///   extremes, smallest first.
pub fn convex_hull(points: &PointSeq, orientation: Orientation) -> Hull {
    let mut indices = match points {
        PointSeq::I32(pts) => chain_indices(pts, |o, a, b| {
            let v = (a[0] as i64 - o[0] as i64) * (b[1] as i64 - o[1] as i64)
                - (a[1] as i64 - o[1] as i64) * (b[0] as i64 - o[0] as i64);
            sign_i64(v)
        }),
        PointSeq::F32(pts) => chain_indices(pts, |o, a, b| {
            let v = (a[0] as f64 - o[0] as f64) * (b[1] as f64 - o[1] as f64)
                - (a[1] as f64 - o[1] as f64) * (b[0] as f64 - o[0] as f64);
            sign_f64(v)
        }),
    };

    if indices.len() < 3 {
        tracing::debug!(n = points.len(), "degenerate hull");
    }

    // The chain produces counter-clockwise order; reversal keeps the
    // starting vertex while flipping the traversal sense.
    if orientation == Orientation::Clockwise && indices.len() > 2 {
        indices[1..].reverse();
    }

    Hull { indices }
}

#[inline]
fn sign_i64(v: i64) -> i32 {
    match v.cmp(&0) {
        std::cmp::Ordering::Greater => 1,
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
    }
}

#[inline]
fn sign_f64(v: f64) -> i32 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Monotone chain over an arbitrary coordinate type.
///
/// `cross_sign(o, a, b)` is the sign of the z-component of (a−o)×(b−o);
/// a strictly positive sign is a counter-clockwise turn in the y-up frame.
/// Returns indices into `pts` in counter-clockwise order, lexicographically
/// smallest vertex first.
fn chain_indices<T>(pts: &[T], cross_sign: impl Fn(&T, &T, &T) -> i32) -> Vec<usize>
where
    T: PartialOrd + PartialEq,
{
    let n = pts.len();
    if n == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| {
        pts[i]
            .partial_cmp(&pts[j])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(i.cmp(&j))
    });
    // Exact duplicates collapse to their earliest occurrence.
    order.dedup_by(|a, b| pts[*a] == pts[*b]);

    if order.len() == 1 {
        return order;
    }
    if order.len() == 2 {
        return order;
    }

    let mut lower: Vec<usize> = Vec::with_capacity(order.len());
    for &i in &order {
        while lower.len() >= 2
            && cross_sign(
                &pts[lower[lower.len() - 2]],
                &pts[lower[lower.len() - 1]],
                &pts[i],
            ) <= 0
        {
            lower.pop();
        }
        lower.push(i);
    }

    let mut upper: Vec<usize> = Vec::with_capacity(order.len());
    for &i in order.iter().rev() {
        while upper.len() >= 2
            && cross_sign(
                &pts[upper[upper.len() - 2]],
                &pts[upper[upper.len() - 1]],
                &pts[i],
            ) <= 0
        {
            upper.pop();
        }
        upper.push(i);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

// ── Tests ──────────────────────────────────────────────────────────────────
