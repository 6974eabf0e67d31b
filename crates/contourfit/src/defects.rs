//! Convexity defects of a contour relative to its convex hull.
//!
//! A defect is a run of contour points that dips inside the hull between two
//! consecutive hull vertices. Each defect reports the bounding hull vertices,
//! the deepest contour point of the run, and its distance to the hull edge.
//!
//! The hull must be the index-form hull of this exact contour. For a simple
//! (non-self-intersecting) contour those indices are monotonic in contour
//! order with at most one cyclic wrap; a non-monotonic sequence is rejected
//! with [`GeomError::InvalidHull`] rather than silently producing defects of
//! a mismatched polygon.

use serde::{Deserialize, Serialize};

use crate::pointset::PointSeq;
use crate::GeomError;

/// Fixed-point scale of [`ConvexityDefect::depth_fp`] (8.8 convention).
const DEPTH_SCALE: f64 = 256.0;

/// One concavity of a contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvexityDefect {
    /// Contour index of the hull vertex starting the defect.
    pub start: usize,
    /// Contour index of the hull vertex ending the defect.
    pub end: usize,
    /// Contour index of the deepest point of the run.
    pub farthest: usize,
    /// Depth of the deepest point in 8.8 fixed point (distance × 256).
    pub depth_fp: i32,
}

impl ConvexityDefect {
    /// Depth as a distance in coordinate units.
    pub fn depth(&self) -> f32 {
        self.depth_fp as f32 / DEPTH_SCALE as f32
    }
}

/// Find the convexity defects of `contour` against its hull `hull_indices`.
///
/// Defects are emitted in contour traversal order (ascending contour index);
/// the interior walk always runs in the ascending direction, so each defect
/// satisfies `start < end` and `start <= farthest <= end` whenever the
/// contour starts on a hull vertex, which is what contour tracers produce.
/// Runs with no interior points, or whose interior points all sit exactly on
/// the hull edge, are not defects. Contours of at most 3 points and hulls of
/// fewer than 3 vertices have no concavities and yield an empty list.
pub fn convexity_defects(
    contour: &PointSeq,
    hull_indices: &[usize],
) -> Result<Vec<ConvexityDefect>, GeomError> {
    let n = contour.len();
    let h = hull_indices.len();

    if let Some(&bad) = hull_indices.iter().find(|&&i| i >= n) {
        return Err(GeomError::InvalidHull(format!(
            "hull index {} out of range for contour of {} points",
            bad, n
        )));
    }
    if n <= 3 || h < 3 {
        return Ok(Vec::new());
    }

    // Direction of the hull relative to contour order: among the cyclic
    // consecutive pairs, a monotonic-with-one-wrap sequence has exactly one
    // descent (ascending hull) or exactly one ascent (descending hull).
    let mut ascents = 0usize;
    for i in 0..h {
        let a = hull_indices[i];
        let b = hull_indices[(i + 1) % h];
        if a == b {
            return Err(GeomError::InvalidHull(format!(
                "duplicate hull index {}",
                a
            )));
        }
        if a < b {
            ascents += 1;
        }
    }
    let ascending = match ascents {
        a if a == h - 1 => true,
        1 => false,
        _ => {
            tracing::warn!(ascents, hull_len = h, "non-monotonic hull indices");
            return Err(GeomError::InvalidHull(
                "hull indices are not monotonic; the contour may self-intersect".into(),
            ));
        }
    };

    // Walk every gap in ascending contour direction.
    let mut defects = Vec::new();
    for i in 0..h {
        let (start, end) = if ascending {
            (hull_indices[i], hull_indices[(i + 1) % h])
        } else {
            (hull_indices[(i + 1) % h], hull_indices[i])
        };

        let p0 = contour.get_f64(start);
        let p1 = contour.get_f64(end);
        let dx = p1[0] - p0[0];
        let dy = p1[1] - p0[1];
        let len = (dx * dx + dy * dy).sqrt();
        let scale = if len > 0.0 { 1.0 / len } else { 0.0 };

        let mut deepest = None;
        let mut depth = 0.0f64;
        let mut j = start;
        loop {
            j = if j + 1 >= n { 0 } else { j + 1 };
            if j == end {
                break;
            }
            let p = contour.get_f64(j);
            let dist = (-dy * (p[0] - p0[0]) + dx * (p[1] - p0[1])).abs() * scale;
            if dist > depth {
                depth = dist;
                deepest = Some(j);
            }
        }

        if let Some(farthest) = deepest {
            defects.push(ConvexityDefect {
                start,
                end,
                farthest,
                depth_fp: (depth * DEPTH_SCALE).round() as i32,
            });
        }
    }

    defects.sort_by_key(|d| d.start);
    Ok(defects)
}

// ── Tests ──────────────────────────────────────────────────────────────────
