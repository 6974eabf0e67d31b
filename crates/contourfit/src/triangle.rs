//! Minimum-area enclosing triangle.
//!
//! Rotating sweep over the convex hull: the minimal enclosing triangle has
//! one side flush with a hull edge, so each hull edge is tried as the base
//! side C. For a fixed base line the optimal triangle is pinned by a second
//! property: the midpoints of the other two sides touch the hull, and both
//! midpoints sit at exactly half the apex height. Sweeping the half-height
//! cut line through the hull therefore enumerates every critical triangle:
//! between vertex heights both free sides are flush with the cut edges and
//! the apex is their intersection; at a vertex height a side pivots through
//! its contact vertex. The smallest valid candidate over all base edges is
//! the minimum enclosing triangle.

use serde::{Deserialize, Serialize};

use crate::hull::{convex_hull, Orientation};
use crate::pointset::PointSeq;
use crate::GeomError;

/// A triangle given by its vertices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub vertices: [[f32; 2]; 3],
}

impl Triangle {
    pub fn area(&self) -> f32 {
        let [a, b, c] = self.vertices;
        0.5 * ((b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])).abs()
    }
}

/// Find the smallest-area triangle enclosing the convex hull of `points`.
///
/// Degenerate inputs never fail: a single point yields a point triangle, a
/// colinear set yields a zero-area triangle covering the segment. Only an
/// empty sequence is an error.
pub fn min_enclosing_triangle(points: &PointSeq) -> Result<Triangle, GeomError> {
    if points.is_empty() {
        return Err(GeomError::EmptyInput { needed: 1, got: 0 });
    }

    let hull = convex_hull(points, Orientation::CounterClockwise);
    let verts = hull.points(points);

    let tri64 = match verts.len() {
        1 => [verts[0], verts[0], verts[0]],
        2 => [verts[0], verts[1], verts[1]],
        3 => [verts[0], verts[1], verts[2]],
        _ => sweep(&verts).unwrap_or_else(|| {
            // Cannot be reached for a well-formed strict hull; kept so a
            // numerical corner case degrades instead of panicking.
            tracing::warn!(n = verts.len(), "triangle sweep found no candidate");
            bbox_fallback(&verts)
        }),
    };

    Ok(Triangle {
        vertices: tri64.map(|p| [p[0] as f32, p[1] as f32]),
    })
}

/// Right triangle with doubled bounding-box legs: always encloses the
/// hull, if suboptimally.
fn bbox_fallback(verts: &[[f64; 2]]) -> [[f64; 2]; 3] {
    let mut min = verts[0];
    let mut max = verts[0];
    for p in verts {
        min = [min[0].min(p[0]), min[1].min(p[1])];
        max = [max[0].max(p[0]), max[1].max(p[1])];
    }
    let w = max[0] - min[0];
    let h = max[1] - min[1];
    [
        min,
        [min[0] + 2.0 * w, min[1]],
        [min[0], min[1] + 2.0 * h],
    ]
}

/// One candidate triangle in the edge-aligned frame.
struct Candidate {
    area: f64,
    q: [f64; 2],
    r: [f64; 2],
    apex: [f64; 2],
}

/// Sweep every hull edge as the flush base side; `verts` is a strict CCW
/// hull with at least 4 vertices.
fn sweep(verts: &[[f64; 2]]) -> Option<[[f64; 2]; 3]> {
    let h = verts.len();
    let mut best: Option<(f64, [[f64; 2]; 3])> = None;

    for c in 0..h {
        let a0 = verts[c];
        let a1 = verts[(c + 1) % h];
        let ex = a1[0] - a0[0];
        let ey = a1[1] - a0[1];
        let len = (ex * ex + ey * ey).sqrt();
        if len <= 0.0 {
            continue;
        }
        let u = [ex / len, ey / len];
        let v = [-u[1], u[0]];

        // Hull in the edge frame, starting at a1 and walking CCW back to a0:
        // heights rise along the right chain, fall along the left chain.
        let q: Vec<[f64; 2]> = (0..h)
            .map(|k| {
                let p = verts[(c + 1 + k) % h];
                let rx = p[0] - a0[0];
                let ry = p[1] - a0[1];
                [rx * u[0] + ry * u[1], rx * v[0] + ry * v[1]]
            })
            .collect();

        for cand in flush_candidates(&q) {
            if !cand.area.is_finite() || cand.area < 0.0 {
                continue;
            }
            if !encloses(&q, cand.q, cand.r, cand.apex) {
                continue;
            }
            if best.as_ref().is_none_or(|(a, _)| cand.area < *a) {
                let to_world = |p: [f64; 2]| {
                    [
                        a0[0] + p[0] * u[0] + p[1] * v[0],
                        a0[1] + p[0] * u[1] + p[1] * v[1],
                    ]
                };
                best = Some((
                    cand.area,
                    [to_world(cand.q), to_world(cand.r), to_world(cand.apex)],
                ));
            }
        }
    }

    best.map(|(_, tri)| tri)
}

/// All critical triangles for a fixed base line (the s-axis of `q`).
fn flush_candidates(q: &[[f64; 2]]) -> Vec<Candidate> {
    let h = q.len();
    let mut out = Vec::new();

    let t_max = q.iter().fold(0.0f64, |m, p| m.max(p[1]));
    if t_max <= 0.0 {
        return out;
    }
    let scale = t_max + q.iter().fold(0.0f64, |m, p| m.max(p[0].abs()));
    let eps = 1e-9 * scale;

    // Chain split: q[0] and q[h-1] sit on the base; the maximum height is
    // reached at k_top1 (and k_top1 + 1 when the top edge is parallel to
    // the base).
    let k_top1 = (0..h)
        .filter(|&k| q[k][1] >= t_max - eps)
        .min()
        .expect("t_max attained");
    let k_top2 = (0..h)
        .filter(|&k| q[k][1] >= t_max - eps)
        .max()
        .expect("t_max attained");

    let y_lo_bound = t_max * 0.5;

    // Heights of chain vertices inside the sweep band, descending.
    let mut breaks: Vec<f64> = q
        .iter()
        .map(|p| p[1])
        .filter(|&t| t >= y_lo_bound - eps && t <= t_max + eps)
        .collect();
    breaks.push(y_lo_bound);
    breaks.push(t_max);
    breaks.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    breaks.dedup_by(|a, b| (*a - *b).abs() <= eps);

    // Flush-flush candidates on each open interval between breakpoints.
    for w in breaks.windows(2) {
        let (y_hi, y_lo) = (w[0], w[1]);
        if y_hi - y_lo <= eps {
            continue;
        }
        let y_mid = 0.5 * (y_hi + y_lo);
        let (rk, lk) = match (
            edge_at(q, 0, k_top1, y_mid, false),
            edge_at(q, k_top2, h - 1, y_mid, true),
        ) {
            (Some(r), Some(l)) => (r, l),
            _ => continue,
        };
        let lb = (q[rk], q[rk + 1]);
        let la = (q[lk], q[lk + 1]);
        if let Some(apex) = line_intersection(la, lb) {
            let height = apex[1];
            if height * 0.5 >= y_lo - eps && height * 0.5 <= y_hi + eps {
                push_candidate(&mut out, line_at_zero(la), line_at_zero(lb), apex);
            }
        }
    }

    // Pivot candidates at each breakpoint that is a chain vertex height.
    for &y in &breaks {
        if y < y_lo_bound - eps {
            continue;
        }
        let height = 2.0 * y;
        let rv = (0..=k_top1).find(|&k| k > 0 && (q[k][1] - y).abs() <= eps);
        let lv = (k_top2..h).find(|&k| k < h - 1 && (q[k][1] - y).abs() <= eps);

        match (rv, lv) {
            (Some(kr), Some(kl)) => {
                if let Some(cand) = both_pivot(q, kr, kl, height, eps) {
                    out.push(cand);
                }
            }
            (Some(kr), None) => {
                if let Some(lk) = edge_at(q, k_top2, h - 1, y, true) {
                    let la = (q[lk], q[lk + 1]);
                    if let Some(apex) = point_at_height(la, height) {
                        if supports(q, kr, apex, true, eps) {
                            push_candidate(
                                &mut out,
                                line_at_zero(la),
                                reflect_base(q[kr], apex),
                                apex,
                            );
                        }
                    }
                }
            }
            (None, Some(kl)) => {
                if let Some(rk) = edge_at(q, 0, k_top1, y, false) {
                    let lb = (q[rk], q[rk + 1]);
                    if let Some(apex) = point_at_height(lb, height) {
                        if supports(q, kl, apex, false, eps) {
                            push_candidate(
                                &mut out,
                                reflect_base(q[kl], apex),
                                line_at_zero(lb),
                                apex,
                            );
                        }
                    }
                }
            }
            (None, None) => {}
        }
    }

    out
}

/// Both cut points are chain vertices at the same height: the free sides
/// pivot through their vertices and the base width is fixed, so the apex
/// abscissa is constrained only by the two support cones.
fn both_pivot(q: &[[f64; 2]], kr: usize, kl: usize, height: f64, eps: f64) -> Option<Candidate> {
    let h = q.len();
    let vr = q[kr];
    let vl = q[kl];

    let mut p_lo = f64::NEG_INFINITY;
    let mut p_hi = f64::INFINITY;
    // Side B runs base → apex with direction 2(apex − vr); the hull must
    // stay on its left. Side A direction is 2(apex − vl); hull on its right.
    for (kv, vv, left_of) in [(kr, vr, true), (kl, vl, false)] {
        for nk in [(kv + h - 1) % h, (kv + 1) % h] {
            let n = [q[nk][0] - vv[0], q[nk][1] - vv[1]];
            // cross((p − v_s, height − v_t), n) ⋛ 0, linear in p.
            let alpha = n[1];
            let beta = (height - vv[1]) * n[0];
            // left_of: alpha * (p - v_s) - beta >= -eps
            // !left_of: alpha * (p - v_s) - beta <= eps
            if alpha.abs() <= 1e-15 {
                let ok = if left_of { -beta >= -eps } else { -beta <= eps };
                if !ok {
                    return None;
                }
                continue;
            }
            let bound = vv[0] + beta / alpha;
            let lower = (alpha > 0.0) == left_of;
            if lower {
                p_lo = p_lo.max(bound - eps);
            } else {
                p_hi = p_hi.min(bound + eps);
            }
        }
    }
    if p_lo > p_hi {
        return None;
    }
    let natural = 0.5 * (vl[0] + vr[0]);
    let p = natural.max(p_lo).min(p_hi);

    let apex = [p, height];
    let q_base = reflect_base(vl, apex);
    let r_base = reflect_base(vr, apex);
    if r_base[0] <= q_base[0] {
        return None;
    }
    Some(Candidate {
        area: 0.5 * (r_base[0] - q_base[0]) * height,
        q: q_base,
        r: r_base,
        apex,
    })
}

/// Base point such that `v` is the midpoint between it and `apex`.
fn reflect_base(v: [f64; 2], apex: [f64; 2]) -> [f64; 2] {
    [2.0 * v[0] - apex[0], 2.0 * v[1] - apex[1]]
}

/// Does the line through chain vertex `q[kv]` toward `apex` support the
/// hull? `left_of` selects which closed side the hull must stay on.
fn supports(q: &[[f64; 2]], kv: usize, apex: [f64; 2], left_of: bool, eps: f64) -> bool {
    let h = q.len();
    let vv = q[kv];
    let d = [apex[0] - vv[0], apex[1] - vv[1]];
    for nk in [(kv + h - 1) % h, (kv + 1) % h] {
        let n = [q[nk][0] - vv[0], q[nk][1] - vv[1]];
        let cr = d[0] * n[1] - d[1] * n[0];
        let ok = if left_of { cr >= -eps } else { cr <= eps };
        if !ok {
            return false;
        }
    }
    true
}

/// The chain edge whose height range contains `y`. Right chain: indices
/// `lo..hi` ascending in t; left chain: descending.
fn edge_at(q: &[[f64; 2]], lo: usize, hi: usize, y: f64, descending: bool) -> Option<usize> {
    for k in lo..hi {
        let (t0, t1) = (q[k][1], q[k + 1][1]);
        let (t_min, t_max) = if descending { (t1, t0) } else { (t0, t1) };
        if t_min <= y && y <= t_max && t_max > t_min {
            return Some(k);
        }
    }
    None
}

/// Intersection of two lines, each given by two points.
fn line_intersection(a: ([f64; 2], [f64; 2]), b: ([f64; 2], [f64; 2])) -> Option<[f64; 2]> {
    let d1 = [a.1[0] - a.0[0], a.1[1] - a.0[1]];
    let d2 = [b.1[0] - b.0[0], b.1[1] - b.0[1]];
    let den = d1[0] * d2[1] - d1[1] * d2[0];
    if den.abs() <= 1e-14 * (d1[0].hypot(d1[1]) * d2[0].hypot(d2[1])) {
        return None;
    }
    let w = [b.0[0] - a.0[0], b.0[1] - a.0[1]];
    let s = (w[0] * d2[1] - w[1] * d2[0]) / den;
    Some([a.0[0] + s * d1[0], a.0[1] + s * d1[1]])
}

/// Point on the line `(e.0, e.1)` at height `t = 0`.
fn line_at_zero(e: ([f64; 2], [f64; 2])) -> [f64; 2] {
    point_at_height(e, 0.0).unwrap_or([f64::NAN, 0.0])
}

/// Point on the line at the given height, `None` for near-horizontal lines.
fn point_at_height(e: ([f64; 2], [f64; 2]), t: f64) -> Option<[f64; 2]> {
    let dt = e.1[1] - e.0[1];
    if dt.abs() <= 1e-14 * (1.0 + e.1[0].hypot(e.1[1])) {
        return None;
    }
    let s = (t - e.0[1]) / dt;
    Some([e.0[0] + s * (e.1[0] - e.0[0]), t])
}

fn push_candidate(out: &mut Vec<Candidate>, q_base: [f64; 2], r_base: [f64; 2], apex: [f64; 2]) {
    if !q_base[0].is_finite() || !r_base[0].is_finite() || r_base[0] <= q_base[0] {
        return;
    }
    out.push(Candidate {
        area: 0.5 * (r_base[0] - q_base[0]) * apex[1],
        q: q_base,
        r: r_base,
        apex,
    });
}

/// Containment guard in the edge frame: every hull point inside the
/// candidate triangle within a relative tolerance.
fn encloses(q: &[[f64; 2]], qb: [f64; 2], rb: [f64; 2], apex: [f64; 2]) -> bool {
    let tri = [qb, rb, apex];
    let scale = 1.0 + apex[1].abs() + (rb[0] - qb[0]).abs();
    // Cross products scale with length², so the slack does too.
    let eps = 1e-7 * scale * scale;
    for p in q {
        for i in 0..3 {
            let a = tri[i];
            let b = tri[(i + 1) % 3];
            let cr = (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0]);
            if cr < -eps {
                return false;
            }
        }
    }
    true
}

// ── Tests ──────────────────────────────────────────────────────────────────
