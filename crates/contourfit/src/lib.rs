//! contourfit — shape descriptors for 2-D contour point sets.
//!
//! Pure geometry over an immutable point sequence, typically a traced image
//! contour. The modules are:
//!
//! 1. **Pointset** – canonical container for integer/floating 2-D points.
//! 2. **Hull** – strictly convex hull (monotone chain), CW/CCW, index or point form.
//! 3. **Defects** – concavity analysis of a contour against its hull.
//! 4. **Rect** – minimum-area enclosing rectangle (rotating calipers).
//! 5. **Circle** – minimum enclosing circle (incremental Welzl).
//! 6. **Triangle** – minimum-area enclosing triangle (rotating sweep over hull edges).
//! 7. **Linefit** – robust line fitting (IRLS over six distance kernels).
//! 8. **Conic** – direct least-squares ellipse fitting.
//! 9. **Polytest** – signed point-to-polygon distance (the measurement
//!    primitive behind the containment checks).
//!
//! Every operation is a synchronous pure function of its input: no shared
//! state, no caching, no I/O. Results are freshly constructed value types;
//! the input sequence is never mutated.

pub mod circle;
pub mod conic;
pub mod defects;
pub mod hull;
pub mod linefit;
pub mod pointset;
pub mod polytest;
pub mod rect;
pub mod triangle;

pub use circle::{min_enclosing_circle, Circle};
pub use conic::fit_ellipse;
pub use defects::{convexity_defects, ConvexityDefect};
pub use hull::{convex_hull, Hull, Orientation};
pub use linefit::{fit_line, DistanceKind, FittedLine};
pub use pointset::PointSeq;
pub use rect::{min_area_rect, RotatedRect};
pub use triangle::{min_enclosing_triangle, Triangle};

// ── Error type ─────────────────────────────────────────────────────────────

/// Errors raised by the shape-descriptor operations.
#[derive(Debug, Clone, PartialEq)]
pub enum GeomError {
    /// Point container layout is not a recognized 2-channel arrangement.
    InvalidShape {
        rows: usize,
        cols: usize,
        channels: usize,
    },
    /// Too few points for the requested operation.
    EmptyInput { needed: usize, got: usize },
    /// Hull indices are not monotonic with respect to the contour, which is
    /// the signature of a self-intersecting contour or a hull computed over
    /// a different point sequence.
    InvalidHull(String),
    /// The fit has no meaningful result on this input (ill-conditioned or
    /// fully degenerate data).
    DegenerateFit(String),
}

impl std::fmt::Display for GeomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidShape {
                rows,
                cols,
                channels,
            } => write!(
                f,
                "invalid point container shape: {}x{} with {} channel(s)",
                rows, cols, channels
            ),
            Self::EmptyInput { needed, got } => {
                write!(f, "too few points: need {}, got {}", needed, got)
            }
            Self::InvalidHull(msg) => write!(f, "invalid hull: {}", msg),
            Self::DegenerateFit(msg) => write!(f, "degenerate fit: {}", msg),
        }
    }
}

impl std::error::Error for GeomError {}
