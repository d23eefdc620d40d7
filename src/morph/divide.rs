use serde::{Deserialize, Serialize};

use crate::{foundation::core::Point, morph::geometry::Outline};

/// How one outline is turned into several morph pieces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DivideShape {
    /// Contiguous arc-length partitions of the outline.
    #[default]
    Split,
    /// Every piece is the whole outline, drawn at reduced opacity.
    Clone,
}

/// One piece produced by [`divide`].
#[derive(Clone, Debug, PartialEq)]
pub struct Piece {
    pub points: Vec<Point>,
    /// Multiplier applied to the source opacity.
    pub opacity: Option<f64>,
}

/// Opacity that `count` stacked copies need so they composite to `opacity`.
pub fn clone_piece_opacity(opacity: f64, count: usize) -> f64 {
    if count <= 1 {
        return opacity;
    }
    1.0 - (1.0 - opacity.clamp(0.0, 1.0)).powf(1.0 / count as f64)
}

fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::ZERO;
    }
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let n = points.len() as f64;
    Point::new(sx / n, sy / n)
}

/// Divide `outline` into `count` pieces of `samples` points each.
///
/// Split pieces of a closed outline are fans: the outline centroid followed by one arc of
/// the boundary. Degenerate outlines yield zero-length pieces.
pub fn divide(
    outline: &Outline,
    count: usize,
    samples: usize,
    strategy: DivideShape,
    opacity: f64,
) -> Vec<Piece> {
    match strategy {
        DivideShape::Clone => {
            let points = outline.resample(samples);
            let opacity = clone_piece_opacity(opacity, count);
            (0..count)
                .map(|_| Piece {
                    points: points.clone(),
                    opacity: Some(opacity),
                })
                .collect()
        }
        DivideShape::Split => {
            let len = outline.length();
            let step = len / count.max(1) as f64;
            let center = centroid(&outline.points);
            (0..count)
                .map(|i| {
                    let (start, end) = (step * i as f64, step * (i + 1) as f64);
                    let points = if outline.closed && samples > 1 {
                        std::iter::once(center)
                            .chain(outline.sample(start, end, samples - 1))
                            .collect()
                    } else {
                        outline.sample(start, end, samples)
                    };
                    Piece {
                        points,
                        opacity: None,
                    }
                })
                .collect()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/morph/divide.rs"]
mod tests;
