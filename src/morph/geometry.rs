use kurbo::{CubicBez, Ellipse, ParamCurve, PathEl, QuadBez, RoundedRect, Shape};

use crate::{
    element::{option::ElementKind, value::PropMap},
    foundation::core::{Affine, BezPath, Point, Rect},
};

const CURVE_TOLERANCE: f64 = 0.1;
const CURVE_STEPS: usize = 8;

fn num(shape: &PropMap, key: &str) -> f64 {
    shape
        .get(key)
        .and_then(|v| v.as_number())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn flat_points(shape: &PropMap, key: &str) -> Vec<Point> {
    shape
        .get(key)
        .and_then(|v| v.as_array())
        .map(from_flat)
        .unwrap_or_default()
}

fn polyline(points: &[Point], close: bool) -> BezPath {
    let mut path = BezPath::new();
    for (i, p) in points.iter().enumerate() {
        if i == 0 {
            path.move_to(*p);
        } else {
            path.line_to(*p);
        }
    }
    if close && !points.is_empty() {
        path.close_path();
    }
    path
}

/// Local-space outline of a geometric element, or `None` for kinds without one (or an
/// unparsable path string).
pub fn element_path(kind: ElementKind, shape: &PropMap) -> Option<BezPath> {
    let path = match kind {
        ElementKind::Rect => {
            let x = num(shape, "x");
            let y = num(shape, "y");
            let rect = Rect::new(x, y, x + num(shape, "width"), y + num(shape, "height"));
            let r = num(shape, "r");
            if r > 0.0 {
                RoundedRect::from_rect(rect, r).to_path(CURVE_TOLERANCE)
            } else {
                rect.to_path(CURVE_TOLERANCE)
            }
        }
        ElementKind::Circle => kurbo::Circle::new(
            (num(shape, "cx"), num(shape, "cy")),
            num(shape, "r").abs(),
        )
        .to_path(CURVE_TOLERANCE),
        ElementKind::Ellipse => Ellipse::new(
            (num(shape, "cx"), num(shape, "cy")),
            (num(shape, "rx").abs(), num(shape, "ry").abs()),
            0.0,
        )
        .to_path(CURVE_TOLERANCE),
        ElementKind::Sector => {
            let start = num(shape, "startAngle");
            let end = shape
                .get("endAngle")
                .and_then(|v| v.as_number())
                .unwrap_or(std::f64::consts::TAU);
            kurbo::Circle::new((num(shape, "cx"), num(shape, "cy")), num(shape, "r").abs())
                .segment(num(shape, "r0").abs(), start, end - start)
                .to_path(CURVE_TOLERANCE)
        }
        ElementKind::Ring => {
            kurbo::Circle::new((num(shape, "cx"), num(shape, "cy")), num(shape, "r").abs())
                .segment(num(shape, "r0").abs(), 0.0, std::f64::consts::TAU)
                .to_path(CURVE_TOLERANCE)
        }
        ElementKind::Polygon => polyline(&flat_points(shape, "points"), true),
        ElementKind::Polyline => polyline(&flat_points(shape, "points"), false),
        ElementKind::Line => polyline(
            &[
                Point::new(num(shape, "x1"), num(shape, "y1")),
                Point::new(num(shape, "x2"), num(shape, "y2")),
            ],
            false,
        ),
        ElementKind::BezierCurve => {
            let p0 = Point::new(num(shape, "x1"), num(shape, "y1"));
            let p3 = Point::new(num(shape, "x2"), num(shape, "y2"));
            let c1 = Point::new(num(shape, "cpx1"), num(shape, "cpy1"));
            let mut path = BezPath::new();
            path.move_to(p0);
            if shape.contains_key("cpx2") {
                path.curve_to(c1, Point::new(num(shape, "cpx2"), num(shape, "cpy2")), p3);
            } else {
                path.quad_to(c1, p3);
            }
            path
        }
        ElementKind::Path => {
            let d = shape
                .get("pathData")
                .or_else(|| shape.get("d"))
                .and_then(|v| v.as_text())?;
            BezPath::from_svg(d.trim()).ok()?
        }
        ElementKind::Image | ElementKind::Text | ElementKind::Group => return None,
    };
    Some(path)
}

/// Flattened outline: a polyline, closed or open.
#[derive(Clone, Debug, PartialEq)]
pub struct Outline {
    pub points: Vec<Point>,
    pub closed: bool,
}

impl Outline {
    /// Flatten every subpath of `path` into one point run.
    pub fn from_path(path: &BezPath) -> Self {
        let mut points = Vec::new();
        let mut closed = false;
        let mut last = Point::ZERO;
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) | PathEl::LineTo(p) => {
                    points.push(p);
                    last = p;
                }
                PathEl::QuadTo(p1, p2) => {
                    let q = QuadBez::new(last, p1, p2);
                    points.extend((1..=CURVE_STEPS).map(|i| q.eval(i as f64 / CURVE_STEPS as f64)));
                    last = p2;
                }
                PathEl::CurveTo(p1, p2, p3) => {
                    let c = CubicBez::new(last, p1, p2, p3);
                    points.extend((1..=CURVE_STEPS).map(|i| c.eval(i as f64 / CURVE_STEPS as f64)));
                    last = p3;
                }
                PathEl::ClosePath => closed = true,
            }
        }
        if closed && points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Self { points, closed }
    }

    pub fn transformed(&self, affine: Affine) -> Self {
        Self {
            points: self.points.iter().map(|p| affine * *p).collect(),
            closed: self.closed,
        }
    }

    fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let closing = if self.closed && self.points.len() > 1 {
            self.points.last().copied().zip(self.points.first().copied())
        } else {
            None
        };
        self.points
            .windows(2)
            .map(|w| (w[0], w[1]))
            .chain(closing)
    }

    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| a.distance(b)).sum()
    }

    /// Point at arc length `s` from the start, clamped to the outline.
    pub fn point_at(&self, s: f64) -> Point {
        let Some(first) = self.points.first().copied() else {
            return Point::ZERO;
        };
        let mut remaining = s.max(0.0);
        let mut end = first;
        for (a, b) in self.segments() {
            let len = a.distance(b);
            if remaining <= len && len > 0.0 {
                return a.lerp(b, remaining / len);
            }
            remaining -= len;
            end = b;
        }
        end
    }

    /// `count` points evenly spaced by arc length between `start` and `end`, inclusive.
    pub fn sample(&self, start: f64, end: f64, count: usize) -> Vec<Point> {
        match count {
            0 => Vec::new(),
            1 => vec![self.point_at(start)],
            _ => (0..count)
                .map(|i| self.point_at(start + (end - start) * i as f64 / (count - 1) as f64))
                .collect(),
        }
    }

    /// `count` points evenly spaced around the whole outline.
    pub fn resample(&self, count: usize) -> Vec<Point> {
        let len = self.length();
        if !self.closed {
            return self.sample(0.0, len, count);
        }
        (0..count)
            .map(|i| self.point_at(len * i as f64 / count.max(1) as f64))
            .collect()
    }
}

/// Rotate `points` (a closed ring) so that it travels least from `reference`.
pub fn align_closed(reference: &[Point], points: &mut [Point]) {
    let n = points.len();
    if n < 2 || reference.len() != n {
        return;
    }
    let cost = |offset: usize| -> f64 {
        reference
            .iter()
            .enumerate()
            .map(|(i, r)| r.distance_squared(points[(i + offset) % n]))
            .sum()
    };
    let best = (0..n)
        .min_by(|a, b| cost(*a).total_cmp(&cost(*b)))
        .unwrap_or(0);
    points.rotate_left(best);
}

pub fn to_flat(points: &[Point]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}

pub fn from_flat(values: &[f64]) -> Vec<Point> {
    values
        .chunks_exact(2)
        .map(|c| Point::new(c[0], c[1]))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/morph/geometry.rs"]
mod tests;
