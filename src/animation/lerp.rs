use std::sync::Arc;

use crate::{
    element::{props::ElementProps, value::PropMap, value::PropValue},
    foundation::core::{Transform2D, Vec2},
};

pub trait Lerp: Sized {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

impl Lerp for Transform2D {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            x: f64::lerp(&a.x, &b.x, t),
            y: f64::lerp(&a.y, &b.y, t),
            scale_x: f64::lerp(&a.scale_x, &b.scale_x, t),
            scale_y: f64::lerp(&a.scale_y, &b.scale_y, t),
            origin_x: f64::lerp(&a.origin_x, &b.origin_x, t),
            origin_y: f64::lerp(&a.origin_y, &b.origin_y, t),
            rotation: f64::lerp(&a.rotation, &b.rotation, t),
        }
    }
}

impl Lerp for PropValue {
    // Values without a numeric interpolation hold the start value and switch at the end.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        match (a, b) {
            (PropValue::Number(x), PropValue::Number(y)) if x.is_finite() && y.is_finite() => {
                PropValue::Number(f64::lerp(x, y, t))
            }
            (PropValue::Array(x), PropValue::Array(y)) if x.len() == y.len() => {
                if t >= 1.0 {
                    return b.clone();
                }
                let out: Vec<f64> = x
                    .iter()
                    .zip(y.iter())
                    .map(|(p, q)| f64::lerp(p, q, t))
                    .collect();
                PropValue::Array(Arc::new(out))
            }
            _ if t >= 1.0 => b.clone(),
            _ => a.clone(),
        }
    }
}

fn lerp_map(a: &PropMap, b: &PropMap, t: f64) -> PropMap {
    b.iter()
        .map(|(k, bv)| {
            let v = match a.get(k) {
                Some(av) => PropValue::lerp(av, bv, t),
                None => bv.clone(),
            };
            (k.clone(), v)
        })
        .collect()
}

impl Lerp for ElementProps {
    /// Interpolates every key of `b`; keys missing from `a` take `b`'s value.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        ElementProps {
            transform: b
                .transform
                .iter()
                .map(|(k, bv)| {
                    let v = a.transform.get(k).map_or(*bv, |av| f64::lerp(av, bv, t));
                    (*k, v)
                })
                .collect(),
            shape: lerp_map(&a.shape, &b.shape, t),
            style: lerp_map(&a.style, &b.style, t),
            extra: lerp_map(&a.extra, &b.extra, t),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/lerp.rs"]
mod tests;
