pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Resolved transform of one element, in the element's parent space.
///
/// Rotation is expressed in radians and turns counter-clockwise on screen (y grows
/// downward), scale and rotation pivot around `(origin_x, origin_y)`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform2D {
    /// Horizontal translation.
    pub x: f64,
    /// Vertical translation.
    pub y: f64,
    /// Horizontal scale factor.
    pub scale_x: f64,
    /// Vertical scale factor.
    pub scale_y: f64,
    /// Pivot x in local space.
    pub origin_x: f64,
    /// Pivot y in local space.
    pub origin_y: f64,
    /// Rotation in radians.
    pub rotation: f64,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            origin_x: 0.0,
            origin_y: 0.0,
            rotation: 0.0,
        }
    }
}

impl Transform2D {
    /// Convert into an affine matrix mapping local coordinates to parent coordinates.
    pub fn to_affine(self) -> Affine {
        let origin = Vec2::new(self.origin_x, self.origin_y);
        let t_translate = Affine::translate((self.x, self.y));
        let t_origin = Affine::translate(origin);
        let t_unorigin = Affine::translate(-origin);
        let t_rotate = Affine::rotate(-self.rotation);
        let t_scale = Affine::scale_non_uniform(self.scale_x, self.scale_y);

        // Canonical order:
        // T(translate) * T(origin) * R(-rotation) * S(scale) * T(-origin)
        t_translate * t_origin * t_rotate * t_scale * t_unorigin
    }
}

/// Returns `true` when `v` is a finite number usable as an animation endpoint.
pub fn is_animatable_number(v: f64) -> bool {
    v.is_finite()
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
