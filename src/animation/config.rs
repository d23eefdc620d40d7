use std::rc::Rc;

use crate::animation::ease::Ease;

/// Lifecycle phase an animation belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnimationKind {
    Enter,
    Update,
    Leave,
}

/// Resolved timing for one animation, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnimationConfig {
    pub duration: f64,
    pub delay: f64,
    pub easing: Ease,
}

impl AnimationConfig {
    pub fn instant() -> Self {
        Self {
            duration: 0.0,
            delay: 0.0,
            easing: Ease::Linear,
        }
    }

    /// `true` when the config describes a real animation rather than a jump.
    pub fn is_animated(&self) -> bool {
        self.duration > 0.0
    }
}

/// Partial timing override. Used both for per-element `enterAnimation`/`updateAnimation`/
/// `leaveAnimation` options and for one-pass payloads triggered by a user action.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnimationOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub easing: Option<Ease>,
}

/// Externally supplied override for exactly one reconciliation pass.
pub type AnimationPayload = AnimationOverride;

/// Duration or delay value: a fixed number of milliseconds or a per-data-index function.
#[derive(Clone)]
pub enum Timing {
    Fixed(f64),
    PerIndex(Rc<dyn Fn(usize) -> f64>),
}

impl Timing {
    pub fn per_index(f: impl Fn(usize) -> f64 + 'static) -> Self {
        Self::PerIndex(Rc::new(f))
    }

    pub fn eval(&self, data_index: usize) -> f64 {
        match self {
            Self::Fixed(v) => *v,
            Self::PerIndex(f) => f(data_index),
        }
    }
}

impl From<f64> for Timing {
    fn from(v: f64) -> Self {
        Self::Fixed(v)
    }
}

impl std::fmt::Debug for Timing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(v) => write!(f, "Fixed({v})"),
            Self::PerIndex(_) => f.write_str("PerIndex(<fn>)"),
        }
    }
}

impl PartialEq for Timing {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Fixed(a), Self::Fixed(b)) => a == b,
            (Self::PerIndex(a), Self::PerIndex(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl serde::Serialize for Timing {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Fixed(v) => serializer.serialize_f64(*v),
            Self::PerIndex(_) => Err(serde::ser::Error::custom(
                "per-index timing functions cannot be serialized",
            )),
        }
    }
}

impl<'de> serde::Deserialize<'de> for Timing {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Self::Fixed)
    }
}

/// Series-level animation options.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimationOptions {
    pub animation: bool,
    /// Animation is turned off when the series holds more items than this.
    pub animation_threshold: usize,
    pub animation_duration: Timing,
    pub animation_easing: Ease,
    pub animation_delay: Timing,
    pub animation_duration_update: Timing,
    pub animation_easing_update: Ease,
    pub animation_delay_update: Timing,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            animation: true,
            animation_threshold: 2000,
            animation_duration: Timing::Fixed(1000.0),
            animation_easing: Ease::OutCubic,
            animation_delay: Timing::Fixed(0.0),
            animation_duration_update: Timing::Fixed(300.0),
            animation_easing_update: Ease::OutCubic,
            animation_delay_update: Timing::Fixed(0.0),
        }
    }
}

impl AnimationOptions {
    /// Options with animation switched off.
    pub fn disabled() -> Self {
        Self {
            animation: false,
            ..Self::default()
        }
    }
}

/// Anything that can answer animation timing questions for the elements it owns.
pub trait AnimatableModel {
    fn animation_options(&self) -> &AnimationOptions;

    /// Number of data items the model renders.
    fn data_count(&self) -> usize {
        0
    }

    fn is_animation_enabled(&self) -> bool {
        let opts = self.animation_options();
        opts.animation && self.data_count() <= opts.animation_threshold
    }
}

/// Plain [`AnimatableModel`] backed by an options struct.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeriesModel {
    pub options: AnimationOptions,
    pub data_count: usize,
}

impl SeriesModel {
    pub fn new(options: AnimationOptions) -> Self {
        Self {
            options,
            data_count: 0,
        }
    }

    pub fn with_data_count(mut self, n: usize) -> Self {
        self.data_count = n;
        self
    }
}

impl AnimatableModel for SeriesModel {
    fn animation_options(&self) -> &AnimationOptions {
        &self.options
    }

    fn data_count(&self) -> usize {
        self.data_count
    }
}

fn sanitize_ms(v: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

/// Effective timing for one element animation, or `None` when the model has animation off.
///
/// Enter animations read `animationDuration/Easing/Delay`; update and leave animations read
/// the `*Update` variants. A per-element override replaces model values field by field, and
/// a payload replaces both.
pub fn resolve_animation_config(
    kind: AnimationKind,
    model: &dyn AnimatableModel,
    data_index: usize,
    element_override: Option<&AnimationOverride>,
    payload: Option<&AnimationPayload>,
) -> Option<AnimationConfig> {
    if !model.is_animation_enabled() {
        return None;
    }
    let opts = model.animation_options();
    let (duration, delay, easing) = match kind {
        AnimationKind::Enter => (
            &opts.animation_duration,
            &opts.animation_delay,
            opts.animation_easing,
        ),
        AnimationKind::Update | AnimationKind::Leave => (
            &opts.animation_duration_update,
            &opts.animation_delay_update,
            opts.animation_easing_update,
        ),
    };
    let mut cfg = AnimationConfig {
        duration: duration.eval(data_index),
        delay: delay.eval(data_index),
        easing,
    };
    for o in [element_override, payload].into_iter().flatten() {
        if let Some(d) = o.duration {
            cfg.duration = d;
        }
        if let Some(d) = o.delay {
            cfg.delay = d;
        }
        if let Some(e) = o.easing {
            cfg.easing = e;
        }
    }
    cfg.duration = sanitize_ms(cfg.duration);
    cfg.delay = sanitize_ms(cfg.delay);
    Some(cfg)
}

/// One shared timing for a whole morph operation.
///
/// A payload replaces the model's update timing entirely (missing fields become 0 ms and
/// `cubicOut`). Disabled animation yields a zero-duration config.
pub fn morph_animation_config(
    model: &dyn AnimatableModel,
    data_index: usize,
    payload: Option<&AnimationPayload>,
) -> AnimationConfig {
    if !model.is_animation_enabled() {
        return AnimationConfig::instant();
    }
    let cfg = match payload {
        Some(p) => AnimationConfig {
            duration: p.duration.unwrap_or(0.0),
            delay: p.delay.unwrap_or(0.0),
            easing: p.easing.unwrap_or(Ease::OutCubic),
        },
        None => {
            let opts = model.animation_options();
            AnimationConfig {
                duration: opts.animation_duration_update.eval(data_index),
                delay: opts.animation_delay_update.eval(data_index),
                easing: opts.animation_easing_update,
            }
        }
    };
    AnimationConfig {
        duration: sanitize_ms(cfg.duration),
        delay: sanitize_ms(cfg.delay),
        easing: cfg.easing,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/config.rs"]
mod tests;
