/// Easing curves, named the way chart options spell them (`"cubicOut"`, ...).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "quadraticIn")]
    InQuad,
    #[serde(rename = "quadraticOut")]
    OutQuad,
    #[serde(rename = "quadraticInOut")]
    InOutQuad,
    #[serde(rename = "cubicIn")]
    InCubic,
    #[default]
    #[serde(rename = "cubicOut")]
    OutCubic,
    #[serde(rename = "cubicInOut")]
    InOutCubic,
    #[serde(rename = "sinusoidalIn")]
    InSine,
    #[serde(rename = "sinusoidalOut")]
    OutSine,
    #[serde(rename = "sinusoidalInOut")]
    InOutSine,
    #[serde(rename = "exponentialIn")]
    InExpo,
    #[serde(rename = "exponentialOut")]
    OutExpo,
    #[serde(rename = "backOut")]
    OutBack,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::InSine => 1.0 - (t * std::f64::consts::FRAC_PI_2).cos(),
            Self::OutSine => (t * std::f64::consts::FRAC_PI_2).sin(),
            Self::InOutSine => 0.5 * (1.0 - (std::f64::consts::PI * t).cos()),
            Self::InExpo => {
                if t == 0.0 {
                    0.0
                } else {
                    1024f64.powf(t - 1.0)
                }
            }
            Self::OutExpo => {
                if t == 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * t)
                }
            }
            Self::OutBack => {
                let s = 1.70158;
                let u = t - 1.0;
                u * u * ((s + 1.0) * u + s) + 1.0
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
