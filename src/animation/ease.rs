use std::f64::consts::PI;
use std::str::FromStr;

use crate::foundation::error::{ScrollError, ScrollResult};

const BACK_C1: f64 = 1.70158;
const BACK_C2: f64 = BACK_C1 * 1.525;
const BACK_C3: f64 = BACK_C1 + 1.0;

/// Easing functions used to map normalized animation progress.
///
/// Names follow the `family.direction` convention (`"power3.out"`, `"sine.inOut"`), with
/// `power1..4` aliasing quad, cubic, quart and quint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Ease {
    /// Linear interpolation (`"none"`).
    Linear,
    /// Quadratic ease-in.
    InQuad,
    /// Quadratic ease-out.
    OutQuad,
    /// Quadratic ease-in/out.
    InOutQuad,
    /// Cubic ease-in.
    InCubic,
    /// Cubic ease-out.
    OutCubic,
    /// Cubic ease-in/out.
    InOutCubic,
    /// Quartic ease-in.
    InQuart,
    /// Quartic ease-out.
    OutQuart,
    /// Quartic ease-in/out.
    InOutQuart,
    /// Quintic ease-in.
    InQuint,
    /// Quintic ease-out.
    OutQuint,
    /// Quintic ease-in/out.
    InOutQuint,
    /// Sinusoidal ease-in.
    InSine,
    /// Sinusoidal ease-out.
    OutSine,
    /// Sinusoidal ease-in/out.
    InOutSine,
    /// Exponential ease-in.
    InExpo,
    /// Exponential ease-out.
    OutExpo,
    /// Exponential ease-in/out.
    InOutExpo,
    /// Circular ease-in.
    InCirc,
    /// Circular ease-out.
    OutCirc,
    /// Circular ease-in/out.
    InOutCirc,
    /// Back ease-in (undershoots below 0 before rising).
    InBack,
    /// Back ease-out (overshoots above 1 before settling).
    OutBack,
    /// Back ease-in/out.
    InOutBack,
}

impl Default for Ease {
    fn default() -> Self {
        Self::OutQuad
    }
}

impl Ease {
    /// Every supported ease, in declaration order.
    pub const ALL: [Ease; 25] = [
        Self::Linear,
        Self::InQuad,
        Self::OutQuad,
        Self::InOutQuad,
        Self::InCubic,
        Self::OutCubic,
        Self::InOutCubic,
        Self::InQuart,
        Self::OutQuart,
        Self::InOutQuart,
        Self::InQuint,
        Self::OutQuint,
        Self::InOutQuint,
        Self::InSine,
        Self::OutSine,
        Self::InOutSine,
        Self::InExpo,
        Self::OutExpo,
        Self::InOutExpo,
        Self::InCirc,
        Self::OutCirc,
        Self::InOutCirc,
        Self::InBack,
        Self::OutBack,
        Self::InOutBack,
    ];

    /// Apply this easing function to normalized progress `t` in `[0, 1]`.
    ///
    /// Endpoints are exact: `apply(0) == 0` and `apply(1) == 1` for every curve.
    pub fn apply(self, t: f64) -> f64 {
        if t.is_nan() || t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => in_out_power(t, 2),
            Self::InCubic => t.powi(3),
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => in_out_power(t, 3),
            Self::InQuart => t.powi(4),
            Self::OutQuart => 1.0 - (1.0 - t).powi(4),
            Self::InOutQuart => in_out_power(t, 4),
            Self::InQuint => t.powi(5),
            Self::OutQuint => 1.0 - (1.0 - t).powi(5),
            Self::InOutQuint => in_out_power(t, 5),
            Self::InSine => 1.0 - (t * PI / 2.0).cos(),
            Self::OutSine => (t * PI / 2.0).sin(),
            Self::InOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Self::InExpo => 2f64.powf(10.0 * t - 10.0),
            Self::OutExpo => 1.0 - 2f64.powf(-10.0 * t),
            Self::InOutExpo => {
                if t < 0.5 {
                    2f64.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
            Self::InCirc => 1.0 - (1.0 - t * t).sqrt(),
            Self::OutCirc => (1.0 - (t - 1.0).powi(2)).sqrt(),
            Self::InOutCirc => {
                if t < 0.5 {
                    (1.0 - (1.0 - (2.0 * t).powi(2)).sqrt()) / 2.0
                } else {
                    ((1.0 - (-2.0 * t + 2.0).powi(2)).sqrt() + 1.0) / 2.0
                }
            }
            Self::InBack => BACK_C3 * t.powi(3) - BACK_C1 * t * t,
            Self::OutBack => 1.0 + BACK_C3 * (t - 1.0).powi(3) + BACK_C1 * (t - 1.0).powi(2),
            Self::InOutBack => {
                if t < 0.5 {
                    ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2)
                        + 2.0)
                        / 2.0
                }
            }
        }
    }

    /// Return `true` for curves that leave `[0, 1]` between the endpoints.
    pub fn overshoots(self) -> bool {
        matches!(self, Self::InBack | Self::OutBack | Self::InOutBack)
    }

    /// Canonical `family.direction` name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "none",
            Self::InQuad => "power1.in",
            Self::OutQuad => "power1.out",
            Self::InOutQuad => "power1.inOut",
            Self::InCubic => "power2.in",
            Self::OutCubic => "power2.out",
            Self::InOutCubic => "power2.inOut",
            Self::InQuart => "power3.in",
            Self::OutQuart => "power3.out",
            Self::InOutQuart => "power3.inOut",
            Self::InQuint => "power4.in",
            Self::OutQuint => "power4.out",
            Self::InOutQuint => "power4.inOut",
            Self::InSine => "sine.in",
            Self::OutSine => "sine.out",
            Self::InOutSine => "sine.inOut",
            Self::InExpo => "expo.in",
            Self::OutExpo => "expo.out",
            Self::InOutExpo => "expo.inOut",
            Self::InCirc => "circ.in",
            Self::OutCirc => "circ.out",
            Self::InOutCirc => "circ.inOut",
            Self::InBack => "back.in",
            Self::OutBack => "back.out",
            Self::InOutBack => "back.inOut",
        }
    }
}

fn in_out_power(t: f64, n: i32) -> f64 {
    if t < 0.5 {
        2f64.powi(n - 1) * t.powi(n)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(n) / 2.0
    }
}

impl FromStr for Ease {
    type Err = ScrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if matches!(s, "none" | "linear" | "power0" | "power0.in" | "power0.out") {
            return Ok(Self::Linear);
        }

        let (family, dir) = s.split_once('.').unwrap_or((s, "out"));
        let idx = match family {
            "power1" | "quad" => 0,
            "power2" | "cubic" => 1,
            "power3" | "quart" => 2,
            "power4" | "quint" | "strong" => 3,
            "sine" => 4,
            "expo" => 5,
            "circ" => 6,
            "back" => 7,
            _ => {
                return Err(ScrollError::configuration(format!(
                    "unknown ease family \"{family}\""
                )));
            }
        };
        let offset = match dir {
            "in" => 0,
            "out" => 1,
            "inOut" | "inout" => 2,
            _ => {
                return Err(ScrollError::configuration(format!(
                    "unknown ease direction \"{dir}\" (expected in, out or inOut)"
                )));
            }
        };
        Ok(Self::ALL[1 + idx * 3 + offset])
    }
}

impl TryFrom<String> for Ease {
    type Error = ScrollError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ease> for String {
    fn from(value: Ease) -> Self {
        value.name().to_owned()
    }
}

/// Resolve an ease by name into a plain progress mapping function.
pub fn ease_fn(name: &str) -> ScrollResult<impl Fn(f64) -> f64 + Copy> {
    let ease: Ease = name.parse()?;
    Ok(move |t| ease.apply(t))
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
