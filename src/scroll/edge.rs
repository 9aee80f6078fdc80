//! Trigger edge grammar.
//!
//! An edge names the scroll offset at which a point on the anchor element meets a point on the
//! viewport: `"top 80%"` is reached when the anchor's top edge sits at 80% of the viewport
//! height. Ends may also be written relative to the start (`"+=80%"`, `"+=300"`) or as absolute
//! document offsets.

use std::str::FromStr;

use serde::Deserialize;

use crate::foundation::core::{Rect, Viewport};
use crate::foundation::error::{ScrollError, ScrollResult};

/// A point along one vertical extent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Anchor {
    /// Fraction of the extent: `top` = 0, `center` = 0.5, `bottom` = 1, `"80%"` = 0.8.
    Fraction(f64),
    /// Fixed pixel distance from the extent's top (`"120px"` or `"120"`).
    Pixels(f64),
}

impl Anchor {
    /// Distance from the top of an extent of `size` pixels.
    pub fn resolve(self, size: f64) -> f64 {
        match self {
            Self::Fraction(f) => size * f,
            Self::Pixels(px) => px,
        }
    }
}

impl FromStr for Anchor {
    type Err = ScrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bad = || ScrollError::configuration(format!("invalid edge anchor \"{s}\""));
        match s {
            "top" => return Ok(Self::Fraction(0.0)),
            "center" => return Ok(Self::Fraction(0.5)),
            "bottom" => return Ok(Self::Fraction(1.0)),
            _ => {}
        }
        if let Some(pct) = s.strip_suffix('%') {
            let v: f64 = pct.parse().map_err(|_| bad())?;
            return finite(v).map(|v| Self::Fraction(v / 100.0)).ok_or_else(bad);
        }
        let px = s.strip_suffix("px").unwrap_or(s);
        let v: f64 = px.parse().map_err(|_| bad())?;
        finite(v).map(Self::Pixels).ok_or_else(bad)
    }
}

/// A distance along the scroll axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Length {
    /// Pixels.
    Pixels(f64),
    /// Percent of the viewport height.
    ViewportPercent(f64),
}

impl Length {
    /// Resolve to pixels.
    pub fn resolve(self, viewport: Viewport) -> f64 {
        match self {
            Self::Pixels(px) => px,
            Self::ViewportPercent(pct) => viewport.height_fraction(pct / 100.0),
        }
    }

    fn is_positive(self) -> bool {
        match self {
            Self::Pixels(v) | Self::ViewportPercent(v) => v > 0.0,
        }
    }
}

impl FromStr for Length {
    type Err = ScrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bad = || ScrollError::configuration(format!("invalid scroll length \"{s}\""));
        if let Some(pct) = s.strip_suffix('%') {
            let v: f64 = pct.parse().map_err(|_| bad())?;
            return finite(v).map(Self::ViewportPercent).ok_or_else(bad);
        }
        let v: f64 = s.strip_suffix("px").unwrap_or(s).parse().map_err(|_| bad())?;
        finite(v).map(Self::Pixels).ok_or_else(bad)
    }
}

/// One end of a trigger region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Edge {
    /// Absolute document scroll offset in pixels. Never shifted by pin spacers.
    Absolute(f64),
    /// Scroll offset where `element` (on the anchor) meets `viewport`.
    Meet {
        /// Point on the anchor element.
        element: Anchor,
        /// Point on the viewport.
        viewport: Anchor,
    },
    /// Distance past the resolved start edge; only valid as an end edge.
    After(Length),
}

impl Edge {
    /// Default start: anchor top meets viewport bottom.
    pub const DEFAULT_START: Self = Self::Meet {
        element: Anchor::Fraction(0.0),
        viewport: Anchor::Fraction(1.0),
    };

    /// Default end: anchor bottom meets viewport top.
    pub const DEFAULT_END: Self = Self::Meet {
        element: Anchor::Fraction(1.0),
        viewport: Anchor::Fraction(0.0),
    };

    /// Return `true` for edges written relative to the start.
    pub fn is_relative(self) -> bool {
        matches!(self, Self::After(_))
    }

    pub(crate) fn validate_pair(start: Self, end: Self) -> ScrollResult<()> {
        match (start, end) {
            (Self::After(_), _) => Err(ScrollError::configuration(
                "start edge cannot be relative (\"+=...\")",
            )),
            (_, Self::After(len)) if !len.is_positive() => Err(ScrollError::configuration(
                format!("relative end edge must be > 0 (got {len:?})"),
            )),
            (Self::Absolute(a), Self::Absolute(b)) if b <= a => Err(ScrollError::configuration(
                format!("end edge {b} must be greater than start edge {a}"),
            )),
            (s, e) if s == e => Err(ScrollError::configuration(format!(
                "start and end edges are identical ({s:?})"
            ))),
            _ => Ok(()),
        }
    }

    /// Resolve against the anchor's natural rect, displaced downward by `shift` pixels.
    ///
    /// `start` is the already resolved start edge; required for [`Edge::After`].
    pub(crate) fn resolve(
        self,
        anchor: Rect,
        shift: f64,
        viewport: Viewport,
        start: Option<f64>,
    ) -> Option<f64> {
        match self {
            Self::Absolute(px) => Some(px),
            Self::Meet { element, viewport: vp } => Some(
                anchor.y0 + shift + element.resolve(anchor.height()) - vp.resolve(viewport.height),
            ),
            Self::After(len) => start.map(|s| s + len.resolve(viewport)),
        }
    }
}

impl FromStr for Edge {
    type Err = ScrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix("+=") {
            return rest.parse().map(Self::After);
        }
        let mut parts = s.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(element), Some(viewport), None) => Ok(Self::Meet {
                element: element.parse()?,
                viewport: viewport.parse()?,
            }),
            (Some(single), None, None) => {
                let v: f64 = single
                    .strip_suffix("px")
                    .unwrap_or(single)
                    .parse()
                    .map_err(|_| {
                        ScrollError::configuration(format!(
                            "edge \"{s}\" must be \"<element> <viewport>\", \"+=<length>\" or a pixel offset"
                        ))
                    })?;
                finite(v)
                    .map(Self::Absolute)
                    .ok_or_else(|| ScrollError::configuration(format!("invalid edge \"{s}\"")))
            }
            _ => Err(ScrollError::configuration(format!("invalid edge \"{s}\""))),
        }
    }
}

impl<'de> Deserialize<'de> for Edge {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Px(f64),
            Str(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Px(v) => Ok(Self::Absolute(v)),
            Repr::Str(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

#[cfg(test)]
#[path = "../../tests/unit/scroll/edge.rs"]
mod tests;
