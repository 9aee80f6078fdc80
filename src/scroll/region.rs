use serde::{Deserialize, Serialize};

use crate::foundation::core::{Rect, Viewport};
use crate::foundation::error::ScrollResult;
use crate::foundation::ids::ElementId;
use crate::scroll::edge::Edge;
use crate::surface::{PinState, Surface};

/// Which element a pinned region holds, and whether it reserves its scroll distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinSpec {
    /// Element held fixed; the region anchor when `None`.
    #[serde(default)]
    pub element: Option<ElementId>,
    /// Reserve a spacer equal to the region length so later content keeps its distance.
    #[serde(default = "default_spacing")]
    pub spacing: bool,
}

fn default_spacing() -> bool {
    true
}

impl Default for PinSpec {
    fn default() -> Self {
        Self {
            element: None,
            spacing: true,
        }
    }
}

impl PinSpec {
    /// Pin the region anchor itself, with spacing.
    pub fn anchor() -> Self {
        Self::default()
    }

    /// Pin a distinct element.
    pub fn element(element: ElementId) -> Self {
        Self {
            element: Some(element),
            ..Self::default()
        }
    }

    /// Toggle spacer reservation.
    pub fn spacing(mut self, spacing: bool) -> Self {
        self.spacing = spacing;
        self
    }
}

/// Why a region could not be measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// Anchor (or pin element) is not attached or not laid out.
    Unmounted,
    /// Anchor has zero width or height.
    ZeroSize,
    /// Resolved end edge is not past the start edge.
    EmptyRange,
}

/// Cached geometry of a trigger region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Measurement {
    /// Never measured, or invalidated since.
    Dirty,
    /// Resolved scroll range.
    Measured {
        /// Scroll offset of the start edge.
        start: f64,
        /// Scroll offset of the end edge.
        end: f64,
        /// Natural rect of the pinned element, when the region pins.
        pin_rect: Option<Rect>,
    },
    /// Geometry unavailable; the linkage idles until the next refresh.
    Skipped(SkipReason),
}

/// Span of scroll travel over which a linkage is active.
#[derive(Clone, Debug)]
pub struct TriggerRegion {
    anchor: ElementId,
    start: Edge,
    end: Edge,
    pin: Option<PinSpec>,
    shift: f64,
    measurement: Measurement,
}

impl TriggerRegion {
    /// Build an unmeasured region. Statically invalid edge pairs are rejected.
    pub fn new(anchor: ElementId, start: Edge, end: Edge, pin: Option<PinSpec>) -> ScrollResult<Self> {
        Edge::validate_pair(start, end)?;
        Ok(Self {
            anchor,
            start,
            end,
            pin,
            shift: 0.0,
            measurement: Measurement::Dirty,
        })
    }

    /// Anchor element.
    pub fn anchor(&self) -> ElementId {
        self.anchor
    }

    /// Pin configuration.
    pub fn pin(&self) -> Option<PinSpec> {
        self.pin
    }

    /// Element held fixed while pinned.
    pub fn pin_element(&self) -> Option<ElementId> {
        self.pin.map(|p| p.element.unwrap_or(self.anchor))
    }

    /// Current cached measurement.
    pub fn measurement(&self) -> Measurement {
        self.measurement
    }

    /// Displacement from earlier pin spacers applied at the last measurement.
    pub fn shift(&self) -> f64 {
        self.shift
    }

    /// Return `true` when the region must be re-measured before use.
    pub fn is_dirty(&self) -> bool {
        matches!(self.measurement, Measurement::Dirty)
    }

    /// Drop cached geometry.
    pub fn invalidate(&mut self) {
        self.measurement = Measurement::Dirty;
    }

    /// Resolved `(start, end)` scroll range, when measured.
    pub fn range(&self) -> Option<(f64, f64)> {
        match self.measurement {
            Measurement::Measured { start, end, .. } => Some((start, end)),
            _ => None,
        }
    }

    /// Clamped progress of `scroll` through the region.
    pub fn progress(&self, scroll: f64) -> Option<f64> {
        self.range()
            .map(|(start, end)| ((scroll - start) / (end - start)).clamp(0.0, 1.0))
    }

    /// `(natural pin bottom, spacer)` contributed to regions further down the document.
    pub(crate) fn spacer(&self) -> Option<(f64, f64)> {
        if !self.pin.is_some_and(|p| p.spacing) {
            return None;
        }
        match self.measurement {
            Measurement::Measured {
                start,
                end,
                pin_rect: Some(rect),
            } => Some((rect.y1, end - start)),
            _ => None,
        }
    }

    /// Pin placement while the region holds the pin.
    pub(crate) fn pinned_state(&self) -> Option<PinState> {
        let Measurement::Measured {
            start,
            end,
            pin_rect: Some(rect),
        } = self.measurement
        else {
            return None;
        };
        let spacing = self.pin.is_some_and(|p| p.spacing);
        Some(PinState::Pinned {
            viewport_top: rect.y0 + self.shift - start,
            spacer: if spacing { end - start } else { 0.0 },
        })
    }

    /// Pin placement after scrolling past the region.
    pub(crate) fn after_state(&self) -> PinState {
        match self.range() {
            Some((start, end)) => PinState::After { offset: end - start },
            None => PinState::Unpinned,
        }
    }

    /// Resolve both edges against current geometry.
    pub fn measure(&mut self, surface: &dyn Surface, viewport: Viewport, shift: f64) -> Measurement {
        self.shift = shift;
        self.measurement = self.compute(surface, viewport, shift);
        if let Measurement::Skipped(reason) = self.measurement {
            tracing::debug!(anchor = %self.anchor, ?reason, "trigger region measurement skipped");
        }
        self.measurement
    }

    fn compute(&self, surface: &dyn Surface, viewport: Viewport, shift: f64) -> Measurement {
        let Some(rect) = surface.measure(self.anchor) else {
            return Measurement::Skipped(SkipReason::Unmounted);
        };
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return Measurement::Skipped(SkipReason::ZeroSize);
        }
        let start = self.start.resolve(rect, shift, viewport, None);
        let end = self.end.resolve(rect, shift, viewport, start);
        let (Some(start), Some(end)) = (start, end) else {
            return Measurement::Skipped(SkipReason::EmptyRange);
        };
        if end <= start {
            return Measurement::Skipped(SkipReason::EmptyRange);
        }
        let pin_rect = match self.pin_element() {
            None => None,
            Some(el) if el == self.anchor => Some(rect),
            Some(el) => match surface.measure(el) {
                Some(r) => Some(r),
                None => return Measurement::Skipped(SkipReason::Unmounted),
            },
        };
        Measurement::Measured {
            start,
            end,
            pin_rect,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scroll/region.rs"]
mod tests;
