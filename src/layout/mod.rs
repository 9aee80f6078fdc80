//! Layout/refresh coordination for trigger regions.
//!
//! Regions cache their resolved scroll range. Viewport resizes, content mutations and explicit
//! requests mark them dirty; a refresh re-measures dirty regions in document order, carrying the
//! spacers reserved by earlier pinned regions so later edges land where the host lays them out.

use serde::Serialize;

use crate::foundation::core::Viewport;
use crate::scroll::region::{Measurement, TriggerRegion};
use crate::surface::Surface;

/// Outcome of one refresh pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    /// Regions re-measured.
    pub measured: usize,
    /// Re-measured regions whose geometry was unavailable.
    pub skipped: usize,
    /// Clean regions re-measured because an earlier pin spacer moved them.
    pub shifted: usize,
}

/// Owns the viewport and re-measures trigger regions.
#[derive(Debug)]
pub struct LayoutCoordinator {
    viewport: Viewport,
    refreshes: u64,
}

impl LayoutCoordinator {
    /// Coordinator for `viewport`.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            refreshes: 0,
        }
    }

    /// Current viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Completed refresh passes.
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    /// Replace the viewport; returns `true` when it changed.
    pub(crate) fn set_viewport(&mut self, viewport: Viewport) -> bool {
        let changed = self.viewport != viewport;
        self.viewport = viewport;
        changed
    }

    /// Mark regions dirty; returns how many were clean before.
    pub fn invalidate<'a>(&mut self, regions: impl IntoIterator<Item = &'a mut TriggerRegion>) -> usize {
        regions
            .into_iter()
            .map(|r| {
                let was_clean = !r.is_dirty();
                r.invalidate();
                usize::from(was_clean)
            })
            .sum()
    }

    /// Re-measure dirty and previously skipped regions against current geometry.
    ///
    /// Regions are visited by natural anchor top (registration order breaks ties). Each region
    /// is displaced by the spacers of spacing pins ending at or above its anchor; a clean region
    /// whose displacement changed is re-measured too.
    #[tracing::instrument(skip(self, surface, regions))]
    pub fn refresh_all<'a>(
        &mut self,
        surface: &dyn Surface,
        regions: impl IntoIterator<Item = &'a mut TriggerRegion>,
    ) -> RefreshReport {
        let mut ordered: Vec<(f64, &mut TriggerRegion)> = regions
            .into_iter()
            .map(|r| {
                let top = surface.measure(r.anchor()).map_or(f64::INFINITY, |rect| rect.y0);
                (top, r)
            })
            .collect();
        ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut report = RefreshReport::default();
        let mut spacers: Vec<(f64, f64)> = Vec::new();
        for (top, region) in ordered {
            let shift: f64 = if top.is_finite() {
                spacers
                    .iter()
                    .filter(|(bottom, _)| *bottom <= top)
                    .map(|(_, spacer)| spacer)
                    .sum()
            } else {
                0.0
            };
            let dirty = region.is_dirty();
            let retry = matches!(region.measurement(), Measurement::Skipped(_));
            if dirty || retry || region.shift() != shift {
                if !dirty && !retry {
                    report.shifted += 1;
                }
                report.measured += 1;
                if let Measurement::Skipped(_) = region.measure(surface, self.viewport, shift) {
                    report.skipped += 1;
                }
            }
            if let Some(spacer) = region.spacer() {
                spacers.push(spacer);
            }
        }

        self.refreshes += 1;
        tracing::debug!(?report, "trigger regions refreshed");
        report
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/layout.rs"]
mod tests;
