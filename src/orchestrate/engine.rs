use serde::Serialize;

use crate::foundation::core::Viewport;
use crate::foundation::error::{ScrollError, ScrollResult};
use crate::foundation::ids::{ContextId, ElementId, LinkageId};
use crate::layout::{LayoutCoordinator, RefreshReport};
use crate::orchestrate::context::{OrchestrationContext, RevertReport};
use crate::scroll::claim::PinClaim;
use crate::scroll::linkage::{FrameInput, LinkageEvent, ToggleActions};
use crate::surface::Surface;

/// Options controlling frame scheduling and playback defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineOpts {
    /// Upper bound on the frame delta in seconds (a stalled tab must not skip animations).
    pub max_frame_dt: f64,
    /// Progress distance under which a smoothed linkage snaps onto its target.
    pub smoothing_epsilon: f64,
    /// Toggle actions for linkages that do not set their own.
    pub default_toggle_actions: ToggleActions,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            max_frame_dt: 0.1,
            smoothing_epsilon: 1e-4,
            default_toggle_actions: ToggleActions::default(),
        }
    }
}

impl EngineOpts {
    fn validate(&self) -> ScrollResult<()> {
        if !self.max_frame_dt.is_finite() || self.max_frame_dt <= 0.0 {
            return Err(ScrollError::configuration(format!(
                "max_frame_dt must be > 0 (got {})",
                self.max_frame_dt
            )));
        }
        if !self.smoothing_epsilon.is_finite() || self.smoothing_epsilon < 0.0 {
            return Err(ScrollError::configuration(format!(
                "smoothing_epsilon must be >= 0 (got {})",
                self.smoothing_epsilon
            )));
        }
        Ok(())
    }
}

/// One boundary crossing observed during a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    /// Owning context.
    pub context: ContextId,
    /// Linkage that crossed.
    pub linkage: LinkageId,
    /// Crossing kind.
    pub event: LinkageEvent,
}

/// Summary of one frame pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FrameReport {
    /// Frame index.
    pub frame: u64,
    /// Scroll offset evaluated.
    pub scroll: f64,
    /// Scroll notifications folded into this frame.
    pub coalesced: u32,
    /// Refresh performed before evaluation, if any region was dirty.
    pub refresh: Option<RefreshReport>,
    /// Boundary crossings in evaluation order.
    pub events: Vec<EventRecord>,
    /// Property writes committed.
    pub writes: usize,
    /// Linkages idling because their region could not be measured.
    pub skipped: usize,
    /// Contexts reverted through their signal during this frame.
    pub reverted: Vec<ContextId>,
}

/// Scroll-synchronized animation engine.
///
/// Hosts forward scroll, resize and content notifications, then call [`ScrollEngine::frame`]
/// once per display frame. Notifications are coalesced: at most one evaluation pass runs per
/// frame, with the latest scroll offset.
#[derive(Debug)]
pub struct ScrollEngine {
    opts: EngineOpts,
    layout: LayoutCoordinator,
    contexts: Vec<OrchestrationContext>,
    next_context: u32,
    claim: PinClaim,
    scroll: f64,
    pending_scroll: Option<f64>,
    coalesced: u32,
    frames: u64,
}

impl ScrollEngine {
    /// Engine with default options.
    pub fn new(viewport: Viewport) -> Self {
        Self::build(viewport, EngineOpts::default())
    }

    /// Engine with explicit options.
    pub fn with_opts(viewport: Viewport, opts: EngineOpts) -> ScrollResult<Self> {
        opts.validate()?;
        Ok(Self::build(viewport, opts))
    }

    fn build(viewport: Viewport, opts: EngineOpts) -> Self {
        Self {
            opts,
            layout: LayoutCoordinator::new(viewport),
            contexts: Vec::new(),
            next_context: 0,
            claim: PinClaim::default(),
            scroll: 0.0,
            pending_scroll: None,
            coalesced: 0,
            frames: 0,
        }
    }

    /// Engine options.
    pub fn opts(&self) -> &EngineOpts {
        &self.opts
    }

    /// Current viewport.
    pub fn viewport(&self) -> Viewport {
        self.layout.viewport()
    }

    /// Scroll offset used by the last frame.
    pub fn scroll(&self) -> f64 {
        self.scroll
    }

    /// Frames evaluated so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Current pin claim.
    pub fn pin_claim(&self) -> PinClaim {
        self.claim
    }

    /// Open a context scoped to `scope`, which must be mounted.
    pub fn open_context(&mut self, surface: &dyn Surface, scope: ElementId) -> ScrollResult<ContextId> {
        if !surface.is_mounted(scope) {
            return Err(ScrollError::resolution(format!(
                "context scope {scope} is not mounted"
            )));
        }
        let id = ContextId(self.next_context);
        self.next_context += 1;
        self.contexts.push(OrchestrationContext::open(
            id,
            scope,
            self.opts.default_toggle_actions,
        ));
        tracing::debug!(context = %id, %scope, "context opened");
        Ok(id)
    }

    /// Context by id.
    pub fn context(&self, id: ContextId) -> Option<&OrchestrationContext> {
        self.contexts.iter().find(|c| c.id() == id)
    }

    /// Mutable context by id, for registration.
    pub fn context_mut(&mut self, id: ContextId) -> Option<&mut OrchestrationContext> {
        self.contexts.iter_mut().find(|c| c.id() == id)
    }

    /// Open contexts in registration order.
    pub fn contexts(&self) -> impl Iterator<Item = &OrchestrationContext> {
        self.contexts.iter()
    }

    /// Revert a context and drop it.
    pub fn close_context(
        &mut self,
        id: ContextId,
        surface: &mut dyn Surface,
    ) -> Option<RevertReport> {
        let idx = self.contexts.iter().position(|c| c.id() == id)?;
        let mut ctx = self.contexts.remove(idx);
        self.claim.release_unless(|k| k.context != id);
        Some(ctx.revert(surface))
    }

    /// Record a scroll notification; evaluated on the next frame.
    pub fn on_scroll(&mut self, offset: f64) {
        if !offset.is_finite() {
            tracing::warn!(offset, "ignoring non-finite scroll offset");
            return;
        }
        self.pending_scroll = Some(offset);
        self.coalesced += 1;
    }

    /// Viewport resize: every region is re-measured on the next frame.
    pub fn on_resize(&mut self, viewport: Viewport) {
        if self.layout.set_viewport(viewport) {
            self.invalidate(None);
        }
    }

    /// Document content changed height (for example an image finished loading).
    pub fn on_content_changed(&mut self) {
        self.invalidate(None);
    }

    /// Mark the regions of one context, or of every context, dirty.
    pub fn invalidate(&mut self, scope: Option<ContextId>) -> usize {
        let regions = self
            .contexts
            .iter_mut()
            .filter(|c| scope.is_none_or(|id| c.id() == id))
            .flat_map(|c| c.linkages_mut())
            .map(|l| l.region_mut());
        self.layout.invalidate(regions)
    }

    /// Re-measure dirty regions now.
    pub fn refresh(&mut self, surface: &dyn Surface) -> RefreshReport {
        let regions = self
            .contexts
            .iter_mut()
            .flat_map(|c| c.linkages_mut())
            .map(|l| l.region_mut());
        self.layout.refresh_all(surface, regions)
    }

    /// Return `true` when the next frame would do any work.
    pub fn needs_frame(&self) -> bool {
        self.pending_scroll.is_some()
            || self.has_dirty_regions()
            || self.contexts.iter().any(|c| c.is_animating())
    }

    fn has_dirty_regions(&self) -> bool {
        self.contexts
            .iter()
            .flat_map(|c| c.linkages())
            .any(|l| l.region().is_dirty())
    }

    /// Run one evaluation pass.
    ///
    /// Dirty regions are refreshed first. Contexts, then their linkages, run in registration
    /// order; each linkage's writes are committed before the next linkage is evaluated.
    /// Contexts reverted by the time the pass ends are dropped along with their baselines.
    #[tracing::instrument(level = "trace", skip(self, surface))]
    pub fn frame(&mut self, dt: f64, surface: &mut dyn Surface) -> FrameReport {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.opts.max_frame_dt)
        } else {
            0.0
        };
        if let Some(offset) = self.pending_scroll.take() {
            self.scroll = offset;
        }
        let mut report = FrameReport {
            frame: self.frames,
            scroll: self.scroll,
            coalesced: std::mem::take(&mut self.coalesced),
            ..FrameReport::default()
        };
        self.frames += 1;

        if self.has_dirty_regions() {
            report.refresh = Some(self.refresh(&*surface));
        }

        let scroll = self.scroll;
        let contexts = &self.contexts;
        self.claim.release_unless(|key| {
            contexts
                .iter()
                .find(|c| c.id() == key.context && !c.is_reverted())
                .and_then(|c| c.linkage(key.linkage))
                .is_some_and(|l| l.contains(scroll))
        });

        let input = FrameInput {
            scroll,
            dt,
            epsilon: self.opts.smoothing_epsilon,
        };
        for ctx in &mut self.contexts {
            ctx.run_frame(input, &mut self.claim, surface, &mut report);
        }

        let before = self.contexts.len();
        self.contexts.retain(|c| !c.is_reverted());
        if self.contexts.len() != before {
            let contexts = &self.contexts;
            self.claim
                .release_unless(|key| contexts.iter().any(|c| c.id() == key.context));
            tracing::debug!(dropped = before - self.contexts.len(), "reverted contexts dropped");
        }
        report
    }
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/engine.rs"]
mod tests;
