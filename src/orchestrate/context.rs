use std::cell::Cell;
use std::rc::Rc;

use serde::Serialize;
use smallvec::SmallVec;

use crate::animation::timeline::Timeline;
use crate::animation::value::{Property, PropertyValue};
use crate::foundation::error::{ScrollError, ScrollResult};
use crate::foundation::ids::{ContextId, ElementId, LinkageId, TimelineId};
use crate::orchestrate::clock::{ClockDriver, ClockPlayback};
use crate::orchestrate::engine::{EventRecord, FrameReport};
use crate::registry::{AnimationTarget, ElementRegistry, Requirement, Selector};
use crate::scroll::claim::{LinkageKey, PinClaim};
use crate::scroll::linkage::{FrameInput, Linkage, LinkageConfig, ToggleActions};
use crate::scroll::region::Measurement;
use crate::surface::{PinState, Surface};

/// Shared flag through which host code asks for a context teardown.
///
/// Requests made while a frame pass is running (for example from inside a surface write) are
/// honored before the next linkage or clock of that context is evaluated.
#[derive(Clone, Debug, Default)]
pub struct RevertSignal(Rc<Cell<bool>>);

impl RevertSignal {
    /// Request a revert.
    pub fn request(&self) {
        self.0.set(true);
    }

    /// Return `true` once a revert was requested.
    pub fn is_requested(&self) -> bool {
        self.0.get()
    }
}

/// What a revert undid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RevertReport {
    /// Linkages detached.
    pub linkages_detached: usize,
    /// Timelines stopped.
    pub timelines_stopped: usize,
    /// Property writes restored to baseline.
    pub properties_restored: usize,
    /// Elements returned to normal flow.
    pub unpinned: usize,
}

#[derive(Debug)]
struct TimelineEntry {
    id: TimelineId,
    timeline: Timeline,
    clock: Option<ClockDriver>,
    linked: bool,
}

/// Scoped registration boundary for one section's timelines and linkages.
///
/// The context is the only owner with teardown authority: [`OrchestrationContext::revert`]
/// detaches every linkage and restores every animated property to its captured baseline.
#[derive(Debug)]
pub struct OrchestrationContext {
    id: ContextId,
    registry: ElementRegistry,
    default_actions: ToggleActions,
    timelines: Vec<TimelineEntry>,
    linkages: Vec<Linkage>,
    signal: RevertSignal,
    reverted: bool,
    next_timeline: u32,
    next_linkage: u32,
}

impl OrchestrationContext {
    pub(crate) fn open(id: ContextId, scope: ElementId, default_actions: ToggleActions) -> Self {
        Self {
            id,
            registry: ElementRegistry::new(scope),
            default_actions,
            timelines: Vec::new(),
            linkages: Vec::new(),
            signal: RevertSignal::default(),
            reverted: false,
            next_timeline: 0,
            next_linkage: 0,
        }
    }

    /// Context id.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Scope root.
    pub fn scope(&self) -> ElementId {
        self.registry.scope()
    }

    /// Element registry of this context.
    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    /// Return `true` after [`OrchestrationContext::revert`].
    pub fn is_reverted(&self) -> bool {
        self.reverted
    }

    /// Handle for requesting a revert from host code.
    pub fn revert_signal(&self) -> RevertSignal {
        self.signal.clone()
    }

    /// Resolve a selector inside this context's scope.
    pub fn resolve(
        &self,
        surface: &dyn Surface,
        selector: &Selector,
        requirement: Requirement,
    ) -> ScrollResult<Vec<AnimationTarget>> {
        self.ensure_open()?;
        self.registry.resolve(surface, selector, requirement)
    }

    /// Take ownership of a timeline.
    pub fn register_timeline(&mut self, timeline: Timeline) -> ScrollResult<TimelineId> {
        self.ensure_open()?;
        let id = TimelineId(self.next_timeline);
        self.next_timeline += 1;
        tracing::debug!(context = %self.id, timeline = %id, segments = timeline.segments().len(), "timeline registered");
        self.timelines.push(TimelineEntry {
            id,
            timeline,
            clock: None,
            linked: false,
        });
        Ok(id)
    }

    /// Drive a registered timeline from the frame clock instead of scroll.
    pub fn play(&mut self, timeline: TimelineId, playback: ClockPlayback) -> ScrollResult<()> {
        self.ensure_open()?;
        let entry = self.entry_mut(timeline)?;
        if entry.linked || entry.clock.is_some() {
            return Err(ScrollError::configuration(format!(
                "{timeline} is already driven"
            )));
        }
        entry.clock = Some(ClockDriver::new(timeline, entry.timeline.length(), playback)?);
        Ok(())
    }

    /// Bind a registered timeline to a trigger region.
    pub fn register_linkage(
        &mut self,
        timeline: TimelineId,
        config: LinkageConfig,
    ) -> ScrollResult<LinkageId> {
        self.ensure_open()?;
        let id = LinkageId(self.next_linkage);
        let default_actions = self.default_actions;
        let entry = self.entry_mut(timeline)?;
        if entry.linked || entry.clock.is_some() {
            return Err(ScrollError::configuration(format!(
                "{timeline} is already driven"
            )));
        }
        let linkage = Linkage::new(id, timeline, entry.timeline.length(), config, default_actions)?;
        entry.linked = true;
        self.next_linkage += 1;
        tracing::debug!(context = %self.id, linkage = %id, mode = ?linkage.mode(), "linkage registered");
        self.linkages.push(linkage);
        Ok(id)
    }

    /// Registered timeline.
    pub fn timeline(&self, id: TimelineId) -> Option<&Timeline> {
        self.timelines
            .iter()
            .find(|e| e.id == id)
            .map(|e| &e.timeline)
    }

    /// Clock driver of a timeline started with [`OrchestrationContext::play`].
    pub fn clock(&self, id: TimelineId) -> Option<&ClockDriver> {
        self.timelines
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| e.clock.as_ref())
    }

    /// Registered linkage.
    pub fn linkage(&self, id: LinkageId) -> Option<&Linkage> {
        self.linkages.iter().find(|l| l.id() == id)
    }

    /// Linkages in registration order.
    pub fn linkages(&self) -> &[Linkage] {
        &self.linkages
    }

    /// Detach every linkage, stop every clock and restore every animated property.
    ///
    /// Timelines are restored in reverse registration order. Idempotent.
    #[tracing::instrument(skip(self, surface), fields(context = %self.id))]
    pub fn revert(&mut self, surface: &mut dyn Surface) -> RevertReport {
        let mut report = RevertReport::default();
        if self.reverted {
            return report;
        }
        self.reverted = true;
        self.signal.request();

        for linkage in self.linkages.iter_mut().rev() {
            if let Some(element) = linkage.detach() {
                surface.set_pin(element, PinState::Unpinned);
                report.unpinned += 1;
            }
            report.linkages_detached += 1;
        }
        self.linkages.clear();

        for entry in self.timelines.iter_mut().rev() {
            entry.clock = None;
            for element in entry.timeline.elements().into_iter().rev() {
                report.properties_restored += self.registry.restore(surface, element);
            }
            report.timelines_stopped += 1;
        }
        self.timelines.clear();

        tracing::debug!(?report, "context reverted");
        report
    }

    pub(crate) fn is_animating(&self) -> bool {
        !self.reverted
            && (self.linkages.iter().any(|l| !l.is_settled())
                || self
                    .timelines
                    .iter()
                    .any(|e| e.clock.as_ref().is_some_and(|c| !c.is_finished())))
    }

    pub(crate) fn linkages_mut(&mut self) -> impl Iterator<Item = &mut Linkage> {
        self.linkages.iter_mut()
    }

    /// Evaluate every linkage, then every clock, committing writes as they are produced.
    pub(crate) fn run_frame(
        &mut self,
        input: FrameInput,
        claim: &mut PinClaim,
        surface: &mut dyn Surface,
        report: &mut FrameReport,
    ) {
        if self.reverted {
            return;
        }
        for i in 0..self.linkages.len() {
            if self.honor_signal(surface, report) {
                return;
            }
            let linkage = &mut self.linkages[i];
            let key = LinkageKey {
                context: self.id,
                linkage: linkage.id(),
            };
            let step = linkage.update(key, input, claim);
            if matches!(linkage.region().measurement(), Measurement::Skipped(_)) {
                report.skipped += 1;
            }
            report
                .events
                .extend(step.events.iter().map(|event| EventRecord {
                    context: self.id,
                    linkage: key.linkage,
                    event: *event,
                }));
            if let Some((element, pin)) = step.pin {
                surface.set_pin(element, pin);
            }
            let timeline = linkage.timeline();
            let Some(entry) = self.timelines.iter().find(|e| e.id == timeline) else {
                continue;
            };
            if step.restore {
                for element in entry.timeline.elements().into_iter().rev() {
                    report.writes += self.registry.restore(surface, element);
                }
            }
            if let Some(progress) = step.render {
                report.writes += commit(&mut self.registry, &entry.timeline, progress, surface);
            }
        }

        for i in 0..self.timelines.len() {
            if self.honor_signal(surface, report) {
                return;
            }
            let entry = &mut self.timelines[i];
            let Some(progress) = entry.clock.as_mut().and_then(|c| c.advance(input.dt)) else {
                continue;
            };
            report.writes += commit(&mut self.registry, &entry.timeline, progress, surface);
        }
        self.honor_signal(surface, report);
    }

    fn honor_signal(&mut self, surface: &mut dyn Surface, report: &mut FrameReport) -> bool {
        if !self.signal.is_requested() {
            return false;
        }
        self.revert(surface);
        report.reverted.push(self.id);
        true
    }

    fn ensure_open(&self) -> ScrollResult<()> {
        if self.reverted {
            return Err(ScrollError::configuration(format!(
                "{} has been reverted",
                self.id
            )));
        }
        Ok(())
    }

    fn entry_mut(&mut self, id: TimelineId) -> ScrollResult<&mut TimelineEntry> {
        let ctx = self.id;
        self.timelines
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ScrollError::configuration(format!("unknown {id} in {ctx}")))
    }
}

/// Evaluate `timeline` and apply its writes element by element.
fn commit(
    registry: &mut ElementRegistry,
    timeline: &Timeline,
    progress: f64,
    surface: &mut dyn Surface,
) -> usize {
    for element in timeline.elements() {
        registry.capture_baseline(&*surface, element);
    }
    let writes = timeline.evaluate(progress, &*registry);
    let count = writes.len();

    let mut batch: SmallVec<[(Property, PropertyValue); 8]> = SmallVec::new();
    let mut current: Option<ElementId> = None;
    for write in writes {
        if current != Some(write.element) {
            if let Some(element) = current {
                registry.apply(surface, element, &batch);
            }
            batch.clear();
            current = Some(write.element);
        }
        batch.push((write.property, write.value));
    }
    if let Some(element) = current {
        registry.apply(surface, element, &batch);
    }
    count
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/context.rs"]
mod tests;
