//! Scroll linkage controller.
//!
//! A [`Linkage`] turns the document scroll offset into progress for one timeline. Per frame it
//! classifies the scroll offset against its trigger region, emits boundary events, advances its
//! playback (toggle playhead, direct or smoothed scrub) and reports which progress to render and
//! whether its pinned element changes placement. It never touches the surface itself.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::foundation::error::{ScrollError, ScrollResult};
use crate::foundation::ids::{ElementId, LinkageId, TimelineId};
use crate::scroll::claim::{LinkageKey, PinClaim};
use crate::scroll::edge::Edge;
use crate::scroll::region::{Measurement, PinSpec, TriggerRegion};
use crate::surface::PinState;

/// How scroll position drives timeline progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackMode {
    /// Boundary crossings trigger real-time play/reverse actions.
    #[default]
    Toggle,
    /// Progress follows the scroll offset through the region.
    Scrub,
    /// As `Scrub`, with the pin element held fixed while the region is active.
    PinnedScrub,
}

/// Lifecycle state of a linkage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkageState {
    /// Outside the region, nothing in motion (or geometry unavailable).
    #[default]
    Idle,
    /// Crossed into the region this frame, or waiting for the pin claim.
    Entering,
    /// Inside the region.
    Active,
    /// Crossed out of the region and still settling.
    Leaving,
}

/// Scroll offset relative to a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// Above the start edge.
    Before,
    /// Within `[start, end]`.
    Inside,
    /// Past the end edge.
    After,
}

impl Side {
    /// Classify `scroll` against `[start, end]`.
    pub fn of(scroll: f64, start: f64, end: f64) -> Self {
        if scroll < start {
            Self::Before
        } else if scroll > end {
            Self::After
        } else {
            Self::Inside
        }
    }
}

/// Boundary crossing reported by a frame pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkageEvent {
    /// Crossed the start edge scrolling down.
    Enter,
    /// Crossed the end edge scrolling down.
    Leave,
    /// Crossed the end edge scrolling up.
    EnterBack,
    /// Crossed the start edge scrolling up.
    LeaveBack,
}

fn transitions(from: Side, to: Side) -> SmallVec<[LinkageEvent; 2]> {
    use LinkageEvent::*;
    match (from, to) {
        (Side::Before, Side::Inside) => smallvec::smallvec![Enter],
        (Side::Before, Side::After) => smallvec::smallvec![Enter, Leave],
        (Side::Inside, Side::After) => smallvec::smallvec![Leave],
        (Side::Inside, Side::Before) => smallvec::smallvec![LeaveBack],
        (Side::After, Side::Inside) => smallvec::smallvec![EnterBack],
        (Side::After, Side::Before) => smallvec::smallvec![EnterBack, LeaveBack],
        _ => SmallVec::new(),
    }
}

/// What a toggle linkage does to its playhead on one boundary event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleAction {
    /// Run forward from the current position.
    Play,
    /// Stop in place.
    Pause,
    /// Continue in the last direction.
    Resume,
    /// Run backward from the current position.
    Reverse,
    /// Jump to the start and run forward.
    Restart,
    /// Jump to the start and stop.
    Reset,
    /// Jump to the end and stop.
    Complete,
    /// Do nothing.
    None,
}

impl FromStr for ToggleAction {
    type Err = ScrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "play" => Self::Play,
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "reverse" => Self::Reverse,
            "restart" => Self::Restart,
            "reset" => Self::Reset,
            "complete" => Self::Complete,
            "none" => Self::None,
            other => {
                return Err(ScrollError::configuration(format!(
                    "unknown toggle action \"{other}\""
                )));
            }
        })
    }
}

/// Actions for the four boundary events, written `"onEnter onLeave onEnterBack onLeaveBack"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToggleActions {
    /// Start edge crossed downward.
    pub on_enter: ToggleAction,
    /// End edge crossed downward.
    pub on_leave: ToggleAction,
    /// End edge crossed upward.
    pub on_enter_back: ToggleAction,
    /// Start edge crossed upward.
    pub on_leave_back: ToggleAction,
}

impl Default for ToggleActions {
    fn default() -> Self {
        Self::PLAY_REVERSE
    }
}

impl ToggleActions {
    /// Play on enter, reverse when scrolling back above the start edge.
    pub const PLAY_REVERSE: Self = Self {
        on_enter: ToggleAction::Play,
        on_leave: ToggleAction::None,
        on_enter_back: ToggleAction::None,
        on_leave_back: ToggleAction::Reverse,
    };

    /// Action bound to `event`.
    pub fn for_event(&self, event: LinkageEvent) -> ToggleAction {
        match event {
            LinkageEvent::Enter => self.on_enter,
            LinkageEvent::Leave => self.on_leave,
            LinkageEvent::EnterBack => self.on_enter_back,
            LinkageEvent::LeaveBack => self.on_leave_back,
        }
    }
}

impl FromStr for ToggleActions {
    type Err = ScrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        let [enter, leave, enter_back, leave_back] = parts.as_slice() else {
            return Err(ScrollError::configuration(format!(
                "toggle actions \"{s}\" must name exactly four actions"
            )));
        };
        Ok(Self {
            on_enter: enter.parse()?,
            on_leave: leave.parse()?,
            on_enter_back: enter_back.parse()?,
            on_leave_back: leave_back.parse()?,
        })
    }
}

impl<'de> Deserialize<'de> for ToggleActions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Construction parameters of a linkage.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkageConfig {
    /// Element whose geometry defines the region.
    pub anchor: ElementId,
    /// Start edge; defaults to `"top bottom"`.
    pub start: Edge,
    /// End edge; defaults to `"bottom top"`.
    pub end: Edge,
    /// Playback mode.
    pub mode: PlaybackMode,
    /// Low-pass time constant in seconds for scrubbed progress; `None` tracks scroll directly.
    pub smoothing: Option<f64>,
    /// Toggle actions; the engine default when `None`.
    pub toggle_actions: Option<ToggleActions>,
    /// Pin configuration; `PinnedScrub` pins the anchor when `None`.
    pub pin: Option<PinSpec>,
}

impl LinkageConfig {
    /// Default edges for `anchor` in `mode`.
    pub fn new(anchor: ElementId, mode: PlaybackMode) -> Self {
        Self {
            anchor,
            start: Edge::DEFAULT_START,
            end: Edge::DEFAULT_END,
            mode,
            smoothing: None,
            toggle_actions: None,
            pin: None,
        }
    }

    /// Set the start edge.
    pub fn start(mut self, edge: Edge) -> Self {
        self.start = edge;
        self
    }

    /// Set the end edge.
    pub fn end(mut self, edge: Edge) -> Self {
        self.end = edge;
        self
    }

    /// Smooth scrubbed progress with time constant `seconds`.
    pub fn smoothing(mut self, seconds: f64) -> Self {
        self.smoothing = Some(seconds);
        self
    }

    /// Set toggle actions.
    pub fn toggle_actions(mut self, actions: ToggleActions) -> Self {
        self.toggle_actions = Some(actions);
        self
    }

    /// Set the pin configuration.
    pub fn pin(mut self, pin: PinSpec) -> Self {
        self.pin = Some(pin);
        self
    }

    /// Reject combinations no linkage can honor.
    pub fn validate(&self) -> ScrollResult<()> {
        if let Some(s) = self.smoothing {
            if !s.is_finite() || s <= 0.0 {
                return Err(ScrollError::configuration(format!(
                    "smoothing must be > 0 seconds (got {s})"
                )));
            }
            if self.mode == PlaybackMode::Toggle {
                return Err(ScrollError::configuration(
                    "smoothing only applies to scrubbed linkages",
                ));
            }
        }
        if self.pin.is_some() && self.mode != PlaybackMode::PinnedScrub {
            return Err(ScrollError::configuration(format!(
                "pin requires PinnedScrub mode (got {:?})",
                self.mode
            )));
        }
        if self.toggle_actions.is_some() && self.mode != PlaybackMode::Toggle {
            return Err(ScrollError::configuration(
                "toggle actions only apply to Toggle linkages",
            ));
        }
        Edge::validate_pair(self.start, self.end)
    }
}

/// Real-time playhead of a toggle linkage, in normalized timeline progress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Playhead {
    position: f64,
    reversed: bool,
    running: bool,
    duration: f64,
}

impl Playhead {
    /// Stopped playhead at progress 0 over a timeline of `duration` seconds.
    pub fn new(duration: f64) -> Self {
        Self {
            position: 0.0,
            reversed: false,
            running: false,
            duration,
        }
    }

    /// Normalized position.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Return `true` while the playhead moves.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Apply one toggle action.
    pub fn apply(&mut self, action: ToggleAction) {
        match action {
            ToggleAction::Play => {
                self.reversed = false;
                self.running = true;
            }
            ToggleAction::Pause => self.running = false,
            ToggleAction::Resume => self.running = true,
            ToggleAction::Reverse => {
                self.reversed = true;
                self.running = true;
            }
            ToggleAction::Restart => {
                self.position = 0.0;
                self.reversed = false;
                self.running = true;
            }
            ToggleAction::Reset => {
                self.position = 0.0;
                self.running = false;
            }
            ToggleAction::Complete => {
                self.position = 1.0;
                self.running = false;
            }
            ToggleAction::None => {}
        }
    }

    /// Advance by `dt` seconds; stops at either end.
    pub fn advance(&mut self, dt: f64) {
        if !self.running {
            return;
        }
        let goal = if self.reversed { 0.0 } else { 1.0 };
        if self.duration <= 0.0 {
            self.position = goal;
        } else {
            let delta = dt / self.duration;
            self.position = if self.reversed {
                (self.position - delta).max(0.0)
            } else {
                (self.position + delta).min(1.0)
            };
        }
        if self.position == goal {
            self.running = false;
        }
    }
}

/// Per-frame inputs shared by every linkage.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FrameInput {
    pub(crate) scroll: f64,
    pub(crate) dt: f64,
    pub(crate) epsilon: f64,
}

/// Outcome of one linkage update.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinkageStep {
    /// Boundary crossings in order.
    pub events: SmallVec<[LinkageEvent; 2]>,
    /// Progress to evaluate the timeline at, when it changed.
    pub render: Option<f64>,
    /// New placement of the pinned element, when it changed.
    pub pin: Option<(ElementId, PinState)>,
    /// The region stopped being measurable after a render; targets go back to baseline.
    pub restore: bool,
}

/// Binding of one timeline to one trigger region.
#[derive(Clone, Debug)]
pub struct Linkage {
    id: LinkageId,
    timeline: TimelineId,
    mode: PlaybackMode,
    region: TriggerRegion,
    smoothing: Option<f64>,
    actions: ToggleActions,
    state: LinkageState,
    side: Option<Side>,
    target: f64,
    rendered: Option<f64>,
    playhead: Playhead,
    pin: PinState,
}

impl Linkage {
    pub(crate) fn new(
        id: LinkageId,
        timeline: TimelineId,
        duration: f64,
        config: LinkageConfig,
        default_actions: ToggleActions,
    ) -> ScrollResult<Self> {
        config.validate()?;
        let pin = match config.mode {
            PlaybackMode::PinnedScrub => Some(config.pin.unwrap_or_default()),
            _ => None,
        };
        Ok(Self {
            id,
            timeline,
            mode: config.mode,
            region: TriggerRegion::new(config.anchor, config.start, config.end, pin)?,
            smoothing: config.smoothing,
            actions: config.toggle_actions.unwrap_or(default_actions),
            state: LinkageState::Idle,
            side: None,
            target: 0.0,
            rendered: None,
            playhead: Playhead::new(duration),
            pin: PinState::Unpinned,
        })
    }

    /// Linkage id.
    pub fn id(&self) -> LinkageId {
        self.id
    }

    /// Driven timeline.
    pub fn timeline(&self) -> TimelineId {
        self.timeline
    }

    /// Playback mode.
    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    /// Lifecycle state.
    pub fn state(&self) -> LinkageState {
        self.state
    }

    /// Last rendered progress (0 before the first render).
    pub fn progress(&self) -> f64 {
        self.rendered.unwrap_or(0.0)
    }

    /// Progress the linkage is moving toward.
    pub fn target_progress(&self) -> f64 {
        self.target
    }

    /// Current pin placement.
    pub fn pin_state(&self) -> PinState {
        self.pin
    }

    /// Trigger region.
    pub fn region(&self) -> &TriggerRegion {
        &self.region
    }

    pub(crate) fn region_mut(&mut self) -> &mut TriggerRegion {
        &mut self.region
    }

    /// Return `true` when the region contains `scroll`.
    pub fn contains(&self, scroll: f64) -> bool {
        self.region
            .range()
            .is_some_and(|(start, end)| Side::of(scroll, start, end) == Side::Inside)
    }

    /// Return `true` when further frames would not change the rendered progress.
    pub fn is_settled(&self) -> bool {
        if self.region.range().is_none() {
            return true;
        }
        match self.mode {
            PlaybackMode::Toggle => !self.playhead.is_running() && self.rendered.is_some(),
            _ => self.rendered == Some(self.target),
        }
    }

    /// Stop the linkage; returns the element to unpin when it held a pin.
    pub(crate) fn detach(&mut self) -> Option<ElementId> {
        self.state = LinkageState::Idle;
        self.side = None;
        self.playhead.apply(ToggleAction::Pause);
        if self.pin == PinState::Unpinned {
            return None;
        }
        self.pin = PinState::Unpinned;
        self.region.pin_element()
    }

    pub(crate) fn update(
        &mut self,
        key: LinkageKey,
        input: FrameInput,
        claim: &mut PinClaim,
    ) -> LinkageStep {
        let Some((start, end)) = self.region.range() else {
            return self.idle(key, claim);
        };

        let side = Side::of(input.scroll, start, end);
        let prev = self.side.replace(side);
        let was_inside = prev == Some(Side::Inside);
        let inside = side == Side::Inside;
        let raw = ((input.scroll - start) / (end - start)).clamp(0.0, 1.0);

        let mut step = LinkageStep {
            events: transitions(prev.unwrap_or(Side::Before), side),
            ..LinkageStep::default()
        };
        let mut waiting = false;

        match self.mode {
            PlaybackMode::Toggle => {
                for event in &step.events {
                    self.playhead.apply(self.actions.for_event(*event));
                }
                self.playhead.advance(input.dt);
                self.target = self.playhead.position();
                step.render = self.commit(self.target);
            }
            PlaybackMode::Scrub => {
                self.target = raw;
                step.render = self.settle(input);
            }
            PlaybackMode::PinnedScrub => {
                let holds = inside && claim.try_acquire(key);
                if !inside {
                    claim.release(key);
                }
                waiting = inside && !holds;
                if !waiting {
                    self.target = raw;
                }
                step.render = self.settle(input);

                let desired = if holds {
                    self.region.pinned_state().unwrap_or_default()
                } else if side == Side::After {
                    self.region.after_state()
                } else {
                    PinState::Unpinned
                };
                if desired != self.pin {
                    self.pin = desired;
                    step.pin = self.region.pin_element().map(|el| (el, desired));
                }
            }
        }

        self.state = match (was_inside, inside) {
            (false, true) => LinkageState::Entering,
            (true, true) if waiting => LinkageState::Entering,
            (true, true) => LinkageState::Active,
            (true, false) => LinkageState::Leaving,
            (false, false)
                if !step.events.is_empty()
                    || (self.state == LinkageState::Leaving && !self.is_settled()) =>
            {
                LinkageState::Leaving
            }
            (false, false) => LinkageState::Idle,
        };
        if !step.events.is_empty() {
            tracing::debug!(linkage = %self.id, events = ?step.events, state = ?self.state, "linkage crossed region boundary");
        }
        step
    }

    fn idle(&mut self, key: LinkageKey, claim: &mut PinClaim) -> LinkageStep {
        let mut step = LinkageStep::default();
        claim.release(key);
        if self.pin != PinState::Unpinned {
            self.pin = PinState::Unpinned;
            step.pin = self
                .region
                .pin_element()
                .map(|el| (el, PinState::Unpinned));
        }
        if matches!(self.region.measurement(), Measurement::Skipped(_))
            && self.rendered.take().is_some()
        {
            step.restore = true;
            self.target = 0.0;
            self.playhead.apply(ToggleAction::Reset);
        }
        self.side = None;
        self.state = LinkageState::Idle;
        step
    }

    fn settle(&mut self, input: FrameInput) -> Option<f64> {
        let next = match (self.rendered, self.smoothing) {
            (Some(current), Some(tau)) => {
                let blend = 1.0 - (-input.dt / tau).exp();
                let v = current + (self.target - current) * blend;
                if (self.target - v).abs() < input.epsilon {
                    self.target
                } else {
                    v
                }
            }
            _ => self.target,
        };
        self.commit(next)
    }

    fn commit(&mut self, progress: f64) -> Option<f64> {
        if self.rendered == Some(progress) {
            return None;
        }
        self.rendered = Some(progress);
        Some(progress)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scroll/linkage.rs"]
mod tests;
