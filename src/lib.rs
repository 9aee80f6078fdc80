//! Scrollsync is a scroll-synchronized animation orchestration engine.
//!
//! Sections of a page register declarative [`Timeline`]s inside an [`OrchestrationContext`] and
//! bind them to scroll position through [`LinkageConfig`]s (toggle, scrub or pinned scrub). The
//! host forwards scroll, resize and content notifications to a [`ScrollEngine`] and calls
//! [`ScrollEngine::frame`] once per display frame; property writes go to a [`Surface`].
//!
//! - Describe a page as JSON and load it with [`Page`]
//! - Mount it into a [`ScrollEngine`] against a [`Surface`] (for tests, [`MemorySurface`])
//! - Drive frames and inspect the [`FrameReport`]s
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod layout;
pub(crate) mod orchestrate;
pub(crate) mod registry;
/// Declarative page descriptions.
pub mod scene;
pub(crate) mod scroll;
/// Host rendering-surface boundary.
pub mod surface;

pub use crate::foundation::core::{Rect, Rgba8, Vec2, Vec3, Viewport};
pub use crate::foundation::error::{ScrollError, ScrollResult};
pub use crate::foundation::ids::{ContextId, ElementId, LinkageId, TimelineId};

pub use crate::animation::ease::{Ease, ease_fn};
pub use crate::animation::timeline::{
    DEFAULT_DURATION, PlacedSegment, Position, PropertyWrite, Segment, Timeline,
};
pub use crate::animation::value::{
    Lerp, Property, PropertyKind, PropertyMap, PropertyValue, ValueSpec,
};
pub use crate::layout::{LayoutCoordinator, RefreshReport};
pub use crate::orchestrate::clock::{ClockDriver, ClockPlayback, Repeat};
pub use crate::orchestrate::context::{OrchestrationContext, RevertReport, RevertSignal};
pub use crate::orchestrate::engine::{EngineOpts, EventRecord, FrameReport, ScrollEngine};
pub use crate::registry::{
    AnimationTarget, BaselineSource, CAPTURED_PROPERTIES, ElementRegistry, Requirement, Selector,
};
pub use crate::scene::page::{MountReport, Page, SectionReport, TimelineReport};
pub use crate::scroll::claim::{LinkageKey, PinClaim};
pub use crate::scroll::edge::{Anchor, Edge, Length};
pub use crate::scroll::linkage::{
    Linkage, LinkageConfig, LinkageEvent, LinkageState, LinkageStep, PlaybackMode, Playhead, Side,
    ToggleAction, ToggleActions,
};
pub use crate::scroll::region::{Measurement, PinSpec, SkipReason, TriggerRegion};
pub use crate::surface::memory::{ElementSnapshot, MemorySurface};
pub use crate::surface::{PinState, Query, Surface};
