//! Orchestration: scoped contexts, clock playback and the per-frame engine.

pub(crate) mod clock;
pub(crate) mod context;
pub(crate) mod engine;
