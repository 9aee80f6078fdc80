//! Scroll linkage: trigger geometry, playback state machine and pin ownership.

pub(crate) mod claim;
pub(crate) mod edge;
pub(crate) mod linkage;
pub(crate) mod region;
