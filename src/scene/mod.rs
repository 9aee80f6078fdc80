//! JSON page descriptions: element tree, sections and their timelines.

pub(crate) mod model;
/// Page loading and mounting.
pub mod page;
