//! Rendering-surface boundary.
//!
//! The engine never touches element attributes outside the animatable property vocabulary; it
//! reads geometry, reads/writes properties and reports pin transitions through [`Surface`].

use serde::Serialize;

use crate::animation::value::{Property, PropertyValue};
use crate::foundation::core::Rect;
use crate::foundation::ids::ElementId;

/// In-memory surface used by tests and the simulator.
pub mod memory;

/// Selector-style queries a surface resolves inside a scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query<'a> {
    /// Elements carrying a class.
    Class(&'a str),
    /// Elements registered under a unique name.
    Name(&'a str),
}

/// Placement of a pinned (or previously pinned) element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PinState {
    /// Normal document flow.
    #[default]
    Unpinned,
    /// Held at `viewport_top` pixels below the viewport top; scroll input drives progress.
    Pinned {
        /// Fixed distance from the viewport top edge.
        viewport_top: f64,
        /// Spacer height the host inserts so following content keeps its distance.
        spacer: f64,
    },
    /// Back in flow after the pinned window, displaced by the consumed spacer.
    After {
        /// Downward displacement in document space.
        offset: f64,
    },
}

impl PinState {
    /// Return `true` while the element is held fixed.
    pub fn is_pinned(self) -> bool {
        matches!(self, Self::Pinned { .. })
    }
}

/// Host rendering surface.
pub trait Surface {
    /// Return `true` when the element exists and is attached to the document.
    fn is_mounted(&self, element: ElementId) -> bool;

    /// Return `true` when `element` is `scope` or one of its descendants.
    fn contains(&self, scope: ElementId, element: ElementId) -> bool;

    /// Resolve a query among `scope` and its descendants, in document order.
    fn query(&self, scope: ElementId, query: Query<'_>) -> Vec<ElementId>;

    /// Current value of a property, or `None` when the element never set it.
    fn read(&self, element: ElementId, property: Property) -> Option<PropertyValue>;

    /// Commit a property value to the live element.
    fn write(&mut self, element: ElementId, property: Property, value: PropertyValue);

    /// Natural (unpinned, untransformed) document-space bounds, or `None` when not laid out.
    fn measure(&self, element: ElementId) -> Option<Rect>;

    /// Apply a pin transition.
    fn set_pin(&mut self, element: ElementId, pin: PinState);
}
