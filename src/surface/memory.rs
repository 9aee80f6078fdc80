use std::collections::BTreeMap;

use serde::Serialize;

use crate::animation::value::{Property, PropertyValue};
use crate::foundation::core::Rect;
use crate::foundation::error::{ScrollError, ScrollResult};
use crate::foundation::ids::ElementId;
use crate::surface::{PinState, Query, Surface};

#[derive(Debug, Clone)]
struct Node {
    parent: Option<ElementId>,
    name: Option<String>,
    classes: Vec<String>,
    rect: Option<Rect>,
    mounted: bool,
    props: BTreeMap<Property, PropertyValue>,
    pin: PinState,
}

/// Property and pin state of one element, as seen by the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementSnapshot {
    /// Element handle.
    pub id: ElementId,
    /// Registered name, if any.
    pub name: Option<String>,
    /// Every property that has been set on the element.
    pub props: BTreeMap<Property, PropertyValue>,
    /// Current pin placement.
    pub pin: PinState,
}

/// Flat in-memory document: element tree, geometry and property storage.
///
/// Element ids are allocated in document order, so queries return matches in creation order.
#[derive(Debug, Default, Clone)]
pub struct MemorySurface {
    nodes: Vec<Node>,
    names: BTreeMap<String, ElementId>,
    writes: u64,
}

impl MemorySurface {
    /// Empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element under `parent` with natural bounds `rect`.
    pub fn add(&mut self, parent: Option<ElementId>, rect: Option<Rect>) -> ElementId {
        let id = ElementId(self.nodes.len() as u32);
        self.nodes.push(Node {
            parent,
            name: None,
            classes: Vec::new(),
            rect,
            mounted: true,
            props: BTreeMap::new(),
            pin: PinState::Unpinned,
        });
        id
    }

    /// Register a unique name for `#name` queries.
    pub fn set_name(&mut self, id: ElementId, name: impl Into<String>) -> ScrollResult<()> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(ScrollError::configuration(format!(
                "duplicate element name '{name}'"
            )));
        }
        let node = self.node_mut(id)?;
        node.name = Some(name.clone());
        self.names.insert(name, id);
        Ok(())
    }

    /// Attach a class for `.class` queries.
    pub fn add_class(&mut self, id: ElementId, class: impl Into<String>) -> ScrollResult<()> {
        self.node_mut(id)?.classes.push(class.into());
        Ok(())
    }

    /// Replace natural bounds; `None` models an element that is not laid out.
    pub fn set_rect(&mut self, id: ElementId, rect: Option<Rect>) -> ScrollResult<()> {
        self.node_mut(id)?.rect = rect;
        Ok(())
    }

    /// Seed a property without counting it as an animation write.
    pub fn set_style(
        &mut self,
        id: ElementId,
        property: Property,
        value: PropertyValue,
    ) -> ScrollResult<()> {
        self.node_mut(id)?.props.insert(property, value);
        Ok(())
    }

    /// Detach an element and its descendants.
    pub fn unmount(&mut self, id: ElementId) {
        self.set_mounted_subtree(id, false);
    }

    /// Re-attach an element and its descendants.
    pub fn mount(&mut self, id: ElementId) {
        self.set_mounted_subtree(id, true);
    }

    /// Look up an element by registered name.
    pub fn lookup(&self, name: &str) -> Option<ElementId> {
        self.names.get(name).copied()
    }

    /// Registered name of an element.
    pub fn name_of(&self, id: ElementId) -> Option<&str> {
        self.nodes.get(id.0 as usize)?.name.as_deref()
    }

    /// Effective property value: the stored value or the property's identity.
    pub fn value(&self, id: ElementId, property: Property) -> PropertyValue {
        self.read(id, property)
            .unwrap_or_else(|| property.identity())
    }

    /// Scalar shortcut for [`MemorySurface::value`]; colors read as `NaN`.
    pub fn scalar(&self, id: ElementId, property: Property) -> f64 {
        self.value(id, property).as_scalar().unwrap_or(f64::NAN)
    }

    /// Current pin placement.
    pub fn pin(&self, id: ElementId) -> PinState {
        self.nodes
            .get(id.0 as usize)
            .map(|n| n.pin)
            .unwrap_or_default()
    }

    /// Number of property writes received through [`Surface::write`].
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    /// Number of elements ever added.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Return `true` when the document has no elements.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Snapshot of every element in document order.
    pub fn snapshot(&self) -> Vec<ElementSnapshot> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| ElementSnapshot {
                id: ElementId(i as u32),
                name: n.name.clone(),
                props: n.props.clone(),
                pin: n.pin,
            })
            .collect()
    }

    fn node_mut(&mut self, id: ElementId) -> ScrollResult<&mut Node> {
        self.nodes
            .get_mut(id.0 as usize)
            .ok_or_else(|| ScrollError::resolution(format!("unknown element {id}")))
    }

    fn set_mounted_subtree(&mut self, root: ElementId, mounted: bool) {
        for i in 0..self.nodes.len() {
            let id = ElementId(i as u32);
            if self.is_descendant_or_self(root, id) {
                self.nodes[i].mounted = mounted;
            }
        }
    }

    fn is_descendant_or_self(&self, scope: ElementId, mut element: ElementId) -> bool {
        loop {
            if element == scope {
                return true;
            }
            match self.nodes.get(element.0 as usize).and_then(|n| n.parent) {
                Some(parent) => element = parent,
                None => return false,
            }
        }
    }
}

impl Surface for MemorySurface {
    fn is_mounted(&self, element: ElementId) -> bool {
        self.nodes
            .get(element.0 as usize)
            .is_some_and(|n| n.mounted)
    }

    fn contains(&self, scope: ElementId, element: ElementId) -> bool {
        (element.0 as usize) < self.nodes.len() && self.is_descendant_or_self(scope, element)
    }

    fn query(&self, scope: ElementId, query: Query<'_>) -> Vec<ElementId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.mounted)
            .filter(|(_, n)| match query {
                Query::Class(class) => n.classes.iter().any(|c| c == class),
                Query::Name(name) => n.name.as_deref() == Some(name),
            })
            .map(|(i, _)| ElementId(i as u32))
            .filter(|id| self.is_descendant_or_self(scope, *id))
            .collect()
    }

    fn read(&self, element: ElementId, property: Property) -> Option<PropertyValue> {
        self.nodes.get(element.0 as usize)?.props.get(&property).copied()
    }

    fn write(&mut self, element: ElementId, property: Property, value: PropertyValue) {
        if let Some(node) = self.nodes.get_mut(element.0 as usize) {
            node.props.insert(property, value);
            self.writes += 1;
        }
    }

    fn measure(&self, element: ElementId) -> Option<Rect> {
        let node = self.nodes.get(element.0 as usize)?;
        if !node.mounted {
            return None;
        }
        node.rect
    }

    fn set_pin(&mut self, element: ElementId, pin: PinState) {
        if let Some(node) = self.nodes.get_mut(element.0 as usize) {
            node.pin = pin;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/memory.rs"]
mod tests;
