//! Element registry: scoped target resolution and baseline bookkeeping.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use std::sync::Arc;

use crate::animation::value::{Property, PropertyValue};
use crate::foundation::error::{ScrollError, ScrollResult};
use crate::foundation::ids::ElementId;
use crate::surface::{Query, Surface};

/// Concrete properties captured into a baseline (uniform `Scale` is never stored).
pub const CAPTURED_PROPERTIES: [Property; 11] = [
    Property::X,
    Property::Y,
    Property::Z,
    Property::RotateX,
    Property::RotateY,
    Property::RotateZ,
    Property::ScaleX,
    Property::ScaleY,
    Property::Opacity,
    Property::Color,
    Property::BackgroundColor,
];

/// How a group of targets is addressed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    /// One explicit element handle.
    Ref(ElementId),
    /// An indexed list of element handles; unmounted entries are skipped.
    Refs(Vec<ElementId>),
    /// Every element with this class inside the scope (`.class`).
    Class(String),
    /// The element registered under this name inside the scope (`#name`).
    Name(String),
}

impl FromStr for Selector {
    type Err = ScrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(class) = s.strip_prefix('.').filter(|c| !c.is_empty()) {
            return Ok(Self::Class(class.to_owned()));
        }
        if let Some(name) = s.strip_prefix('#').filter(|n| !n.is_empty()) {
            return Ok(Self::Name(name.to_owned()));
        }
        Err(ScrollError::configuration(format!(
            "selector \"{s}\" must be \".class\" or \"#name\""
        )))
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ref(id) => write!(f, "{id}"),
            Self::Refs(ids) => write!(f, "[{} refs]", ids.len()),
            Self::Class(c) => write!(f, ".{c}"),
            Self::Name(n) => write!(f, "#{n}"),
        }
    }
}

/// Whether a selector matching nothing is an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Requirement {
    /// Zero matches raise [`ScrollError::Resolution`].
    #[default]
    Required,
    /// Zero matches resolve to an empty target list.
    Optional,
}

/// Ownership-free reference to one element under animation control.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimationTarget {
    /// Resolved element handle.
    pub element: ElementId,
    /// Position in the resolved list (drives stagger and indexed values).
    pub index: usize,
    /// The selector that produced this target.
    pub source: Arc<str>,
}

/// Read access to captured baselines, used by timeline evaluation.
pub trait BaselineSource {
    /// Baseline of `property` on `element`; the property identity when nothing was captured.
    fn baseline(&self, element: ElementId, property: Property) -> PropertyValue;
}

#[derive(Debug, Clone, Default)]
struct Baseline {
    values: BTreeMap<Property, PropertyValue>,
    touched: BTreeSet<Property>,
}

/// Per-context registry of resolved targets and their captured baselines.
#[derive(Debug)]
pub struct ElementRegistry {
    scope: ElementId,
    baselines: BTreeMap<ElementId, Baseline>,
}

impl ElementRegistry {
    /// Registry resolving inside `scope`.
    pub fn new(scope: ElementId) -> Self {
        Self {
            scope,
            baselines: BTreeMap::new(),
        }
    }

    /// Scope root of this registry.
    pub fn scope(&self) -> ElementId {
        self.scope
    }

    /// Resolve a selector inside the scope.
    pub fn resolve(
        &self,
        surface: &dyn Surface,
        selector: &Selector,
        requirement: Requirement,
    ) -> ScrollResult<Vec<AnimationTarget>> {
        let scope = self.scope;
        let in_scope = |id: &ElementId| surface.is_mounted(*id) && surface.contains(scope, *id);
        let elements: Vec<ElementId> = match selector {
            Selector::Ref(id) => std::iter::once(*id).filter(in_scope).collect(),
            Selector::Refs(ids) => ids.iter().copied().filter(in_scope).collect(),
            Selector::Class(class) => surface.query(scope, Query::Class(class)),
            Selector::Name(name) => surface.query(scope, Query::Name(name)),
        };

        if elements.is_empty() && requirement == Requirement::Required {
            return Err(ScrollError::resolution(format!(
                "selector {selector} matched no elements in scope {scope}"
            )));
        }

        let source: Arc<str> = Arc::from(selector.to_string());
        Ok(elements
            .into_iter()
            .enumerate()
            .map(|(index, element)| AnimationTarget {
                element,
                index,
                source: Arc::clone(&source),
            })
            .collect())
    }

    /// Record the current values of every animatable property of `element`.
    ///
    /// Returns `false` when the element was already captured; the first capture wins.
    pub fn capture_baseline(&mut self, surface: &dyn Surface, element: ElementId) -> bool {
        if self.baselines.contains_key(&element) {
            return false;
        }
        let values = CAPTURED_PROPERTIES
            .iter()
            .map(|p| (*p, surface.read(element, *p).unwrap_or_else(|| p.identity())))
            .collect();
        self.baselines.insert(
            element,
            Baseline {
                values,
                touched: BTreeSet::new(),
            },
        );
        tracing::trace!(%element, "captured baseline");
        true
    }

    /// Return `true` when `element` has a captured baseline.
    pub fn is_captured(&self, element: ElementId) -> bool {
        self.baselines.contains_key(&element)
    }

    /// Write property values to the live element, capturing its baseline first if needed.
    pub fn apply(
        &mut self,
        surface: &mut dyn Surface,
        element: ElementId,
        properties: &[(Property, PropertyValue)],
    ) {
        self.capture_baseline(surface, element);
        let Some(baseline) = self.baselines.get_mut(&element) else {
            return;
        };
        for (property, value) in properties {
            baseline.touched.insert(*property);
            surface.write(element, *property, *value);
        }
    }

    /// Re-apply the captured baseline of every property this registry wrote.
    ///
    /// No-op for elements that were never captured or never written.
    pub fn restore(&mut self, surface: &mut dyn Surface, element: ElementId) -> usize {
        let Some(baseline) = self.baselines.get_mut(&element) else {
            return 0;
        };
        let touched = std::mem::take(&mut baseline.touched);
        for property in &touched {
            if let Some(value) = baseline.values.get(property) {
                surface.write(element, *property, *value);
            }
        }
        touched.len()
    }
}

impl BaselineSource for ElementRegistry {
    fn baseline(&self, element: ElementId, property: Property) -> PropertyValue {
        self.baselines
            .get(&element)
            .and_then(|b| b.values.get(&property))
            .copied()
            .unwrap_or_else(|| property.identity())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/registry/registry.rs"]
mod tests;
