use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::foundation::core::{Rgba8, Vec2, Vec3};
use crate::foundation::error::{ScrollError, ScrollResult};

/// Interpolation contract for animation value types.
pub trait Lerp: Sized {
    /// Interpolate from `a` to `b` with normalized factor `t` in `[0, 1]`.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

impl Lerp for Vec3 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec3::new(
            a.x + (b.x - a.x) * t,
            a.y + (b.y - a.y) * t,
            a.z + (b.z - a.z) * t,
        )
    }
}

impl Lerp for Rgba8 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        fn lerp_u8(a: u8, b: u8, t: f64) -> u8 {
            let a = f64::from(a);
            let b = f64::from(b);
            (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
        }

        Self {
            r: lerp_u8(a.r, b.r, t),
            g: lerp_u8(a.g, b.g, t),
            b: lerp_u8(a.b, b.b, t),
            a: lerp_u8(a.a, b.a, t),
        }
    }
}

/// The fixed vocabulary of animatable properties.
///
/// Rotations are in degrees and interpolate linearly (no shortest-path wrapping).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Property {
    /// Horizontal translation offset in pixels.
    X,
    /// Vertical translation offset in pixels.
    Y,
    /// Depth translation offset in pixels.
    Z,
    /// Rotation around the horizontal axis, degrees.
    RotateX,
    /// Rotation around the vertical axis, degrees.
    RotateY,
    /// Rotation in the screen plane, degrees.
    #[serde(alias = "rotate", alias = "rotation")]
    RotateZ,
    /// Uniform scale. Expanded to `ScaleX` + `ScaleY` when placed in a [`PropertyMap`].
    Scale,
    /// Horizontal scale factor.
    ScaleX,
    /// Vertical scale factor.
    ScaleY,
    /// Opacity in `[0, 1]`.
    Opacity,
    /// Foreground color.
    Color,
    /// Background color.
    BackgroundColor,
}

/// Value shape of a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyKind {
    /// Plain number.
    Scalar,
    /// RGBA color.
    Color,
}

impl Property {
    /// Value shape accepted by this property.
    pub fn kind(self) -> PropertyKind {
        match self {
            Self::Color | Self::BackgroundColor => PropertyKind::Color,
            _ => PropertyKind::Scalar,
        }
    }

    /// Value of the property on an element that has never been styled.
    pub fn identity(self) -> PropertyValue {
        match self {
            Self::X | Self::Y | Self::Z | Self::RotateX | Self::RotateY | Self::RotateZ => {
                PropertyValue::Scalar(0.0)
            }
            Self::Scale | Self::ScaleX | Self::ScaleY | Self::Opacity => {
                PropertyValue::Scalar(1.0)
            }
            Self::Color => PropertyValue::Color(Rgba8::rgb(0, 0, 0)),
            Self::BackgroundColor => PropertyValue::Color(Rgba8::transparent()),
        }
    }
}

/// A concrete value written to (or read from) an element property.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Numeric value (offsets, angles, scale factors, opacity).
    Scalar(f64),
    /// Color value.
    Color(Rgba8),
}

impl PropertyValue {
    /// Value shape of this value.
    pub fn kind(self) -> PropertyKind {
        match self {
            Self::Scalar(_) => PropertyKind::Scalar,
            Self::Color(_) => PropertyKind::Color,
        }
    }

    /// Numeric payload, if scalar.
    pub fn as_scalar(self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::Color(_) => None,
        }
    }

    /// Color payload, if color.
    pub fn as_color(self) -> Option<Rgba8> {
        match self {
            Self::Color(c) => Some(c),
            Self::Scalar(_) => None,
        }
    }
}

impl Lerp for PropertyValue {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        match (a, b) {
            (Self::Scalar(a), Self::Scalar(b)) => Self::Scalar(f64::lerp(a, b, t)),
            (Self::Color(a), Self::Color(b)) => Self::Color(Rgba8::lerp(a, b, t)),
            // Mixed shapes are rejected when segments are built; hold the start value.
            _ if t < 1.0 => *a,
            _ => *b,
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Rgba8> for PropertyValue {
    fn from(value: Rgba8) -> Self {
        Self::Color(value)
    }
}

/// An authored property value: fixed, or computed from the target's index in its list.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueSpec {
    /// `base + index * step` for the target at `index`.
    Indexed {
        /// Value for target 0.
        base: f64,
        /// Increment per target index.
        step: f64,
    },
    /// Same value for every target.
    Fixed(PropertyValue),
}

impl ValueSpec {
    /// Resolve this value for the target at `index`.
    pub fn resolve(self, index: usize) -> PropertyValue {
        match self {
            Self::Indexed { base, step } => PropertyValue::Scalar(base + step * index as f64),
            Self::Fixed(v) => v,
        }
    }

    fn kind(self) -> PropertyKind {
        match self {
            Self::Indexed { .. } => PropertyKind::Scalar,
            Self::Fixed(v) => v.kind(),
        }
    }
}

impl From<f64> for ValueSpec {
    fn from(value: f64) -> Self {
        Self::Fixed(PropertyValue::Scalar(value))
    }
}

impl From<Rgba8> for ValueSpec {
    fn from(value: Rgba8) -> Self {
        Self::Fixed(PropertyValue::Color(value))
    }
}

/// Ordered set of authored property values.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PropertyMap {
    values: BTreeMap<Property, ValueSpec>,
}

impl PropertyMap {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; see [`PropertyMap::insert`].
    pub fn with(mut self, property: Property, value: impl Into<ValueSpec>) -> Self {
        self.insert(property, value);
        self
    }

    /// Insert a value. Uniform `Scale` is stored as `ScaleX` + `ScaleY`.
    pub fn insert(&mut self, property: Property, value: impl Into<ValueSpec>) {
        let value = value.into();
        if property == Property::Scale {
            self.values.insert(Property::ScaleX, value);
            self.values.insert(Property::ScaleY, value);
        } else {
            self.values.insert(property, value);
        }
    }

    /// Convenience for a 2D translation.
    pub fn translate(self, offset: Vec2) -> Self {
        self.with(Property::X, offset.x).with(Property::Y, offset.y)
    }

    /// Convenience for a 3D translation.
    pub fn translate3d(self, offset: Vec3) -> Self {
        self.translate(Vec2::new(offset.x, offset.y))
            .with(Property::Z, offset.z)
    }

    /// Look up an authored value.
    pub fn get(&self, property: Property) -> Option<ValueSpec> {
        self.values.get(&property).copied()
    }

    /// Properties in stable order.
    pub fn properties(&self) -> impl Iterator<Item = Property> + '_ {
        self.values.keys().copied()
    }

    /// Iterate authored values in stable property order.
    pub fn iter(&self) -> impl Iterator<Item = (Property, ValueSpec)> + '_ {
        self.values.iter().map(|(p, v)| (*p, *v))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Return `true` when no property is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check every value matches its property's shape.
    pub fn validate(&self) -> ScrollResult<()> {
        for (property, value) in &self.values {
            if property.kind() != value.kind() {
                return Err(ScrollError::configuration(format!(
                    "property {property:?} expects a {:?} value",
                    property.kind()
                )));
            }
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for PropertyMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = BTreeMap::<Property, ValueSpec>::deserialize(deserializer)?;
        let mut out = Self::new();
        for (property, value) in raw {
            out.insert(property, value);
        }
        Ok(out)
    }
}

impl FromIterator<(Property, ValueSpec)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (Property, ValueSpec)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (property, value) in iter {
            out.insert(property, value);
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/value.rs"]
mod tests;
