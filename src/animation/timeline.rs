use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::animation::ease::Ease;
use crate::animation::value::{Lerp, Property, PropertyMap, PropertyValue};
use crate::foundation::error::{ScrollError, ScrollResult};
use crate::foundation::ids::ElementId;
use crate::registry::{AnimationTarget, BaselineSource};

/// Default segment duration in timeline seconds.
pub const DEFAULT_DURATION: f64 = 0.5;

const FIT_EPSILON: f64 = 1e-9;

/// Where a segment (or label) is placed on its timeline.
///
/// String forms: `"1.5"` absolute, `"+=0.2"` / `"-=0.5"` relative to the current end,
/// `"<"` with the previous segment, `">"` after the previous segment, `"intro"` or
/// `"intro+=0.3"` relative to a label.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Position {
    /// At the current end of the timeline.
    #[default]
    Append,
    /// At an absolute timeline offset.
    At(f64),
    /// Offset from the current end of the timeline; clamped at zero.
    Relative(f64),
    /// Same start as the previously added segment.
    WithPrevious,
    /// Right after the previously added segment ends.
    AfterPrevious,
    /// Offset from a named label.
    Label(String, f64),
}

impl FromStr for Position {
    type Err = ScrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bad = || ScrollError::configuration(format!("invalid timeline position \"{s}\""));
        match s {
            "" => return Ok(Self::Append),
            "<" => return Ok(Self::WithPrevious),
            ">" => return Ok(Self::AfterPrevious),
            _ => {}
        }
        if let Ok(v) = s.parse::<f64>() {
            return Ok(Self::At(v));
        }
        if let Some(rest) = s.strip_prefix("+=") {
            return rest.parse().map(Self::Relative).map_err(|_| bad());
        }
        if let Some(rest) = s.strip_prefix("-=") {
            return rest.parse::<f64>().map(|v| Self::Relative(-v)).map_err(|_| bad());
        }
        let (label, offset) = if let Some((label, rest)) = s.split_once("+=") {
            (label, rest.parse::<f64>().map_err(|_| bad())?)
        } else if let Some((label, rest)) = s.split_once("-=") {
            (label, -rest.parse::<f64>().map_err(|_| bad())?)
        } else {
            (s, 0.0)
        };
        if label.is_empty() || !label.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
            return Err(bad());
        }
        Ok(Self::Label(label.to_owned(), offset))
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(f64),
            Str(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Num(v) => Ok(Self::At(v)),
            Repr::Str(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// One property interpolation over a list of targets.
///
/// Properties missing from `from` start at the value the property holds just before this
/// segment (baseline, or the `to` of an earlier segment); properties missing from `to` end there.
#[derive(Clone, Debug)]
pub struct Segment {
    targets: Vec<AnimationTarget>,
    from: PropertyMap,
    to: PropertyMap,
    duration: f64,
    ease: Ease,
    stagger: f64,
    immediate_render: bool,
}

impl Segment {
    /// Animate from explicit start values to explicit end values.
    pub fn from_to(targets: Vec<AnimationTarget>, from: PropertyMap, to: PropertyMap) -> Self {
        Self {
            targets,
            from,
            to,
            duration: DEFAULT_DURATION,
            ease: Ease::default(),
            stagger: 0.0,
            immediate_render: false,
        }
    }

    /// Animate from the current value to `to`.
    pub fn to(targets: Vec<AnimationTarget>, to: PropertyMap) -> Self {
        Self::from_to(targets, PropertyMap::new(), to)
    }

    /// Animate from `from` back to the current value.
    pub fn from(targets: Vec<AnimationTarget>, from: PropertyMap) -> Self {
        Self::from_to(targets, from, PropertyMap::new())
    }

    /// Per-target duration in timeline seconds.
    pub fn duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Easing curve.
    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    /// Per-target start offset: target `i` starts `i * stagger` after the segment start.
    pub fn stagger(mut self, stagger: f64) -> Self {
        self.stagger = stagger;
        self
    }

    /// Write the `from` state while the window is still in the future, when this is the
    /// first segment touching the property.
    pub fn immediate_render(mut self, on: bool) -> Self {
        self.immediate_render = on;
        self
    }

    /// Resolved targets.
    pub fn targets(&self) -> &[AnimationTarget] {
        &self.targets
    }

    /// Per-target duration.
    pub fn duration_secs(&self) -> f64 {
        self.duration
    }

    /// Length from the first target's start to the last target's end.
    pub fn span(&self) -> f64 {
        let n = self.targets.len().max(1);
        self.duration + self.stagger * (n - 1) as f64
    }

    /// Animated properties in stable order.
    pub fn properties(&self) -> BTreeSet<Property> {
        self.from.properties().chain(self.to.properties()).collect()
    }

    fn validate(&self) -> ScrollResult<()> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(ScrollError::configuration(format!(
                "segment duration must be > 0 (got {})",
                self.duration
            )));
        }
        if !self.stagger.is_finite() || self.stagger < 0.0 {
            return Err(ScrollError::configuration(format!(
                "segment stagger must be >= 0 (got {})",
                self.stagger
            )));
        }
        self.from.validate()?;
        self.to.validate()
    }
}

/// A segment placed at a resolved start offset.
#[derive(Clone, Debug)]
pub struct PlacedSegment {
    /// The segment definition.
    pub segment: Segment,
    /// Resolved start offset in timeline seconds.
    pub start: f64,
}

impl PlacedSegment {
    /// Active window `[start, end]` of the target at `index`.
    pub fn window(&self, index: usize) -> (f64, f64) {
        let s = self.start + self.segment.stagger * index as f64;
        (s, s + self.segment.duration)
    }

    /// End of the last target's window.
    pub fn end(&self) -> f64 {
        self.start + self.segment.span()
    }
}

/// One committed property value produced by evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PropertyWrite {
    /// Target element.
    pub element: ElementId,
    /// Written property.
    pub property: Property,
    /// Written value.
    pub value: PropertyValue,
}

/// Ordered segments sharing one progress axis.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    segments: Vec<PlacedSegment>,
    // Indices into `segments`, sorted by (start, registration order).
    eval_order: Vec<usize>,
    labels: BTreeMap<String, f64>,
    fixed_length: Option<f64>,
    unbounded: bool,
    last_window: Option<(f64, f64)>,
}

impl Timeline {
    /// Timeline whose length grows to fit its segments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeline with a nominal length; segments must fit inside unless marked unbounded.
    pub fn with_length(length: f64) -> ScrollResult<Self> {
        if !length.is_finite() || length <= 0.0 {
            return Err(ScrollError::configuration(format!(
                "timeline length must be > 0 (got {length})"
            )));
        }
        Ok(Self {
            fixed_length: Some(length),
            ..Self::default()
        })
    }

    /// Allow segments to run past the nominal length (continuous or looping content).
    pub fn unbounded(mut self) -> Self {
        self.unbounded = true;
        self
    }

    /// Current end: the latest segment end, or zero.
    pub fn end(&self) -> f64 {
        self.segments
            .iter()
            .map(PlacedSegment::end)
            .fold(0.0, f64::max)
    }

    /// Length of the progress axis in timeline seconds.
    pub fn length(&self) -> f64 {
        self.fixed_length.unwrap_or_else(|| self.end())
    }

    /// Placed segments in registration order.
    pub fn segments(&self) -> &[PlacedSegment] {
        &self.segments
    }

    /// Resolved label offset.
    pub fn label(&self, name: &str) -> Option<f64> {
        self.labels.get(name).copied()
    }

    /// Every element animated by this timeline, in first-registration order.
    pub fn elements(&self) -> Vec<ElementId> {
        let mut seen = BTreeSet::new();
        self.segments
            .iter()
            .flat_map(|p| p.segment.targets.iter().map(|t| t.element))
            .filter(|e| seen.insert(*e))
            .collect()
    }

    /// Place a label; later positions may refer to it.
    pub fn add_label(&mut self, name: impl Into<String>, position: Position) -> ScrollResult<f64> {
        let at = self.resolve_position(&position)?;
        self.labels.insert(name.into(), at);
        Ok(at)
    }

    /// Add a segment and return its resolved start offset.
    pub fn add(&mut self, segment: Segment, position: Position) -> ScrollResult<f64> {
        segment.validate()?;
        let start = self.resolve_position(&position)?;
        let placed = PlacedSegment { segment, start };
        let end = placed.end();
        if let Some(length) = self.fixed_length
            && !self.unbounded
            && end > length + FIT_EPSILON
        {
            return Err(ScrollError::configuration(format!(
                "segment window [{start}, {end}] exceeds timeline length {length}"
            )));
        }

        self.last_window = Some((start, end));
        self.segments.push(placed);
        let idx = self.segments.len() - 1;
        let at = self
            .eval_order
            .partition_point(|&i| self.segments[i].start <= start);
        self.eval_order.insert(at, idx);
        Ok(start)
    }

    fn resolve_position(&self, position: &Position) -> ScrollResult<f64> {
        let at = match position {
            Position::Append => self.end(),
            Position::At(t) => *t,
            Position::Relative(d) => (self.end() + d).max(0.0),
            Position::WithPrevious => self.last_window.map_or(0.0, |w| w.0),
            Position::AfterPrevious => self.last_window.map_or(0.0, |w| w.1),
            Position::Label(name, offset) => {
                let base = self.labels.get(name).ok_or_else(|| {
                    ScrollError::configuration(format!("unknown timeline label \"{name}\""))
                })?;
                (base + offset).max(0.0)
            }
        };
        if !at.is_finite() || at < 0.0 {
            return Err(ScrollError::configuration(format!(
                "timeline position must be >= 0 (got {at})"
            )));
        }
        Ok(at)
    }

    /// Evaluate at normalized progress in `[0, 1]` (clamped).
    pub fn evaluate(&self, progress: f64, baselines: &dyn BaselineSource) -> Vec<PropertyWrite> {
        let p = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        self.evaluate_at(p * self.length(), baselines)
    }

    /// Evaluate at an absolute timeline offset.
    ///
    /// Pure function of `time` and the baselines: segments run in ascending start order
    /// (registration order breaks ties) and the last started segment wins per property.
    pub fn evaluate_at(&self, time: f64, baselines: &dyn BaselineSource) -> Vec<PropertyWrite> {
        type Key = (ElementId, Property);

        let mut settled: BTreeMap<Key, PropertyValue> = BTreeMap::new();
        let mut current: BTreeMap<Key, PropertyValue> = BTreeMap::new();
        let mut claimed: BTreeSet<Key> = BTreeSet::new();

        for &idx in &self.eval_order {
            let placed = &self.segments[idx];
            let seg = &placed.segment;
            let properties = seg.properties();

            for target in &seg.targets {
                let (win_start, _) = placed.window(target.index);
                let local = (time - win_start) / seg.duration;

                for &property in &properties {
                    let key = (target.element, property);
                    let base = baselines.baseline(target.element, property);
                    let before = settled.get(&key).copied().unwrap_or(base);
                    let from = seg.from.get(property).map_or(before, |v| v.resolve(target.index));
                    let to = seg.to.get(property).map_or(before, |v| v.resolve(target.index));
                    settled.insert(key, to);

                    let slot = current.entry(key).or_insert(base);
                    if local >= 0.0 {
                        let eased = seg.ease.apply(local.min(1.0));
                        *slot = PropertyValue::lerp(&from, &to, eased);
                    } else if seg.immediate_render && !claimed.contains(&key) {
                        *slot = from;
                    }
                    claimed.insert(key);
                }
            }
        }

        current
            .into_iter()
            .map(|((element, property), value)| PropertyWrite {
                element,
                property,
                value,
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/timeline.rs"]
mod tests;
