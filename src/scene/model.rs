use crate::animation::ease::Ease;
use crate::animation::timeline::Position;
use crate::animation::value::{Property, PropertyMap, PropertyValue};
use crate::foundation::core::Rect;
use crate::orchestrate::clock::ClockPlayback;
use crate::scroll::edge::Edge;
use crate::scroll::linkage::{PlaybackMode, ToggleActions};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct ViewportDef {
    pub(crate) width: f64,
    pub(crate) height: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct RectDef {
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

impl RectDef {
    pub(crate) fn to_rect(self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

impl<'de> Deserialize<'de> for RectDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Arr([f64; 4]),
            Obj {
                #[serde(default)]
                x: f64,
                y: f64,
                width: f64,
                height: f64,
            },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Arr([x, y, width, height]) | Repr::Obj { x, y, width, height } => Ok(Self {
                x,
                y,
                width,
                height,
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageDef {
    pub(crate) viewport: ViewportDef,
    #[serde(default)]
    pub(crate) scroll_height: Option<f64>,
    pub(crate) elements: Vec<ElementDef>,
    #[serde(default)]
    pub(crate) sections: Vec<SectionDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ElementDef {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default, alias = "class")]
    pub(crate) classes: Vec<String>,
    #[serde(default)]
    pub(crate) rect: Option<RectDef>,
    #[serde(default)]
    pub(crate) style: BTreeMap<Property, PropertyValue>,
    #[serde(default)]
    pub(crate) children: Vec<ElementDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SectionDef {
    pub(crate) scope: String,
    #[serde(default)]
    pub(crate) timelines: Vec<TimelineDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TimelineDef {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) length: Option<f64>,
    #[serde(default)]
    pub(crate) unbounded: bool,
    pub(crate) segments: Vec<StepDef>,
    #[serde(default)]
    pub(crate) trigger: Option<TriggerDef>,
    #[serde(default)]
    pub(crate) clock: Option<ClockPlayback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum StepDef {
    Label(LabelDef),
    Segment(SegmentDef),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LabelDef {
    pub(crate) label: String,
    #[serde(default)]
    pub(crate) position: Position,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SegmentDef {
    pub(crate) targets: String,
    #[serde(default)]
    pub(crate) optional: bool,
    #[serde(default)]
    pub(crate) from: Option<PropertyMap>,
    #[serde(default)]
    pub(crate) to: Option<PropertyMap>,
    #[serde(default)]
    pub(crate) duration: Option<f64>,
    #[serde(default)]
    pub(crate) ease: Option<Ease>,
    #[serde(default)]
    pub(crate) stagger: f64,
    #[serde(default)]
    pub(crate) position: Position,
    #[serde(default)]
    pub(crate) immediate_render: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TriggerDef {
    #[serde(default)]
    pub(crate) anchor: Option<String>,
    #[serde(default)]
    pub(crate) start: Option<Edge>,
    #[serde(default)]
    pub(crate) end: Option<Edge>,
    #[serde(default)]
    pub(crate) mode: PlaybackMode,
    #[serde(default)]
    pub(crate) smoothing: Option<f64>,
    #[serde(default)]
    pub(crate) toggle_actions: Option<ToggleActions>,
    #[serde(default)]
    pub(crate) pin: Option<PinDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PinDef {
    Off,
    Anchor,
    Element { element: String, spacing: bool },
    AnchorNoSpacing,
}

impl<'de> Deserialize<'de> for PinDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        fn yes() -> bool {
            true
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Obj {
                #[serde(default)]
                element: Option<String>,
                #[serde(default = "yes")]
                spacing: bool,
            },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Flag(false) => Self::Off,
            Repr::Flag(true) => Self::Anchor,
            Repr::Obj {
                element: Some(element),
                spacing,
            } => Self::Element { element, spacing },
            Repr::Obj {
                element: None,
                spacing: true,
            } => Self::Anchor,
            Repr::Obj {
                element: None,
                spacing: false,
            } => Self::AnchorNoSpacing,
        })
    }
}
