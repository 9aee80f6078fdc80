use crate::animation::timeline::{Segment, Timeline};
use crate::foundation::core::Viewport;
use crate::foundation::error::{ScrollError, ScrollResult};
use crate::foundation::ids::{ContextId, ElementId, LinkageId, TimelineId};
use crate::orchestrate::context::OrchestrationContext;
use crate::orchestrate::engine::ScrollEngine;
use crate::registry::{Requirement, Selector};
use crate::scene::model::{ElementDef, PageDef, PinDef, StepDef, TimelineDef, TriggerDef};
use crate::scroll::edge::Edge;
use crate::scroll::linkage::LinkageConfig;
use crate::scroll::region::PinSpec;
use crate::surface::memory::MemorySurface;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Declarative page description: element tree plus per-section animation definitions.
///
/// This is the JSON-facing representation used by the simulator and tests. Building it produces
/// a [`MemorySurface`]; mounting it opens one orchestration context per section.
#[derive(Debug, Clone)]
pub struct Page {
    def: PageDef,
}

/// Outcome of mounting one timeline definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineReport {
    /// Timeline name, or its position in the section.
    pub name: String,
    /// Registered timeline.
    pub timeline: Option<TimelineId>,
    /// Registered linkage, for scroll-driven timelines.
    pub linkage: Option<LinkageId>,
    /// Construction error that aborted this timeline or its linkage.
    pub error: Option<String>,
}

/// Outcome of mounting one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionReport {
    /// Scope element name.
    pub scope: String,
    /// Opened context.
    pub context: Option<ContextId>,
    /// Per-timeline outcomes in definition order.
    pub timelines: Vec<TimelineReport>,
    /// Error that prevented the context from opening.
    pub error: Option<String>,
}

/// Outcome of [`Page::mount`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MountReport {
    /// Per-section outcomes in definition order.
    pub sections: Vec<SectionReport>,
}

impl MountReport {
    /// Every construction error, prefixed with its section.
    pub fn errors(&self) -> Vec<String> {
        let mut out = Vec::new();
        for section in &self.sections {
            if let Some(e) = &section.error {
                out.push(format!("{}: {e}", section.scope));
            }
            for tl in &section.timelines {
                if let Some(e) = &tl.error {
                    out.push(format!("{}/{}: {e}", section.scope, tl.name));
                }
            }
        }
        out
    }

    /// Return `true` when nothing failed.
    pub fn is_clean(&self) -> bool {
        self.errors().is_empty()
    }
}

impl Page {
    /// Parse a page from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> ScrollResult<Self> {
        let def: PageDef = serde_json::from_reader(r)
            .map_err(|e| ScrollError::serde(format!("parse page JSON: {e}")))?;
        Ok(Self { def })
    }

    /// Parse a page from a JSON string.
    pub fn from_json_str(s: &str) -> ScrollResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse a page from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ScrollResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ScrollError::configuration(format!("open page JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Declared viewport.
    pub fn viewport(&self) -> ScrollResult<Viewport> {
        Viewport::new(self.def.viewport.width, self.def.viewport.height)
    }

    /// Maximum scroll offset: declared, or derived from the lowest element edge.
    pub fn scroll_height(&self) -> f64 {
        fn lowest(el: &ElementDef) -> f64 {
            let own = el.rect.map_or(0.0, |r| r.y + r.height);
            el.children.iter().map(lowest).fold(own, f64::max)
        }
        self.def.scroll_height.unwrap_or_else(|| {
            let bottom = self.def.elements.iter().map(lowest).fold(0.0, f64::max);
            (bottom - self.def.viewport.height).max(0.0)
        })
    }

    /// Build the in-memory document.
    pub fn build_surface(&self) -> ScrollResult<MemorySurface> {
        let mut surface = MemorySurface::new();
        for el in &self.def.elements {
            add_element(&mut surface, None, el)?;
        }
        Ok(surface)
    }

    /// Open one context per section and register its timelines.
    ///
    /// Construction errors abort only the offending timeline (or section, when its scope
    /// cannot be found) and are collected in the report.
    pub fn mount(&self, engine: &mut ScrollEngine, surface: &MemorySurface) -> MountReport {
        let mut report = MountReport::default();
        for section in &self.def.sections {
            let opened = surface
                .lookup(&section.scope)
                .ok_or_else(|| {
                    ScrollError::resolution(format!("section scope #{} not found", section.scope))
                })
                .and_then(|scope| engine.open_context(surface, scope));
            let context = match opened {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(scope = %section.scope, error = %e, "section not mounted");
                    report.sections.push(SectionReport {
                        scope: section.scope.clone(),
                        context: None,
                        timelines: Vec::new(),
                        error: Some(e.to_string()),
                    });
                    continue;
                }
            };

            let timelines = section
                .timelines
                .iter()
                .enumerate()
                .map(|(i, def)| {
                    let name = def.name.clone().unwrap_or_else(|| format!("timeline {i}"));
                    let mut out = TimelineReport {
                        name,
                        timeline: None,
                        linkage: None,
                        error: None,
                    };
                    if let Err(e) = mount_timeline(engine, context, surface, def, &mut out) {
                        tracing::warn!(scope = %section.scope, timeline = %out.name, error = %e, "timeline rejected");
                        out.error = Some(e.to_string());
                    }
                    out
                })
                .collect();

            report.sections.push(SectionReport {
                scope: section.scope.clone(),
                context: Some(context),
                timelines,
                error: None,
            });
        }
        report
    }
}

fn add_element(
    surface: &mut MemorySurface,
    parent: Option<ElementId>,
    def: &ElementDef,
) -> ScrollResult<()> {
    let id = surface.add(parent, def.rect.map(|r| r.to_rect()));
    if let Some(name) = &def.name {
        surface.set_name(id, name.clone())?;
    }
    for class in &def.classes {
        surface.add_class(id, class.clone())?;
    }
    for (property, value) in &def.style {
        surface.set_style(id, *property, *value)?;
    }
    for child in &def.children {
        add_element(surface, Some(id), child)?;
    }
    Ok(())
}

fn mount_timeline(
    engine: &mut ScrollEngine,
    context: ContextId,
    surface: &MemorySurface,
    def: &TimelineDef,
    out: &mut TimelineReport,
) -> ScrollResult<()> {
    if def.trigger.is_some() && def.clock.is_some() {
        return Err(ScrollError::configuration(
            "a timeline is driven either by a trigger or by the clock, not both",
        ));
    }
    let ctx = engine
        .context(context)
        .ok_or_else(|| ScrollError::configuration(format!("unknown {context}")))?;
    let timeline = build_timeline(ctx, surface, def)?;
    let linkage = def
        .trigger
        .as_ref()
        .map(|t| linkage_config(ctx, surface, t))
        .transpose()?;

    let ctx = engine
        .context_mut(context)
        .ok_or_else(|| ScrollError::configuration(format!("unknown {context}")))?;
    let id = ctx.register_timeline(timeline)?;
    out.timeline = Some(id);
    if let Some(config) = linkage {
        out.linkage = Some(ctx.register_linkage(id, config)?);
    }
    if let Some(playback) = def.clock {
        ctx.play(id, playback)?;
    }
    Ok(())
}

fn build_timeline(
    ctx: &OrchestrationContext,
    surface: &MemorySurface,
    def: &TimelineDef,
) -> ScrollResult<Timeline> {
    let mut timeline = match def.length {
        Some(length) => Timeline::with_length(length)?,
        None => Timeline::new(),
    };
    if def.unbounded {
        timeline = timeline.unbounded();
    }

    for step in &def.segments {
        let seg = match step {
            StepDef::Label(label) => {
                timeline.add_label(label.label.clone(), label.position.clone())?;
                continue;
            }
            StepDef::Segment(seg) => seg,
        };
        let selector: Selector = seg.targets.parse()?;
        let requirement = if seg.optional {
            Requirement::Optional
        } else {
            Requirement::Required
        };
        let targets = ctx.resolve(surface, &selector, requirement)?;
        let mut segment = match (&seg.from, &seg.to) {
            (Some(from), Some(to)) => Segment::from_to(targets, from.clone(), to.clone()),
            (None, Some(to)) => Segment::to(targets, to.clone()),
            (Some(from), None) => Segment::from(targets, from.clone()),
            (None, None) => {
                return Err(ScrollError::configuration(format!(
                    "segment targeting {selector} has neither from nor to"
                )));
            }
        };
        if let Some(duration) = seg.duration {
            segment = segment.duration(duration);
        }
        if let Some(ease) = seg.ease {
            segment = segment.ease(ease);
        }
        segment = segment
            .stagger(seg.stagger)
            .immediate_render(seg.immediate_render);
        timeline.add(segment, seg.position.clone())?;
    }
    Ok(timeline)
}

fn linkage_config(
    ctx: &OrchestrationContext,
    surface: &MemorySurface,
    def: &TriggerDef,
) -> ScrollResult<LinkageConfig> {
    let first = |selector: &str| -> ScrollResult<ElementId> {
        let selector: Selector = selector.parse()?;
        let targets = ctx.resolve(surface, &selector, Requirement::Required)?;
        targets
            .first()
            .map(|t| t.element)
            .ok_or_else(|| ScrollError::resolution(format!("{selector} matched no elements")))
    };

    let anchor = match &def.anchor {
        Some(selector) => first(selector)?,
        None => ctx.scope(),
    };
    let mut config = LinkageConfig::new(anchor, def.mode)
        .start(def.start.unwrap_or(Edge::DEFAULT_START))
        .end(def.end.unwrap_or(Edge::DEFAULT_END));
    config.smoothing = def.smoothing;
    config.toggle_actions = def.toggle_actions;
    config.pin = match &def.pin {
        None | Some(PinDef::Off) => None,
        Some(PinDef::Anchor) => Some(PinSpec::anchor()),
        Some(PinDef::AnchorNoSpacing) => Some(PinSpec::anchor().spacing(false)),
        Some(PinDef::Element { element, spacing }) => {
            Some(PinSpec::element(first(element)?).spacing(*spacing))
        }
    };
    Ok(config)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/page.rs"]
mod tests;
