use super::*;
use crate::animation::ease::Ease;
use crate::animation::timeline::{Position, Segment, Timeline};
use crate::animation::value::{Property, PropertyMap};
use crate::foundation::core::Rect;
use crate::registry::{Requirement, Selector};
use crate::scroll::claim::LinkageKey;
use crate::scroll::edge::Edge;
use crate::scroll::linkage::{LinkageConfig, LinkageState, PlaybackMode};
use crate::surface::memory::MemorySurface;

struct Fixture {
    surface: MemorySurface,
    root: ElementId,
    section: ElementId,
    engine: ScrollEngine,
}

fn fixture() -> Fixture {
    let mut surface = MemorySurface::new();
    let root = surface.add(None, Some(Rect::new(0.0, 0.0, 1000.0, 5000.0)));
    let section = surface.add(Some(root), Some(Rect::new(0.0, 1000.0, 1000.0, 2000.0)));
    surface.add_class(section, "box").unwrap();
    let engine = ScrollEngine::new(Viewport::new(1000.0, 1000.0).unwrap());
    Fixture {
        surface,
        root,
        section,
        engine,
    }
}

fn fade(f: &Fixture, ctx: ContextId) -> Timeline {
    let targets = f
        .engine
        .context(ctx)
        .unwrap()
        .resolve(&f.surface, &Selector::Class("box".into()), Requirement::Required)
        .unwrap();
    let mut tl = Timeline::new();
    tl.add(
        Segment::from_to(
            targets,
            PropertyMap::new().with(Property::Opacity, 0.0),
            PropertyMap::new().with(Property::Opacity, 1.0),
        )
        .duration(1.0)
        .ease(Ease::Linear),
        Position::default(),
    )
    .unwrap();
    tl
}

fn link(f: &mut Fixture, ctx: ContextId, config: LinkageConfig) -> LinkageId {
    let timeline = fade(f, ctx);
    let c = f.engine.context_mut(ctx).unwrap();
    let tl = c.register_timeline(timeline).unwrap();
    c.register_linkage(tl, config).unwrap()
}

fn opacity(f: &Fixture) -> f64 {
    f.surface.scalar(f.section, Property::Opacity)
}

#[test]
fn invalid_options_are_rejected() {
    let vp = Viewport::new(800.0, 600.0).unwrap();
    let opts = EngineOpts {
        max_frame_dt: 0.0,
        ..EngineOpts::default()
    };
    assert!(ScrollEngine::with_opts(vp, opts).is_err());
    assert!(ScrollEngine::with_opts(vp, EngineOpts::default()).is_ok());
}

#[test]
fn open_context_requires_a_mounted_scope() {
    let mut f = fixture();
    f.surface.unmount(f.section);
    let err = f.engine.open_context(&f.surface, f.section).unwrap_err();
    assert!(matches!(err, ScrollError::Resolution(_)));
    assert!(f.engine.open_context(&f.surface, f.root).is_ok());
}

#[test]
fn scroll_notifications_coalesce_into_one_pass() {
    let mut f = fixture();
    let ctx = f.engine.open_context(&f.surface, f.root).unwrap();
    let section = f.section;
    link(&mut f, ctx, LinkageConfig::new(section, PlaybackMode::Scrub));

    f.engine.on_scroll(100.0);
    f.engine.on_scroll(f64::NAN);
    f.engine.on_scroll(600.0);
    f.engine.on_scroll(1000.0);
    let report = f.engine.frame(0.016, &mut f.surface);
    assert_eq!(report.frame, 0);
    assert_eq!(report.coalesced, 3);
    assert_eq!(report.scroll, 1000.0);
    assert_eq!(report.refresh.map(|r| r.measured), Some(1));
    assert_eq!(report.writes, 1);
    assert!((opacity(&f) - 0.5).abs() < 1e-9);

    let idle = f.engine.frame(0.016, &mut f.surface);
    assert_eq!(idle.coalesced, 0);
    assert_eq!(idle.refresh, None);
    assert_eq!(idle.writes, 0);
    assert_eq!(f.engine.frames(), 2);
}

#[test]
fn resize_invalidates_and_remeasures() {
    let mut f = fixture();
    let ctx = f.engine.open_context(&f.surface, f.root).unwrap();
    let section = f.section;
    link(&mut f, ctx, LinkageConfig::new(section, PlaybackMode::Scrub));
    f.engine.on_scroll(1000.0);
    f.engine.frame(0.016, &mut f.surface);
    assert!(!f.engine.needs_frame());

    f.engine.on_resize(Viewport::new(1000.0, 1000.0).unwrap());
    assert!(!f.engine.needs_frame());

    f.engine.on_resize(Viewport::new(1000.0, 500.0).unwrap());
    assert!(f.engine.needs_frame());
    let report = f.engine.frame(0.016, &mut f.surface);
    assert_eq!(report.refresh.map(|r| r.measured), Some(1));
    // Region is now [500, 2000].
    assert!((opacity(&f) - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn events_are_recorded_with_their_linkage() {
    let mut f = fixture();
    let ctx = f.engine.open_context(&f.surface, f.root).unwrap();
    let section = f.section;
    let id = link(&mut f, ctx, LinkageConfig::new(section, PlaybackMode::Toggle));

    f.engine.on_scroll(-10.0);
    assert!(f.engine.frame(0.016, &mut f.surface).events.is_empty());

    f.engine.on_scroll(1000.0);
    let report = f.engine.frame(0.016, &mut f.surface);
    assert_eq!(
        report.events,
        vec![EventRecord {
            context: ctx,
            linkage: id,
            event: LinkageEvent::Enter,
        }]
    );
    let linkage = f.engine.context(ctx).unwrap().linkage(id).unwrap();
    assert_eq!(linkage.state(), LinkageState::Entering);
}

#[test]
fn only_one_pinned_linkage_holds_the_claim() {
    let mut f = fixture();
    let other = f
        .surface
        .add(Some(f.root), Some(Rect::new(0.0, 2000.0, 1000.0, 3000.0)));
    f.surface.add_class(other, "box").unwrap();
    let ctx = f.engine.open_context(&f.surface, f.root).unwrap();
    let pinned = |anchor| {
        LinkageConfig::new(anchor, PlaybackMode::PinnedScrub)
            .start(Edge::Absolute(0.0))
            .end(Edge::Absolute(1000.0))
    };
    let section = f.section;
    let first = link(&mut f, ctx, pinned(section));
    let second = link(&mut f, ctx, pinned(other));

    f.engine.on_scroll(500.0);
    f.engine.frame(0.016, &mut f.surface);
    assert_eq!(
        f.engine.pin_claim().holder(),
        Some(LinkageKey {
            context: ctx,
            linkage: first,
        })
    );
    assert!(f.surface.pin(f.section).is_pinned());
    assert!(!f.surface.pin(other).is_pinned());
    let waiting = f.engine.context(ctx).unwrap().linkage(second).unwrap();
    assert_eq!(waiting.state(), LinkageState::Entering);

    f.engine.on_scroll(1500.0);
    f.engine.frame(0.016, &mut f.surface);
    assert_eq!(f.engine.pin_claim().holder(), None);
    assert!(!f.surface.pin(f.section).is_pinned());
}

#[test]
fn close_context_reverts_and_releases_the_claim() {
    let mut f = fixture();
    let ctx = f.engine.open_context(&f.surface, f.root).unwrap();
    let section = f.section;
    link(
        &mut f,
        ctx,
        LinkageConfig::new(section, PlaybackMode::PinnedScrub)
            .start(Edge::Absolute(0.0))
            .end(Edge::Absolute(1000.0)),
    );
    f.engine.on_scroll(500.0);
    f.engine.frame(0.016, &mut f.surface);
    assert!(f.engine.pin_claim().holder().is_some());

    let report = f.engine.close_context(ctx, &mut f.surface).unwrap();
    assert_eq!(report.unpinned, 1);
    assert_eq!(report.properties_restored, 1);
    assert_eq!(f.engine.pin_claim().holder(), None);
    assert!(f.engine.context(ctx).is_none());
    assert_eq!(opacity(&f), 1.0);
    assert!(!f.surface.pin(f.section).is_pinned());
    assert!(f.engine.close_context(ctx, &mut f.surface).is_none());
}

#[test]
fn reverted_contexts_are_dropped_after_the_frame() {
    let mut f = fixture();
    let signalled = f.engine.open_context(&f.surface, f.root).unwrap();
    let section = f.section;
    link(&mut f, signalled, LinkageConfig::new(section, PlaybackMode::Scrub));
    let direct = f.engine.open_context(&f.surface, f.root).unwrap();
    let kept = f.engine.open_context(&f.surface, f.root).unwrap();

    f.engine.on_scroll(1000.0);
    f.engine.frame(0.016, &mut f.surface);
    assert!((opacity(&f) - 0.5).abs() < 1e-9);

    f.engine.context(signalled).unwrap().revert_signal().request();
    f.engine
        .context_mut(direct)
        .unwrap()
        .revert(&mut f.surface);
    assert_eq!(f.engine.contexts().count(), 3);

    let report = f.engine.frame(0.016, &mut f.surface);
    assert_eq!(report.reverted, vec![signalled]);
    let open: Vec<ContextId> = f.engine.contexts().map(|c| c.id()).collect();
    assert_eq!(open, vec![kept]);
    assert_eq!(opacity(&f), 1.0);
    assert!(!f.engine.needs_frame());
}
