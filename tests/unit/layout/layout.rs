use super::*;
use crate::foundation::core::Rect;
use crate::scroll::edge::Edge;
use crate::scroll::region::PinSpec;
use crate::surface::memory::MemorySurface;

fn edge(s: &str) -> Edge {
    s.parse().unwrap()
}

struct Page {
    surface: MemorySurface,
    pinned: TriggerRegion,
    below: TriggerRegion,
}

fn page() -> Page {
    let mut surface = MemorySurface::new();
    let root = surface.add(None, Some(Rect::new(0.0, 0.0, 1000.0, 3000.0)));
    let carousel = surface.add(Some(root), Some(Rect::new(0.0, 0.0, 1000.0, 1000.0)));
    let footer = surface.add(Some(root), Some(Rect::new(0.0, 1500.0, 1000.0, 2000.0)));
    let pinned = TriggerRegion::new(
        carousel,
        edge("top top"),
        edge("+=100%"),
        Some(PinSpec::anchor()),
    )
    .unwrap();
    let below = TriggerRegion::new(footer, edge("top 80%"), Edge::DEFAULT_END, None).unwrap();
    Page {
        surface,
        pinned,
        below,
    }
}

#[test]
fn refresh_shifts_regions_below_a_spacing_pin() {
    let mut p = page();
    let mut layout = LayoutCoordinator::new(Viewport::new(1000.0, 1000.0).unwrap());
    // Registration order is reversed on purpose: document order decides.
    let report = layout.refresh_all(&p.surface, [&mut p.below, &mut p.pinned]);
    assert_eq!(report.measured, 2);
    assert_eq!(report.skipped, 0);
    assert_eq!(p.pinned.range(), Some((0.0, 1000.0)));
    assert_eq!(p.below.shift(), 1000.0);
    assert_eq!(p.below.range(), Some((1700.0, 3000.0)));
    assert_eq!(layout.refreshes(), 1);
}

#[test]
fn clean_regions_are_kept_unless_a_spacer_moves_them() {
    let mut p = page();
    let mut layout = LayoutCoordinator::new(Viewport::new(1000.0, 1000.0).unwrap());
    layout.refresh_all(&p.surface, [&mut p.pinned, &mut p.below]);

    let again = layout.refresh_all(&p.surface, [&mut p.pinned, &mut p.below]);
    assert_eq!(again, RefreshReport::default());

    assert!(layout.set_viewport(Viewport::new(1000.0, 500.0).unwrap()));
    assert_eq!(layout.invalidate([&mut p.pinned]), 1);
    let report = layout.refresh_all(&p.surface, [&mut p.pinned, &mut p.below]);
    assert_eq!(report.measured, 2);
    assert_eq!(report.shifted, 1);
    assert_eq!(p.pinned.range(), Some((0.0, 500.0)));
    assert_eq!(p.below.shift(), 500.0);
}

#[test]
fn skipped_regions_are_retried_on_refresh() {
    let mut p = page();
    let footer = p.below.anchor();
    p.surface.unmount(footer);
    let mut layout = LayoutCoordinator::new(Viewport::new(1000.0, 1000.0).unwrap());
    let report = layout.refresh_all(&p.surface, [&mut p.pinned, &mut p.below]);
    assert_eq!(report.skipped, 1);
    assert_eq!(p.below.range(), None);

    p.surface.mount(footer);
    let report = layout.refresh_all(&p.surface, [&mut p.pinned, &mut p.below]);
    assert_eq!(report.measured, 1);
    assert_eq!(report.skipped, 0);
    assert!(p.below.range().is_some());
}
