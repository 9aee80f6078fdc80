use super::*;
use std::sync::Arc;

struct Baselines(BTreeMap<(ElementId, Property), PropertyValue>);

impl BaselineSource for Baselines {
    fn baseline(&self, element: ElementId, property: Property) -> PropertyValue {
        self.0
            .get(&(element, property))
            .copied()
            .unwrap_or_else(|| property.identity())
    }
}

fn identity() -> Baselines {
    Baselines(BTreeMap::new())
}

fn targets(ids: &[u32]) -> Vec<AnimationTarget> {
    let source: Arc<str> = Arc::from(".t");
    ids.iter()
        .enumerate()
        .map(|(index, id)| AnimationTarget {
            element: ElementId(*id),
            index,
            source: Arc::clone(&source),
        })
        .collect()
}

fn value(writes: &[PropertyWrite], element: u32, property: Property) -> f64 {
    writes
        .iter()
        .find(|w| w.element == ElementId(element) && w.property == property)
        .and_then(|w| w.value.as_scalar())
        .expect("write present")
}

fn fade_up(ids: &[u32]) -> Segment {
    Segment::from_to(
        targets(ids),
        PropertyMap::new()
            .with(Property::Y, 80.0)
            .with(Property::Opacity, 0.0),
        PropertyMap::new()
            .with(Property::Y, 0.0)
            .with(Property::Opacity, 1.0),
    )
}

#[test]
fn position_grammar() {
    assert_eq!("1.5".parse::<Position>().unwrap(), Position::At(1.5));
    assert_eq!("+=0.2".parse::<Position>().unwrap(), Position::Relative(0.2));
    assert_eq!("-=0.5".parse::<Position>().unwrap(), Position::Relative(-0.5));
    assert_eq!("<".parse::<Position>().unwrap(), Position::WithPrevious);
    assert_eq!(">".parse::<Position>().unwrap(), Position::AfterPrevious);
    assert_eq!(
        "intro+=0.3".parse::<Position>().unwrap(),
        Position::Label("intro".to_owned(), 0.3)
    );
    assert_eq!(
        "intro".parse::<Position>().unwrap(),
        Position::Label("intro".to_owned(), 0.0)
    );
    assert!("+=abc".parse::<Position>().is_err());
    assert!("a b".parse::<Position>().is_err());

    let p: Position = serde_json::from_value(serde_json::json!(0.25)).unwrap();
    assert_eq!(p, Position::At(0.25));
    let p: Position = serde_json::from_value(serde_json::json!("-=0.6")).unwrap();
    assert_eq!(p, Position::Relative(-0.6));
}

#[test]
fn positions_resolve_against_timeline_state() {
    let mut tl = Timeline::new();
    assert_eq!(tl.add(fade_up(&[1]).duration(1.0), Position::Append).unwrap(), 0.0);
    assert_eq!(
        tl.add(fade_up(&[2]).duration(0.8), Position::Relative(-0.5))
            .unwrap(),
        0.5
    );
    assert!((tl.end() - 1.3).abs() < 1e-12);
    assert_eq!(
        tl.add(fade_up(&[3]).duration(0.2), Position::WithPrevious)
            .unwrap(),
        0.5
    );
    assert!((tl.add(fade_up(&[4]), Position::AfterPrevious).unwrap() - 0.7).abs() < 1e-12);
    tl.add_label("outro", Position::At(2.0)).unwrap();
    assert_eq!(
        tl.add(fade_up(&[5]), Position::Label("outro".to_owned(), 0.25))
            .unwrap(),
        2.25
    );
    assert_eq!(tl.label("outro"), Some(2.0));
    assert!(matches!(
        tl.add(fade_up(&[6]), Position::Label("missing".to_owned(), 0.0)),
        Err(ScrollError::Configuration(_))
    ));
    assert_eq!(tl.add(fade_up(&[7]), Position::Relative(-99.0)).unwrap(), 0.0);
}

#[test]
fn malformed_segments_are_configuration_errors() {
    let mut tl = Timeline::new();
    assert!(tl.add(fade_up(&[1]).duration(0.0), Position::Append).is_err());
    assert!(tl.add(fade_up(&[1]).duration(-1.0), Position::Append).is_err());
    assert!(tl.add(fade_up(&[1]).stagger(-0.1), Position::Append).is_err());
    assert!(tl.add(fade_up(&[1]), Position::At(-1.0)).is_err());
    let bad_shape = Segment::to(
        targets(&[1]),
        PropertyMap::new().with(Property::Opacity, crate::foundation::core::Rgba8::rgb(1, 1, 1)),
    );
    assert!(tl.add(bad_shape, Position::Append).is_err());
    assert!(tl.segments().is_empty());
}

#[test]
fn bounded_timeline_rejects_overflow_unless_unbounded() {
    let mut tl = Timeline::with_length(1.0).unwrap();
    assert!(tl.add(fade_up(&[1]).duration(0.6), Position::At(0.4)).is_ok());
    assert!(tl.add(fade_up(&[2]).duration(0.6), Position::At(0.5)).is_err());
    assert!(tl.add(fade_up(&[1, 2, 3]).duration(0.5).stagger(0.3), Position::At(0.0)).is_err());

    let mut open = Timeline::with_length(1.0).unwrap().unbounded();
    assert!(open.add(fade_up(&[2]).duration(3.0), Position::At(0.5)).is_ok());
    assert_eq!(open.length(), 1.0);
    assert!(Timeline::with_length(0.0).is_err());
}

#[test]
fn evaluate_is_deterministic_and_idempotent() {
    let mut tl = Timeline::new();
    tl.add(fade_up(&[1, 2, 3]).duration(1.0).stagger(0.1).ease(Ease::OutQuart), Position::Append)
        .unwrap();
    tl.add(
        Segment::to(targets(&[2]), PropertyMap::new().with(Property::RotateZ, 15.0)),
        Position::Relative(-0.3),
    )
    .unwrap();
    let b = identity();
    for i in 0..=20 {
        let p = f64::from(i) / 20.0;
        assert_eq!(tl.evaluate(p, &b), tl.evaluate(p, &b));
    }
}

#[test]
fn evaluate_writes_from_at_zero_and_to_at_one() {
    let mut tl = Timeline::new();
    tl.add(fade_up(&[1]).duration(1.0).ease(Ease::Linear), Position::Append)
        .unwrap();
    let b = identity();
    let start = tl.evaluate(0.0, &b);
    assert_eq!(value(&start, 1, Property::Y), 80.0);
    assert_eq!(value(&start, 1, Property::Opacity), 0.0);
    let end = tl.evaluate(1.0, &b);
    assert_eq!(value(&end, 1, Property::Y), 0.0);
    assert_eq!(value(&end, 1, Property::Opacity), 1.0);
    let mid = tl.evaluate(0.5, &b);
    assert_eq!(value(&mid, 1, Property::Y), 40.0);
    // Out-of-range progress clamps.
    assert_eq!(tl.evaluate(1.7, &b), end);
    assert_eq!(tl.evaluate(-3.0, &b), start);
}

#[test]
fn stagger_windows_do_not_overlap_when_stagger_exceeds_duration() {
    let mut tl = Timeline::new();
    let n = 4;
    let ids: Vec<u32> = (0..n).collect();
    tl.add(
        fade_up(&ids).duration(0.2).stagger(0.3).immediate_render(true),
        Position::At(0.0),
    )
    .unwrap();
    let placed = &tl.segments()[0];
    for i in 0..n as usize {
        let (s, e) = placed.window(i);
        assert!((s - 0.3 * i as f64).abs() < 1e-12);
        assert!((e - s - 0.2).abs() < 1e-12);
    }
    let (_, first_end) = placed.window(0);
    let (last_start, _) = placed.window(n as usize - 1);
    assert!(first_end < last_start);

    // At the end of target 0's window the last target still holds its from state.
    let w = tl.evaluate_at(first_end, &identity());
    assert_eq!(value(&w, 0, Property::Y), 0.0);
    assert_eq!(value(&w, n - 1, Property::Y), 80.0);
    assert_eq!(value(&w, n - 1, Property::Opacity), 0.0);
}

#[test]
fn stagger_windows_overlap_when_stagger_is_shorter_than_duration() {
    let mut tl = Timeline::new();
    tl.add(fade_up(&[0, 1, 2]).duration(1.0).stagger(0.1), Position::At(0.0))
        .unwrap();
    let placed = &tl.segments()[0];
    let (_, first_end) = placed.window(0);
    let (last_start, _) = placed.window(2);
    assert!(last_start < first_end);
    assert!((tl.length() - 1.2).abs() < 1e-12);

    let w = tl.evaluate_at(0.5, &identity());
    let a = value(&w, 0, Property::Opacity);
    let c = value(&w, 2, Property::Opacity);
    assert!(a > 0.0 && a < 1.0);
    assert!(c > 0.0 && c < a);
}

#[test]
fn future_segments_leave_pre_segment_values() {
    let mut b = identity();
    b.0.insert((ElementId(1), Property::Opacity), PropertyValue::Scalar(0.9));
    let mut tl = Timeline::new();
    tl.add(
        Segment::to(targets(&[1]), PropertyMap::new().with(Property::Opacity, 0.5)).duration(1.0),
        Position::At(0.0),
    )
    .unwrap();
    tl.add(
        Segment::from_to(
            targets(&[1]),
            PropertyMap::new().with(Property::Opacity, 0.0),
            PropertyMap::new().with(Property::Opacity, 1.0),
        )
        .duration(1.0),
        Position::At(2.0),
    )
    .unwrap();

    // Before anything starts: baseline.
    assert_eq!(value(&tl.evaluate_at(0.0, &b), 1, Property::Opacity), 0.9);
    // Between the two segments: the first segment's end value.
    assert_eq!(value(&tl.evaluate_at(1.5, &b), 1, Property::Opacity), 0.5);
    // Once the second starts, its explicit from wins.
    assert_eq!(value(&tl.evaluate_at(2.0, &b), 1, Property::Opacity), 0.0);
    assert_eq!(value(&tl.evaluate_at(3.0, &b), 1, Property::Opacity), 1.0);
}

#[test]
fn immediate_render_applies_from_state_for_first_touch_only() {
    let b = identity();
    let mut tl = Timeline::new();
    tl.add(
        fade_up(&[1]).duration(1.0).immediate_render(true),
        Position::At(1.0),
    )
    .unwrap();
    let w = tl.evaluate_at(0.0, &b);
    assert_eq!(value(&w, 1, Property::Opacity), 0.0);
    assert_eq!(value(&w, 1, Property::Y), 80.0);

    let mut tl = Timeline::new();
    tl.add(
        Segment::to(targets(&[1]), PropertyMap::new().with(Property::Opacity, 0.4)).duration(0.5),
        Position::At(0.0),
    )
    .unwrap();
    tl.add(
        fade_up(&[1]).duration(1.0).immediate_render(true),
        Position::At(1.0),
    )
    .unwrap();
    // Opacity is already claimed by the first segment; y is a first touch.
    let w = tl.evaluate_at(0.75, &b);
    assert_eq!(value(&w, 1, Property::Opacity), 0.4);
    assert_eq!(value(&w, 1, Property::Y), 80.0);
}

#[test]
fn to_segments_chain_from_settled_values() {
    let b = identity();
    let mut tl = Timeline::new();
    tl.add(
        Segment::to(targets(&[1]), PropertyMap::new().with(Property::X, 100.0)).duration(1.0).ease(Ease::Linear),
        Position::Append,
    )
    .unwrap();
    tl.add(
        Segment::to(targets(&[1]), PropertyMap::new().with(Property::X, -100.0)).duration(1.0).ease(Ease::Linear),
        Position::Append,
    )
    .unwrap();
    assert_eq!(value(&tl.evaluate_at(1.5, &b), 1, Property::X), 0.0);

    let mut from_only = Timeline::new();
    from_only
        .add(
            Segment::from(targets(&[1]), PropertyMap::new().with(Property::Y, 50.0))
                .duration(1.0)
                .ease(Ease::Linear),
            Position::Append,
        )
        .unwrap();
    assert_eq!(value(&from_only.evaluate(0.0, &b), 1, Property::Y), 50.0);
    assert_eq!(value(&from_only.evaluate(1.0, &b), 1, Property::Y), 0.0);
}

#[test]
fn overlapping_segments_resolve_last_started_wins() {
    let b = identity();
    let mut tl = Timeline::new();
    let a = Segment::to(targets(&[1]), PropertyMap::new().with(Property::X, 10.0)).duration(1.0).ease(Ease::Linear);
    let c = Segment::to(targets(&[1]), PropertyMap::new().with(Property::X, 20.0)).duration(1.0).ease(Ease::Linear);
    tl.add(a, Position::At(0.0)).unwrap();
    tl.add(c, Position::At(0.0)).unwrap();
    // Same start: registration order breaks the tie and the later segment overrides.
    assert_eq!(value(&tl.evaluate_at(1.0, &b), 1, Property::X), 20.0);
}

#[test]
fn phased_timeline_lands_on_phase_boundary_at_half_progress() {
    let b = identity();
    let ids = [1, 2, 3];
    let mut tl = Timeline::new();
    tl.add(
        Segment::from_to(
            targets(&ids),
            PropertyMap::new()
                .with(Property::X, crate::animation::value::ValueSpec::Indexed { base: 600.0, step: 80.0 })
                .with(Property::Opacity, 0.0),
            PropertyMap::new().with(Property::X, 0.0).with(Property::Opacity, 1.0),
        )
        .duration(0.3)
        .ease(Ease::OutCubic),
        Position::At(0.0),
    )
    .unwrap();
    tl.add(
        Segment::to(targets(&ids), PropertyMap::new().with(Property::X, 0.0)).duration(0.2),
        Position::At(0.3),
    )
    .unwrap();
    tl.add(
        Segment::to(
            targets(&ids),
            PropertyMap::new().with(
                Property::X,
                crate::animation::value::ValueSpec::Indexed { base: 200.0, step: -420.0 },
            ),
        )
        .duration(0.5)
        .ease(Ease::Linear),
        Position::At(0.5),
    )
    .unwrap();
    assert!((tl.length() - 1.0).abs() < 1e-12);

    let start = tl.evaluate(0.0, &b);
    assert_eq!(value(&start, 3, Property::X), 760.0);
    let boundary = tl.evaluate(0.5, &b);
    for id in ids {
        assert!(value(&boundary, id, Property::X).abs() < 1e-9);
        assert_eq!(value(&boundary, id, Property::Opacity), 1.0);
    }
    let end = tl.evaluate(1.0, &b);
    assert_eq!(value(&end, 3, Property::X), 200.0 - 840.0);
}

#[test]
fn zero_target_segments_are_a_noop() {
    let mut tl = Timeline::new();
    tl.add(fade_up(&[]).duration(1.0), Position::Append).unwrap();
    assert!(tl.evaluate(0.5, &identity()).is_empty());
    assert!(tl.elements().is_empty());
}
