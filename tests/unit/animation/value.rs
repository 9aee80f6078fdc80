use super::*;
use serde_json::json;

#[test]
fn scalar_and_vector_lerp_are_linear() {
    assert_eq!(f64::lerp(&0.0, &10.0, 0.25), 2.5);
    assert_eq!(
        <Vec2 as Lerp>::lerp(&Vec2::new(0.0, 10.0), &Vec2::new(10.0, 20.0), 0.5),
        Vec2::new(5.0, 15.0)
    );
    assert_eq!(
        Vec3::lerp(&Vec3::ZERO, &Vec3::new(2.0, 4.0, -8.0), 0.5),
        Vec3::new(1.0, 2.0, -4.0)
    );
}

#[test]
fn rotation_lerp_takes_the_long_way() {
    // Degrees interpolate linearly; 350 -> 10 passes through 180.
    assert_eq!(f64::lerp(&350.0, &10.0, 0.5), 180.0);
}

#[test]
fn color_lerp_is_channelwise_and_rounded() {
    let a = Rgba8::rgba(0, 0, 0, 0);
    let b = Rgba8::rgba(255, 100, 1, 255);
    assert_eq!(Rgba8::lerp(&a, &b, 0.5), Rgba8::rgba(128, 50, 1, 128));
    assert_eq!(Rgba8::lerp(&a, &b, 0.0), a);
    assert_eq!(Rgba8::lerp(&a, &b, 1.0), b);
}

#[test]
fn property_value_lerp_holds_on_mixed_shapes() {
    let a = PropertyValue::Scalar(1.0);
    let b = PropertyValue::Color(Rgba8::rgb(1, 2, 3));
    assert_eq!(PropertyValue::lerp(&a, &b, 0.5), a);
    assert_eq!(PropertyValue::lerp(&a, &b, 1.0), b);
}

#[test]
fn uniform_scale_expands_to_both_axes() {
    let map = PropertyMap::new().with(Property::Scale, 0.85);
    assert_eq!(map.get(Property::Scale), None);
    assert_eq!(map.get(Property::ScaleX), Some(ValueSpec::from(0.85)));
    assert_eq!(map.get(Property::ScaleY), Some(ValueSpec::from(0.85)));
}

#[test]
fn indexed_values_resolve_per_target() {
    let indexed = ValueSpec::Indexed {
        base: 600.0,
        step: 80.0,
    };
    assert_eq!(indexed.resolve(0), PropertyValue::Scalar(600.0));
    assert_eq!(indexed.resolve(3), PropertyValue::Scalar(840.0));
}

#[test]
fn validate_rejects_shape_mismatch() {
    let bad = PropertyMap::new().with(Property::Opacity, Rgba8::rgb(0, 0, 0));
    assert!(bad.validate().is_err());
    let good = PropertyMap::new()
        .with(Property::Color, Rgba8::rgb(0, 0, 0))
        .with(Property::Opacity, 0.0);
    assert!(good.validate().is_ok());
}

#[test]
fn deserializes_camel_case_properties_and_value_forms() {
    let map: PropertyMap = serde_json::from_value(json!({
        "x": {"base": -37.5, "step": 15.0},
        "rotateY": -30,
        "rotation": 45,
        "scale": 0.9,
        "backgroundColor": "#000000",
    }))
    .unwrap();
    assert_eq!(
        map.get(Property::X),
        Some(ValueSpec::Indexed {
            base: -37.5,
            step: 15.0
        })
    );
    assert_eq!(map.get(Property::RotateY), Some(ValueSpec::from(-30.0)));
    assert_eq!(map.get(Property::RotateZ), Some(ValueSpec::from(45.0)));
    assert_eq!(map.get(Property::ScaleY), Some(ValueSpec::from(0.9)));
    assert_eq!(
        map.get(Property::BackgroundColor),
        Some(ValueSpec::from(Rgba8::rgb(0, 0, 0)))
    );
    assert!(map.validate().is_ok());
}

#[test]
fn translate_helpers_fill_axes() {
    let map = PropertyMap::new().translate3d(Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(
        map.properties().collect::<Vec<_>>(),
        vec![Property::X, Property::Y, Property::Z]
    );
}

#[test]
fn identity_values_match_unstyled_elements() {
    assert_eq!(Property::Opacity.identity(), PropertyValue::Scalar(1.0));
    assert_eq!(Property::ScaleX.identity(), PropertyValue::Scalar(1.0));
    assert_eq!(Property::RotateY.identity(), PropertyValue::Scalar(0.0));
    assert_eq!(Property::Color.identity().kind(), PropertyKind::Color);
}
