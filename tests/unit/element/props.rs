use super::*;

#[test]
fn transform_names_round_trip() {
    for p in TransformProp::ALL {
        assert_eq!(TransformProp::parse(p.name()), Some(p));
    }
    assert_eq!(TransformProp::parse("opacity"), None);
    assert_eq!(
        TransformProp::legacy_pair("scale"),
        Some([TransformProp::ScaleX, TransformProp::ScaleY])
    );
}

#[test]
fn defaults_follow_group_rules() {
    assert_eq!(default_value(AttrGroup::Transform, "scaleY"), PropValue::Number(1.0));
    assert_eq!(default_value(AttrGroup::Transform, "x"), PropValue::Number(0.0));
    assert_eq!(default_value(AttrGroup::Style, "opacity"), PropValue::Number(1.0));
    assert_eq!(default_value(AttrGroup::Style, "lineWidth"), PropValue::Number(0.0));
    assert_eq!(default_value(AttrGroup::Shape, "opacity"), PropValue::Number(0.0));
}

#[test]
fn set_rejects_non_numeric_transform() {
    let mut p = ElementProps::default();
    assert!(p.set(AttrGroup::Transform, "x", PropValue::Number(3.0)));
    assert!(!p.set(AttrGroup::Transform, "x", PropValue::from("3")));
    assert!(!p.set(AttrGroup::Transform, "width", PropValue::Number(3.0)));
    assert_eq!(p.get(AttrGroup::Transform, "x"), Some(PropValue::Number(3.0)));
}

#[test]
fn merge_masks_and_restrict() {
    let mut a = ElementProps::default();
    a.set(AttrGroup::Shape, "width", 10.0.into());
    a.set(AttrGroup::Style, "fill", "red".into());
    a.set(AttrGroup::Transform, "y", 2.0.into());

    let mut b = ElementProps::default();
    b.set(AttrGroup::Shape, "width", 20.0.into());
    b.set(AttrGroup::Extra, "t", 1.0.into());

    let mut merged = a.clone();
    merged.merge(&b);
    assert_eq!(merged.len(), 4);
    assert_eq!(merged.get(AttrGroup::Shape, "width"), Some(20.0.into()));

    let rest = merged.without_keys_of(&b);
    assert_eq!(rest.len(), 2);
    assert!(!rest.contains(AttrGroup::Shape, "width"));

    let only = merged.restricted_to(&b);
    assert_eq!(only, b);
}

#[test]
fn transform2d_fills_defaults() {
    let mut p = ElementProps::default();
    p.set(AttrGroup::Transform, "x", 5.0.into());
    let t = p.transform2d();
    assert_eq!(t.x, 5.0);
    assert_eq!(t.scale_x, 1.0);
    assert_eq!(t.rotation, 0.0);
}

#[test]
fn json_shape_uses_camel_case_transform_keys() {
    let mut p = ElementProps::default();
    p.set(AttrGroup::Transform, "scaleX", 0.5.into());
    let json = serde_json::to_value(&p).unwrap();
    assert_eq!(json["transform"]["scaleX"], 0.5);
    assert!(json.get("shape").is_none());
}
