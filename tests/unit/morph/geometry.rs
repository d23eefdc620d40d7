use super::*;
use crate::element::value::PropValue;

fn shape(pairs: &[(&str, PropValue)]) -> PropMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn rect_outline_is_a_closed_quad() {
    let s = shape(&[
        ("x", 0.0.into()),
        ("y", 0.0.into()),
        ("width", 10.0.into()),
        ("height", 5.0.into()),
    ]);
    let path = element_path(ElementKind::Rect, &s).unwrap();
    let outline = Outline::from_path(&path);
    assert!(outline.closed);
    assert_eq!(outline.points.len(), 4);
    assert!((outline.length() - 30.0).abs() < 1e-9);
}

#[test]
fn kinds_without_geometry_have_no_path() {
    assert!(element_path(ElementKind::Text, &PropMap::new()).is_none());
    assert!(element_path(ElementKind::Group, &PropMap::new()).is_none());
    let bad = shape(&[("pathData", "M 0 0 Q".into())]);
    assert!(element_path(ElementKind::Path, &bad).is_none());
}

#[test]
fn svg_path_curves_are_flattened() {
    let s = shape(&[("pathData", "M0 0 C 0 10 10 10 10 0 Z".into())]);
    let outline = Outline::from_path(&element_path(ElementKind::Path, &s).unwrap());
    assert!(outline.closed);
    assert!(outline.points.len() > 4);
    assert_eq!(outline.points[0], Point::new(0.0, 0.0));
}

#[test]
fn circle_outline_length_approximates_circumference() {
    let s = shape(&[("cx", 0.0.into()), ("cy", 0.0.into()), ("r", 10.0.into())]);
    let outline = Outline::from_path(&element_path(ElementKind::Circle, &s).unwrap());
    let expected = std::f64::consts::TAU * 10.0;
    assert!((outline.length() - expected).abs() / expected < 0.02);
}

#[test]
fn resample_spaces_points_evenly() {
    let outline = Outline {
        points: vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ],
        closed: true,
    };
    let pts = outline.resample(8);
    assert_eq!(pts.len(), 8);
    assert_eq!(pts[1], Point::new(2.0, 0.0));
    assert_eq!(pts[7], Point::new(0.0, 2.0));

    let open = Outline {
        points: vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
        closed: false,
    };
    assert_eq!(
        open.sample(0.0, 10.0, 3),
        vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.0)
        ]
    );
}

#[test]
fn transform_moves_points() {
    let outline = Outline {
        points: vec![Point::new(1.0, 1.0)],
        closed: false,
    };
    let moved = outline.transformed(Affine::translate((10.0, 0.0)));
    assert_eq!(moved.points, vec![Point::new(11.0, 1.0)]);
}

#[test]
fn alignment_rotates_to_nearest_start() {
    let reference = vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
    ];
    let mut pts = vec![
        Point::new(1.0, 1.0),
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
    ];
    align_closed(&reference, &mut pts);
    assert_eq!(pts, reference);
}

#[test]
fn flat_conversion_drops_odd_tail() {
    let pts = from_flat(&[1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(pts, vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)]);
    assert_eq!(to_flat(&pts), vec![1.0, 2.0, 3.0, 4.0]);
}
