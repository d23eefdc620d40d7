use super::*;
use crate::{
    animation::config::{AnimationOptions, SeriesModel},
    element::{
        dsl::{ElementBuilder, group, rect},
        props::{AttrGroup, TransformProp},
    },
    foundation::error::TesselError,
    render::scene::SceneRenderer,
};

fn model() -> SeriesModel {
    SeriesModel::new(AnimationOptions::default())
}

fn strict() -> Reconciler {
    Reconciler::new(ReconcileOpts {
        contract_mode: ContractMode::Strict,
        ..ReconcileOpts::default()
    })
}

fn pass(
    rec: &mut Reconciler,
    r: &mut SceneRenderer,
    items: Vec<ElementOption>,
) -> PassReport {
    let items: Vec<Option<ElementOption>> = items.into_iter().map(Some).collect();
    rec.reconcile(r, &model(), &items, None).unwrap()
}

fn num(r: &SceneRenderer, id: ElementId, group: AttrGroup, key: &str) -> f64 {
    r.read(id)
        .and_then(|p| p.get(group, key))
        .and_then(|v| v.as_number())
        .unwrap()
}

#[test]
fn first_pass_creates_with_steady_values() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    let report = pass(&mut rec, &mut r, vec![rect("a", 0.0, 0.0, 10.0, 10.0).build().unwrap()]);

    assert_eq!(report.created, 1);
    let plan = report.plan_for("a").unwrap();
    assert!(plan.from_props.is_empty());
    assert_eq!(plan.all_props.shape.len(), 4);
    assert_eq!(plan.all_props.shape["width"], PropValue::Number(10.0));
    let id = rec.find("a").unwrap();
    assert_eq!(rec.lifecycle(id), Some(Lifecycle::Steady));
    assert_eq!(num(&r, id, AttrGroup::Shape, "width"), 10.0);
}

#[test]
fn node_transition_animates_changed_shape_keys() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    pass(&mut rec, &mut r, vec![rect("a", 0.0, 0.0, 10.0, 10.0).build().unwrap()]);
    let report = pass(
        &mut rec,
        &mut r,
        vec![rect("a", 0.0, 0.0, 20.0, 10.0).transition(["shape"]).build().unwrap()],
    );
    let plan = report.plan_for("a").unwrap();
    assert_eq!(plan.from_props.shape.len(), 1);
    assert_eq!(plan.from_props.shape["width"], PropValue::Number(10.0));
    assert_eq!(plan.all_props.shape["width"], PropValue::Number(20.0));

    let id = rec.find("a").unwrap();
    assert_eq!(num(&r, id, AttrGroup::Shape, "width"), 10.0);
    rec.advance(&mut r, 150.0).unwrap();
    let mid = num(&r, id, AttrGroup::Shape, "width");
    assert!(mid > 10.0 && mid < 20.0);
    rec.advance(&mut r, 200.0).unwrap();
    assert_eq!(num(&r, id, AttrGroup::Shape, "width"), 20.0);
}

#[test]
fn position_changes_animate_by_default() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    pass(&mut rec, &mut r, vec![rect("a", 0.0, 0.0, 1.0, 1.0).position(0.0, 0.0).build().unwrap()]);
    let report = pass(
        &mut rec,
        &mut r,
        vec![rect("a", 0.0, 0.0, 1.0, 1.0).position(100.0, 0.0).build().unwrap()],
    );
    let plan = report.plan_for("a").unwrap();
    assert_eq!(plan.from_props.transform.get(&TransformProp::X), Some(&0.0));
    let id = rec.find("a").unwrap();
    rec.advance(&mut r, 150.0).unwrap();
    let x = num(&r, id, AttrGroup::Transform, "x");
    assert!(x > 0.0 && x < 100.0);
}

#[test]
fn identical_passes_keep_identity_and_plan_nothing() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    let opt = rect("a", 0.0, 0.0, 10.0, 10.0).transition(["shape"]).build().unwrap();
    pass(&mut rec, &mut r, vec![opt.clone()]);
    let id = rec.find("a").unwrap();
    for _ in 0..3 {
        let report = pass(&mut rec, &mut r, vec![opt.clone()]);
        assert!(report.plan_for("a").unwrap().from_props.is_empty());
        assert_eq!(rec.find("a"), Some(id));
    }
    assert_eq!(r.stats().created, 1);
    assert_eq!(r.stats().destroyed, 0);
    assert_eq!(r.animation_count(), 0);
}

#[test]
fn leaving_element_defers_destroy_until_animation_ends() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    pass(
        &mut rec,
        &mut r,
        vec![rect("a", 0.0, 0.0, 10.0, 10.0).leave_to("scaleX", 0.0).build().unwrap()],
    );
    let id = rec.find("a").unwrap();
    let report = pass(&mut rec, &mut r, vec![]);
    assert_eq!(report.removed, 1);
    assert_eq!(rec.lifecycle(id), Some(Lifecycle::Leaving));
    assert_eq!(rec.leaving(), &[id]);
    assert!(rec.roots().is_empty());

    assert_eq!(rec.remove(&mut r, &model(), id).unwrap(), RemoveOutcome::Deferred);
    rec.advance(&mut r, 150.0).unwrap();
    let sx = num(&r, id, AttrGroup::Transform, "scaleX");
    assert!(sx < 1.0 && sx > 0.0);

    rec.advance(&mut r, 200.0).unwrap();
    assert!(!r.contains(id));
    assert!(rec.lifecycle(id).is_none());
    assert!(rec.leaving().is_empty());
}

#[test]
fn removal_without_leave_values_destroys_at_once() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    pass(&mut rec, &mut r, vec![rect("a", 0.0, 0.0, 1.0, 1.0).build().unwrap()]);
    let id = rec.find("a").unwrap();
    let items = vec![None];
    rec.reconcile(&mut r, &model(), &items, None).unwrap();
    assert!(!r.contains(id));
    assert_eq!(rec.remove(&mut r, &model(), id).unwrap(), RemoveOutcome::Unknown);
}

#[test]
fn resurrected_element_restores_pre_leave_values() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    let opt = rect("a", 0.0, 0.0, 10.0, 10.0)
        .attr_leave_to(AttrGroup::Style, "opacity", 0.0)
        .build()
        .unwrap();
    pass(&mut rec, &mut r, vec![opt.clone()]);
    let id = rec.find("a").unwrap();
    pass(&mut rec, &mut r, vec![]);
    rec.advance(&mut r, 150.0).unwrap();
    assert!(num(&r, id, AttrGroup::Style, "opacity") < 1.0);

    let report = pass(&mut rec, &mut r, vec![opt]);
    assert_eq!(report.resurrected, 1);
    assert_eq!(rec.find("a"), Some(id));
    assert_eq!(rec.lifecycle(id), Some(Lifecycle::Steady));
    rec.advance(&mut r, 1000.0).unwrap();
    assert!(r.contains(id));
    assert_eq!(num(&r, id, AttrGroup::Style, "opacity"), 1.0);
}

#[test]
fn kind_change_recreates_from_old_transform() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    pass(&mut rec, &mut r, vec![rect("a", 0.0, 0.0, 1.0, 1.0).position(5.0, 6.0).build().unwrap()]);
    let old = rec.find("a").unwrap();
    let circle = ElementBuilder::new(ElementKind::Circle)
        .id("a")
        .shape("r", 3.0)
        .build()
        .unwrap();
    let report = pass(&mut rec, &mut r, vec![circle]);
    assert_eq!(report.recreated, 1);
    let new = rec.find("a").unwrap();
    assert_ne!(old, new);
    assert!(!r.contains(old));
    assert_eq!(r.kind(new), Some(ElementKind::Circle));
    assert_eq!(num(&r, new, AttrGroup::Transform, "x"), 5.0);
}

#[test]
fn path_data_change_recreates() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    let path = |d: &str| {
        ElementBuilder::new(ElementKind::Path)
            .id("p")
            .shape("pathData", d)
            .build()
            .unwrap()
    };
    pass(&mut rec, &mut r, vec![path("M0 0 L1 1")]);
    let report = pass(&mut rec, &mut r, vec![path("M0 0 L1 1")]);
    assert_eq!(report.recreated, 0);
    let report = pass(&mut rec, &mut r, vec![path("M0 0 L2 2")]);
    assert_eq!(report.recreated, 1);
}

#[test]
fn children_by_name_keep_identity() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    let tree = |names: &[&str]| {
        let mut g = group("g").merge_children(MergeChildren::ByName);
        for n in names {
            g = g.child(
                ElementBuilder::new(ElementKind::Circle)
                    .name(*n)
                    .shape("r", 1.0)
                    .build()
                    .unwrap(),
            );
        }
        g.build().unwrap()
    };
    pass(&mut rec, &mut r, vec![tree(&["a", "b"])]);
    let g = rec.find("g").unwrap();
    let before = rec.children(g).to_vec();
    pass(&mut rec, &mut r, vec![tree(&["b", "a"])]);
    let after = rec.children(g).to_vec();
    assert_eq!(after, vec![before[1], before[0]]);
    assert_eq!(r.parent(after[0]), Some(g));
}

#[test]
fn replace_mode_rebuilds_anonymous_children_only() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    let tree = || {
        group("g")
            .child(rect("kept", 0.0, 0.0, 1.0, 1.0).build().unwrap())
            .child(
                ElementBuilder::new(ElementKind::Circle)
                    .shape("r", 1.0)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    };
    pass(&mut rec, &mut r, vec![tree()]);
    let g = rec.find("g").unwrap();
    let before = rec.children(g).to_vec();
    pass(&mut rec, &mut r, vec![tree()]);
    let after = rec.children(g).to_vec();
    assert_eq!(after[0], before[0]);
    assert_ne!(after[1], before[1]);
    assert!(!r.contains(before[1]));
}

#[test]
fn strict_mode_rejects_unknown_transition_keys() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    pass(&mut rec, &mut r, vec![rect("a", 0.0, 0.0, 1.0, 1.0).build().unwrap()]);
    let bad = rect("a", 0.0, 0.0, 2.0, 1.0)
        .transition(["bogus"])
        .build()
        .unwrap();
    let err = rec
        .reconcile(&mut r, &model(), &[Some(bad.clone())], None)
        .unwrap_err();
    assert!(matches!(err, TesselError::Contract(_)));

    let mut lenient = Reconciler::new(ReconcileOpts {
        contract_mode: ContractMode::Lenient,
        ..ReconcileOpts::default()
    });
    let mut r2 = SceneRenderer::new();
    pass(&mut lenient, &mut r2, vec![rect("a", 0.0, 0.0, 1.0, 1.0).build().unwrap()]);
    let report = pass(&mut lenient, &mut r2, vec![bad]);
    assert_eq!(report.updated, 1);
}

#[test]
fn failed_strict_pass_keeps_the_retained_tree() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    let items = || {
        vec![
            rect("a", 0.0, 0.0, 1.0, 1.0).build().unwrap(),
            rect("b", 2.0, 0.0, 1.0, 1.0).build().unwrap(),
        ]
    };
    pass(&mut rec, &mut r, items());
    let ids = rec.roots().to_vec();

    let bad = [
        Some(rect("a", 0.0, 0.0, 1.0, 1.0).build().unwrap()),
        Some(rect("b", 2.0, 0.0, 3.0, 1.0).transition(["bogus"]).build().unwrap()),
    ];
    assert!(rec.reconcile(&mut r, &model(), &bad, None).is_err());
    assert_eq!(rec.roots(), ids.as_slice());

    let report = pass(&mut rec, &mut r, items());
    assert_eq!(report.created, 0);
    assert_eq!(report.updated, 2);
    assert_eq!(rec.roots(), ids.as_slice());
    assert_eq!(r.len(), 2);
}

#[test]
fn failed_child_update_keeps_siblings_attached() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    let tree = |second: ElementOption| {
        group("g")
            .child(rect("c1", 0.0, 0.0, 1.0, 1.0).build().unwrap())
            .child(second)
            .build()
            .unwrap()
    };
    pass(&mut rec, &mut r, vec![tree(rect("c2", 2.0, 0.0, 1.0, 1.0).build().unwrap())]);
    let g = rec.find("g").unwrap();
    let children = rec.children(g).to_vec();

    let bad = tree(rect("c2", 2.0, 0.0, 1.0, 1.0).transition(["nope"]).build().unwrap());
    assert!(rec.reconcile(&mut r, &model(), &[Some(bad)], None).is_err());
    assert_eq!(rec.children(g), children.as_slice());

    let report = pass(&mut rec, &mut r, vec![tree(rect("c2", 2.0, 0.0, 1.0, 1.0).build().unwrap())]);
    assert_eq!(report.created, 0);
    assert_eq!(rec.children(g), children.as_slice());
    assert_eq!(r.len(), 3);
}

#[test]
fn failed_creation_rolls_back_the_new_subtree() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    pass(&mut rec, &mut r, vec![rect("a", 0.0, 0.0, 1.0, 1.0).build().unwrap()]);
    let a = rec.find("a").unwrap();

    let shared = PropValue::array(vec![0.0, 0.0, 4.0, 4.0]);
    let line = ElementBuilder::new(ElementKind::Polyline)
        .id("line")
        .shape("points", shared.clone())
        .attr_enter_from(AttrGroup::Shape, "points", shared)
        .build()
        .unwrap();
    let items = [
        Some(rect("a", 0.0, 0.0, 1.0, 1.0).build().unwrap()),
        Some(group("g").child(line).build().unwrap()),
    ];
    assert!(rec.reconcile(&mut r, &model(), &items, None).is_err());
    assert_eq!(rec.roots(), &[a]);
    assert_eq!(r.len(), 1);
    assert!(rec.find("g").is_none());
}

#[test]
fn children_by_index_match_positions() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    let tree = |radii: &[f64]| {
        let mut g = group("g").merge_children(MergeChildren::ByIndex);
        for radius in radii {
            g = g.child(
                ElementBuilder::new(ElementKind::Circle)
                    .shape("r", *radius)
                    .build()
                    .unwrap(),
            );
        }
        g.build().unwrap()
    };
    pass(&mut rec, &mut r, vec![tree(&[1.0, 2.0])]);
    let g = rec.find("g").unwrap();
    let before = rec.children(g).to_vec();

    let report = pass(&mut rec, &mut r, vec![tree(&[3.0, 4.0, 5.0])]);
    assert_eq!(report.created, 1);
    let grown = rec.children(g).to_vec();
    assert_eq!(&grown[..2], before.as_slice());
    assert_eq!(num(&r, grown[0], AttrGroup::Shape, "r"), 3.0);

    let report = pass(&mut rec, &mut r, vec![tree(&[6.0])]);
    assert_eq!(report.removed, 2);
    assert_eq!(rec.children(g), &before[..1]);
    assert!(!r.contains(grown[1]) && !r.contains(grown[2]));
}

#[test]
fn leaving_child_survives_parent_updates_until_its_leave_ends() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    let leaver = || rect("c", 0.0, 0.0, 1.0, 1.0).leave_to("x", 5.0).build().unwrap();
    let stay = || rect("d", 2.0, 0.0, 1.0, 1.0).build().unwrap();
    pass(
        &mut rec,
        &mut r,
        vec![group("g").child(leaver()).child(stay()).build().unwrap()],
    );
    let g = rec.find("g").unwrap();
    let c = rec.find("c").unwrap();

    pass(&mut rec, &mut r, vec![group("g").child(stay()).build().unwrap()]);
    assert_eq!(rec.lifecycle(c), Some(Lifecycle::Leaving));
    assert_eq!(rec.children(g).len(), 1);

    rec.advance(&mut r, 100.0).unwrap();
    pass(&mut rec, &mut r, vec![group("g").child(stay()).build().unwrap()]);
    assert!(r.contains(c));
    assert_eq!(rec.lifecycle(c), Some(Lifecycle::Leaving));
    assert_eq!(r.parent(c), Some(g));

    rec.advance(&mut r, 250.0).unwrap();
    assert!(!r.contains(c));
    assert!(rec.lifecycle(c).is_none());
    assert!(r.contains(g));
    assert_eq!(r.len(), 2);
}

#[test]
fn disabled_animation_snaps_everything() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    let off = SeriesModel::new(AnimationOptions::disabled());
    let opt = rect("a", 0.0, 0.0, 1.0, 1.0)
        .attr_enter_from(AttrGroup::Style, "opacity", 0.0)
        .style("opacity", 0.5)
        .leave_to("scaleX", 0.0)
        .build()
        .unwrap();
    rec.reconcile(&mut r, &off, &[Some(opt)], None).unwrap();
    let id = rec.find("a").unwrap();
    assert_eq!(rec.lifecycle(id), Some(Lifecycle::Steady));
    assert_eq!(num(&r, id, AttrGroup::Style, "opacity"), 0.5);
    assert_eq!(r.animation_count(), 0);

    rec.reconcile(&mut r, &off, &[], None).unwrap();
    assert!(!r.contains(id));
}

#[test]
fn info_and_flags_reach_host_and_renderer() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    let opt = rect("a", 0.0, 0.0, 1.0, 1.0)
        .info(serde_json::json!({ "series": 2 }))
        .invisible(true)
        .build()
        .unwrap();
    pass(&mut rec, &mut r, vec![opt]);
    let id = rec.find("a").unwrap();
    assert_eq!(rec.info(id).unwrap()["series"], 2);
    assert!(r.flags(id).unwrap().invisible);
}

#[test]
fn combine_morph_runs_through_temporaries() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    pass(
        &mut rec,
        &mut r,
        vec![
            rect("x1", 0.0, 0.0, 10.0, 10.0).build().unwrap(),
            rect("x2", 20.0, 0.0, 10.0, 10.0).build().unwrap(),
        ],
    );
    let report = pass(
        &mut rec,
        &mut r,
        vec![
            rect("y", 0.0, 0.0, 30.0, 10.0)
                .morph_from("x1")
                .morph_from("x2")
                .build()
                .unwrap(),
        ],
    );
    assert_eq!(report.morphs, 1);
    let y = rec.find("y").unwrap();
    assert!(rec.is_morphing(y));
    assert_eq!(rec.lifecycle(y), Some(Lifecycle::Morphing));
    assert!(!r.is_visible(y));
    // y plus two temporaries; both sources are gone.
    assert_eq!(r.len(), 3);

    rec.advance(&mut r, 400.0).unwrap();
    assert_eq!(r.len(), 1);
    assert!(r.is_visible(y));
    assert_eq!(rec.lifecycle(y), Some(Lifecycle::Steady));
}

#[test]
fn groups_combine_through_their_descendant_paths() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    pass(
        &mut rec,
        &mut r,
        vec![
            group("g1")
                .child(rect("c1", 0.0, 0.0, 10.0, 10.0).build().unwrap())
                .build()
                .unwrap(),
            group("g2")
                .child(rect("c2", 20.0, 0.0, 10.0, 10.0).build().unwrap())
                .build()
                .unwrap(),
        ],
    );
    let report = pass(
        &mut rec,
        &mut r,
        vec![
            group("y")
                .morph_from("g1")
                .morph_from("g2")
                .child(rect("body", 0.0, 0.0, 30.0, 10.0).build().unwrap())
                .build()
                .unwrap(),
        ],
    );
    assert_eq!(report.morphs, 1);
    assert_eq!(report.removed, 2);
    let y = rec.find("y").unwrap();
    let body = rec.find("body").unwrap();
    // y, its body and one temporary per source path.
    assert_eq!(r.len(), 4);
    assert!(r.is_visible(y));
    assert!(!r.is_visible(body));
    assert_eq!(rec.lifecycle(body), Some(Lifecycle::Morphing));

    rec.advance(&mut r, 400.0).unwrap();
    assert_eq!(r.len(), 2);
    assert!(r.is_visible(body));
    assert_eq!(rec.lifecycle(body), Some(Lifecycle::Steady));
    assert_eq!(r.animation_count(), 0);
}

#[test]
fn overlapping_morph_sources_all_reach_a_target() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    pass(
        &mut rec,
        &mut r,
        vec![
            rect("x1", 0.0, 0.0, 10.0, 10.0).build().unwrap(),
            rect("x2", 20.0, 0.0, 10.0, 10.0).build().unwrap(),
            rect("x3", 40.0, 0.0, 10.0, 10.0).build().unwrap(),
        ],
    );
    let report = pass(
        &mut rec,
        &mut r,
        vec![
            rect("y1", 0.0, 20.0, 20.0, 10.0)
                .morph_from("x1")
                .morph_from("x2")
                .build()
                .unwrap(),
            rect("y2", 30.0, 20.0, 20.0, 10.0)
                .morph_from("x2")
                .morph_from("x3")
                .build()
                .unwrap(),
        ],
    );
    assert_eq!(report.morphs, 1);
    assert_eq!(report.removed, 3);
    let (y1, y2) = (rec.find("y1").unwrap(), rec.find("y2").unwrap());
    // Two targets and three temporaries, one per source.
    assert_eq!(r.len(), 5);
    assert!(!r.is_visible(y1) && !r.is_visible(y2));

    rec.advance(&mut r, 400.0).unwrap();
    assert_eq!(r.len(), 2);
    assert!(r.is_visible(y1) && r.is_visible(y2));
}

#[test]
fn morph_falls_back_to_swap_for_non_geometric_kinds() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    let text = ElementBuilder::new(ElementKind::Text)
        .id("t")
        .style("text", "hi")
        .build()
        .unwrap();
    pass(&mut rec, &mut r, vec![text]);
    let report = pass(
        &mut rec,
        &mut r,
        vec![rect("y", 0.0, 0.0, 1.0, 1.0).morph_from("t").build().unwrap()],
    );
    assert_eq!(report.morphs, 0);
    assert_eq!(r.len(), 1);
    let y = rec.find("y").unwrap();
    assert!(r.is_visible(y));
}

#[test]
fn clear_destroys_everything() {
    let mut rec = strict();
    let mut r = SceneRenderer::new();
    pass(
        &mut rec,
        &mut r,
        vec![
            group("g")
                .child(rect("c", 0.0, 0.0, 1.0, 1.0).build().unwrap())
                .build()
                .unwrap(),
            rect("a", 0.0, 0.0, 1.0, 1.0).leave_to("x", 5.0).build().unwrap(),
        ],
    );
    let g = rec.find("g").unwrap();
    pass(
        &mut rec,
        &mut r,
        vec![group("g").child(rect("c", 0.0, 0.0, 1.0, 1.0).build().unwrap()).build().unwrap()],
    );
    assert_eq!(rec.leaving().len(), 1);
    rec.clear(&mut r);
    assert!(r.is_empty());
    assert!(rec.lifecycle(g).is_none());
    assert!(rec.roots().is_empty());
}
