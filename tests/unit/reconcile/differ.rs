use super::*;

fn id(s: &str) -> DiffKey {
    DiffKey::Id(s.to_string())
}

#[test]
fn matches_by_key_and_reports_adds_and_removes() {
    let old = vec![id("a"), id("b"), id("c")];
    let new = vec![Some(id("c")), Some(id("a")), Some(id("d"))];
    let ops = KeyedDiffer::diff(&old, &new);
    assert_eq!(
        ops,
        vec![
            DiffOp::Update { old: 2, new: 0 },
            DiffOp::Update { old: 0, new: 1 },
            DiffOp::Add { new: 2 },
            DiffOp::Remove { old: 1 },
        ]
    );
}

#[test]
fn duplicate_keys_pair_in_order() {
    let old = vec![id("x"), id("x")];
    let new = vec![Some(id("x")), Some(id("x")), Some(id("x"))];
    let ops = KeyedDiffer::diff(&old, &new);
    assert_eq!(
        ops,
        vec![
            DiffOp::Update { old: 0, new: 0 },
            DiffOp::Update { old: 1, new: 1 },
            DiffOp::Add { new: 2 },
        ]
    );
}

#[test]
fn empty_slots_never_match() {
    let old = vec![DiffKey::Index(0), DiffKey::Index(1)];
    let new = vec![Some(DiffKey::Index(0)), None];
    let ops = KeyedDiffer::diff(&old, &new);
    assert_eq!(
        ops,
        vec![DiffOp::Update { old: 0, new: 0 }, DiffOp::Remove { old: 1 }]
    );
}

#[test]
fn names_and_indices_do_not_collide() {
    let old = vec![DiffKey::Name("0".into())];
    let new = vec![Some(DiffKey::Index(0))];
    let ops = KeyedDiffer::diff(&old, &new);
    assert_eq!(ops, vec![DiffOp::Add { new: 0 }, DiffOp::Remove { old: 0 }]);
}
