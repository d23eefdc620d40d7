use super::*;

#[test]
fn many_paths_go_round_robin_by_position() {
    let batches = prepare_morph_batches(&["a", "b"], &[vec!["x0", "x1"], vec!["y0", "y1", "y2"]]);
    assert_eq!(batches[0].one, "a");
    assert_eq!(batches[0].many, vec!["x0", "y0", "y2"]);
    assert_eq!(batches[1].many, vec!["x1", "y1"]);
}

#[test]
fn empty_batches_borrow_half_of_a_donor() {
    let batches = prepare_morph_batches(&["a", "b"], &[vec!["x"], vec!["y"], vec!["z"]]);
    assert_eq!(batches[0].many, vec!["x", "y"]);
    assert_eq!(batches[1].many, vec!["z"]);
}

#[test]
fn borrowing_stops_when_nothing_can_be_spared() {
    let batches = prepare_morph_batches(&["a", "b", "c"], &[vec!["x"]]);
    assert_eq!(batches[0].many, vec!["x"]);
    assert!(batches[1].many.is_empty());
    assert!(batches[2].many.is_empty());
}

#[test]
fn no_one_side_means_no_batches() {
    let batches = prepare_morph_batches::<&str>(&[], &[vec!["x"]]);
    assert!(batches.is_empty());
}
