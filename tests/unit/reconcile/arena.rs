use super::*;

#[test]
fn stale_handles_miss_after_reuse() {
    let mut arena = Arena::new();
    let a = arena.insert("a");
    assert_eq!(arena.remove(a), Some("a"));
    let b = arena.insert("b");

    assert_eq!(a.index(), b.index());
    assert_ne!(a.generation(), b.generation());
    assert!(arena.get(a).is_none());
    assert_eq!(arena.get(b), Some(&"b"));
    assert!(arena.remove(a).is_none());
    assert_eq!(arena.len(), 1);
}

#[test]
fn iter_skips_free_slots() {
    let mut arena = Arena::new();
    let ids: Vec<_> = (0..4).map(|i| arena.insert(i)).collect();
    arena.remove(ids[1]);
    let seen: Vec<_> = arena.iter().map(|(_, v)| *v).collect();
    assert_eq!(seen, vec![0, 2, 3]);
    *arena.get_mut(ids[2]).unwrap() = 20;
    assert_eq!(arena.get(ids[2]), Some(&20));
}
