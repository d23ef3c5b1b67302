//! Resource pool: canonical slots and all-or-nothing acquisition

use junction_sim::simulation::{ResourcePool, RouteId, SlotKey};

fn pool_with(keys: &[(&str, &str)]) -> ResourcePool {
    let mut pool = ResourcePool::new();
    for (a, b) in keys {
        pool.add_slot(SlotKey::new(*a, *b));
    }
    pool
}

#[test]
fn test_slot_key_is_order_independent() {
    assert_eq!(SlotKey::new("a-b", "a-c"), SlotKey::new("a-c", "a-b"));
    assert_eq!(SlotKey::new("x", "y").routes(), ("x", "y"));
    assert_eq!(SlotKey::new("y", "x").routes(), ("x", "y"));
    assert_eq!(SlotKey::new("x", "y").other("y"), Some("x"));
    assert_eq!(SlotKey::new("x", "x").other("x"), Some("x"));
    assert_eq!(SlotKey::new("x", "y").other("z"), None);
}

#[test]
fn test_slot_is_stored_once() {
    let mut pool = ResourcePool::new();
    let first = pool.add_slot(SlotKey::new("a", "b"));
    let second = pool.add_slot(SlotKey::new("b", "a"));

    assert_eq!(first, second);
    assert_eq!(pool.len(), 1);
    assert_eq!(pool.slot_between("a", "b"), Some(first));
    assert_eq!(pool.slot_between("b", "a"), Some(first));
    assert_eq!(pool.slot_between("a", "c"), None);
}

#[test]
fn test_acquire_all_claims_every_slot() {
    let mut pool = pool_with(&[("a", "a"), ("a", "b")]);
    let footprint = vec![
        pool.slot_between("a", "a").unwrap(),
        pool.slot_between("a", "b").unwrap(),
    ];

    assert!(pool.can_acquire_all(&footprint));
    assert!(pool.try_acquire_all(RouteId(0), &footprint));
    for slot in &footprint {
        assert_eq!(pool.holder(*slot), Some(RouteId(0)));
    }
    assert!(!pool.can_acquire_all(&footprint));
}

#[test]
fn test_partially_held_footprint_claims_nothing() {
    let mut pool = pool_with(&[("a", "b"), ("b", "b"), ("b", "c")]);
    let ab = pool.slot_between("a", "b").unwrap();
    let bb = pool.slot_between("b", "b").unwrap();
    let bc = pool.slot_between("b", "c").unwrap();

    assert!(pool.try_acquire_all(RouteId(2), &[bc]));

    // Route b needs all three; bc is taken so nothing may be held afterwards
    assert!(!pool.try_acquire_all(RouteId(1), &[ab, bb, bc]));
    assert_eq!(pool.holder(ab), None);
    assert_eq!(pool.holder(bb), None);
    assert_eq!(pool.holder(bc), Some(RouteId(2)));
}

#[test]
fn test_release_only_frees_own_slots() {
    let mut pool = pool_with(&[("a", "b"), ("c", "c")]);
    let ab = pool.slot_between("a", "b").unwrap();
    let cc = pool.slot_between("c", "c").unwrap();

    assert!(pool.try_acquire_all(RouteId(0), &[ab]));
    assert!(pool.try_acquire_all(RouteId(2), &[cc]));

    assert_eq!(pool.holders(), vec![Some(RouteId(0)), Some(RouteId(2))]);

    pool.release_all(RouteId(0), &[ab, cc]);
    assert_eq!(pool.holder(ab), None);
    assert_eq!(pool.holder(cc), Some(RouteId(2)), "Slot held by another route must survive");

    pool.release_all(RouteId(2), &[cc]);
    assert!(pool.slots().iter().all(|slot| slot.is_free()));
    assert_eq!(pool.holders(), vec![None, None]);
}

#[test]
fn test_acquisition_counts() {
    let mut pool = pool_with(&[("a", "a")]);
    let slot = pool.slot_between("a", "a").unwrap();
    for _ in 0..3 {
        assert!(pool.try_acquire_all(RouteId(0), &[slot]));
        pool.release_all(RouteId(0), &[slot]);
    }
    assert_eq!(pool.get(slot).unwrap().acquisitions, 3);
}

#[test]
fn test_unknown_slot_is_never_acquirable() {
    let mut pool = pool_with(&[("a", "a")]);
    let slot = pool.slot_between("a", "a").unwrap();
    let bogus = junction_sim::simulation::SlotId(42);
    assert!(!pool.try_acquire_all(RouteId(0), &[slot, bogus]));
    assert_eq!(pool.holder(slot), None);
}
