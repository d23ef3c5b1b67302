//! Topology validation and the conflict relation

use junction_sim::simulation::{ConfigError, JunctionTopology, SlotKey, TopologyBuilder};

#[test]
fn test_standard_topology_conflicts() {
    let topology = JunctionTopology::standard().expect("standard topology should be valid");
    let id = |name: &str| topology.route_id(name).unwrap();

    assert_eq!(topology.route_count(), 4);
    assert!(topology.conflicts(id("a-b"), id("a-c")));
    assert!(topology.conflicts(id("a-c"), id("b-a")));
    assert!(topology.conflicts(id("b-a"), id("c-a")));

    assert!(!topology.conflicts(id("a-b"), id("b-a")));
    assert!(!topology.conflicts(id("a-b"), id("c-a")));
    assert!(!topology.conflicts(id("a-c"), id("c-a")));

    assert_eq!(topology.conflict_pairs().len(), 3);
    assert_eq!(topology.conflicting_routes(id("a-c")), vec![id("a-b"), id("b-a")]);
}

#[test]
fn test_conflict_relation_is_symmetric() {
    let topology = JunctionTopology::standard().unwrap();
    for a in topology.route_ids() {
        for b in topology.route_ids() {
            assert_eq!(topology.conflicts(a, b), topology.conflicts(b, a));
        }
    }
}

#[test]
fn test_standard_topology_slots() {
    let topology = JunctionTopology::standard().unwrap();
    let slots = topology.slot_keys();
    // four own-track segments plus three shared ones
    assert_eq!(slots.len(), 7);
    assert!(slots.contains(&SlotKey::new("c-a", "b-a")));
}

#[test]
fn test_missing_counterpart_is_rejected() {
    let result = TopologyBuilder::new()
        .route("x", [("x", "x"), ("x", "y")])
        .route("y", [("y", "y")])
        .build();

    assert_eq!(
        result.unwrap_err(),
        ConfigError::AsymmetricSlot {
            route: "x".to_string(),
            slot: SlotKey::new("x", "y"),
            missing_in: "y".to_string(),
        }
    );
}

#[test]
fn test_pair_order_in_footprints_does_not_matter() {
    let topology = TopologyBuilder::new()
        .route("x", [("x", "y")])
        .route("y", [("x", "y")])
        .build()
        .expect("the same unordered pair declared twice is symmetric");
    assert!(topology.conflicts(topology.route_id("x").unwrap(), topology.route_id("y").unwrap()));
}

#[test]
fn test_unknown_route_is_rejected() {
    let result = TopologyBuilder::new().route("x", [("x", "ghost")]).build();
    assert!(matches!(
        result,
        Err(ConfigError::UnknownRoute { ref unknown, .. }) if unknown == "ghost"
    ));
}

#[test]
fn test_foreign_slot_is_rejected() {
    let result = TopologyBuilder::new()
        .route("x", [("x", "x"), ("y", "z")])
        .route("y", [("y", "z")])
        .route("z", [("y", "z")])
        .build();
    assert!(matches!(result, Err(ConfigError::ForeignSlot { ref route, .. }) if route == "x"));
}

#[test]
fn test_duplicate_and_empty_routes_are_rejected() {
    let duplicate = TopologyBuilder::new()
        .route("x", [("x", "x")])
        .route("x", [("x", "x")])
        .build();
    assert_eq!(duplicate.unwrap_err(), ConfigError::DuplicateRoute("x".to_string()));

    let empty = TopologyBuilder::new()
        .route("x", Vec::<(&str, &str)>::new())
        .build();
    assert_eq!(empty.unwrap_err(), ConfigError::EmptyFootprint("x".to_string()));

    assert_eq!(TopologyBuilder::new().build().unwrap_err(), ConfigError::NoRoutes);
}

#[test]
fn test_duplicate_slots_in_footprint_collapse() {
    let topology = TopologyBuilder::new()
        .route("x", [("x", "x"), ("x", "x")])
        .build()
        .unwrap();
    assert_eq!(topology.footprint(topology.route_id("x").unwrap()).len(), 1);
}
