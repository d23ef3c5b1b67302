//! Post-run correctness checks over exported train records
//!
//! A train occupies the junction over `[service_start, completion)`. Trains
//! still in service at the end of a run are treated as occupying it forever.

use std::collections::BTreeMap;

use super::topology::JunctionTopology;
use super::train::TrainRecord;
use super::types::SimTime;

fn occupation(record: &TrainRecord) -> Option<(SimTime, SimTime)> {
    record
        .service_interval()
        .or_else(|| Some((record.service_start_time?, SimTime::INFINITY)))
}

fn overlaps(a: (SimTime, SimTime), b: (SimTime, SimTime)) -> bool {
    a.0.max(b.0) < a.1.min(b.1)
}

/// Pairs of train ids from `route_a` and `route_b` whose service intervals overlap.
///
/// When both names are the same route each pair is reported once.
pub fn overlapping_trains(records: &[TrainRecord], route_a: &str, route_b: &str) -> Vec<(u64, u64)> {
    let served = |route: &str| -> Vec<(u64, (SimTime, SimTime))> {
        records
            .iter()
            .filter(|record| record.route == route)
            .filter_map(|record| occupation(record).map(|interval| (record.id, interval)))
            .collect()
    };
    let left = served(route_a);
    let right = served(route_b);

    let mut pairs = Vec::new();
    for (id_a, interval_a) in &left {
        for (id_b, interval_b) in &right {
            if route_a == route_b && id_a >= id_b {
                continue;
            }
            if overlaps(*interval_a, *interval_b) {
                pairs.push((*id_a, *id_b));
            }
        }
    }
    pairs
}

/// Overlap count for every pair of distinct routes, keyed by sorted name pair
pub fn overlap_counts(
    records: &[TrainRecord],
    topology: &JunctionTopology,
) -> BTreeMap<(String, String), usize> {
    let names = topology.route_names();
    let mut counts = BTreeMap::new();
    for (i, a) in names.iter().enumerate() {
        for b in &names[i + 1..] {
            let count = overlapping_trains(records, a, b).len();
            let key = if a <= b {
                (a.clone(), b.clone())
            } else {
                (b.clone(), a.clone())
            };
            counts.insert(key, count);
        }
    }
    counts
}

/// Total overlaps between routes that conflict, including a route with itself.
/// Zero for every correct run.
pub fn conflict_overlaps(records: &[TrainRecord], topology: &JunctionTopology) -> usize {
    let between: usize = topology
        .conflict_pairs()
        .into_iter()
        .filter_map(|(a, b)| Some((topology.route_name(a)?, topology.route_name(b)?)))
        .map(|(a, b)| overlapping_trains(records, a, b).len())
        .sum();

    // A route shares its own segments only if its footprint names itself
    let within: usize = topology
        .route_ids()
        .filter_map(|id| {
            let name = topology.route_name(id)?;
            let holds_own = topology
                .footprint(id)
                .iter()
                .any(|slot| slot.routes() == (name, name));
            holds_own.then(|| overlapping_trains(records, name, name).len())
        })
        .sum();

    between + within
}

/// Trains of a route whose service started before that of a train that arrived earlier
pub fn fifo_violations(records: &[TrainRecord]) -> Vec<u64> {
    let mut by_route: BTreeMap<&str, Vec<&TrainRecord>> = BTreeMap::new();
    for record in records {
        by_route.entry(record.route.as_str()).or_default().push(record);
    }

    let mut violations = Vec::new();
    for trains in by_route.values_mut() {
        trains.sort_by_key(|record| record.id);
        let mut latest_start = SimTime::NEG_INFINITY;
        let mut unserved_seen = false;
        for record in trains.iter() {
            match record.service_start_time {
                Some(start) if start < latest_start || unserved_seen => violations.push(record.id),
                Some(start) => latest_start = start,
                None => unserved_seen = true,
            }
        }
    }
    violations.sort_unstable();
    violations
}
