//! Junction topology: routes, their footprints, and the conflict graph
//!
//! A route's footprint is the set of track segments its service holds at
//! once. Two routes conflict when their footprints intersect; the conflict
//! relation is kept as an undirected petgraph graph with one edge per shared
//! segment.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeSet, HashMap};

use super::error::ConfigError;
use super::types::{RouteId, SlotKey};

/// Route names of the standard two-branch junction: main line `a`, branches `b` and `c`
pub const STANDARD_ROUTES: [&str; 4] = ["a-b", "a-c", "b-a", "c-a"];

/// Collects routes and footprints, then validates them into a [`JunctionTopology`]
#[derive(Debug, Clone, Default)]
pub struct TopologyBuilder {
    routes: Vec<(String, Vec<SlotKey>)>,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a route with the segments its service must hold
    pub fn route<I, A, B>(mut self, name: impl Into<String>, footprint: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        let slots = footprint
            .into_iter()
            .map(|(a, b)| SlotKey::new(a, b))
            .collect();
        self.routes.push((name.into(), slots));
        self
    }

    pub fn build(self) -> Result<JunctionTopology, ConfigError> {
        if self.routes.is_empty() {
            return Err(ConfigError::NoRoutes);
        }

        let mut by_name = HashMap::new();
        let mut names = Vec::with_capacity(self.routes.len());
        let mut footprints = Vec::with_capacity(self.routes.len());

        for (index, (name, slots)) in self.routes.into_iter().enumerate() {
            if by_name.insert(name.clone(), RouteId(index)).is_some() {
                return Err(ConfigError::DuplicateRoute(name));
            }
            if slots.is_empty() {
                return Err(ConfigError::EmptyFootprint(name));
            }

            // Duplicates collapse; declaration order is kept for slot registration
            let mut seen = BTreeSet::new();
            let footprint: Vec<SlotKey> = slots
                .into_iter()
                .filter(|slot| seen.insert(slot.clone()))
                .collect();

            names.push(name);
            footprints.push(footprint);
        }

        for (route, footprint) in names.iter().zip(&footprints) {
            for slot in footprint {
                let (low, high) = slot.routes();
                for member in [low, high] {
                    if !by_name.contains_key(member) {
                        return Err(ConfigError::UnknownRoute {
                            route: route.clone(),
                            slot: slot.clone(),
                            unknown: member.to_string(),
                        });
                    }
                }

                let other = slot.other(route).ok_or_else(|| ConfigError::ForeignSlot {
                    route: route.clone(),
                    slot: slot.clone(),
                })?;

                let other_footprint = &footprints[by_name[other].0];
                if !other_footprint.contains(slot) {
                    return Err(ConfigError::AsymmetricSlot {
                        route: route.clone(),
                        slot: slot.clone(),
                        missing_in: other.to_string(),
                    });
                }
            }
        }

        let mut graph = UnGraph::with_capacity(names.len(), 0);
        let nodes: Vec<NodeIndex> = (0..names.len())
            .map(|index| graph.add_node(RouteId(index)))
            .collect();

        for (index, (route, footprint)) in names.iter().zip(&footprints).enumerate() {
            for slot in footprint {
                if let Some(other) = slot.other(route) {
                    let other_index = by_name[other].0;
                    // One edge per shared segment, added from the lower-indexed side
                    if other_index > index {
                        graph.add_edge(nodes[index], nodes[other_index], slot.clone());
                    }
                }
            }
        }

        Ok(JunctionTopology {
            names,
            by_name,
            footprints,
            graph,
            nodes,
        })
    }
}

/// Validated set of routes and footprints
#[derive(Debug, Clone)]
pub struct JunctionTopology {
    names: Vec<String>,
    by_name: HashMap<String, RouteId>,
    footprints: Vec<Vec<SlotKey>>,
    /// Conflict graph: nodes are routes, edges are shared segments
    graph: UnGraph<RouteId, SlotKey>,
    nodes: Vec<NodeIndex>,
}

impl JunctionTopology {
    pub fn builder() -> TopologyBuilder {
        TopologyBuilder::new()
    }

    /// The two-branch junction: `a-b` and `b-a` on the main line, `a-c` and
    /// `c-a` on the side branch. `a-c` crosses both main-line routes' paths
    /// into the branch, so it conflicts with `a-b` and `b-a`; `c-a` merges
    /// into `b-a`.
    pub fn standard() -> Result<Self, ConfigError> {
        TopologyBuilder::new()
            .route("a-b", [("a-b", "a-b"), ("a-b", "a-c")])
            .route("a-c", [("a-c", "a-b"), ("a-c", "a-c"), ("a-c", "b-a")])
            .route("b-a", [("b-a", "c-a"), ("b-a", "a-c"), ("b-a", "b-a")])
            .route("c-a", [("c-a", "c-a"), ("c-a", "b-a")])
            .build()
    }

    /// A junction of one route holding only its own segment
    pub fn single(route: &str) -> Result<Self, ConfigError> {
        TopologyBuilder::new().route(route, [(route, route)]).build()
    }

    pub fn route_count(&self) -> usize {
        self.names.len()
    }

    pub fn route_ids(&self) -> impl Iterator<Item = RouteId> + '_ {
        (0..self.names.len()).map(RouteId)
    }

    pub fn route_names(&self) -> &[String] {
        &self.names
    }

    pub fn route_id(&self, name: &str) -> Option<RouteId> {
        self.by_name.get(name).copied()
    }

    pub fn route_name(&self, id: RouteId) -> Option<&str> {
        self.names.get(id.0).map(String::as_str)
    }

    pub fn footprint(&self, id: RouteId) -> &[SlotKey] {
        self.footprints.get(id.0).map_or(&[], Vec::as_slice)
    }

    /// Every distinct segment, in the order routes first declare them
    pub fn slot_keys(&self) -> Vec<SlotKey> {
        let mut seen = BTreeSet::new();
        self.footprints
            .iter()
            .flatten()
            .filter(|slot| seen.insert((*slot).clone()))
            .cloned()
            .collect()
    }

    /// Whether the two routes' footprints intersect. A route always conflicts with itself.
    pub fn conflicts(&self, a: RouteId, b: RouteId) -> bool {
        if a == b {
            return true;
        }
        match (self.nodes.get(a.0), self.nodes.get(b.0)) {
            (Some(na), Some(nb)) => self.graph.contains_edge(*na, *nb),
            _ => false,
        }
    }

    /// Routes whose footprints intersect the given route's, sorted by id
    pub fn conflicting_routes(&self, id: RouteId) -> Vec<RouteId> {
        let Some(node) = self.nodes.get(id.0) else {
            return Vec::new();
        };
        let mut routes: Vec<RouteId> = self.graph.neighbors(*node).map(|n| self.graph[n]).collect();
        routes.sort();
        routes.dedup();
        routes
    }

    /// Every conflicting pair once, lower id first
    pub fn conflict_pairs(&self) -> Vec<(RouteId, RouteId)> {
        let mut pairs: Vec<(RouteId, RouteId)> = self
            .graph
            .edge_references()
            .map(|edge| {
                let (a, b) = (self.graph[edge.source()], self.graph[edge.target()]);
                (a.min(b), a.max(b))
            })
            .collect();
        pairs.sort();
        pairs.dedup();
        pairs
    }
}
