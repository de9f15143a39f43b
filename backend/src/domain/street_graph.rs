//! Street-network graph used to route between snapped points.
//!
//! The graph is undirected; each edge joins consecutive nodes of a way and is
//! weighted by its haversine length in metres. Shortest paths use A* with the
//! straight-line distance to the goal as an admissible heuristic.

use std::collections::HashMap;

use petgraph::algo::astar;
use petgraph::graph::{NodeIndex, UnGraph};

use super::geo::{Coordinate, haversine_m};

/// Raw network node as fetched from the street-network source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkNode {
    pub id: i64,
    pub coord: Coordinate,
}

/// Raw network way: an ordered list of node references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkWay {
    pub id: i64,
    pub nodes: Vec<i64>,
}

/// Nodes and ways around a point, ready to be turned into a [`StreetGraph`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreetNetwork {
    pub nodes: Vec<NetworkNode>,
    pub ways: Vec<NetworkWay>,
}

/// A shortest path between two graph nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphPath {
    pub coordinates: Vec<Coordinate>,
    pub length_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StreetGraphError {
    #[error("street network contains no routable segments")]
    Empty,
}

/// Routable, undirected street graph.
#[derive(Debug, Clone)]
pub struct StreetGraph {
    graph: UnGraph<Coordinate, f64>,
}

impl StreetGraph {
    /// Build a graph from `network`, keeping only nodes referenced by a way
    /// segment whose both ends are known.
    pub fn from_network(network: &StreetNetwork) -> Result<Self, StreetGraphError> {
        let coords: HashMap<i64, Coordinate> =
            network.nodes.iter().map(|node| (node.id, node.coord)).collect();
        let mut graph = UnGraph::<Coordinate, f64>::default();
        let mut indices: HashMap<i64, NodeIndex> = HashMap::new();

        for way in &network.ways {
            for pair in way.nodes.windows(2) {
                let [a, b] = pair else { continue };
                if a == b {
                    continue;
                }
                let (Some(&ca), Some(&cb)) = (coords.get(a), coords.get(b)) else {
                    continue;
                };
                let ia = *indices.entry(*a).or_insert_with(|| graph.add_node(ca));
                let ib = *indices.entry(*b).or_insert_with(|| graph.add_node(cb));
                graph.update_edge(ia, ib, haversine_m(ca, cb));
            }
        }

        if graph.edge_count() == 0 {
            return Err(StreetGraphError::Empty);
        }
        Ok(Self { graph })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn coordinate(&self, node: NodeIndex) -> Option<Coordinate> {
        self.graph.node_weight(node).copied()
    }

    /// Graph node closest to `coord` by great-circle distance.
    pub fn nearest_node(&self, coord: Coordinate) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .map(|idx| (idx, haversine_m(self.graph[idx], coord)))
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(idx, _)| idx)
    }

    /// Shortest path from `from` to `to`; `None` when unreachable.
    pub fn shortest_path(&self, from: NodeIndex, to: NodeIndex) -> Option<GraphPath> {
        let goal = *self.graph.node_weight(to)?;
        self.graph.node_weight(from)?;
        let (length_m, nodes) = astar(
            &self.graph,
            from,
            |node| node == to,
            |edge| *edge.weight(),
            |node| haversine_m(self.graph[node], goal),
        )?;
        Some(GraphPath {
            coordinates: nodes.into_iter().map(|idx| self.graph[idx]).collect(),
            length_m,
        })
    }
}
