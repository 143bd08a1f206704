use std::collections::HashMap;

use ahash::{AHashMap, AHashSet};

use crate::graph::WeightMatrix;

/// An undirected adjacency graph in compressed sparse row format, with named
/// node series, boolean node flags, and named per-edge weights.
///
/// Edges are identified by their index in the edge list passed to `new`.
/// The graph is read-only once constructed.
#[derive(Debug)]
pub struct Graph {
    size: usize,
    offsets: Vec<u32>,
    edges: Vec<u32>,            // CSR neighbor slots
    slot_edges: Vec<u32>,       // CSR slot -> edge id
    endpoints: Vec<(u32, u32)>, // edge id -> endpoints
    node_weights: WeightMatrix,
    node_flags: AHashMap<String, Vec<bool>>,
    edge_weights: AHashMap<String, Vec<f64>>,
}

impl Graph {
    /// Construct a graph from an undirected edge list and attribute maps.
    /// Edge weight vectors are indexed by position in `edge_list`.
    pub fn new(
        num_nodes: usize,
        edge_list: &[(u32, u32)],
        node_weights: WeightMatrix,
        node_flags: HashMap<String, Vec<bool>>,
        edge_weights: HashMap<String, Vec<f64>>,
    ) -> Self {
        assert!(node_weights.num_rows() == num_nodes, "node_weights rows must equal num_nodes");
        node_flags.iter().for_each(|(name, values)| {
            assert!(values.len() == num_nodes, "node_flags[{name}].len() must equal num_nodes");
        });
        edge_weights.iter().for_each(|(name, values)| {
            assert!(values.len() == edge_list.len(), "edge_weights[{name}].len() must equal number of edges");
        });

        let mut seen = AHashSet::with_capacity(edge_list.len());
        let mut degree = vec![0u32; num_nodes];
        for &(u, v) in edge_list {
            assert!((u as usize) < num_nodes && (v as usize) < num_nodes, "edge ({u}, {v}) out of range");
            assert!(u != v, "self-loop on node {u}");
            assert!(seen.insert(if u < v { (u, v) } else { (v, u) }), "duplicate edge ({u}, {v})");
            degree[u as usize] += 1;
            degree[v as usize] += 1;
        }

        let offsets = std::iter::once(0u32).chain(
            degree.iter()
                .copied()
                .scan(0u32, |acc, len| { *acc += len; Some(*acc) })
        ).collect::<Vec<u32>>();

        let mut edges = vec![0u32; edge_list.len() * 2];
        let mut slot_edges = vec![0u32; edge_list.len() * 2];
        let mut cursor = offsets[..num_nodes].to_vec();
        for (edge, &(u, v)) in edge_list.iter().enumerate() {
            edges[cursor[u as usize] as usize] = v;
            slot_edges[cursor[u as usize] as usize] = edge as u32;
            cursor[u as usize] += 1;
            edges[cursor[v as usize] as usize] = u;
            slot_edges[cursor[v as usize] as usize] = edge as u32;
            cursor[v as usize] += 1;
        }

        Self {
            size: num_nodes,
            offsets,
            edges,
            slot_edges,
            endpoints: edge_list.to_vec(),
            node_weights,
            node_flags: node_flags.into_iter().collect(),
            edge_weights: edge_weights.into_iter().collect(),
        }
    }

    /// Get the number of nodes in the graph.
    #[inline] pub fn node_count(&self) -> usize { self.size }

    /// Get the number of undirected edges in the graph.
    #[inline] pub fn edge_count(&self) -> usize { self.endpoints.len() }

    /// Get a reference to the node weights matrix.
    #[inline] pub fn node_weights(&self) -> &WeightMatrix { &self.node_weights }

    /// Get the range of CSR slots for a given node.
    #[inline]
    fn range(&self, node: usize) -> std::ops::Range<usize> {
        self.offsets[node] as usize .. self.offsets[node + 1] as usize
    }

    /// Get the degree (number of neighbors) of a given node.
    #[inline] pub fn degree(&self, node: usize) -> usize { self.range(node).len() }

    /// Get an iterator over the neighbors of a given node.
    #[inline]
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.range(node).map(move |slot| self.edges[slot] as usize)
    }

    /// Get an iterator over the neighbors and edge ids incident to a given node.
    #[inline]
    pub fn incident(&self, node: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.range(node).map(move |slot| (self.edges[slot] as usize, self.slot_edges[slot] as usize))
    }

    /// Get the endpoints of a given edge.
    #[inline]
    pub fn endpoints(&self, edge: usize) -> (usize, usize) {
        let (u, v) = self.endpoints[edge];
        (u as usize, v as usize)
    }

    /// Whether a named boolean node flag is present.
    #[inline] pub fn has_flag(&self, name: &str) -> bool { self.node_flags.contains_key(name) }

    /// Get a boolean node flag, or `None` if the flag is not present.
    pub fn node_flag(&self, name: &str, node: usize) -> Option<bool> {
        self.node_flags.get(name).map(|values| values[node])
    }

    /// Whether a named edge weight series is present.
    #[inline] pub fn has_edge_series(&self, name: &str) -> bool { self.edge_weights.contains_key(name) }

    /// Get an edge weight, or `None` if the series is not present.
    pub fn edge_weight(&self, name: &str, edge: usize) -> Option<f64> {
        self.edge_weights.get(name).map(|values| values[edge])
    }
}
