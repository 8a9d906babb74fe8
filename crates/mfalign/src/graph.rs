use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use rayon::prelude::*;

use mfalign_common::config::GraphConfig;
use mfalign_common::feature::{DatasetFeatures, FeatureKey, MassFeature};

use crate::index::SpatialIndex;
use crate::scoring::similarity_score;

/// A feature in the similarity graph.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureNode {
    pub key: FeatureKey,
    pub mz: f64,
    pub rt: f64,
    pub intensity: Option<f64>,
}

/// Attributes of an undirected similarity edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityEdge {
    pub weight: f64,
    pub mz_diff: f64,
    pub rt_diff: f64,
}

/// Basic graph statistics, logged after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphStats {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub mean_degree: f64,
    pub connected_components: usize,
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "nodes: {}, edges: {}, mean degree: {:.2}, connected components: {}",
            self.num_nodes, self.num_edges, self.mean_degree, self.connected_components
        )
    }
}

/// Undirected cross-dataset similarity graph.
///
/// Nodes are a dense table indexed by integer id over the flattened feature
/// pool; adjacency is a sorted map per node, so neighbour iteration order is
/// deterministic. Edges only ever connect features from different datasets.
#[derive(Debug, Clone, Default)]
pub struct FeatureGraph {
    nodes: Vec<FeatureNode>,
    adjacency: Vec<BTreeMap<usize, SimilarityEdge>>,
    edge_count: usize,
}

impl FeatureGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn node(&self, id: usize) -> &FeatureNode {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[FeatureNode] {
        &self.nodes
    }

    /// Neighbour ids of a node in ascending order.
    pub fn neighbors(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[id].keys().copied()
    }

    pub fn degree(&self, id: usize) -> usize {
        self.adjacency[id].len()
    }

    pub fn edge(&self, u: usize, v: usize) -> Option<&SimilarityEdge> {
        self.adjacency[u].get(&v)
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.adjacency[u].contains_key(&v)
    }

    /// Every edge exactly once, smaller id first, in ascending order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, &SimilarityEdge)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(u, nbrs)| {
            nbrs.iter()
                .filter_map(move |(&v, e)| (v > u).then_some((u, v, e)))
        })
    }

    fn add_edge(&mut self, u: usize, v: usize, edge: SimilarityEdge) {
        debug_assert_ne!(u, v);
        debug_assert_ne!(self.nodes[u].key.dataset, self.nodes[v].key.dataset);
        if self.adjacency[u].insert(v, edge).is_none() {
            self.edge_count += 1;
        }
        self.adjacency[v].insert(u, edge);
    }

    fn remove_edge(&mut self, u: usize, v: usize) -> bool {
        if self.adjacency[u].remove(&v).is_some() {
            self.adjacency[v].remove(&u);
            self.edge_count -= 1;
            true
        } else {
            false
        }
    }

    /// One-shot local deconfliction: for each node in ascending id order,
    /// group its current neighbours by dataset and keep only the strongest
    /// edge per dataset (ties keep the lowest neighbour id).
    ///
    /// The pass is deliberately not iterated to a fixpoint, so the result is
    /// not globally symmetric: removals made at earlier nodes are visible to
    /// later nodes, and two competing features can each survive with edges to
    /// different partners.
    ///
    /// # Returns
    /// The number of edges removed.
    pub fn deconflict_local(&mut self) -> usize {
        let mut removed = 0;
        for node in 0..self.nodes.len() {
            // a node needs at least two neighbours to have a conflict
            if self.degree(node) < 2 {
                continue;
            }
            let by_dataset: HashMap<usize, Vec<(usize, f64)>> = self.adjacency[node]
                .iter()
                .map(|(&nbr, e)| (self.nodes[nbr].key.dataset, (nbr, e.weight)))
                .into_group_map();
            for candidates in by_dataset.into_values() {
                if candidates.len() < 2 {
                    continue;
                }
                let mut best = candidates[0];
                for &candidate in &candidates[1..] {
                    if candidate.1 > best.1 {
                        best = candidate;
                    }
                }
                for (neighbor, _) in candidates {
                    if neighbor != best.0 && self.remove_edge(node, neighbor) {
                        removed += 1;
                    }
                }
            }
        }
        log::debug!("Deconfliction removed {} edges", removed);
        removed
    }

    pub fn stats(&self) -> GraphStats {
        let n = self.nodes.len();
        let degree_sum: usize = self.adjacency.iter().map(|a| a.len()).sum();
        GraphStats {
            num_nodes: n,
            num_edges: self.edge_count,
            mean_degree: if n == 0 { 0.0 } else { degree_sum as f64 / n as f64 },
            connected_components: self.connected_components(),
        }
    }

    fn connected_components(&self) -> usize {
        let n = self.nodes.len();
        let mut seen = vec![false; n];
        let mut stack = Vec::new();
        let mut components = 0;
        for start in 0..n {
            if seen[start] {
                continue;
            }
            components += 1;
            seen[start] = true;
            stack.push(start);
            while let Some(u) = stack.pop() {
                for v in self.neighbors(u) {
                    if !seen[v] {
                        seen[v] = true;
                        stack.push(v);
                    }
                }
            }
        }
        components
    }
}

/// Builds the cross-dataset similarity graph from per-dataset feature lists.
pub struct GraphBuilder {
    config: GraphConfig,
}

impl GraphBuilder {
    pub fn new(config: GraphConfig) -> Self {
        GraphBuilder { config }
    }

    /// Flattens the datasets into the dense node table, finds candidate
    /// pairs through the spatial index and adds an edge for every
    /// cross-dataset pair that passes the exact per-axis tolerance check
    /// with a positive similarity score.
    ///
    /// # Parameters
    /// - `datasets`: Feature lists in dataset-id order
    ///
    /// # Returns
    /// The similarity graph; node ids follow dataset order, then file order.
    pub fn build(&self, datasets: &[DatasetFeatures]) -> FeatureGraph {
        let mut nodes = Vec::new();
        let mut features: Vec<&MassFeature> = Vec::new();
        for (dataset, ds) in datasets.iter().enumerate() {
            for (feature, f) in ds.features.iter().enumerate() {
                nodes.push(FeatureNode {
                    key: FeatureKey { dataset, feature },
                    mz: f.mz,
                    rt: f.rt,
                    intensity: f.intensity,
                });
                features.push(f);
            }
        }

        let coords: Vec<(f64, f64)> = nodes.iter().map(|n| (n.mz, n.rt)).collect();
        let index = SpatialIndex::new(&coords);
        let radius = (self.config.mz_tolerance.powi(2) + self.config.rt_tolerance.powi(2)).sqrt();
        let pairs = index.query_pairs(radius);

        let config = &self.config;
        let edges: Vec<(usize, usize, SimilarityEdge)> = pairs
            .par_iter()
            .filter_map(|&(i, j)| {
                let (a, b) = (&nodes[i], &nodes[j]);
                if a.key.dataset == b.key.dataset {
                    return None;
                }
                let mz_diff = (a.mz - b.mz).abs();
                let rt_diff = (a.rt - b.rt).abs();
                // the circular radius over-approximates the tolerance box
                if mz_diff > config.mz_tolerance || rt_diff > config.rt_tolerance {
                    return None;
                }
                let weight = similarity_score(features[i], features[j], config);
                if weight > 0.0 {
                    Some((i, j, SimilarityEdge { weight, mz_diff, rt_diff }))
                } else {
                    None
                }
            })
            .collect();

        let mut graph = FeatureGraph {
            adjacency: vec![BTreeMap::new(); nodes.len()],
            nodes,
            edge_count: 0,
        };
        for (i, j, edge) in edges {
            graph.add_edge(i, j, edge);
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dataset(name: &str, coords: &[(f64, f64)]) -> DatasetFeatures {
        DatasetFeatures::new(
            name.to_string(),
            coords
                .iter()
                .map(|&(mz, rt)| MassFeature {
                    mz,
                    rt,
                    ..Default::default()
                })
                .collect(),
        )
    }

    fn build(datasets: &[DatasetFeatures]) -> FeatureGraph {
        GraphBuilder::new(GraphConfig::default()).build(datasets)
    }

    #[test]
    fn test_three_near_duplicates_form_a_triangle() {
        let graph = build(&[
            dataset("a", &[(100.000, 5.0)]),
            dataset("b", &[(100.005, 5.2)]),
            dataset("c", &[(100.003, 5.1)]),
        ]);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);

        let ab = graph.edge(0, 1).unwrap();
        assert!((ab.weight - (0.7 * 0.5 + 0.3 * 0.8)).abs() < 1e-9);
        assert!((ab.mz_diff - 0.005).abs() < 1e-12);
        assert!((ab.rt_diff - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_same_dataset_features_never_connect() {
        let graph = build(&[dataset("a", &[(100.000, 5.0), (100.000, 5.0)])]);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_tolerance_box_corner_is_not_an_edge() {
        // exactly at both tolerances the score is 0, so no edge
        let graph = build(&[
            dataset("a", &[(100.00, 5.0)]),
            dataset("b", &[(100.01, 6.0)]),
        ]);
        assert_eq!(graph.edge_count(), 0);

        // inside the search circle but outside the tolerance box
        let graph = build(&[
            dataset("a", &[(100.0, 5.0)]),
            dataset("b", &[(100.0, 6.00002)]),
        ]);
        assert_eq!(graph.edge_count(), 0);

        // just inside the box on both axes is an edge
        let graph = build(&[
            dataset("a", &[(100.000, 5.0)]),
            dataset("b", &[(100.009, 5.9)]),
        ]);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let graph = build(&[
            dataset("a", &[(100.000, 5.0)]),
            dataset("b", &[(100.005, 5.2)]),
        ]);
        assert!(graph.has_edge(0, 1));
        assert!(graph.has_edge(1, 0));
        assert_eq!(graph.edge(0, 1), graph.edge(1, 0));
    }

    #[test]
    fn test_deconflict_keeps_strongest_edge() {
        // ds1 offers two candidates for the single ds0 feature
        let mut graph = build(&[
            dataset("a", &[(100.000, 5.0)]),
            dataset("b", &[(100.002, 5.0), (100.006, 5.0)]),
        ]);
        assert_eq!(graph.edge_count(), 2);
        let removed = graph.deconflict_local();
        assert_eq!(removed, 1);
        assert!(graph.has_edge(0, 1));
        assert!(!graph.has_edge(0, 2));
    }

    #[test]
    fn test_deconflict_is_one_shot_not_global() {
        // A (ds0) prefers B1; C (ds2) prefers B2. After one pass both B1 and
        // B2 survive, each holding an edge to a different partner.
        let mut graph = build(&[
            dataset("a", &[(100.000, 5.0)]),
            dataset("b", &[(100.002, 5.0), (100.003, 5.0)]),
            dataset("c", &[(100.005, 5.0)]),
        ]);
        // A-B1, A-B2, A-C, B1-C, B2-C
        assert_eq!(graph.edge_count(), 5);
        let removed = graph.deconflict_local();
        assert_eq!(removed, 2);
        let remaining: Vec<(usize, usize)> = graph.edges().map(|(u, v, _)| (u, v)).collect();
        assert_eq!(remaining, vec![(0, 1), (0, 3), (2, 3)]);
    }

    #[test]
    fn test_empty_input_builds_empty_graph() {
        let graph = build(&[]);
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        let stats = graph.stats();
        assert_eq!(stats.mean_degree, 0.0);
        assert_eq!(stats.connected_components, 0);
    }

    #[test]
    fn test_stats() {
        let graph = build(&[
            dataset("a", &[(100.000, 5.0), (300.0, 20.0)]),
            dataset("b", &[(100.005, 5.2)]),
            dataset("c", &[(100.003, 5.1)]),
        ]);
        let stats = graph.stats();
        assert_eq!(stats.num_nodes, 4);
        assert_eq!(stats.num_edges, 3);
        assert_eq!(stats.mean_degree, 1.5);
        assert_eq!(graph.degree(0), 2);
        assert_eq!(graph.degree(1), 0);
        // the triangle plus the isolated feature at 300 m/z
        assert_eq!(stats.connected_components, 2);
    }

    proptest! {
        #[test]
        fn prop_edges_are_cross_dataset_and_within_tolerance(
            points in prop::collection::vec(
                (0..3usize, 99.95..100.05f64, 4.0..6.0f64),
                0..40,
            )
        ) {
            let mut datasets = vec![
                dataset("a", &[]),
                dataset("b", &[]),
                dataset("c", &[]),
            ];
            for (ds, mz, rt) in points {
                datasets[ds].features.push(MassFeature { mz, rt, ..Default::default() });
            }
            let config = GraphConfig::default();
            let graph = GraphBuilder::new(config.clone()).build(&datasets);
            for (u, v, edge) in graph.edges() {
                let (a, b) = (graph.node(u), graph.node(v));
                prop_assert_ne!(a.key.dataset, b.key.dataset);
                prop_assert!(edge.weight > 0.0 && edge.weight <= 1.0);
                prop_assert!(edge.mz_diff <= config.mz_tolerance);
                prop_assert!(edge.rt_diff <= config.rt_tolerance);
                prop_assert!(graph.has_edge(v, u));
            }
        }
    }
}
