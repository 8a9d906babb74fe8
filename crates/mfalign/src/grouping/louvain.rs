use std::collections::{BTreeMap, HashMap};

use crate::graph::FeatureGraph;

/// Community assignment strategy over the similarity graph.
pub trait Partitioner {
    /// Labels every node with a community id.
    fn partition(&self, graph: &FeatureGraph) -> Vec<usize>;
}

/// Weighted Louvain modularity optimisation.
///
/// Sweeps run over nodes in ascending id order and a move happens only on a
/// strict modularity gain, so the assignment is deterministic for a given
/// graph.
#[derive(Debug, Clone, Default)]
pub struct LouvainPartitioner;

impl Partitioner for LouvainPartitioner {
    fn partition(&self, graph: &FeatureGraph) -> Vec<usize> {
        let n = graph.node_count();
        if n == 0 {
            return Vec::new();
        }
        let mut level = LevelGraph::from_feature_graph(graph);
        let mut membership: Vec<usize> = (0..n).collect();
        loop {
            let (assignment, moved) = level.local_moving();
            let (labels, count) = renumber(&assignment);
            for m in &mut membership {
                *m = labels[*m];
            }
            if !moved || count == level.node_count() {
                break;
            }
            level = level.aggregate(&labels, count);
        }
        membership
    }
}

/// Working graph for one Louvain level. Self loop weights are stored once,
/// not doubled; degrees account for the doubling.
struct LevelGraph {
    adjacency: Vec<BTreeMap<usize, f64>>,
    self_loops: Vec<f64>,
    degrees: Vec<f64>,
    total_weight_2: f64,
}

impl LevelGraph {
    fn from_feature_graph(graph: &FeatureGraph) -> Self {
        let n = graph.node_count();
        let mut adjacency = vec![BTreeMap::new(); n];
        for (u, v, edge) in graph.edges() {
            adjacency[u].insert(v, edge.weight);
            adjacency[v].insert(u, edge.weight);
        }
        Self::finish(adjacency, vec![0.0; n])
    }

    fn finish(adjacency: Vec<BTreeMap<usize, f64>>, self_loops: Vec<f64>) -> Self {
        let degrees: Vec<f64> = adjacency
            .iter()
            .zip(&self_loops)
            .map(|(nbrs, &sl)| nbrs.values().sum::<f64>() + 2.0 * sl)
            .collect();
        let total_weight_2 = degrees.iter().sum();
        LevelGraph {
            adjacency,
            self_loops,
            degrees,
            total_weight_2,
        }
    }

    fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Repeated greedy sweeps until a full sweep makes no move.
    ///
    /// # Returns
    /// The per-node community assignment and whether any move happened.
    fn local_moving(&self) -> (Vec<usize>, bool) {
        let n = self.node_count();
        let mut community: Vec<usize> = (0..n).collect();
        if self.total_weight_2 <= 0.0 {
            return (community, false);
        }
        let mut sum_tot = self.degrees.clone();
        let mut moved_any = false;
        loop {
            let mut moves = 0;
            for node in 0..n {
                let current = community[node];
                let degree = self.degrees[node];
                let mut neighbor_weights: BTreeMap<usize, f64> = BTreeMap::new();
                for (&nbr, &w) in &self.adjacency[node] {
                    *neighbor_weights.entry(community[nbr]).or_insert(0.0) += w;
                }
                sum_tot[current] -= degree;
                let k_in_current = neighbor_weights.get(&current).copied().unwrap_or(0.0);
                let mut best = current;
                let mut best_gain = k_in_current - sum_tot[current] * degree / self.total_weight_2;
                for (&target, &k_in) in &neighbor_weights {
                    if target == current {
                        continue;
                    }
                    let gain = k_in - sum_tot[target] * degree / self.total_weight_2;
                    if gain > best_gain {
                        best_gain = gain;
                        best = target;
                    }
                }
                sum_tot[best] += degree;
                if best != current {
                    community[node] = best;
                    moves += 1;
                }
            }
            if moves == 0 {
                break;
            }
            moved_any = true;
        }
        (community, moved_any)
    }

    /// Collapses each community into one node of the next level.
    fn aggregate(&self, labels: &[usize], count: usize) -> Self {
        let mut adjacency = vec![BTreeMap::new(); count];
        let mut self_loops = vec![0.0; count];
        for (node, &cu) in labels.iter().enumerate() {
            self_loops[cu] += self.self_loops[node];
            for (&nbr, &w) in &self.adjacency[node] {
                if nbr <= node {
                    continue;
                }
                let cv = labels[nbr];
                if cu == cv {
                    self_loops[cu] += w;
                } else {
                    *adjacency[cu].entry(cv).or_insert(0.0) += w;
                    *adjacency[cv].entry(cu).or_insert(0.0) += w;
                }
            }
        }
        Self::finish(adjacency, self_loops)
    }
}

/// Renumbers community ids densely from 0 in first-encounter order.
fn renumber(assignment: &[usize]) -> (Vec<usize>, usize) {
    let mut map: HashMap<usize, usize> = HashMap::new();
    let labels = assignment
        .iter()
        .map(|&c| {
            let next = map.len();
            *map.entry(c).or_insert(next)
        })
        .collect();
    (labels, map.len())
}
