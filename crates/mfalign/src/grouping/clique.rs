use mfalign_common::config::GroupingConfig;

use super::AlignmentGroup;
use crate::graph::FeatureGraph;

/// Enumerates every maximal clique of the graph with Bron-Kerbosch and
/// pivoting. Each clique is returned with its members sorted ascending;
/// the clique order itself follows the deterministic search order.
pub fn maximal_cliques(graph: &FeatureGraph) -> Vec<AlignmentGroup> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut current = Vec::new();
    bron_kerbosch(graph, &mut current, (0..n).collect(), Vec::new(), &mut out);
    out
}

fn bron_kerbosch(
    graph: &FeatureGraph,
    current: &mut Vec<usize>,
    mut candidates: Vec<usize>,
    mut excluded: Vec<usize>,
    out: &mut Vec<AlignmentGroup>,
) {
    if candidates.is_empty() && excluded.is_empty() {
        let mut clique = current.clone();
        clique.sort_unstable();
        out.push(clique);
        return;
    }
    // candidates or excluded is non-empty here
    let pivot = candidates
        .iter()
        .chain(excluded.iter())
        .copied()
        .max_by_key(|&u| candidates.iter().filter(|&&v| graph.has_edge(u, v)).count())
        .unwrap();
    let branch: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&v| !graph.has_edge(pivot, v))
        .collect();
    for v in branch {
        let neighbors: Vec<usize> = graph.neighbors(v).collect();
        current.push(v);
        bron_kerbosch(
            graph,
            current,
            intersect_sorted(&candidates, &neighbors),
            intersect_sorted(&excluded, &neighbors),
            out,
        );
        current.pop();
        candidates.retain(|&u| u != v);
        if let Err(pos) = excluded.binary_search(&v) {
            excluded.insert(pos, v);
        }
    }
}

/// Intersection of two ascending id lists.
fn intersect_sorted(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Clique-based grouping: all maximal cliques at least `min_group_size`
/// large. Isolated features always form singleton cliques and are dropped
/// by the default minimum of 2.
pub fn extract_cliques(graph: &FeatureGraph, config: &GroupingConfig) -> Vec<AlignmentGroup> {
    let cliques = maximal_cliques(graph);
    if let Some(limit) = config.clique_soft_limit {
        if cliques.len() > limit {
            log::warn!(
                "Found {} maximal cliques (soft limit {}); consider enabling deconfliction",
                cliques.len(),
                limit
            );
        }
    }
    cliques
        .into_iter()
        .filter(|c| c.len() >= config.min_group_size)
        .collect()
}
