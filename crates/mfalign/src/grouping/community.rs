use std::collections::{HashMap, HashSet};

use itertools::{Itertools, MinMaxResult};

use mfalign_common::config::GroupingConfig;

use super::louvain::Partitioner;
use super::AlignmentGroup;
use crate::graph::FeatureGraph;
use crate::stats::{median, population_variance};

/// Community-based grouping: partition the graph, validate each community
/// and resolve remaining dataset conflicts.
pub fn extract_communities(
    graph: &FeatureGraph,
    config: &GroupingConfig,
    partitioner: &dyn Partitioner,
) -> Vec<AlignmentGroup> {
    let labels = partitioner.partition(graph);
    let mut groups = Vec::new();
    for community in group_by_label(&labels) {
        if !is_valid_community(graph, &community, config) {
            log::trace!("Rejected community of {} nodes", community.len());
            continue;
        }
        let resolved = resolve_conflicts(graph, &community);
        if !resolved.is_empty() {
            groups.push(resolved);
        }
    }
    groups
}

/// Communities in first-encounter order, members ascending.
fn group_by_label(labels: &[usize]) -> Vec<AlignmentGroup> {
    let mut slots: HashMap<usize, usize> = HashMap::new();
    let mut groups: Vec<AlignmentGroup> = Vec::new();
    for (node, &label) in labels.iter().enumerate() {
        let slot = *slots.entry(label).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(node);
    }
    groups
}

/// Validation gates, applied in order: community size, one feature per
/// dataset, m/z variance, RT range.
pub fn is_valid_community(
    graph: &FeatureGraph,
    members: &[usize],
    config: &GroupingConfig,
) -> bool {
    if members.len() < config.min_community_size {
        return false;
    }
    let datasets: HashSet<usize> = members.iter().map(|&m| graph.node(m).key.dataset).collect();
    if datasets.len() != members.len() {
        return false;
    }
    let mzs: Vec<f64> = members.iter().map(|&m| graph.node(m).mz).collect();
    if population_variance(&mzs) > config.mz_variance_threshold {
        return false;
    }
    let (min_rt, max_rt) = match members.iter().map(|&m| graph.node(m).rt).minmax() {
        MinMaxResult::NoElements => return false,
        MinMaxResult::OneElement(rt) => (rt, rt),
        MinMaxResult::MinMax(min, max) => (min, max),
    };
    max_rt - min_rt <= config.rt_range_threshold
}

/// Collapses each dataset in the community down to a single feature.
pub fn resolve_conflicts(graph: &FeatureGraph, members: &[usize]) -> AlignmentGroup {
    let by_dataset: HashMap<usize, Vec<usize>> = members
        .iter()
        .map(|&m| (graph.node(m).key.dataset, m))
        .into_group_map();
    let mut resolved: AlignmentGroup = Vec::with_capacity(by_dataset.len());
    for candidates in by_dataset.into_values() {
        if candidates.len() == 1 {
            resolved.push(candidates[0]);
        } else {
            resolved.push(select_best_feature(graph, &candidates, members));
        }
    }
    resolved.sort_unstable();
    resolved
}

/// Picks the candidate whose m/z lies closest to the median m/z of the
/// other community members. `candidates` must be non-empty; when the
/// community holds no other members the first candidate wins, and so does
/// the first of equally close candidates.
pub fn select_best_feature(graph: &FeatureGraph, candidates: &[usize], members: &[usize]) -> usize {
    let others: Vec<f64> = members
        .iter()
        .copied()
        .filter(|m| !candidates.contains(m))
        .map(|m| graph.node(m).mz)
        .collect();
    if others.is_empty() {
        return candidates[0];
    }
    let reference = median(&others);
    let mut best = candidates[0];
    let mut best_diff = f64::INFINITY;
    for &candidate in candidates {
        let diff = (graph.node(candidate).mz - reference).abs();
        if diff < best_diff {
            best_diff = diff;
            best = candidate;
        }
    }
    best
}
