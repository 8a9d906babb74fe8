use std::collections::BTreeMap;

use super::AlignmentGroup;
use crate::graph::FeatureGraph;

/// One row of the wide-format alignment table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedGroup {
    /// Dataset id to feature index within that dataset. A duplicate dataset
    /// inside a group keeps the last member written.
    pub features: BTreeMap<usize, usize>,
    /// m/z of every group member, in member order.
    pub mz: Vec<f64>,
    /// Intensity of every group member; NaN marks a missing value.
    pub intensity: Vec<f64>,
}

/// Wide-format alignment result, one entry per group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedTable {
    pub groups: Vec<AlignedGroup>,
}

impl AlignedTable {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Materialises groups of node ids into the aligned table.
///
/// # Parameters
/// - `graph`: Source graph holding the node attributes
/// - `groups`: Aligned groups as node id lists
pub fn build_aligned_table(graph: &FeatureGraph, groups: &[AlignmentGroup]) -> AlignedTable {
    let mut table = AlignedTable::default();
    for group in groups {
        let mut aligned = AlignedGroup::default();
        for &node in group {
            let attrs = graph.node(node);
            aligned.features.insert(attrs.key.dataset, attrs.key.feature);
            aligned.mz.push(attrs.mz);
            aligned.intensity.push(attrs.intensity.unwrap_or(f64::NAN));
        }
        table.groups.push(aligned);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use mfalign_common::config::GraphConfig;
    use mfalign_common::feature::{DatasetFeatures, MassFeature};

    fn dataset(name: &str, features: &[(f64, f64, Option<f64>)]) -> DatasetFeatures {
        DatasetFeatures::new(
            name.to_string(),
            features
                .iter()
                .map(|&(mz, rt, intensity)| MassFeature {
                    mz,
                    rt,
                    intensity,
                    ..Default::default()
                })
                .collect(),
        )
    }

    fn build(datasets: &[DatasetFeatures]) -> FeatureGraph {
        GraphBuilder::new(GraphConfig::default()).build(datasets)
    }

    #[test]
    fn test_triangle_group() {
        let graph = build(&[
            dataset("a", &[(100.000, 5.0, Some(1500.0))]),
            dataset("b", &[(100.005, 5.2, None)]),
            dataset("c", &[(100.003, 5.1, Some(900.0))]),
        ]);
        let table = build_aligned_table(&graph, &[vec![0, 1, 2]]);
        assert_eq!(table.len(), 1);
        let group = &table.groups[0];
        assert_eq!(group.features, BTreeMap::from([(0, 0), (1, 0), (2, 0)]));
        assert_eq!(group.mz, vec![100.000, 100.005, 100.003]);
        assert_eq!(group.intensity[0], 1500.0);
        assert!(group.intensity[1].is_nan());
        assert_eq!(group.intensity[2], 900.0);
    }

    #[test]
    fn test_duplicate_dataset_keeps_last_feature_in_map() {
        let graph = build(&[
            dataset("a", &[(100.000, 5.0, None)]),
            dataset("b", &[(100.002, 5.0, None), (100.003, 5.0, None)]),
        ]);
        let table = build_aligned_table(&graph, &[vec![0, 1, 2]]);
        let group = &table.groups[0];
        assert_eq!(group.features, BTreeMap::from([(0, 0), (1, 1)]));
        // the per-member lists still carry every member
        assert_eq!(group.mz, vec![100.000, 100.002, 100.003]);
        assert_eq!(group.intensity.len(), 3);
    }

    #[test]
    fn test_empty_groups() {
        let graph = build(&[]);
        let table = build_aligned_table(&graph, &[]);
        assert!(table.is_empty());
    }
}
