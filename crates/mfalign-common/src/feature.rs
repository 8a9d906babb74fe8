use serde::{Deserialize, Serialize};

use crate::DatasetSummary;

/// A single mass feature read from one input file.
///
/// `mz` and `rt` are always present; readers drop records without them.
/// Everything else is carried through when the source file provides it.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MassFeature {
    pub title: Option<String>,
    /// Precursor m/z.
    pub mz: f64,
    /// Retention time in minutes.
    pub rt: f64,
    pub charge: Option<i32>,
    pub intensity: Option<f64>,
    /// Fragment spectrum as ordered (m/z, intensity) pairs.
    pub fragment_spectrum: Option<Vec<(f64, f64)>>,
}

/// Identity of a feature: the dataset it came from and its position within
/// that dataset's feature list. Formed exactly once at ingestion; never
/// round-tripped through strings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FeatureKey {
    pub dataset: usize,
    pub feature: usize,
}

impl std::fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}_{}", self.dataset, self.feature)
    }
}

/// All features of one input file, in file order. The position of a feature
/// in `features` is the `feature` half of its [`FeatureKey`].
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DatasetFeatures {
    pub name: String,
    pub features: Vec<MassFeature>,
}

impl DatasetFeatures {
    pub fn new(name: String, features: Vec<MassFeature>) -> Self {
        DatasetFeatures { name, features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Summary statistics for the report table. Intensity is averaged over
    /// the features that carry one; an empty column averages to 0.0.
    pub fn summary(&self) -> DatasetSummary {
        let n = self.features.len();
        let mean = |sum: f64, count: usize| if count == 0 { 0.0 } else { sum / count as f64 };

        let mz_sum: f64 = self.features.iter().map(|f| f.mz).sum();
        let rt_sum: f64 = self.features.iter().map(|f| f.rt).sum();
        let intensities: Vec<f64> = self.features.iter().filter_map(|f| f.intensity).collect();
        let intensity_sum: f64 = intensities.iter().sum();

        DatasetSummary {
            name: self.name.clone(),
            num_features: n,
            mean_mz: mean(mz_sum, n),
            mean_rt: mean(rt_sum, n),
            mean_intensity: mean(intensity_sum, intensities.len()),
        }
    }
}
