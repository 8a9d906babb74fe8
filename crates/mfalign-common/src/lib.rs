use serde::{Serialize, Deserialize};

pub mod config;
pub mod error;
pub mod feature;

/// Per-dataset summary statistics reported ahead of alignment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DatasetSummary {
    /// Basename of the input file.
    pub name: String,
    pub num_features: usize,
    pub mean_mz: f64,
    /// Mean retention time in minutes.
    pub mean_rt: f64,
    /// Mean over the features that carry an intensity; 0.0 when none do.
    pub mean_intensity: f64,
}
