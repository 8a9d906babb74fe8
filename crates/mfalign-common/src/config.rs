use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum FeatureFileType {
    Mgf,
    Msp,
    Unknown,
}

impl Default for FeatureFileType {
    fn default() -> Self {
        FeatureFileType::Mgf
    }
}

impl<'de> Deserialize<'de> for FeatureFileType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "mgf" => Ok(FeatureFileType::Mgf),
            "msp" => Ok(FeatureFileType::Msp),
            _ => Ok(FeatureFileType::Unknown),
        }
    }
}

impl FeatureFileType {
    pub fn as_str(&self) -> &str {
        match self {
            FeatureFileType::Mgf => "mgf",
            FeatureFileType::Msp => "msp",
            FeatureFileType::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InputConfig {
    #[serde(rename = "file-type")]
    pub file_type: Option<FeatureFileType>,
    #[serde(rename = "file-paths")]
    pub file_paths: Vec<PathBuf>,
    /// Directory to scan for feature files. Scanned entries are appended to
    /// `file-paths` in lexicographic order so dataset indices are reproducible.
    pub directory: Option<PathBuf>,
}

impl InputConfig {
    /// Get the number of file paths.
    pub fn len(&self) -> usize {
        self.file_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_paths.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeightsConfig {
    pub mz: f64,
    pub rt: f64,
}

impl Default for ScoreWeightsConfig {
    fn default() -> Self {
        ScoreWeightsConfig { mz: 0.7, rt: 0.3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Maximum m/z difference for two features to be considered the same analyte.
    #[serde(rename = "mz-tolerance")]
    pub mz_tolerance: f64,
    /// Maximum retention time difference in minutes.
    #[serde(rename = "rt-tolerance")]
    pub rt_tolerance: f64,
    /// Relative contribution of the m/z and rt agreement to the edge weight.
    /// The two weights must sum to 1 so edge weights stay in (0, 1].
    pub weights: ScoreWeightsConfig,
    /// Run the one-shot local deconfliction pass after building the graph,
    /// keeping only the best edge per neighbour dataset of each node.
    pub deconflict: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            mz_tolerance: 0.01,
            rt_tolerance: 1.0,
            weights: ScoreWeightsConfig::default(),
            deconflict: false,
        }
    }
}

impl std::fmt::Display for GraphConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "\n---- Graph Config ----\n\
            mz_tolerance: {}\n\
            rt_tolerance: {}\n\
            weights: mz={} rt={}\n\
            deconflict: {}\n\
            ----------------------",
            self.mz_tolerance,
            self.rt_tolerance,
            self.weights.mz,
            self.weights.rt,
            self.deconflict
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// Method to use for extracting aligned groups. Current options are
    /// "clique", "community" and "both".
    pub method: String,
    /// Smallest group worth emitting. Groups below this are dropped; a
    /// single-member group aligns nothing across runs.
    #[serde(rename = "min-group-size")]
    pub min_group_size: usize,
    /// Smallest raw community accepted by validation.
    #[serde(rename = "min-community-size")]
    pub min_community_size: usize,
    /// Maximum population variance of member m/z values within a community.
    #[serde(rename = "mz-variance-threshold")]
    pub mz_variance_threshold: f64,
    /// Maximum retention time span in minutes within a community.
    #[serde(rename = "rt-range-threshold")]
    pub rt_range_threshold: f64,
    /// Soft limit on the number of maximal cliques. Exceeding it logs a
    /// single warning; enumeration is never truncated.
    #[serde(rename = "clique-soft-limit")]
    pub clique_soft_limit: Option<usize>,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        GroupingConfig {
            method: "both".to_string(),
            min_group_size: 2,
            min_community_size: 3,
            mz_variance_threshold: 0.02,
            rt_range_threshold: 1.0,
            clique_soft_limit: Some(1_000_000),
        }
    }
}

impl std::fmt::Display for GroupingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "\n---- Grouping Config ----\n\
            method: {}\n\
            min_group_size: {}\n\
            min_community_size: {}\n\
            mz_variance_threshold: {}\n\
            rt_range_threshold: {}\n\
            clique_soft_limit: {:?}\n\
            -------------------------",
            self.method,
            self.min_group_size,
            self.min_community_size,
            self.mz_variance_threshold,
            self.rt_range_threshold,
            self.clique_soft_limit
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the aligned feature tables and summary are written to.
    pub directory: PathBuf,
    /// Write the per-dataset summary table as markdown.
    #[serde(rename = "write-summary")]
    pub write_summary: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: PathBuf::from("."),
            write_summary: true,
        }
    }
}
