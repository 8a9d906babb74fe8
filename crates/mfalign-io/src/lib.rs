use std::fs;
use std::path::{Path, PathBuf};

use mfalign_common::config::FeatureFileType;
use mfalign_common::error::MfalignError;
use mfalign_common::feature::MassFeature;

pub mod mgf;
pub mod msp;
pub mod util;

pub trait FeatureReader: Send + Sync {
    fn read_features(&self, path: &Path) -> Result<Vec<MassFeature>, MfalignError>;
}

/// Pick a reader for the given file type, if one exists.
pub fn reader_for(file_type: &FeatureFileType) -> Option<Box<dyn FeatureReader>> {
    match file_type {
        FeatureFileType::Mgf => Some(Box::new(mgf::MgfReader)),
        FeatureFileType::Msp => Some(Box::new(msp::MspReader)),
        FeatureFileType::Unknown => None,
    }
}

/// Infer the feature file type from the file extension.
pub fn infer_file_type<P: AsRef<Path>>(path: P) -> FeatureFileType {
    match path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("mgf") => FeatureFileType::Mgf,
        Some("msp") => FeatureFileType::Msp,
        _ => FeatureFileType::Unknown,
    }
}

/// Read one feature file, dispatching on its extension.
pub fn load_feature_file<P: AsRef<Path>>(path: P) -> Result<Vec<MassFeature>, MfalignError> {
    let path = path.as_ref();
    match reader_for(&infer_file_type(path)) {
        Some(reader) => reader.read_features(path),
        None => Err(MfalignError::Custom(format!(
            "Unsupported feature file type: {}",
            path.display()
        ))),
    }
}

/// Parse a fragment peak line of exactly two whitespace-separated numbers.
pub(crate) fn parse_peak(line: &str) -> Option<(f64, f64)> {
    let mut parts = line.split_whitespace();
    let mz = parts.next()?.parse::<f64>().ok()?;
    let intensity = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((mz, intensity))
}

/// Collect readable feature files from a directory.
///
/// Entries are returned sorted by name so dataset indices do not depend on
/// directory iteration order.
pub fn collect_feature_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, MfalignError> {
    let dir = dir.as_ref();
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| {
            MfalignError::Io(format!("Failed to read directory {}: {}", dir.display(), e))
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && infer_file_type(p) != FeatureFileType::Unknown)
        .collect();
    paths.sort();
    Ok(paths)
}
