use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use mfalign_common::error::MfalignError;
use mfalign_common::feature::MassFeature;

use crate::{parse_peak, FeatureReader};

/// Reader for Mascot Generic Format feature files.
///
/// Each `BEGIN IONS`/`END IONS` block becomes one [`MassFeature`]. Retention
/// times are given as `RTINSECONDS` and converted to minutes here so every
/// dataset enters the pipeline in the same unit. Blocks without a parseable
/// precursor m/z or retention time are dropped with a warning.
pub struct MgfReader;

#[derive(Default)]
struct MgfBlock {
    title: Option<String>,
    mz: Option<f64>,
    rt_seconds: Option<f64>,
    charge: Option<i32>,
    intensity: Option<f64>,
    peaks: Vec<(f64, f64)>,
}

impl MgfBlock {
    fn finish(self, path: &Path, block_index: usize) -> Option<MassFeature> {
        match (self.mz, self.rt_seconds) {
            (Some(mz), Some(rt_seconds)) => Some(MassFeature {
                title: self.title,
                mz,
                rt: rt_seconds / 60.0,
                charge: self.charge,
                intensity: self.intensity,
                fragment_spectrum: if self.peaks.is_empty() {
                    None
                } else {
                    Some(self.peaks)
                },
            }),
            _ => {
                log::warn!(
                    "Skipping block {} of {}: missing precursor m/z or retention time",
                    block_index,
                    path.display()
                );
                None
            }
        }
    }
}

impl FeatureReader for MgfReader {
    fn read_features(&self, path: &Path) -> Result<Vec<MassFeature>, MfalignError> {
        let file = File::open(path).map_err(|e| {
            MfalignError::Io(format!("Failed to open MGF file {}: {}", path.display(), e))
        })?;
        let reader = BufReader::new(file);

        let mut features = Vec::new();
        let mut block: Option<MgfBlock> = None;
        let mut block_index = 0usize;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line == "BEGIN IONS" {
                block = Some(MgfBlock::default());
            } else if line == "END IONS" {
                if let Some(b) = block.take() {
                    block_index += 1;
                    if let Some(feature) = b.finish(path, block_index) {
                        features.push(feature);
                    }
                }
            } else if let Some(b) = block.as_mut() {
                if let Some(value) = line.strip_prefix("TITLE=") {
                    b.title = Some(value.trim().to_string());
                } else if let Some(value) = line.strip_prefix("RTINSECONDS=") {
                    b.rt_seconds = value.trim().parse().ok();
                } else if let Some(value) = line.strip_prefix("PEPMASS=") {
                    // PEPMASS may carry an intensity after the m/z; only the
                    // first token is the precursor m/z.
                    b.mz = value.split_whitespace().next().and_then(|v| v.parse().ok());
                } else if let Some(value) = line.strip_prefix("CHARGE=") {
                    b.charge = value.trim().replace('+', "").parse().ok();
                } else if let Some(value) = line.strip_prefix("Signal_intensity=") {
                    b.intensity = value.trim().parse().ok();
                } else if line.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                    match parse_peak(line) {
                        Some(peak) => b.peaks.push(peak),
                        None => log::warn!(
                            "Could not parse peak line in {}: {}",
                            path.display(),
                            line
                        ),
                    }
                }
            }
        }

        Ok(features)
    }
}
