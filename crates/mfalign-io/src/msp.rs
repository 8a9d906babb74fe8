use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use mfalign_common::error::MfalignError;
use mfalign_common::feature::MassFeature;

use crate::{parse_peak, FeatureReader};

/// Reader for NIST MSP library files.
///
/// A `Name:` line opens a record and a blank line closes it; a trailing
/// record at end of file is committed as well. `RetentionTime` is already in
/// minutes. Records without a parseable precursor m/z or retention time are
/// dropped with a warning.
pub struct MspReader;

#[derive(Default)]
struct MspRecord {
    title: Option<String>,
    mz: Option<f64>,
    rt: Option<f64>,
    intensity: Option<f64>,
    peaks: Vec<(f64, f64)>,
}

impl MspRecord {
    fn finish(self, path: &Path, record_index: usize) -> Option<MassFeature> {
        match (self.mz, self.rt) {
            (Some(mz), Some(rt)) => Some(MassFeature {
                title: self.title,
                mz,
                rt,
                charge: None,
                intensity: self.intensity,
                fragment_spectrum: if self.peaks.is_empty() {
                    None
                } else {
                    Some(self.peaks)
                },
            }),
            _ => {
                log::warn!(
                    "Skipping record {} of {}: missing precursor m/z or retention time",
                    record_index,
                    path.display()
                );
                None
            }
        }
    }
}

fn commit(
    record: MspRecord,
    path: &Path,
    record_index: &mut usize,
    features: &mut Vec<MassFeature>,
) {
    *record_index += 1;
    if let Some(feature) = record.finish(path, *record_index) {
        features.push(feature);
    }
}

impl FeatureReader for MspReader {
    fn read_features(&self, path: &Path) -> Result<Vec<MassFeature>, MfalignError> {
        let file = File::open(path).map_err(|e| {
            MfalignError::Io(format!("Failed to open MSP file {}: {}", path.display(), e))
        })?;
        let reader = BufReader::new(file);

        let mut features = Vec::new();
        let mut record: Option<MspRecord> = None;
        let mut record_index = 0usize;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if let Some(value) = line.strip_prefix("Name:") {
                if let Some(r) = record.take() {
                    commit(r, path, &mut record_index, &mut features);
                }
                record = Some(MspRecord {
                    title: Some(value.trim().to_string()),
                    ..Default::default()
                });
            } else if line.is_empty() {
                if let Some(r) = record.take() {
                    commit(r, path, &mut record_index, &mut features);
                }
            } else if let Some(r) = record.as_mut() {
                if let Some(value) = line.strip_prefix("PrecursorMZ:") {
                    r.mz = value.trim().parse().ok();
                } else if let Some(value) = line.strip_prefix("RetentionTime:") {
                    r.rt = value.trim().parse().ok();
                } else if let Some(value) = line.strip_prefix("Signal_intensity:") {
                    r.intensity = value.trim().parse().ok();
                } else if line.starts_with("Num peaks:") {
                    // peak count is implied by the peak lines themselves
                } else if line.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                    match parse_peak(line) {
                        Some(peak) => r.peaks.push(peak),
                        None => log::warn!(
                            "Could not parse peak line in {}: {}",
                            path.display(),
                            line
                        ),
                    }
                }
            }
        }
        if let Some(r) = record.take() {
            commit(r, path, &mut record_index, &mut features);
        }

        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn read_fixture(contents: &str) -> Vec<MassFeature> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        MspReader.read_features(file.path()).unwrap()
    }

    #[test]
    fn test_read_records() {
        let features = read_fixture(
            "Name: compound_1\n\
             PrecursorMZ: 445.12002\n\
             RetentionTime: 5.0\n\
             Signal_intensity: 8000.0\n\
             Num peaks: 2\n\
             100.1 200.0\n\
             101.2 300.0\n\
             \n\
             Name: compound_2\n\
             PrecursorMZ: 300.5\n\
             RetentionTime: 6.1\n",
        );
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].title.as_deref(), Some("compound_1"));
        assert_eq!(features[0].mz, 445.12002);
        assert_eq!(features[0].rt, 5.0);
        assert_eq!(features[0].intensity, Some(8000.0));
        assert_eq!(
            features[0].fragment_spectrum.as_deref(),
            Some(&[(100.1, 200.0), (101.2, 300.0)][..])
        );
        // trailing record without a closing blank line is still committed
        assert_eq!(features[1].title.as_deref(), Some("compound_2"));
        assert_eq!(features[1].rt, 6.1);
        assert_eq!(features[1].intensity, None);
    }

    #[test]
    fn test_record_without_rt_is_dropped() {
        let features = read_fixture(
            "Name: no_rt\n\
             PrecursorMZ: 445.12\n\
             \n\
             Name: ok\n\
             PrecursorMZ: 300.5\n\
             RetentionTime: 6.1\n",
        );
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].title.as_deref(), Some("ok"));
    }
}
