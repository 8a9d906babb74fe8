use std::path::Path;

/// Extract a basename with single extension removal, used to name datasets
/// after their input files. Falls back to the raw file name when there is no
/// stem, and to an empty string for paths without a file name component.
pub fn extract_basename<P: AsRef<Path>>(path: P) -> String {
    let p = path.as_ref();
    p.file_stem()
        .or_else(|| p.file_name())
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_basename() {
        assert_eq!(extract_basename("run1.mgf"), "run1");
        assert_eq!(extract_basename("/data/batch/run1.msp"), "run1");
        assert_eq!(extract_basename("archive.tar.gz"), "archive.tar");
        assert_eq!(extract_basename("no_extension"), "no_extension");
        assert_eq!(extract_basename(".hiddenfile"), ".hiddenfile");
    }
}
