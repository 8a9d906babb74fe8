use anyhow::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use mfalign_common::feature::DatasetFeatures;
use mfalign_common::DatasetSummary;
use mfalign_core::grouping::table::AlignedTable;

/// Writes the aligned feature table to a TSV file.
///
/// One row per group: the group id, then a feature index and m/z column
/// pair per dataset. Datasets without a member in the group get empty
/// cells.
///
/// # Parameters
/// - `table`: The aligned table to write.
/// - `datasets`: Datasets in id order, used to look up member m/z values.
/// - `output_path`: The path to the output TSV file.
pub fn write_aligned_features_tsv(
    table: &AlignedTable,
    datasets: &[DatasetFeatures],
    output_path: &Path,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(output_path)?;

    let mut header = vec!["Group".to_string()];
    for i in 0..datasets.len() {
        header.push(format!("File_{}_Feature", i));
        header.push(format!("File_{}_m/z", i));
    }
    writer.write_record(&header)?;

    for (group_id, group) in table.groups.iter().enumerate() {
        let mut record = vec![group_id.to_string()];
        for (dataset, ds) in datasets.iter().enumerate() {
            match group.features.get(&dataset) {
                Some(&feature) => {
                    record.push(feature.to_string());
                    record.push(format!("{:.4}", ds.features[feature].mz));
                }
                None => {
                    record.push(String::new());
                    record.push(String::new());
                }
            }
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes the per-dataset summary statistics as a markdown table.
///
/// # Parameters
/// - `summaries`: One summary per dataset, in id order.
/// - `output_path`: The path to the output markdown file.
pub fn write_dataset_summary(summaries: &[DatasetSummary], output_path: &Path) -> Result<()> {
    let mut file = File::create(output_path)?;
    writeln!(
        file,
        "| Filename | Number of Features | Average m/z | Average RT (min) | Average Intensity |"
    )?;
    writeln!(file, "|---|---|---|---|---|")?;
    for summary in summaries {
        writeln!(
            file,
            "| {} | {} | {:.4} | {:.2} | {:.2} |",
            summary.name,
            summary.num_features,
            summary.mean_mz,
            summary.mean_rt,
            summary.mean_intensity
        )?;
    }

    Ok(())
}
