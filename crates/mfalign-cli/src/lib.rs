pub mod input;
pub mod output;

use anyhow::Result;
use log::info;
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;

use mfalign_common::error::MfalignError;
use mfalign_common::feature::DatasetFeatures;
use mfalign_common::DatasetSummary;
use mfalign_core::graph::{FeatureGraph, GraphBuilder};
use mfalign_core::grouping::clique::extract_cliques;
use mfalign_core::grouping::community::extract_communities;
use mfalign_core::grouping::louvain::LouvainPartitioner;
use mfalign_core::grouping::table::build_aligned_table;
use mfalign_io::load_feature_file;
use mfalign_io::util::extract_basename;

use input::Input;

pub struct Runner {
    parameters: Input,
    datasets: Vec<DatasetFeatures>,
    start: Instant,
}

impl Runner {
    /// Reads every configured feature file in parallel. Unreadable or empty
    /// files are skipped with a warning; at least one dataset must survive.
    pub fn new(parameters: Input) -> Result<Self> {
        let start = Instant::now();

        let start_io = Instant::now();
        let loaded: Vec<Result<DatasetFeatures, MfalignError>> = parameters
            .input
            .file_paths
            .par_iter()
            .map(|path| {
                let features = load_feature_file(path)?;
                Ok(DatasetFeatures::new(extract_basename(path), features))
            })
            .collect();

        let mut datasets = Vec::new();
        for (path, result) in parameters.input.file_paths.iter().zip(loaded) {
            match result {
                Ok(dataset) if dataset.is_empty() => {
                    log::warn!("No features found in {}, skipping", path.display());
                }
                Ok(dataset) => datasets.push(dataset),
                Err(e) => {
                    log::warn!("Failed to read {}: {}, skipping", path.display(), e);
                }
            }
        }
        let run_time = (Instant::now() - start_io).as_millis();

        if datasets.is_empty() {
            anyhow::bail!("No feature files could be read");
        }

        info!(
            "Loaded {} features from {} files - took {}ms",
            datasets.iter().map(|d| d.len()).sum::<usize>(),
            datasets.len(),
            run_time
        );

        Ok(Self {
            parameters,
            datasets,
            start,
        })
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        log::debug!("{}", self.parameters.graph);
        log::debug!("{}", self.parameters.grouping);

        let output_dir = self.parameters.output.directory.clone();
        std::fs::create_dir_all(&output_dir)?;

        /* ------------------------------------------------------------------ */
        /* Step 1. Per-dataset summaries                                      */
        /* ------------------------------------------------------------------ */
        let summaries: Vec<DatasetSummary> =
            self.datasets.iter().map(|d| d.summary()).collect();
        for summary in &summaries {
            info!(
                "{}: {} features, mean m/z {:.4}, mean RT {:.2} min",
                summary.name, summary.num_features, summary.mean_mz, summary.mean_rt
            );
        }
        if self.parameters.output.write_summary {
            let path = output_dir.join("dataset_summary.md");
            output::write_dataset_summary(&summaries, &path)?;
            info!("Wrote dataset summary to {}", path.display());
        }

        /* ------------------------------------------------------------------ */
        /* Step 2. Build the similarity graph                                 */
        /* ------------------------------------------------------------------ */
        let start_time = Instant::now();
        let mut graph = GraphBuilder::new(self.parameters.graph.clone()).build(&self.datasets);
        info!(
            "Built similarity graph with {} nodes and {} edges - took {}ms",
            graph.node_count(),
            graph.edge_count(),
            (Instant::now() - start_time).as_millis()
        );

        if self.parameters.graph.deconflict {
            let removed = graph.deconflict_local();
            info!("Deconfliction removed {} conflicting edges", removed);
        }

        info!("{}", graph.stats());

        /* ------------------------------------------------------------------ */
        /* Step 3. Extract aligned groups and write tables                    */
        /* ------------------------------------------------------------------ */
        match self.parameters.grouping.method.to_lowercase().as_str() {
            "clique" => {
                self.run_cliques(&graph, &output_dir)?;
            }
            "community" => {
                self.run_communities(&graph, &output_dir)?;
            }
            _ => {
                self.run_cliques(&graph, &output_dir)?;
                self.run_communities(&graph, &output_dir)?;
            }
        }

        let run_time = (Instant::now() - self.start).as_secs();
        info!("finished in {}s", run_time);
        Ok(())
    }

    fn run_cliques(&self, graph: &FeatureGraph, output_dir: &Path) -> Result<()> {
        let start_time = Instant::now();
        let groups = extract_cliques(graph, &self.parameters.grouping);
        info!(
            "Extracted {} clique groups - took {}ms",
            groups.len(),
            (Instant::now() - start_time).as_millis()
        );

        let table = build_aligned_table(graph, &groups);
        let path = output_dir.join("aligned_features_clique.tsv");
        output::write_aligned_features_tsv(&table, &self.datasets, &path)?;
        info!("Wrote clique table to {}", path.display());
        Ok(())
    }

    fn run_communities(&self, graph: &FeatureGraph, output_dir: &Path) -> Result<()> {
        let start_time = Instant::now();
        let partitioner = LouvainPartitioner::default();
        let groups = extract_communities(graph, &self.parameters.grouping, &partitioner);
        info!(
            "Extracted {} community groups - took {}ms",
            groups.len(),
            (Instant::now() - start_time).as_millis()
        );

        let table = build_aligned_table(graph, &groups);
        let path = output_dir.join("aligned_features_community.tsv");
        output::write_aligned_features_tsv(&table, &self.datasets, &path)?;
        info!("Wrote community table to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUN1: &str = "BEGIN IONS\n\
        TITLE=feat1\n\
        RTINSECONDS=300\n\
        PEPMASS=100.000 1500.0\n\
        CHARGE=2+\n\
        100.0 10.0\n\
        END IONS\n\
        BEGIN IONS\n\
        TITLE=feat2\n\
        RTINSECONDS=600\n\
        PEPMASS=200.000\n\
        END IONS\n";

    const RUN2: &str = "BEGIN IONS\n\
        TITLE=feat1\n\
        RTINSECONDS=312\n\
        PEPMASS=100.005\n\
        END IONS\n\
        BEGIN IONS\n\
        TITLE=feat2\n\
        RTINSECONDS=606\n\
        PEPMASS=200.003\n\
        END IONS\n";

    #[test]
    fn test_runner_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let run1 = dir.path().join("run1.mgf");
        let run2 = dir.path().join("run2.mgf");
        std::fs::write(&run1, RUN1).unwrap();
        std::fs::write(&run2, RUN2).unwrap();

        let mut parameters = Input::default();
        parameters.input.file_paths = vec![run1, run2];
        parameters.output.directory = dir.path().join("out");

        let mut runner = Runner::new(parameters).unwrap();
        runner.run().unwrap();

        let clique_tsv =
            std::fs::read_to_string(dir.path().join("out/aligned_features_clique.tsv")).unwrap();
        // header plus one group per m/z pair
        assert_eq!(clique_tsv.lines().count(), 3);
        assert!(clique_tsv.contains("100.0000\t0\t100.0050"));
        assert!(clique_tsv.contains("200.0000\t1\t200.0030"));

        // pairs are below the community size gate, so only the header remains
        let community_tsv =
            std::fs::read_to_string(dir.path().join("out/aligned_features_community.tsv"))
                .unwrap();
        assert_eq!(community_tsv.lines().count(), 1);

        let summary =
            std::fs::read_to_string(dir.path().join("out/dataset_summary.md")).unwrap();
        assert!(summary.contains("| run1 | 2 |"));
        assert!(summary.contains("| run2 | 2 |"));
    }

    #[test]
    fn test_runner_rejects_unreadable_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.mgf");
        let mut parameters = Input::default();
        parameters.input.file_paths = vec![missing];
        assert!(Runner::new(parameters).is_err());
    }
}
