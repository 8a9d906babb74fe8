use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use mfalign_common::config::{
    FeatureFileType, GraphConfig, GroupingConfig, InputConfig, OutputConfig,
};
use mfalign_io::{collect_feature_files, infer_file_type};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Input {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub grouping: GroupingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Input {
    /// Load parameters from a JSON file and validate them.
    pub fn from_arguments(matches: &ArgMatches) -> Result<Self> {
        let path = matches
            .get_one::<String>("parameters")
            .expect("required parameters");

        let mut input = Input::load(path)
            .with_context(|| format!("Failed to read parameters from `{path}`"))?;

        // Handle additional command-line arguments for overrides
        if let Some(feature_paths) = matches.get_many::<String>("feature_paths") {
            input.input.file_paths.extend(feature_paths.map(|p| p.into()));
        }

        // Append files found in the configured directory
        if let Some(directory) = input.input.directory.clone() {
            let found = collect_feature_files(&directory)?;
            log::info!(
                "Found {} feature files in {}",
                found.len(),
                directory.display()
            );
            input.input.file_paths.extend(found);
        }

        // Infer types if not provided
        input.infer_types()?;

        // Validate the parameters
        input.validate()?;

        log::info!("Loaded parameters from: {}", path);
        log::info!("Feature files: {}", input.input.len());
        if input.input.len() < 2 {
            log::warn!("Only one feature file passed. Nothing can be aligned across runs.");
        }

        Ok(input)
    }

    /// Load parameters from a JSON file.
    pub fn load(file_path: &str) -> Result<Self> {
        let mut file = File::open(file_path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        // Deserialize JSON into Input struct
        let params: Input = serde_json::from_str(&contents).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("JSON parse error: {}", e),
            )
        })?;

        Ok(params)
    }

    /// Infer the file type from the first file path if not provided.
    fn infer_types(&mut self) -> Result<()> {
        if self.input.file_type.is_none() && !self.input.file_paths.is_empty() {
            let inferred = infer_file_type(&self.input.file_paths[0]);
            log::debug!("Inferred feature file type: {}", inferred.as_str());
            self.input.file_type = Some(inferred);
        }

        Ok(())
    }

    /// Validate the parameters.
    fn validate(&self) -> Result<()> {
        if self.input.file_paths.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "No feature files given; set `input.file-paths`, `input.directory` or pass paths on the command line",
            )
            .into());
        }

        // Validate feature file type
        if self.input.file_type == Some(FeatureFileType::Unknown) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Invalid feature file type; expected 'mgf' or 'msp'",
            )
            .into());
        }

        // Validate file paths
        for path in &self.input.file_paths {
            if !Path::new(path).exists() {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("File not found: {:?}", path),
                )
                .into());
            }
        }

        if self.graph.mz_tolerance <= 0.0 || self.graph.rt_tolerance <= 0.0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Graph tolerances must be positive",
            )
            .into());
        }

        if self.graph.weights.mz <= 0.0 || self.graph.weights.rt <= 0.0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Score weights must be positive",
            )
            .into());
        }

        // weights summing to 1 keep every edge weight in (0, 1]
        let weight_sum = self.graph.weights.mz + self.graph.weights.rt;
        if (weight_sum - 1.0).abs() > 1e-9 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Score weights must sum to 1, got {}", weight_sum),
            )
            .into());
        }

        match self.grouping.method.to_lowercase().as_str() {
            "clique" | "community" | "both" => {}
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Invalid grouping method `{}`; expected 'clique', 'community' or 'both'",
                        other
                    ),
                )
                .into());
            }
        }

        Ok(())
    }
}
