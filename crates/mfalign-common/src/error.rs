use thiserror::Error;
use serde::{Serialize, Deserialize};

#[derive(Error, Debug, Serialize, Deserialize)]
pub enum MfalignError {
    #[error("An error occurred: {0}")]
    Custom(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for MfalignError {
    fn from(e: std::io::Error) -> Self {
        MfalignError::Io(e.to_string())
    }
}
