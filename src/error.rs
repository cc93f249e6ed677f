//! Error types for the survey pipelines.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, SurveyError>;

#[derive(Error, Debug)]
pub enum SurveyError {
    /// None of the candidate dataset paths could be opened.
    #[error("survey dataset not found, tried: {}", display_paths(tried))]
    DatasetNotFound { tried: Vec<PathBuf> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filtering or splitting left too little data to fit or score a model.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("invalid shape: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("model not fitted")]
    ModelNotFitted,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_not_found_lists_paths() {
        let err = SurveyError::DatasetNotFound {
            tried: vec![PathBuf::from("a.csv"), PathBuf::from("b/c.csv")],
        };
        assert_eq!(
            err.to_string(),
            "survey dataset not found, tried: a.csv, b/c.csv"
        );
    }

    #[test]
    fn test_insufficient_data_message() {
        let err = SurveyError::InsufficientData("no rows".to_string());
        assert_eq!(err.to_string(), "insufficient data: no rows");
    }
}
