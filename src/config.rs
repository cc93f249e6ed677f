//! Runtime settings: dataset locations and evaluation parameters.
//!
//! Stored as an optional JSON file; every key may be omitted:
//! ```json
//! {
//!   "dataset_candidates": ["dados/dataset2.csv"],
//!   "evaluation": { "seed": 7, "forest_trees": 50 }
//! }
//! ```

use crate::classify::EvaluationSettings;
use crate::error::{Result, SurveyError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const DATASET_FILE: &str = "dataset2.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Probed in order; the first readable file wins.
    pub dataset_candidates: Vec<PathBuf>,
    pub evaluation: EvaluationSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dataset_candidates: default_candidates(),
            evaluation: EvaluationSettings::default(),
        }
    }
}

fn default_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![
        Path::new("..").join("dados").join(DATASET_FILE),
        Path::new("dados").join(DATASET_FILE),
        Path::new("/app/dados").join(DATASET_FILE),
    ];
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(dir.join("dados").join(DATASET_FILE));
    }
    candidates
}

impl Settings {
    /// Loads settings from a JSON file at `path`; missing keys keep defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)?;
        debug!(path = %path.display(), "Loaded settings file");
        Ok(settings)
    }

    /// Puts `path` first in the candidate list.
    pub fn prepend_dataset(&mut self, path: impl Into<PathBuf>) {
        self.dataset_candidates.insert(0, path.into());
    }

    pub fn validate(&self) -> Result<()> {
        if self.dataset_candidates.is_empty() {
            return Err(SurveyError::InvalidConfig(
                "no dataset candidates configured".to_string(),
            ));
        }
        self.evaluation.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    #[test]
    fn test_default_candidates_order() {
        let settings = Settings::default();
        assert!(settings.dataset_candidates.len() >= 3);
        assert_eq!(settings.dataset_candidates[0], Path::new("../dados/dataset2.csv"));
        assert_eq!(settings.dataset_candidates[1], Path::new("dados/dataset2.csv"));
        assert_eq!(settings.dataset_candidates[2], Path::new("/app/dados/dataset2.csv"));
        assert_eq!(settings.evaluation.seed, 42);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let path = temp_path("odsurvey_test_settings.json");
        fs::write(&path, r#"{ "evaluation": { "forest_trees": 7 } }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.evaluation.forest_trees, 7);
        assert_eq!(settings.evaluation.tree_max_depth, 5);
        assert_eq!(settings.evaluation.test_fraction, 0.3);
        assert_eq!(settings.dataset_candidates, default_candidates());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let path = temp_path("odsurvey_test_settings_bad.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(err, SurveyError::Json(_)));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_prepend_dataset() {
        let mut settings = Settings::default();
        settings.prepend_dataset("custom.csv");
        assert_eq!(settings.dataset_candidates[0], Path::new("custom.csv"));
    }

    #[test]
    fn test_validate_rejects_empty_candidates() {
        let settings = Settings {
            dataset_candidates: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(SurveyError::InvalidConfig(_))));
    }
}
