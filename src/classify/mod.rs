//! Integration-usage classification: dataset construction, stratified split,
//! three classifiers and their comparison.

pub mod dataset;
pub mod evaluate;
pub mod metrics;
pub mod models;
pub mod split;

pub use dataset::{ClassificationDataset, TrainingSummary, build_dataset, count_positive_modal_tokens};
pub use evaluate::{EvaluationReport, EvaluationSettings, Metric, ModelEvaluation, evaluate};
pub use split::{TrainTestSplit, stratified_split};
