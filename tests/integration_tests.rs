use chrono::Utc;
use odsurvey::classify::{self, EvaluationSettings, build_dataset};
use odsurvey::error::SurveyError;
use odsurvey::loader::{load_dataset, read_records};
use odsurvey::output::{HistoryRow, append_records};
use odsurvey::prepare::{TripKind, prepare};
use odsurvey::regression::income_regression;
use odsurvey::source::{CsvSource, SurveyStore};
use odsurvey::summary::{crosstab, modal, overview, trips};
use std::path::{Path, PathBuf};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample_survey.csv")
}

fn fast_settings() -> EvaluationSettings {
    EvaluationSettings {
        forest_trees: 10,
        ..Default::default()
    }
}

#[test]
fn test_load_and_prepare_fixture() {
    let records = read_records(&fixture()).expect("Failed to read fixture");
    assert_eq!(records.len(), 30);
    assert_eq!(records[0].work_modals.as_deref(), Some("3,4"));
    assert_eq!(records[1].class_modals, None);

    let table = prepare(records);
    assert_eq!(table.len(), 30);
    assert_eq!(table.rows[0].work_trip, TripKind::Multimodal);
    assert_eq!(table.rows[28].work_trip, TripKind::NoAnswer);
    assert!(table.rows[28].work_modal_list.is_empty());
}

#[test]
fn test_candidate_probing_skips_missing_paths() {
    let candidates = vec![PathBuf::from("/definitely/not/here.csv"), fixture()];
    let (path, records) = load_dataset(&candidates).unwrap();
    assert_eq!(path, fixture());
    assert_eq!(records.len(), 30);

    let err = load_dataset(&candidates[..1]).unwrap_err();
    assert!(matches!(err, SurveyError::DatasetNotFound { .. }));
}

#[test]
fn test_store_builds_once() {
    let mut store = SurveyStore::new(CsvSource::new(vec![fixture()]));
    let first = store.prepared().unwrap();
    let second = store.prepared().unwrap();

    assert_eq!(store.builds(), 1);
    assert_eq!(first.len(), second.len());
}

#[test]
fn test_summary_views_on_fixture() {
    let table = prepare(read_records(&fixture()).unwrap());

    let ov = overview::overview(&table);
    assert_eq!(ov.respondents, 30);
    assert_eq!(ov.pct_working, 80.0);
    assert_eq!(ov.multimodal_respondents, 14);

    let view = trips::trip_types(&table);
    assert_eq!(view.contexts[0].population, 24);

    let combos = modal::modal_combinations(&table);
    assert_eq!(combos[0].label, "Metrô + Ônibus");
    assert_eq!(combos[0].count, 10);

    let location = crosstab::modal_by_neighborhood(&table);
    assert_eq!(location.rows.len(), 4);
}

#[test]
fn test_regression_on_fixture() {
    let table = prepare(read_records(&fixture()).unwrap());
    let reg = income_regression(&table).unwrap();

    assert_eq!(reg.rows, 28);
    assert_eq!(reg.line.len(), 7);
    assert!(reg.r2 <= 1.0);
}

#[test]
fn test_classification_pipeline_on_fixture() {
    let table = prepare(read_records(&fixture()).unwrap());

    let dataset = build_dataset(&table).unwrap();
    assert_eq!(dataset.n_rows(), 28);
    assert_eq!(dataset.positives(), 10);

    let report = classify::evaluate(&table, &fast_settings()).unwrap();
    assert_eq!(report.summary.test_rows, 9);
    assert_eq!(report.summary.train_rows, 19);
    for model in &report.models {
        assert_eq!(model.confusion_matrix.total(), report.summary.test_rows);
        assert_eq!(model.roc.fpr.first(), Some(&0.0));
        assert_eq!(model.roc.fpr.last(), Some(&1.0));
        assert_eq!(model.precision_recall.recall.last(), Some(&0.0));
    }
    assert!(!report.best_by_f1.is_empty());
}

#[test]
fn test_history_rows_appended_per_model() {
    let table = prepare(read_records(&fixture()).unwrap());
    let report = classify::evaluate(&table, &fast_settings()).unwrap();

    let path = std::env::temp_dir().join("odsurvey_integration_history.csv");
    let _ = std::fs::remove_file(&path);

    let rows = HistoryRow::from_report(&report, Utc::now());
    assert_eq!(rows.len(), 3);
    append_records(&path, &rows).unwrap();
    append_records(&path, &rows).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 7);
    assert!(content.starts_with("timestamp,model,"));

    std::fs::remove_file(&path).unwrap();
}
