//! Data access for the views.
//!
//! [`SurveySource`] is the seam between the pipelines and wherever the raw
//! table comes from. [`SurveyStore`] wraps a source and memoizes the prepared
//! table keyed by the source's identity, so every view shares one build.

use crate::error::Result;
use crate::loader;
use crate::prepare::{self, PreparedTable};
use crate::record::RawRecord;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{debug, info};

/// Provides the raw survey table.
pub trait SurveySource {
    /// Identifies the current raw input. A different value means the prepared
    /// table must be rebuilt.
    fn identity(&self) -> Result<String>;

    /// Reads every raw respondent row.
    fn read(&self) -> Result<Vec<RawRecord>>;
}

/// CSV file found by probing candidate paths in order.
#[derive(Debug, Clone)]
pub struct CsvSource {
    candidates: Vec<PathBuf>,
}

impl CsvSource {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }
}

impl SurveySource for CsvSource {
    fn identity(&self) -> Result<String> {
        let path = loader::locate_dataset(&self.candidates)?;
        let meta = std::fs::metadata(&path)?;
        let modified = meta
            .modified()
            .map(|t| DateTime::<Utc>::from(t).to_rfc3339())
            .unwrap_or_default();
        Ok(format!("{}|{}|{}", path.display(), meta.len(), modified))
    }

    fn read(&self) -> Result<Vec<RawRecord>> {
        let (_, records) = loader::load_dataset(&self.candidates)?;
        Ok(records)
    }
}

/// Rows held in memory, identified by a caller-chosen tag.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pub tag: String,
    pub records: Vec<RawRecord>,
}

impl MemorySource {
    pub fn new(tag: impl Into<String>, records: Vec<RawRecord>) -> Self {
        Self {
            tag: tag.into(),
            records,
        }
    }
}

impl SurveySource for MemorySource {
    fn identity(&self) -> Result<String> {
        Ok(format!("memory:{}:{}", self.tag, self.records.len()))
    }

    fn read(&self) -> Result<Vec<RawRecord>> {
        Ok(self.records.clone())
    }
}

/// Load-once cache of the prepared table.
pub struct SurveyStore<S> {
    source: S,
    cached: Option<(String, Rc<PreparedTable>)>,
    builds: usize,
}

impl<S: SurveySource> SurveyStore<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cached: None,
            builds: 0,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Returns the prepared table, building it only when the source identity
    /// changed since the last call.
    pub fn prepared(&mut self) -> Result<Rc<PreparedTable>> {
        let identity = self.source.identity()?;

        if let Some((cached_id, table)) = &self.cached {
            if *cached_id == identity {
                debug!(identity = %identity, "Prepared table served from cache");
                return Ok(Rc::clone(table));
            }
        }

        let raw = self.source.read()?;
        let table = Rc::new(prepare::prepare(raw));
        self.builds += 1;
        info!(identity = %identity, rows = table.len(), "Prepared table built");

        self.cached = Some((identity, Rc::clone(&table)));
        Ok(table)
    }

    /// Number of times the prepared table has been built.
    pub fn builds(&self) -> usize {
        self.builds
    }
}
