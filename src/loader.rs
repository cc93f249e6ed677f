//! Survey CSV ingestion.
//!
//! The dataset is located by probing a list of candidate paths in order; the
//! first one that exists and opens wins. Files ending in `.gz` are
//! decompressed on the fly.

use crate::error::{Result, SurveyError};
use crate::record::RawRecord;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Returns the first candidate that exists and can be opened for reading.
///
/// # Errors
///
/// [`SurveyError::DatasetNotFound`] listing every candidate tried.
pub fn locate_dataset(candidates: &[PathBuf]) -> Result<PathBuf> {
    for path in candidates {
        if !path.exists() {
            debug!(path = %path.display(), "Candidate dataset path does not exist");
            continue;
        }
        match File::open(path) {
            Ok(_) => {
                info!(path = %path.display(), "Survey dataset located");
                return Ok(path.clone());
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Candidate dataset path unreadable");
            }
        }
    }

    Err(SurveyError::DatasetNotFound {
        tried: candidates.to_vec(),
    })
}

/// Reads every respondent row from `path`.
#[tracing::instrument(fields(path = %path.display()))]
pub fn read_records(path: &Path) -> Result<Vec<RawRecord>> {
    let file = File::open(path)?;
    let gzipped = path.extension().and_then(|e| e.to_str()) == Some("gz");

    let reader: Box<dyn Read> = if gzipped {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let records = read_from(reader)?;
    info!(rows = records.len(), gzipped, "Survey rows loaded");
    Ok(records)
}

/// Deserializes respondent rows from any CSV reader.
pub fn read_from<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: RawRecord = result?;
        rows.push(record);
    }

    Ok(rows)
}

/// Probes `candidates` and loads the first readable dataset.
pub fn load_dataset(candidates: &[PathBuf]) -> Result<(PathBuf, Vec<RawRecord>)> {
    let path = locate_dataset(candidates)?;
    let records = read_records(&path)?;
    Ok((path, records))
}
