pub mod classify;
pub mod codes;
pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod prepare;
pub mod record;
pub mod regression;
pub mod source;
pub mod summary;

pub use error::{Result, SurveyError};
