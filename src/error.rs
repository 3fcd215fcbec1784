use std::path::PathBuf;

use chrono::NaiveDate;

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("no timelines to aggregate")]
    EmptyInput,
    #[error("timeline `{timeline_id}` has stage `{stage}` with no status entries")]
    MalformedTimeline { timeline_id: String, stage: String },
    #[error("timeline `{timeline_id}` reports progress {progress}, expected 0-100")]
    ProgressOutOfRange { timeline_id: String, progress: f64 },
    #[error("timeline `{timeline_id}` has unparseable lastUpdated `{value}`")]
    InvalidDate { timeline_id: String, value: String },
    #[error("a {days}-day trend window ending {today} is out of range")]
    TrendWindow { days: usize, today: NaiveDate },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json in config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("config validation failed: {0}")]
    Invalid(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json snapshot {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid csv row in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("line {line}: unknown status `{value}`")]
    UnknownStatus { line: u64, value: String },
    #[error("line {line}: timeline `{timeline_id}` disagrees with earlier rows on {field}")]
    Inconsistent {
        line: u64,
        timeline_id: String,
        field: &'static str,
    },
}
