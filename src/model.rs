// Core structs: Company, PriceSample, NewsItem, Correlation
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub ticker: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSample {
    pub id: i64,
    pub company_id: i64,
    pub price: f64,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub id: i64,
    pub company_id: i64,
    pub text: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Correlation {
    pub id: i64,
    pub company_id: i64,
    pub news_id: i64,
    pub price_sample_id: i64,
    pub correlation_index: f64,
    pub recorded_time: DateTime<Utc>,
}

/// A headline as returned by the data provider, not yet stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Headline {
    pub text: String,
    pub time: DateTime<Utc>,
}

/// A news/price link produced by the analyzer, not yet stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCorrelation {
    pub news_id: i64,
    pub price_sample_id: i64,
    pub correlation_index: f64,
}

/// Outcome counters for a single job run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    pub companies: usize,
    pub stored: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "companies={} stored={} skipped={} failed={}",
            self.companies, self.stored, self.skipped, self.failed
        )
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error("http error: {0}")]
    Http(String),
    #[error("unexpected status {status} for {ticker}")]
    Status { ticker: String, status: u16 },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("ticker not found: {ticker}")]
    NotFound { ticker: String },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("invalid timestamp in column {column}: {value}")]
    InvalidTimestamp { column: &'static str, value: String },
}
