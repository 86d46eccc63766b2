use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "STOCK_TRACKER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.json";
/// Upper bound for every duration setting (ten years).
pub const MAX_DURATION_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CompanyConfig {
    pub name: String,
    pub ticker: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Minimum relative move between the two latest samples (0.002 = 0.2%).
    pub price_change_threshold: f64,
    /// Half-width of the window around the latest sample in which news is linked.
    pub news_window_seconds: u64,
    /// How far back prices and news are read on every run.
    pub lookback_seconds: u64,
    /// Skip links already stored for the same (company, news, price sample).
    pub deduplicate: bool,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            price_change_threshold: 0.002,
            news_window_seconds: 3600,
            lookback_seconds: 3600,
            deduplicate: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout_seconds: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) StockTracker/0.1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: String,
    pub check_interval_seconds: u64,
    pub headline_limit: usize,
    pub max_concurrent_fetches: usize,
    pub correlation: CorrelationConfig,
    pub provider: ProviderConfig,
    pub companies: Vec<CompanyConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: "stock_tracker.db".to_string(),
            check_interval_seconds: 600,
            headline_limit: 3,
            max_concurrent_fetches: 1,
            correlation: CorrelationConfig::default(),
            provider: ProviderConfig::default(),
            companies: vec![
                CompanyConfig {
                    name: "Apple".to_string(),
                    ticker: "AAPL".to_string(),
                },
                CompanyConfig {
                    name: "Microsoft".to_string(),
                    ticker: "MSFT".to_string(),
                },
            ],
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.correlation.price_change_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "price_change_threshold must be a non-negative number, got {}",
                threshold
            )));
        }

        let positive = [
            ("check_interval_seconds", self.check_interval_seconds),
            ("correlation.news_window_seconds", self.correlation.news_window_seconds),
            ("correlation.lookback_seconds", self.correlation.lookback_seconds),
            ("provider.timeout_seconds", self.provider.timeout_seconds),
            ("headline_limit", self.headline_limit as u64),
            ("max_concurrent_fetches", self.max_concurrent_fetches as u64),
        ];
        if let Some((field, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Invalid(format!("{} must be greater than zero", field)));
        }

        let durations = [
            ("check_interval_seconds", self.check_interval_seconds),
            ("correlation.news_window_seconds", self.correlation.news_window_seconds),
            ("correlation.lookback_seconds", self.correlation.lookback_seconds),
            ("provider.timeout_seconds", self.provider.timeout_seconds),
        ];
        if let Some((field, value)) = durations.iter().find(|(_, v)| *v > MAX_DURATION_SECONDS) {
            return Err(ConfigError::Invalid(format!(
                "{} must be at most {} seconds, got {}",
                field, MAX_DURATION_SECONDS, value
            )));
        }

        let mut seen = HashSet::new();
        for company in &self.companies {
            let ticker = company.ticker.trim();
            if ticker.is_empty() || company.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "company entries need a name and a ticker, got {:?}",
                    company
                )));
            }
            if !seen.insert(ticker.to_uppercase()) {
                return Err(ConfigError::Invalid(format!("duplicate ticker {}", ticker)));
            }
        }

        Ok(())
    }
}

pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Config path from `STOCK_TRACKER_CONFIG`, falling back to `config.json`.
pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_yields_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.check_interval_seconds, 600);
        assert_eq!(config.correlation.price_change_threshold, 0.002);
        assert_eq!(config.correlation.news_window_seconds, 3600);
        assert_eq!(config.headline_limit, 3);
        assert_eq!(config.max_concurrent_fetches, 1);
        assert_eq!(config.companies.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{
                "check_interval_seconds": 60,
                "correlation": { "price_change_threshold": 0.01 },
                "companies": [ { "name": "Nvidia", "ticker": "NVDA" } ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.check_interval_seconds, 60);
        assert_eq!(config.correlation.price_change_threshold, 0.01);
        assert_eq!(config.correlation.lookback_seconds, 3600);
        assert!(config.correlation.deduplicate);
        assert_eq!(config.companies[0].ticker, "NVDA");
    }

    #[test]
    fn rejects_negative_threshold() {
        let mut config = AppConfig::default();
        config.correlation.price_change_threshold = -0.1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_zero_interval() {
        let mut config = AppConfig::default();
        config.check_interval_seconds = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("check_interval_seconds"));
    }

    #[test]
    fn rejects_durations_too_large_for_timestamps() {
        let mut config = AppConfig::default();
        config.correlation.news_window_seconds = u64::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("news_window_seconds"));

        let mut config = AppConfig::default();
        config.correlation.lookback_seconds = 10_000_000_000_000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("lookback_seconds"));

        let mut config = AppConfig::default();
        config.correlation.lookback_seconds = MAX_DURATION_SECONDS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_duplicate_tickers() {
        let mut config = AppConfig::default();
        config.companies.push(CompanyConfig {
            name: "Apple again".to_string(),
            ticker: "aapl".to_string(),
        });
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_config_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "database_path": "prices.db", "headline_limit": 5 }}"#).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.database_path, "prices.db");
        assert_eq!(config.headline_limit, 5);
    }

    #[test]
    fn load_config_reports_missing_file_and_bad_json() {
        assert!(matches!(
            load_config("/nonexistent/stock-tracker.json"),
            Err(ConfigError::Io(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
    }
}
