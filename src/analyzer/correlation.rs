use crate::config::CorrelationConfig;
use crate::model::{NewCorrelation, NewsItem, PriceSample};
use chrono::Duration;
use tracing::debug;

/// Tunable values for detecting a price move and linking news to it.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationPolicy {
    pub price_change_threshold: f64,
    pub news_window: Duration,
    pub lookback: Duration,
    pub deduplicate: bool,
}

impl From<&CorrelationConfig> for CorrelationPolicy {
    fn from(cfg: &CorrelationConfig) -> Self {
        Self {
            price_change_threshold: cfg.price_change_threshold,
            news_window: seconds_saturating(cfg.news_window_seconds),
            lookback: seconds_saturating(cfg.lookback_seconds),
            deduplicate: cfg.deduplicate,
        }
    }
}

fn seconds_saturating(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

impl Default for CorrelationPolicy {
    fn default() -> Self {
        Self::from(&CorrelationConfig::default())
    }
}

/// Relative change from `previous` to `current`, always non-negative.
pub fn price_change(previous: f64, current: f64) -> f64 {
    (current - previous).abs() / previous
}

/// Links news to a significant move between the two latest price samples.
///
/// `prices` must be ordered by time ascending. The move is measured between the
/// last two samples only; when it reaches the threshold every news item within
/// `news_window` of the latest sample (either side, strict) gets one link, all
/// sharing the same `correlation_index`.
pub fn analyze(
    prices: &[PriceSample],
    news: &[NewsItem],
    policy: &CorrelationPolicy,
) -> Vec<NewCorrelation> {
    debug!("Analyzing correlation: {} prices, {} news items", prices.len(), news.len());

    let [.., previous, latest] = prices else {
        debug!("Not enough prices for correlation");
        return Vec::new();
    };

    if previous.price <= 0.0 {
        debug!("Previous price {} is not positive, skipping", previous.price);
        return Vec::new();
    }

    let change = price_change(previous.price, latest.price);
    debug!("Price change: {}, threshold: {}", change, policy.price_change_threshold);
    if change < policy.price_change_threshold {
        return Vec::new();
    }

    let window_ms = policy.news_window.num_milliseconds();
    let links: Vec<NewCorrelation> = news
        .iter()
        .filter(|item| (item.time - latest.time).num_milliseconds().abs() < window_ms)
        .map(|item| NewCorrelation {
            news_id: item.id,
            price_sample_id: latest.id,
            correlation_index: change,
        })
        .collect();

    debug!("Relevant news items: {}", links.len());
    links
}
