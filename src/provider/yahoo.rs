// Yahoo Finance client: chart endpoint for prices, search endpoint for headlines
use crate::config::ProviderConfig;
use crate::model::{Headline, ProviderError};
use crate::provider::MarketDataProvider;
use crate::utils::from_unix_seconds;

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<SearchNewsItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNewsItem {
    title: Option<String>,
    // Kept loose so one bad entry drops only itself.
    provider_publish_time: Option<serde_json::Value>,
}

pub struct YahooProvider {
    client: Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_text(
        &self,
        ticker: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                ticker: ticker.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooProvider {
    async fn latest_price(&self, ticker: &str) -> Result<f64, ProviderError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let query = [("interval", "1m".to_string()), ("range", "1d".to_string())];

        let body = self.get_text(ticker, &url, &query).await?;
        let price = parse_price(ticker, &body)?;
        debug!("Price fetched for {}: {}", ticker, price);
        Ok(price)
    }

    async fn recent_headlines(&self, ticker: &str, limit: usize) -> Result<Vec<Headline>, ProviderError> {
        let url = format!("{}/v1/finance/search", self.base_url);
        let query = [
            ("q", ticker.to_string()),
            ("quotesCount", "0".to_string()),
            ("newsCount", limit.to_string()),
        ];

        let body = self.get_text(ticker, &url, &query).await?;
        let headlines = parse_headlines(ticker, &body, limit)?;
        debug!("Fetched {} headlines for {}", headlines.len(), ticker);
        Ok(headlines)
    }
}

/// Extracts `chart.result[0].meta.regularMarketPrice`, which must be a positive number.
pub fn parse_price(ticker: &str, body: &str) -> Result<f64, ProviderError> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Malformed(format!("chart response for {}: {}", ticker, e)))?;

    if let Some(err) = response.chart.error {
        if err.code == "Not Found" {
            return Err(ProviderError::NotFound {
                ticker: ticker.to_string(),
            });
        }
        return Err(ProviderError::Malformed(format!("{}: {}", err.code, err.description)));
    }

    let price = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .and_then(|result| result.meta.regular_market_price)
        .ok_or_else(|| ProviderError::Malformed(format!("no regularMarketPrice for {}", ticker)))?;

    if !price.is_finite() || price <= 0.0 {
        return Err(ProviderError::Malformed(format!("unusable price {} for {}", price, ticker)));
    }

    Ok(price)
}

/// Extracts up to `limit` headlines from a search response. Entries without a title
/// or without an integer `providerPublishTime` in Unix seconds are dropped.
pub fn parse_headlines(ticker: &str, body: &str, limit: usize) -> Result<Vec<Headline>, ProviderError> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Malformed(format!("search response for {}: {}", ticker, e)))?;

    let mut headlines = Vec::new();
    for item in response.news.into_iter().take(limit) {
        let text = item
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let time = item
            .provider_publish_time
            .as_ref()
            .and_then(serde_json::Value::as_i64)
            .and_then(from_unix_seconds);

        match (text, time) {
            (Some(text), Some(time)) => headlines.push(Headline { text, time }),
            _ => warn!(
                "Skipping news item for {} due to missing title or publish time: title={:?} time={:?}",
                ticker, item.title, item.provider_publish_time
            ),
        }
    }

    Ok(headlines)
}
