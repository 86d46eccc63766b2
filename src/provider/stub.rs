// In-memory provider for collector tests
use crate::model::{Headline, ProviderError};
use crate::provider::MarketDataProvider;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct StubProvider {
    prices: HashMap<String, Result<f64, ProviderError>>,
    headlines: HashMap<String, Result<Vec<Headline>, ProviderError>>,
    calls: Mutex<Vec<String>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, ticker: &str, price: Result<f64, ProviderError>) -> Self {
        self.prices.insert(ticker.to_string(), price);
        self
    }

    pub fn with_headlines(mut self, ticker: &str, headlines: Result<Vec<Headline>, ProviderError>) -> Self {
        self.headlines.insert(ticker.to_string(), headlines);
        self
    }

    /// Tickers requested so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for StubProvider {
    async fn latest_price(&self, ticker: &str) -> Result<f64, ProviderError> {
        self.calls.lock().unwrap().push(ticker.to_string());
        self.prices
            .get(ticker)
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::NotFound { ticker: ticker.to_string() }))
    }

    async fn recent_headlines(&self, ticker: &str, limit: usize) -> Result<Vec<Headline>, ProviderError> {
        self.calls.lock().unwrap().push(ticker.to_string());
        self.headlines
            .get(ticker)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
            .map(|mut items| {
                items.truncate(limit);
                items
            })
    }
}
