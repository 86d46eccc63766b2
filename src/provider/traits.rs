use crate::model::{Headline, ProviderError};

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Current market price for a ticker.
    async fn latest_price(&self, ticker: &str) -> Result<f64, ProviderError>;

    /// Up to `limit` most recent headlines for a ticker.
    async fn recent_headlines(&self, ticker: &str, limit: usize) -> Result<Vec<Headline>, ProviderError>;
}
