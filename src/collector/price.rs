use crate::collector::fetch_all;
use crate::model::{JobReport, StorageError};
use crate::provider::MarketDataProvider;
use crate::scheduler::Job;
use crate::storage::SqliteStorage;
use chrono::Utc;
use futures::FutureExt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Appends the current price of every registered company.
pub struct PriceCollector {
    provider: Arc<dyn MarketDataProvider>,
    max_concurrent_fetches: usize,
}

impl PriceCollector {
    pub fn new(provider: Arc<dyn MarketDataProvider>, max_concurrent_fetches: usize) -> Self {
        Self {
            provider,
            max_concurrent_fetches,
        }
    }
}

#[async_trait::async_trait]
impl Job for PriceCollector {
    fn name(&self) -> &'static str {
        "collect_stock_price_job"
    }

    async fn run(&self, storage: &mut SqliteStorage) -> Result<JobReport, StorageError> {
        let companies = storage.get_companies()?;
        info!("Collecting prices for {} companies", companies.len());

        let provider = self.provider.clone();
        let fetched = fetch_all(&companies, self.max_concurrent_fetches, move |company| {
            let provider = provider.clone();
            let ticker = company.ticker.clone();
            async move { provider.latest_price(&ticker).await }.boxed()
        })
        .await;

        let mut report = JobReport {
            companies: companies.len(),
            ..JobReport::default()
        };

        for (company, result) in fetched {
            let price = match result {
                Ok(price) => price,
                Err(e) => {
                    warn!("No price for {}: {}", company.ticker, e);
                    report.skipped += 1;
                    continue;
                }
            };

            match storage.insert_price(company.id, price, Utc::now()) {
                Ok(sample) => {
                    debug!("Price {} stored for {} (sample {})", price, company.ticker, sample.id);
                    report.stored += 1;
                }
                Err(e) => {
                    error!("Error saving price for {}: {}", company.ticker, e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}
