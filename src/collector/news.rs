use crate::collector::fetch_all;
use crate::model::{JobReport, StorageError};
use crate::provider::MarketDataProvider;
use crate::scheduler::Job;
use crate::storage::SqliteStorage;
use futures::FutureExt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Stores recent headlines per company, skipping ones already seen.
pub struct NewsCollector {
    provider: Arc<dyn MarketDataProvider>,
    headline_limit: usize,
    max_concurrent_fetches: usize,
}

impl NewsCollector {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        headline_limit: usize,
        max_concurrent_fetches: usize,
    ) -> Self {
        Self {
            provider,
            headline_limit,
            max_concurrent_fetches,
        }
    }
}

#[async_trait::async_trait]
impl Job for NewsCollector {
    fn name(&self) -> &'static str {
        "collect_news_job"
    }

    async fn run(&self, storage: &mut SqliteStorage) -> Result<JobReport, StorageError> {
        let companies = storage.get_companies()?;
        info!("Collecting news for {} companies", companies.len());

        let limit = self.headline_limit;
        let provider = self.provider.clone();
        let fetched = fetch_all(&companies, self.max_concurrent_fetches, move |company| {
            let provider = provider.clone();
            let ticker = company.ticker.clone();
            async move {
                match provider.recent_headlines(&ticker, limit).await {
                    Ok(headlines) => headlines,
                    Err(e) => {
                        warn!("Error fetching news for {}: {}", ticker, e);
                        Vec::new()
                    }
                }
            }
            .boxed()
        })
        .await;

        let mut report = JobReport {
            companies: companies.len(),
            ..JobReport::default()
        };

        for (company, headlines) in fetched {
            if headlines.is_empty() {
                debug!("No headlines for {}", company.ticker);
                continue;
            }

            match storage.insert_headlines(company.id, &headlines) {
                Ok(inserted) => {
                    let duplicates = headlines.len() - inserted;
                    debug!(
                        "News for {}: {} new, {} already stored",
                        company.ticker, inserted, duplicates
                    );
                    report.stored += inserted;
                    report.skipped += duplicates;
                }
                Err(e) => {
                    error!("Error saving news for {}: {}", company.ticker, e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}
