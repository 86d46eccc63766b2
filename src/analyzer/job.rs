use crate::analyzer::correlation::{analyze, CorrelationPolicy};
use crate::model::{Company, JobReport, StorageError};
use crate::scheduler::Job;
use crate::storage::SqliteStorage;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

/// Re-evaluates the lookback window of every company on each run and stores
/// the resulting news/price links.
pub struct CorrelationAnalyzer {
    policy: CorrelationPolicy,
}

impl CorrelationAnalyzer {
    pub fn new(policy: CorrelationPolicy) -> Self {
        Self { policy }
    }

    /// Analyzes one company as of `now`. Returns the number of links stored.
    pub fn analyze_company(
        &self,
        storage: &mut SqliteStorage,
        company: &Company,
        now: DateTime<Utc>,
    ) -> Result<usize, StorageError> {
        let since = now
            .checked_sub_signed(self.policy.lookback)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let prices = storage.get_prices_since(company.id, since)?;
        let news = storage.get_news_since(company.id, since)?;

        let links = analyze(&prices, &news, &self.policy);
        if links.is_empty() {
            debug!("No correlations for {}", company.ticker);
            return Ok(0);
        }

        info!(
            "{}: price move of {:.4} linked to {} news items",
            company.ticker,
            links[0].correlation_index,
            links.len()
        );
        let stored = storage.insert_correlations(company.id, &links, now, self.policy.deduplicate)?;
        debug!("{}: {} new correlations stored", company.ticker, stored);
        Ok(stored)
    }
}

#[async_trait::async_trait]
impl Job for CorrelationAnalyzer {
    fn name(&self) -> &'static str {
        "analyze_correlation_job"
    }

    async fn run(&self, storage: &mut SqliteStorage) -> Result<JobReport, StorageError> {
        let companies = storage.get_companies()?;
        let mut report = JobReport {
            companies: companies.len(),
            ..JobReport::default()
        };

        let now = Utc::now();
        for company in &companies {
            match self.analyze_company(storage, company, now) {
                Ok(0) => report.skipped += 1,
                Ok(stored) => report.stored += stored,
                Err(e) => {
                    error!("Error saving correlations for {}: {}", company.ticker, e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}
