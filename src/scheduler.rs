// Fixed-interval job runner
use crate::model::{JobReport, StorageError};
use crate::storage::SqliteStorage;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

/// A unit of scheduled work. Each run gets exclusive use of the store.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, storage: &mut SqliteStorage) -> Result<JobReport, StorageError>;
}

pub struct Scheduler {
    storage: Arc<Mutex<SqliteStorage>>,
    jobs: Vec<Box<dyn Job>>,
    period: Duration,
}

impl Scheduler {
    pub fn new(storage: Arc<Mutex<SqliteStorage>>, period: Duration) -> Self {
        Self {
            storage,
            jobs: Vec::new(),
            period,
        }
    }

    /// Adds a job; jobs run in registration order within a tick.
    pub fn register(&mut self, job: impl Job + 'static) {
        self.jobs.push(Box::new(job));
    }

    pub fn job_names(&self) -> Vec<&'static str> {
        self.jobs.iter().map(|job| job.name()).collect()
    }

    /// Runs every registered job once, one after another.
    pub async fn run_tick(&self) {
        for job in &self.jobs {
            self.run_job(job.as_ref()).await;
        }
    }

    async fn run_job(&self, job: &dyn Job) -> Option<JobReport> {
        info!("Running {}...", job.name());

        // The guard lives for the whole job and is released on every exit path.
        let result = {
            let mut storage = self.storage.lock().await;
            job.run(&mut storage).await
        };

        match result {
            Ok(report) => {
                info!("{} completed: {}", job.name(), report);
                Some(report)
            }
            Err(e) => {
                error!("{} failed: {}", job.name(), e);
                None
            }
        }
    }

    /// Runs a tick immediately and then once per period until `shutdown` resolves.
    /// A tick still in flight at shutdown is abandoned. Returns the number of ticks started.
    pub async fn run_until<F>(&self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Scheduler started: jobs {:?} every {}s",
            self.job_names(),
            self.period.as_secs()
        );

        let mut ticks = 0;
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested, no further ticks scheduled.");
                    break;
                }
            }

            ticks += 1;
            info!("Tick {} started.", ticks);

            tokio::select! {
                _ = self.run_tick() => {
                    info!("Tick {} finished, waiting {}s.", ticks, self.period.as_secs());
                }
                _ = &mut shutdown => {
                    warn!("Shutdown requested during tick {}, abandoning in-flight job.", ticks);
                    break;
                }
            }
        }

        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct RecordingJob {
        name: &'static str,
        log: Arc<StdMutex<Vec<&'static str>>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Job for RecordingJob {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&self, _storage: &mut SqliteStorage) -> Result<JobReport, StorageError> {
            self.log.lock().unwrap().push(self.name);
            if self.fail {
                return Err(StorageError::Database(rusqlite::Error::QueryReturnedNoRows));
            }
            Ok(JobReport::default())
        }
    }

    struct StuckJob;

    #[async_trait::async_trait]
    impl Job for StuckJob {
        fn name(&self) -> &'static str {
            "stuck"
        }

        async fn run(&self, _storage: &mut SqliteStorage) -> Result<JobReport, StorageError> {
            tokio::time::sleep(Duration::from_secs(86_400)).await;
            Ok(JobReport::default())
        }
    }

    fn storage() -> Arc<Mutex<SqliteStorage>> {
        Arc::new(Mutex::new(SqliteStorage::open_in_memory().unwrap()))
    }

    fn recording(name: &'static str, log: &Arc<StdMutex<Vec<&'static str>>>, fail: bool) -> RecordingJob {
        RecordingJob {
            name,
            log: log.clone(),
            fail,
        }
    }

    #[tokio::test]
    async fn tick_runs_jobs_in_order_and_survives_failures() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut scheduler = Scheduler::new(storage(), Duration::from_secs(600));
        scheduler.register(recording("prices", &log, false));
        scheduler.register(recording("news", &log, true));
        scheduler.register(recording("correlations", &log, false));

        assert_eq!(scheduler.job_names(), vec!["prices", "news", "correlations"]);

        scheduler.run_tick().await;
        assert_eq!(*log.lock().unwrap(), vec!["prices", "news", "correlations"]);
    }

    #[tokio::test(start_paused = true)]
    async fn runs_immediately_then_every_period() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut scheduler = Scheduler::new(storage(), Duration::from_secs(600));
        scheduler.register(recording("prices", &log, false));

        // Ticks at 0s, 600s and 1200s; shutdown at 1250s.
        let ticks = scheduler
            .run_until(tokio::time::sleep(Duration::from_secs(1250)))
            .await;

        assert_eq!(ticks, 3);
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_abandons_in_flight_job_and_releases_storage() {
        let storage = storage();
        let mut scheduler = Scheduler::new(storage.clone(), Duration::from_secs(600));
        scheduler.register(StuckJob);

        let ticks = scheduler
            .run_until(tokio::time::sleep(Duration::from_secs(5)))
            .await;

        assert_eq!(ticks, 1);
        assert!(storage.try_lock().is_ok());
    }
}
