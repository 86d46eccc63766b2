// Analyzer module: price-move detection and the scheduled correlation job.

pub mod correlation;
pub mod job;

pub use correlation::CorrelationPolicy;
pub use job::CorrelationAnalyzer;
