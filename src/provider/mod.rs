pub mod traits;
pub mod yahoo;

#[cfg(test)]
pub mod stub;

pub use traits::MarketDataProvider;
pub use yahoo::YahooProvider;
