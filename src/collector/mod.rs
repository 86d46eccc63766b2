// Collection jobs: prices and news per registered company
pub mod news;
pub mod price;

pub use news::NewsCollector;
pub use price::PriceCollector;

use crate::model::Company;
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};

/// Runs `fetch` for every company with at most `concurrency` calls in flight.
/// Results come back in company order.
pub(crate) async fn fetch_all<T, F>(
    companies: &[Company],
    concurrency: usize,
    fetch: F,
) -> Vec<(Company, T)>
where
    F: Fn(&Company) -> BoxFuture<'static, T>,
{
    stream::iter(companies.iter().cloned())
        .map(|company| {
            let fut = fetch(&company);
            async move { (company, fut.await) }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}
