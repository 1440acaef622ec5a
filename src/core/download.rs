//! Sequential multi-symbol download

use crate::core::provider::{FetchRequest, QuoteProvider};
use crate::core::quote::{Quote, Quotes};
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of a batch download.
#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub quotes: Quotes,
    pub failures: Vec<(String, String)>,
}

impl DownloadSummary {
    pub fn total(&self) -> usize {
        self.quotes.len() + self.failures.len()
    }
}

/// Fetches `symbols` one at a time, pausing `delay` between requests.
///
/// A symbol that fails is recorded in [`DownloadSummary::failures`] and the
/// batch carries on with the next one. `on_result` sees every outcome in order.
pub async fn download_quotes<F>(
    provider: &dyn QuoteProvider,
    symbols: &[String],
    request: &FetchRequest,
    delay: Duration,
    mut on_result: F,
) -> DownloadSummary
where
    F: FnMut(&str, &anyhow::Result<Quote>),
{
    let mut summary = DownloadSummary::default();

    for (i, symbol) in symbols.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = provider.fetch_quote(symbol, request).await;
        on_result(symbol, &result);

        match result {
            Ok(quote) => {
                info!(symbol = %symbol, bars = quote.len(), "Downloaded quote");
                summary.quotes.push(quote);
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Error downloading quote");
                summary.failures.push((symbol.clone(), e.to_string()));
            }
        }
    }

    summary
}
