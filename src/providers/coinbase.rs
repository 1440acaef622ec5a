use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, SecondsFormat, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::{Bar, FetchRequest, MarketProvider, Period, Quote, QuoteProvider};
use crate::providers::util::{build_url, get_json, http_client};

/// Upper bound on candles returned by a single request.
const MAX_CANDLES: i64 = 300;

fn granularity(period: Period) -> Result<i64> {
    match period {
        Period::Min1 | Period::Min5 | Period::Min15 | Period::Min60 | Period::Hour6 | Period::Daily => {
            Ok(period.seconds())
        }
        other => Err(anyhow!("Coinbase does not support period {}", other)),
    }
}

/// `[time, low, high, open, close, volume]`
#[derive(Deserialize, Debug)]
struct Candle(i64, f64, f64, f64, f64, f64);

#[derive(Deserialize, Debug)]
struct Product {
    id: String,
}

pub struct CoinbaseProvider {
    base_url: String,
    delay: Duration,
}

impl CoinbaseProvider {
    pub fn new(base_url: &str, delay: Duration) -> Self {
        CoinbaseProvider {
            base_url: base_url.to_string(),
            delay,
        }
    }
}

fn rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
impl QuoteProvider for CoinbaseProvider {
    #[instrument(name = "CoinbaseQuoteFetch", skip(self, request), fields(symbol = %symbol))]
    async fn fetch_quote(&self, symbol: &str, request: &FetchRequest) -> Result<Quote> {
        let granularity = granularity(request.period)?;
        let window = ChronoDuration::seconds(granularity * MAX_CANDLES);
        let client = http_client()?;

        let mut candles: Vec<Candle> = Vec::new();
        let mut cursor = request.start;
        while cursor < request.end {
            let window_end = (cursor + window).min(request.end);
            let url = build_url(
                &self.base_url,
                &format!("/products/{symbol}/candles"),
                &[
                    ("start", rfc3339(cursor)),
                    ("end", rfc3339(window_end)),
                    ("granularity", granularity.to_string()),
                ],
            )?;
            let page: Vec<Candle> = get_json(&client, url, symbol).await?;
            debug!(from = %cursor, to = %window_end, candles = page.len(), "Fetched Coinbase page");
            candles.extend(page);

            cursor = window_end;
            if cursor < request.end && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        // Pages arrive newest first and neighbouring windows share an edge.
        candles.sort_by_key(|c| c.0);
        candles.dedup_by_key(|c| c.0);

        let start = request.start.timestamp();
        let end = request.end.timestamp();
        let bars: Vec<Bar> = candles
            .into_iter()
            .filter(|c| c.0 >= start && c.0 <= end)
            .filter_map(|Candle(time, low, high, open, close, volume)| {
                DateTime::from_timestamp(time, 0).map(|date| Bar {
                    date,
                    open,
                    high,
                    low,
                    close,
                    volume,
                })
            })
            .collect();

        if bars.is_empty() {
            return Err(anyhow!("No price data found for symbol: {}", symbol));
        }
        Ok(Quote::from_bars(symbol, bars))
    }
}

#[async_trait]
impl MarketProvider for CoinbaseProvider {
    async fn list_symbols(&self) -> Result<Vec<String>> {
        let url = build_url(&self.base_url, "/products", &[])?;
        let client = http_client()?;
        let products: Vec<Product> = get_json(&client, url, "coinbase market").await?;
        let mut symbols: Vec<String> = products.into_iter().map(|p| p.id).collect();
        symbols.sort();
        Ok(symbols)
    }
}
