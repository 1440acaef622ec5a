use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use serde::de::IgnoredAny;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::{Bar, FetchRequest, MarketProvider, Period, Quote, QuoteProvider};
use crate::providers::util::{build_url, get_json, http_client};

/// Largest page the klines endpoint hands out.
const PAGE_LIMIT: usize = 1000;

fn binance_interval(period: Period) -> &'static str {
    match period {
        Period::Min1 => "1m",
        Period::Min3 => "3m",
        Period::Min5 => "5m",
        Period::Min15 => "15m",
        Period::Min30 => "30m",
        Period::Min60 => "1h",
        Period::Hour2 => "2h",
        Period::Hour4 => "4h",
        Period::Hour6 => "6h",
        Period::Hour8 => "8h",
        Period::Hour12 => "12h",
        Period::Daily => "1d",
        Period::Day3 => "3d",
        Period::Weekly => "1w",
        Period::Monthly => "1M",
    }
}

/// Binance kline row: open time, OHLCV as strings, close time, then quote
/// volume, trade count and taker volumes.
#[derive(Debug, Deserialize)]
struct Kline(
    i64,
    String,
    String,
    String,
    String,
    String,
    i64,
    IgnoredAny,
    IgnoredAny,
    IgnoredAny,
    IgnoredAny,
    IgnoredAny,
);

impl Kline {
    fn to_bar(&self) -> Result<Bar> {
        let number = |s: &str| -> Result<f64> {
            s.parse::<f64>()
                .with_context(|| format!("Invalid number '{s}' in kline"))
        };
        Ok(Bar {
            date: DateTime::from_timestamp_millis(self.0)
                .ok_or_else(|| anyhow!("Invalid kline open time: {}", self.0))?,
            open: number(&self.1)?,
            high: number(&self.2)?,
            low: number(&self.3)?,
            close: number(&self.4)?,
            volume: number(&self.5)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
struct SymbolInfo {
    symbol: String,
}

pub struct BinanceProvider {
    base_url: String,
    delay: Duration,
}

impl BinanceProvider {
    pub fn new(base_url: &str, delay: Duration) -> Self {
        BinanceProvider {
            base_url: base_url.to_string(),
            delay,
        }
    }
}

#[async_trait]
impl QuoteProvider for BinanceProvider {
    #[instrument(name = "BinanceQuoteFetch", skip(self, request), fields(symbol = %symbol))]
    async fn fetch_quote(&self, symbol: &str, request: &FetchRequest) -> Result<Quote> {
        let interval = binance_interval(request.period);
        let end_ms = request.end.timestamp_millis();
        let client = http_client()?;

        let mut quote = Quote::new(symbol, 0);
        let mut cursor = request.start.timestamp_millis();
        loop {
            let url = build_url(
                &self.base_url,
                "/api/v3/klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.to_string()),
                    ("startTime", cursor.to_string()),
                    ("endTime", end_ms.to_string()),
                    ("limit", PAGE_LIMIT.to_string()),
                ],
            )?;
            let page: Vec<Kline> = get_json(&client, url, symbol).await?;
            debug!(from = cursor, klines = page.len(), "Fetched Binance page");

            for kline in &page {
                quote.push(kline.to_bar()?);
            }

            let Some(last) = page.last() else { break };
            cursor = last.6 + 1;
            if page.len() < PAGE_LIMIT || cursor > end_ms {
                break;
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        if quote.is_empty() {
            return Err(anyhow!("No price data found for symbol: {}", symbol));
        }
        Ok(quote)
    }
}

#[async_trait]
impl MarketProvider for BinanceProvider {
    async fn list_symbols(&self) -> Result<Vec<String>> {
        let url = build_url(&self.base_url, "/api/v3/exchangeInfo", &[])?;
        let client = http_client()?;
        let info: ExchangeInfo = get_json(&client, url, "binance market").await?;
        let mut symbols: Vec<String> = info.symbols.into_iter().map(|s| s.symbol).collect();
        symbols.sort();
        Ok(symbols)
    }
}
