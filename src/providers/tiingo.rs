//! Tiingo end-of-day and crypto price endpoints
//!
//! Both endpoints authenticate with a static token passed as a query parameter.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::{Bar, FetchRequest, MarketProvider, Period, Quote, QuoteProvider};
use crate::providers::util::{build_url, get_json, http_client};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn daily_resample(period: Period) -> Result<&'static str> {
    match period {
        Period::Daily => Ok("daily"),
        Period::Weekly => Ok("weekly"),
        Period::Monthly => Ok("monthly"),
        other => Err(anyhow!("Tiingo daily prices do not support period {}", other)),
    }
}

fn crypto_resample(period: Period) -> Result<&'static str> {
    match period {
        Period::Min1 => Ok("1min"),
        Period::Min3 => Ok("3min"),
        Period::Min5 => Ok("5min"),
        Period::Min15 => Ok("15min"),
        Period::Min30 => Ok("30min"),
        Period::Min60 => Ok("1hour"),
        Period::Hour2 => Ok("2hour"),
        Period::Hour4 => Ok("4hour"),
        Period::Hour6 => Ok("6hour"),
        Period::Hour8 => Ok("8hour"),
        Period::Hour12 => Ok("12hour"),
        Period::Daily => Ok("1day"),
        other => Err(anyhow!("Tiingo crypto prices do not support period {}", other)),
    }
}

pub struct TiingoProvider {
    base_url: String,
    token: String,
}

impl TiingoProvider {
    pub fn new(base_url: &str, token: &str) -> Self {
        TiingoProvider {
            base_url: base_url.to_string(),
            token: token.to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct DailyPrice {
    date: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
    adj_open: Option<f64>,
    adj_high: Option<f64>,
    adj_low: Option<f64>,
    adj_close: Option<f64>,
    adj_volume: Option<f64>,
}

impl DailyPrice {
    fn into_bar(self, adjust: bool) -> Bar {
        if adjust {
            Bar {
                date: self.date,
                open: self.adj_open.unwrap_or(self.open),
                high: self.adj_high.unwrap_or(self.high),
                low: self.adj_low.unwrap_or(self.low),
                close: self.adj_close.unwrap_or(self.close),
                volume: self.adj_volume.unwrap_or(self.volume),
            }
        } else {
            Bar {
                date: self.date,
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
                volume: self.volume,
            }
        }
    }
}

#[async_trait]
impl QuoteProvider for TiingoProvider {
    #[instrument(name = "TiingoQuoteFetch", skip(self, request), fields(symbol = %symbol))]
    async fn fetch_quote(&self, symbol: &str, request: &FetchRequest) -> Result<Quote> {
        let resample = daily_resample(request.period)?;
        let url = build_url(
            &self.base_url,
            &format!("/tiingo/daily/{symbol}/prices"),
            &[
                ("startDate", request.start.format(DATE_FORMAT).to_string()),
                ("endDate", request.end.format(DATE_FORMAT).to_string()),
                ("resampleFreq", resample.to_string()),
                ("token", self.token.clone()),
            ],
        )?;

        let client = http_client()?;
        let prices: Vec<DailyPrice> = get_json(&client, url, symbol).await?;
        if prices.is_empty() {
            return Err(anyhow!("No price data found for symbol: {}", symbol));
        }
        debug!(bars = prices.len(), "Parsed Tiingo daily prices");

        Ok(Quote::from_bars(
            symbol,
            prices.into_iter().map(|p| p.into_bar(request.adjust)),
        ))
    }
}

pub struct TiingoCryptoProvider {
    base_url: String,
    token: String,
}

impl TiingoCryptoProvider {
    pub fn new(base_url: &str, token: &str) -> Self {
        TiingoCryptoProvider {
            base_url: base_url.to_string(),
            token: token.to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CryptoTicker {
    #[serde(default)]
    price_data: Vec<CryptoPrice>,
}

#[derive(Deserialize, Debug)]
struct CryptoPrice {
    date: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

#[derive(Deserialize, Debug)]
struct CryptoMeta {
    ticker: String,
}

#[async_trait]
impl QuoteProvider for TiingoCryptoProvider {
    #[instrument(name = "TiingoCryptoFetch", skip(self, request), fields(symbol = %symbol))]
    async fn fetch_quote(&self, symbol: &str, request: &FetchRequest) -> Result<Quote> {
        let resample = crypto_resample(request.period)?;
        let url = build_url(
            &self.base_url,
            "/tiingo/crypto/prices",
            &[
                ("tickers", symbol.to_string()),
                ("startDate", request.start.format(DATE_FORMAT).to_string()),
                ("endDate", request.end.format(DATE_FORMAT).to_string()),
                ("resampleFreq", resample.to_string()),
                ("token", self.token.clone()),
            ],
        )?;

        let client = http_client()?;
        let tickers: Vec<CryptoTicker> = get_json(&client, url, symbol).await?;
        let prices = tickers
            .into_iter()
            .next()
            .map(|t| t.price_data)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", symbol))?;
        debug!(bars = prices.len(), "Parsed Tiingo crypto prices");

        Ok(Quote::from_bars(
            symbol,
            prices.into_iter().map(|p| Bar {
                date: p.date,
                open: p.open,
                high: p.high,
                low: p.low,
                close: p.close,
                volume: p.volume,
            }),
        ))
    }
}

#[async_trait]
impl MarketProvider for TiingoCryptoProvider {
    async fn list_symbols(&self) -> Result<Vec<String>> {
        let url = build_url(
            &self.base_url,
            "/tiingo/crypto",
            &[("token", self.token.clone())],
        )?;
        let client = http_client()?;
        let tickers: Vec<CryptoMeta> = get_json(&client, url, "tiingo crypto market").await?;
        let mut symbols: Vec<String> = tickers.into_iter().map(|t| t.ticker).collect();
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }
}
