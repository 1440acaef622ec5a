use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::{Bar, FetchRequest, Period, Quote, QuoteProvider};
use crate::providers::util::{build_url, get_json, http_client};

fn yahoo_interval(period: Period) -> Result<&'static str> {
    match period {
        Period::Min1 => Ok("1m"),
        Period::Min5 => Ok("5m"),
        Period::Min15 => Ok("15m"),
        Period::Min30 => Ok("30m"),
        Period::Min60 => Ok("60m"),
        Period::Daily => Ok("1d"),
        Period::Weekly => Ok("1wk"),
        Period::Monthly => Ok("1mo"),
        other => Err(anyhow!("Yahoo does not support period {}", other)),
    }
}

pub struct YahooProvider {
    base_url: String,
}

impl YahooProvider {
    pub fn new(base_url: &str) -> Self {
        YahooProvider {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
    error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Deserialize, Debug, Default)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<QuoteColumns>,
    adjclose: Option<Vec<AdjCloseColumn>>,
}

#[derive(Deserialize, Debug)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Deserialize, Debug)]
struct AdjCloseColumn {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

fn bar_date(ts: i64, gmtoffset: i64, period: Period) -> Option<DateTime<Utc>> {
    if period.is_intraday() {
        return DateTime::from_timestamp(ts, 0);
    }
    // Daily and longer bars are keyed by the exchange-local trading day.
    DateTime::from_timestamp(ts + gmtoffset, 0)
        .map(|dt| dt.date_naive().and_time(NaiveTime::MIN).and_utc())
}

fn to_quote(symbol: &str, item: ChartItem, request: &FetchRequest) -> Result<Quote> {
    let timestamps = item.timestamp.unwrap_or_default();
    let columns = item
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No price data found for symbol: {}", symbol))?;
    let adjcloses = item
        .indicators
        .adjclose
        .and_then(|v| v.into_iter().next())
        .map(|a| a.adjclose);

    let mut quote = Quote::new(symbol, timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let at = |col: &Vec<Option<f64>>| col.get(i).copied().flatten();
        let (Some(mut open), Some(mut high), Some(mut low), Some(mut close)) = (
            at(&columns.open),
            at(&columns.high),
            at(&columns.low),
            at(&columns.close),
        ) else {
            debug!(index = i, "Skipping bar with missing prices");
            continue;
        };
        let Some(date) = bar_date(*ts, item.meta.gmtoffset, request.period) else {
            debug!(timestamp = ts, "Skipping bar with invalid timestamp");
            continue;
        };

        if request.adjust
            && let Some(adjclose) = adjcloses.as_ref().and_then(at)
            && close != 0.0
        {
            let factor = adjclose / close;
            open *= factor;
            high *= factor;
            low *= factor;
            close = adjclose;
        }

        quote.push(Bar {
            date,
            open,
            high,
            low,
            close,
            volume: at(&columns.volume).unwrap_or(0.0),
        });
    }
    Ok(quote)
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    #[instrument(
        name = "YahooQuoteFetch",
        skip(self, request),
        fields(symbol = %symbol, period = %request.period)
    )]
    async fn fetch_quote(&self, symbol: &str, request: &FetchRequest) -> Result<Quote> {
        let interval = yahoo_interval(request.period)?;
        let url = build_url(
            &self.base_url,
            &format!("/v8/finance/chart/{symbol}"),
            &[
                ("period1", request.start.timestamp().to_string()),
                ("period2", request.end.timestamp().to_string()),
                ("interval", interval.to_string()),
                ("events", "div|split".to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ],
        )?;

        let client = http_client()?;
        let data: ChartResponse = get_json(&client, url, symbol).await?;

        if let Some(err) = data.chart.error {
            return Err(anyhow!(
                "Yahoo error for {}: {}: {}",
                symbol,
                err.code,
                err.description
            ));
        }
        let item = data
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", symbol))?;

        let quote = to_quote(symbol, item, request)?;
        debug!(bars = quote.len(), "Parsed Yahoo quote");
        Ok(quote)
    }
}
