//! The common OHLCV record every provider normalizes into

use crate::core::dates::parse_datetime;
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

const DEFAULT_PRECISION: usize = 2;
const WIDE_PRECISION: usize = 8;

/// Display precision for a symbol: 8 decimals for BTC/ETH/USD pairs, 2 otherwise.
pub fn precision_for(symbol: &str) -> usize {
    let upper = symbol.to_uppercase();
    if ["BTC", "ETH", "USD"].iter().any(|s| upper.contains(s)) {
        WIDE_PRECISION
    } else {
        DEFAULT_PRECISION
    }
}

/// One OHLCV row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub date: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Price history for one symbol, stored as index-aligned columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    #[serde(skip)]
    pub precision: usize,
    pub date: Vec<DateTime<Utc>>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
}

impl Quote {
    pub fn new(symbol: &str, bars: usize) -> Self {
        Quote {
            symbol: symbol.to_string(),
            precision: precision_for(symbol),
            date: Vec::with_capacity(bars),
            open: Vec::with_capacity(bars),
            high: Vec::with_capacity(bars),
            low: Vec::with_capacity(bars),
            close: Vec::with_capacity(bars),
            volume: Vec::with_capacity(bars),
        }
    }

    pub fn from_bars<I>(symbol: &str, bars: I) -> Self
    where
        I: IntoIterator<Item = Bar>,
    {
        let bars = bars.into_iter();
        let mut quote = Quote::new(symbol, bars.size_hint().0);
        for bar in bars {
            quote.push(bar);
        }
        quote
    }

    pub fn push(&mut self, bar: Bar) {
        self.date.push(bar.date);
        self.open.push(bar.open);
        self.high.push(bar.high);
        self.low.push(bar.low);
        self.close.push(bar.close);
        self.volume.push(bar.volume);
    }

    pub fn len(&self) -> usize {
        self.date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.date.is_empty()
    }

    /// Rows up to the shortest column.
    pub fn bars(&self) -> impl Iterator<Item = Bar> + '_ {
        self.date
            .iter()
            .zip(&self.open)
            .zip(&self.high)
            .zip(&self.low)
            .zip(&self.close)
            .zip(&self.volume)
            .map(|(((((&date, &open), &high), &low), &close), &volume)| Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            })
    }

    pub fn first_date(&self) -> Option<DateTime<Utc>> {
        self.date.first().copied()
    }

    pub fn last_date(&self) -> Option<DateTime<Utc>> {
        self.date.last().copied()
    }

    pub fn check_aligned(&self) -> Result<()> {
        let n = self.date.len();
        let aligned = [
            self.open.len(),
            self.high.len(),
            self.low.len(),
            self.close.len(),
            self.volume.len(),
        ]
        .iter()
        .all(|len| *len == n);
        if aligned {
            Ok(())
        } else {
            Err(anyhow!(
                "Quote for {} has mismatched column lengths",
                self.symbol
            ))
        }
    }

    /// Decodes the JSON layout produced by [`Quote::to_json`].
    pub fn from_json(text: &str) -> Result<Self> {
        let mut quote: Quote =
            serde_json::from_str(text).context("Failed to parse quote JSON")?;
        quote.precision = precision_for(&quote.symbol);
        quote.check_aligned()?;
        Ok(quote)
    }

    /// Decodes the `datetime,open,high,low,close,volume` layout produced by
    /// [`Quote::to_csv`]. Date-only timestamps are accepted too.
    pub fn from_csv(symbol: &str, text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let mut quote = Quote::new(symbol, 0);
        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read CSV row {}", line + 1))?;
            if record.len() < 6 {
                return Err(anyhow!(
                    "CSV row {} for {} has {} columns, expected 6",
                    line + 1,
                    symbol,
                    record.len()
                ));
            }
            let number = |i: usize| -> Result<f64> {
                record[i].parse::<f64>().with_context(|| {
                    format!("Invalid number '{}' in CSV row {}", &record[i], line + 1)
                })
            };
            quote.push(Bar {
                date: parse_datetime(&record[0])?,
                open: number(1)?,
                high: number(2)?,
                low: number(3)?,
                close: number(4)?,
                volume: number(5)?,
            });
        }
        Ok(quote)
    }
}

/// Several quotes written out together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quotes(pub Vec<Quote>);

impl Quotes {
    pub fn push(&mut self, quote: Quote) {
        self.0.push(quote);
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let mut quotes: Quotes =
            serde_json::from_str(text).context("Failed to parse quotes JSON")?;
        for quote in quotes.0.iter_mut() {
            quote.precision = precision_for(&quote.symbol);
            quote.check_aligned()?;
        }
        Ok(quotes)
    }
}

impl Deref for Quotes {
    type Target = [Quote];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<Quote> for Quotes {
    fn from_iter<T: IntoIterator<Item = Quote>>(iter: T) -> Self {
        Quotes(iter.into_iter().collect())
    }
}

impl IntoIterator for Quotes {
    type Item = Quote;
    type IntoIter = std::vec::IntoIter<Quote>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
