//! Provider abstractions and request types

use crate::core::period::Period;
use crate::core::quote::Quote;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchRequest {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub period: Period,
    pub adjust: bool,
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self, symbol: &str, request: &FetchRequest) -> Result<Quote>;
}

#[async_trait]
pub trait MarketProvider: Send + Sync {
    async fn list_symbols(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Yahoo,
    Tiingo,
    TiingoCrypto,
    Coinbase,
    Bittrex,
    Binance,
}

impl Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Source::Yahoo => "yahoo",
                Source::Tiingo => "tiingo",
                Source::TiingoCrypto => "tiingo-crypto",
                Source::Coinbase => "coinbase",
                Source::Bittrex => "bittrex",
                Source::Binance => "binance",
            }
        )
    }
}

impl FromStr for Source {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yahoo" => Ok(Source::Yahoo),
            "tiingo" => Ok(Source::Tiingo),
            "tiingo-crypto" => Ok(Source::TiingoCrypto),
            "coinbase" => Ok(Source::Coinbase),
            "bittrex" => Ok(Source::Bittrex),
            "binance" => Ok(Source::Binance),
            _ => Err(anyhow::anyhow!("Invalid source: {}", s)),
        }
    }
}
