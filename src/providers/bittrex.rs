use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::{Bar, FetchRequest, MarketProvider, Period, Quote, QuoteProvider};
use crate::providers::util::{build_url, get_json, http_client};

fn tick_interval(period: Period) -> Result<&'static str> {
    match period {
        Period::Min1 => Ok("oneMin"),
        Period::Min5 => Ok("fiveMin"),
        Period::Min30 => Ok("thirtyMin"),
        Period::Min60 => Ok("hour"),
        Period::Daily => Ok("day"),
        other => Err(anyhow!("Bittrex does not support period {}", other)),
    }
}

#[derive(Deserialize, Debug)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    message: String,
    result: Option<T>,
}

impl<T> Envelope<T> {
    fn into_result(self, subject: &str) -> Result<T> {
        if !self.success {
            return Err(anyhow!("Bittrex error for {}: {}", subject, self.message));
        }
        self.result
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", subject))
    }
}

#[derive(Deserialize, Debug)]
struct Tick {
    #[serde(rename = "T")]
    time: NaiveDateTime,
    #[serde(rename = "O")]
    open: f64,
    #[serde(rename = "H")]
    high: f64,
    #[serde(rename = "L")]
    low: f64,
    #[serde(rename = "C")]
    close: f64,
    #[serde(rename = "V")]
    volume: f64,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct Market {
    market_name: String,
}

pub struct BittrexProvider {
    base_url: String,
}

impl BittrexProvider {
    pub fn new(base_url: &str) -> Self {
        BittrexProvider {
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl QuoteProvider for BittrexProvider {
    #[instrument(name = "BittrexQuoteFetch", skip(self, request), fields(symbol = %symbol))]
    async fn fetch_quote(&self, symbol: &str, request: &FetchRequest) -> Result<Quote> {
        let interval = tick_interval(request.period)?;
        let url = build_url(
            &self.base_url,
            "/Api/v2.0/pub/market/GetTicks",
            &[
                ("marketName", symbol.to_string()),
                ("tickInterval", interval.to_string()),
            ],
        )?;

        let client = http_client()?;
        let envelope: Envelope<Vec<Tick>> = get_json(&client, url, symbol).await?;
        let ticks = envelope.into_result(symbol)?;
        debug!(ticks = ticks.len(), "Received Bittrex ticks");

        // GetTicks ignores the range, so trim to what was asked for.
        let quote = Quote::from_bars(
            symbol,
            ticks
                .into_iter()
                .map(|t| Bar {
                    date: t.time.and_utc(),
                    open: t.open,
                    high: t.high,
                    low: t.low,
                    close: t.close,
                    volume: t.volume,
                })
                .filter(|b| b.date >= request.start && b.date <= request.end),
        );
        if quote.is_empty() {
            return Err(anyhow!("No price data found for symbol: {}", symbol));
        }
        Ok(quote)
    }
}

#[async_trait]
impl MarketProvider for BittrexProvider {
    async fn list_symbols(&self) -> Result<Vec<String>> {
        let url = build_url(&self.base_url, "/api/v1.1/public/getmarkets", &[])?;
        let client = http_client()?;
        let envelope: Envelope<Vec<Market>> = get_json(&client, url, "bittrex market").await?;
        let mut symbols: Vec<String> = envelope
            .into_result("bittrex market")?
            .into_iter()
            .map(|m| m.market_name)
            .collect();
        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> FetchRequest {
        FetchRequest {
            start: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap(),
            period: Period::Daily,
            adjust: false,
        }
    }

    #[tokio::test]
    async fn test_ticks_are_trimmed_to_range() {
        let mock_server = MockServer::start().await;
        let body = r#"{"success":true,"message":"","result":[
            {"O":0.01,"H":0.02,"L":0.005,"C":0.015,"V":100.0,"T":"2024-01-01T00:00:00","BV":1.5},
            {"O":0.015,"H":0.025,"L":0.01,"C":0.02,"V":200.0,"T":"2024-01-02T00:00:00","BV":4.0},
            {"O":0.02,"H":0.03,"L":0.015,"C":0.025,"V":300.0,"T":"2024-01-03T00:00:00","BV":7.5},
            {"O":0.025,"H":0.035,"L":0.02,"C":0.03,"V":400.0,"T":"2024-01-04T00:00:00","BV":12.0}
        ]}"#;
        Mock::given(method("GET"))
            .and(path("/Api/v2.0/pub/market/GetTicks"))
            .and(query_param("marketName", "BTC-LTC"))
            .and(query_param("tickInterval", "day"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;

        let provider = BittrexProvider::new(&mock_server.uri());
        let quote = provider.fetch_quote("BTC-LTC", &request()).await.unwrap();

        assert_eq!(quote.len(), 2);
        assert_eq!(quote.precision, 8);
        assert_eq!(quote.close, vec![0.02, 0.025]);
        assert_eq!(quote.volume, vec![200.0, 300.0]);
    }

    #[tokio::test]
    async fn test_unsuccessful_envelope() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Api/v2.0/pub/market/GetTicks"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success":false,"message":"INVALID_MARKET","result":null}"#,
            ))
            .mount(&mock_server)
            .await;

        let provider = BittrexProvider::new(&mock_server.uri());
        let err = provider.fetch_quote("BTC-XYZ", &request()).await.unwrap_err();
        assert_eq!(err.to_string(), "Bittrex error for BTC-XYZ: INVALID_MARKET");
    }

    #[tokio::test]
    async fn test_unsupported_period() {
        let provider = BittrexProvider::new("http://127.0.0.1:9");
        let mut req = request();
        req.period = Period::Min15;
        let err = provider.fetch_quote("BTC-LTC", &req).await.unwrap_err();
        assert_eq!(err.to_string(), "Bittrex does not support period 15m");
    }

    #[tokio::test]
    async fn test_market_list() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1.1/public/getmarkets"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success":true,"message":"","result":[
                    {"MarketCurrency":"LTC","BaseCurrency":"BTC","MarketName":"BTC-LTC","IsActive":true},
                    {"MarketCurrency":"ETH","BaseCurrency":"BTC","MarketName":"BTC-ETH","IsActive":true}
                ]}"#,
            ))
            .mount(&mock_server)
            .await;

        let provider = BittrexProvider::new(&mock_server.uri());
        assert_eq!(
            provider.list_symbols().await.unwrap(),
            vec!["BTC-ETH", "BTC-LTC"]
        );
    }
}
