//! Text encoders for quotes: CSV, JSON, Highstock and Amibroker layouts

use crate::core::quote::{Bar, Quote, Quotes};
use anyhow::{Context, Result};
use std::fmt::{Display, Write as _};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    Highstock,
    Amibroker,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv | OutputFormat::Amibroker => "csv",
            OutputFormat::Json | OutputFormat::Highstock => "json",
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                OutputFormat::Csv => "csv",
                OutputFormat::Json => "json",
                OutputFormat::Highstock => "highstock",
                OutputFormat::Amibroker => "amibroker",
            }
        )
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "hs" | "highstock" => Ok(OutputFormat::Highstock),
            "ami" | "amibroker" => Ok(OutputFormat::Amibroker),
            _ => Err(anyhow::anyhow!("Invalid output format: {}", s)),
        }
    }
}

fn fixed(value: f64, precision: usize) -> String {
    format!("{value:.precision$}")
}

fn price_columns(bar: &Bar, precision: usize) -> [String; 5] {
    [
        fixed(bar.open, precision),
        fixed(bar.high, precision),
        fixed(bar.low, precision),
        fixed(bar.close, precision),
        fixed(bar.volume, precision),
    ]
}

fn highstock_row(bar: &Bar, precision: usize) -> String {
    let [open, high, low, close, volume] = price_columns(bar, precision);
    format!(
        "[{},{open},{high},{low},{close},{volume}]",
        bar.date.timestamp_millis()
    )
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

impl Quote {
    /// `datetime,open,high,low,close,volume` with `YYYY-MM-DD HH:MM` stamps.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["datetime", "open", "high", "low", "close", "volume"])?;
        for bar in self.bars() {
            let datetime = bar.date.format("%Y-%m-%d %H:%M").to_string();
            let mut row = vec![datetime];
            row.extend(price_columns(&bar, self.precision));
            writer.write_record(&row)?;
        }
        finish(writer)
    }

    /// Two-column date/time CSV variant.
    pub fn to_amibroker(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["date", "time", "open", "high", "low", "close", "volume"])?;
        for bar in self.bars() {
            let mut row = vec![
                bar.date.format("%Y-%m-%d").to_string(),
                bar.date.format("%H:%M").to_string(),
            ];
            row.extend(price_columns(&bar, self.precision));
            writer.write_record(&row)?;
        }
        finish(writer)
    }

    pub fn to_json(&self, indent: bool) -> Result<String> {
        let json = if indent {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.with_context(|| format!("Failed to encode {} as JSON", self.symbol))
    }

    /// Highstock series layout: one `[ms,open,high,low,close,volume]` row per bar.
    pub fn to_highstock(&self) -> String {
        let rows: Vec<String> = self
            .bars()
            .map(|bar| highstock_row(&bar, self.precision))
            .collect();
        let mut out = String::from("[\n");
        if !rows.is_empty() {
            out.push_str(&rows.join(",\n"));
            out.push('\n');
        }
        out.push_str("]\n");
        out
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        self.check_aligned()?;
        match format {
            OutputFormat::Csv => self.to_csv(),
            OutputFormat::Json => self.to_json(true),
            OutputFormat::Highstock => Ok(self.to_highstock()),
            OutputFormat::Amibroker => self.to_amibroker(),
        }
    }
}

impl Quotes {
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "symbol", "datetime", "open", "high", "low", "close", "volume",
        ])?;
        for quote in self.iter() {
            for bar in quote.bars() {
                let mut row = vec![
                    quote.symbol.clone(),
                    bar.date.format("%Y-%m-%d %H:%M").to_string(),
                ];
                row.extend(price_columns(&bar, quote.precision));
                writer.write_record(&row)?;
            }
        }
        finish(writer)
    }

    pub fn to_amibroker(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "symbol", "date", "time", "open", "high", "low", "close", "volume",
        ])?;
        for quote in self.iter() {
            for bar in quote.bars() {
                let mut row = vec![
                    quote.symbol.clone(),
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.date.format("%H:%M").to_string(),
                ];
                row.extend(price_columns(&bar, quote.precision));
                writer.write_record(&row)?;
            }
        }
        finish(writer)
    }

    pub fn to_json(&self, indent: bool) -> Result<String> {
        let json = if indent {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.context("Failed to encode quotes as JSON")
    }

    /// Object keyed by symbol, each value a Highstock series.
    pub fn to_highstock(&self) -> Result<String> {
        let mut out = String::from("{\n");
        for (i, quote) in self.iter().enumerate() {
            let key = serde_json::to_string(&quote.symbol)?;
            writeln!(out, "{key}:[")?;
            let rows: Vec<String> = quote
                .bars()
                .map(|bar| highstock_row(&bar, quote.precision))
                .collect();
            if !rows.is_empty() {
                out.push_str(&rows.join(",\n"));
                out.push('\n');
            }
            out.push(']');
            if i + 1 < self.len() {
                out.push(',');
            }
            out.push('\n');
        }
        out.push_str("}\n");
        Ok(out)
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        for quote in self.iter() {
            quote.check_aligned()?;
        }
        match format {
            OutputFormat::Csv => self.to_csv(),
            OutputFormat::Json => self.to_json(true),
            OutputFormat::Highstock => self.to_highstock(),
            OutputFormat::Amibroker => self.to_amibroker(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample(symbol: &str) -> Quote {
        Quote::from_bars(
            symbol,
            vec![
                Bar {
                    date: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
                    open: 10.0,
                    high: 12.5,
                    low: 9.75,
                    close: 12.0,
                    volume: 1500.0,
                },
                Bar {
                    date: Utc.with_ymd_and_hms(2024, 1, 3, 14, 30, 0).unwrap(),
                    open: 12.0,
                    high: 13.0,
                    low: 11.0,
                    close: 11.5,
                    volume: 900.0,
                },
            ],
        )
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("hs".parse::<OutputFormat>().unwrap(), OutputFormat::Highstock);
        assert_eq!("ami".parse::<OutputFormat>().unwrap(), OutputFormat::Amibroker);
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Highstock.extension(), "json");
        assert_eq!(OutputFormat::Amibroker.extension(), "csv");
    }

    #[test]
    fn test_render_rejects_misaligned_columns() {
        let mut quote = sample("AAPL");
        quote.close.pop();
        for format in [OutputFormat::Csv, OutputFormat::Highstock] {
            assert_eq!(
                quote.render(format).unwrap_err().to_string(),
                "Quote for AAPL has mismatched column lengths"
            );
        }
        let quotes: Quotes = vec![sample("SPY"), quote].into_iter().collect();
        assert!(quotes.render(OutputFormat::Amibroker).is_err());
    }

    #[test]
    fn test_quote_csv() {
        let csv = sample("AAPL").to_csv().unwrap();
        assert_eq!(
            csv,
            "datetime,open,high,low,close,volume\n\
             2024-01-02 00:00,10.00,12.50,9.75,12.00,1500.00\n\
             2024-01-03 14:30,12.00,13.00,11.00,11.50,900.00\n"
        );
    }

    #[test]
    fn test_quote_csv_uses_wide_precision_for_crypto() {
        let csv = sample("BTC-USD").to_csv().unwrap();
        assert!(csv.contains("2024-01-02 00:00,10.00000000,12.50000000,"), "{csv}");
    }

    #[test]
    fn test_quote_csv_parses_back() {
        let quote = sample("AAPL");
        let parsed = Quote::from_csv("AAPL", &quote.to_csv().unwrap()).unwrap();
        assert_eq!(parsed, quote);
    }

    #[test]
    fn test_quote_amibroker() {
        let ami = sample("AAPL").to_amibroker().unwrap();
        let lines: Vec<&str> = ami.lines().collect();
        assert_eq!(lines[0], "date,time,open,high,low,close,volume");
        assert_eq!(lines[2], "2024-01-03,14:30,12.00,13.00,11.00,11.50,900.00");
    }

    #[test]
    fn test_quote_highstock() {
        let hs = sample("AAPL").to_highstock();
        assert_eq!(
            hs,
            "[\n\
             [1704153600000,10.00,12.50,9.75,12.00,1500.00],\n\
             [1704292200000,12.00,13.00,11.00,11.50,900.00]\n\
             ]\n"
        );
    }

    #[test]
    fn test_quote_highstock_empty() {
        assert_eq!(Quote::new("AAPL", 0).to_highstock(), "[\n]\n");
    }

    #[test]
    fn test_quote_json_layout() {
        let json = sample("AAPL").to_json(false).unwrap();
        assert!(json.starts_with(r#"{"symbol":"AAPL","date":["2024-01-02T00:00:00Z","#));
        assert!(!json.contains("precision"));
        assert_eq!(Quote::from_json(&json).unwrap(), sample("AAPL"));
    }

    #[test]
    fn test_quotes_csv_has_symbol_column() {
        let quotes: Quotes = vec![sample("AAPL"), sample("ETHUSD")].into_iter().collect();
        let csv = quotes.to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "symbol,datetime,open,high,low,close,volume");
        assert_eq!(lines[1], "AAPL,2024-01-02 00:00,10.00,12.50,9.75,12.00,1500.00");
        assert!(lines[3].starts_with("ETHUSD,2024-01-02 00:00,10.00000000,"));
    }

    #[test]
    fn test_quotes_amibroker_has_symbol_column() {
        let quotes: Quotes = vec![sample("AAPL")].into_iter().collect();
        let ami = quotes.to_amibroker().unwrap();
        assert!(ami.starts_with("symbol,date,time,open,high,low,close,volume\n"));
        assert!(ami.contains("AAPL,2024-01-03,14:30,12.00,"));
    }

    #[test]
    fn test_quotes_highstock_keyed_by_symbol() {
        let quotes: Quotes = vec![sample("AAPL"), sample("MSFT")].into_iter().collect();
        let hs = quotes.to_highstock().unwrap();
        let value: serde_json::Value = serde_json::from_str(&hs).unwrap();
        assert_eq!(value["AAPL"].as_array().unwrap().len(), 2);
        assert_eq!(value["MSFT"][1][0], 1704292200000_i64);
        assert_eq!(value["MSFT"][1][4], 11.5);
    }

    #[test]
    fn test_quotes_json_is_array() {
        let quotes: Quotes = vec![sample("AAPL"), sample("MSFT")].into_iter().collect();
        let json = quotes.render(OutputFormat::Json).unwrap();
        let parsed = Quotes::from_json(&json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].symbol, "MSFT");
    }
}
