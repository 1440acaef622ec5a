//! Bar granularity shared by every provider

use anyhow::Result;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum Period {
    Min1,
    Min3,
    Min5,
    Min15,
    Min30,
    Min60,
    Hour2,
    Hour4,
    Hour6,
    Hour8,
    Hour12,
    Daily,
    Day3,
    Weekly,
    Monthly,
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
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
                Period::Daily => "d",
                Period::Day3 => "3d",
                Period::Weekly => "w",
                Period::Monthly => "m",
            }
        )
    }
}

impl Period {
    /// Nominal bar length in seconds. Months count as 30 days.
    pub fn seconds(&self) -> i64 {
        const MINUTE: i64 = 60;
        const HOUR: i64 = 60 * MINUTE;
        const DAY: i64 = 24 * HOUR;
        match self {
            Period::Min1 => MINUTE,
            Period::Min3 => 3 * MINUTE,
            Period::Min5 => 5 * MINUTE,
            Period::Min15 => 15 * MINUTE,
            Period::Min30 => 30 * MINUTE,
            Period::Min60 => HOUR,
            Period::Hour2 => 2 * HOUR,
            Period::Hour4 => 4 * HOUR,
            Period::Hour6 => 6 * HOUR,
            Period::Hour8 => 8 * HOUR,
            Period::Hour12 => 12 * HOUR,
            Period::Daily => DAY,
            Period::Day3 => 3 * DAY,
            Period::Weekly => 7 * DAY,
            Period::Monthly => 30 * DAY,
        }
    }

    pub fn is_intraday(&self) -> bool {
        self.seconds() < Period::Daily.seconds()
    }
}

impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "1M" stays distinct from "1m" so Binance-style month codes still parse.
        if s == "1M" {
            return Ok(Period::Monthly);
        }
        match s.to_lowercase().as_str() {
            "1m" | "1min" | "60" => Ok(Period::Min1),
            "3m" | "3min" => Ok(Period::Min3),
            "5m" | "5min" | "300" => Ok(Period::Min5),
            "15m" | "15min" | "900" => Ok(Period::Min15),
            "30m" | "30min" | "1800" => Ok(Period::Min30),
            "1h" | "60m" | "3600" => Ok(Period::Min60),
            "2h" => Ok(Period::Hour2),
            "4h" => Ok(Period::Hour4),
            "6h" => Ok(Period::Hour6),
            "8h" => Ok(Period::Hour8),
            "12h" => Ok(Period::Hour12),
            "d" | "1d" | "daily" => Ok(Period::Daily),
            "3d" => Ok(Period::Day3),
            "w" | "1w" | "1wk" | "weekly" => Ok(Period::Weekly),
            "m" | "1mo" | "monthly" => Ok(Period::Monthly),
            _ => Err(anyhow::anyhow!("Invalid period: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_parsing() {
        assert_eq!("d".parse::<Period>().unwrap(), Period::Daily);
        assert_eq!("Daily".parse::<Period>().unwrap(), Period::Daily);
        assert_eq!("w".parse::<Period>().unwrap(), Period::Weekly);
        assert_eq!("m".parse::<Period>().unwrap(), Period::Monthly);
        assert_eq!("1M".parse::<Period>().unwrap(), Period::Monthly);
        assert_eq!("1m".parse::<Period>().unwrap(), Period::Min1);
        assert_eq!("60".parse::<Period>().unwrap(), Period::Min1);
        assert_eq!("3600".parse::<Period>().unwrap(), Period::Min60);
        assert_eq!("12h".parse::<Period>().unwrap(), Period::Hour12);

        let err = "2w".parse::<Period>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid period: 2w");
    }

    #[test]
    fn test_period_display_round_trips_through_parse() {
        for period in [
            Period::Min1,
            Period::Min15,
            Period::Hour4,
            Period::Daily,
            Period::Day3,
            Period::Weekly,
            Period::Monthly,
        ] {
            assert_eq!(period.to_string().parse::<Period>().unwrap(), period);
        }
    }

    #[test]
    fn test_period_seconds() {
        assert_eq!(Period::Min5.seconds(), 300);
        assert_eq!(Period::Hour6.seconds(), 21_600);
        assert_eq!(Period::Daily.seconds(), 86_400);
        assert!(Period::Hour12.is_intraday());
        assert!(!Period::Daily.is_intraday());
        assert!(!Period::Monthly.is_intraday());
    }
}
