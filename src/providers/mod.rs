pub mod binance;
pub mod bittrex;
pub mod coinbase;
pub mod tiingo;
pub mod util;
pub mod yahoo;

use crate::core::config::AppConfig;
use crate::core::{MarketProvider, QuoteProvider, Source};
use anyhow::{Result, bail};

pub fn quote_provider(source: Source, config: &AppConfig) -> Result<Box<dyn QuoteProvider>> {
    let provider: Box<dyn QuoteProvider> = match source {
        Source::Yahoo => Box::new(yahoo::YahooProvider::new(config.yahoo_base_url())),
        Source::Tiingo => Box::new(tiingo::TiingoProvider::new(
            config.tiingo_base_url(),
            &config.tiingo_token()?,
        )),
        Source::TiingoCrypto => Box::new(tiingo::TiingoCryptoProvider::new(
            config.tiingo_base_url(),
            &config.tiingo_token()?,
        )),
        Source::Coinbase => Box::new(coinbase::CoinbaseProvider::new(
            config.coinbase_base_url(),
            config.delay(),
        )),
        Source::Bittrex => Box::new(bittrex::BittrexProvider::new(config.bittrex_base_url())),
        Source::Binance => Box::new(binance::BinanceProvider::new(
            config.binance_base_url(),
            config.delay(),
        )),
    };
    Ok(provider)
}

pub fn market_provider(source: Source, config: &AppConfig) -> Result<Box<dyn MarketProvider>> {
    let provider: Box<dyn MarketProvider> = match source {
        Source::TiingoCrypto => Box::new(tiingo::TiingoCryptoProvider::new(
            config.tiingo_base_url(),
            &config.tiingo_token()?,
        )),
        Source::Coinbase => Box::new(coinbase::CoinbaseProvider::new(
            config.coinbase_base_url(),
            config.delay(),
        )),
        Source::Bittrex => Box::new(bittrex::BittrexProvider::new(config.bittrex_base_url())),
        Source::Binance => Box::new(binance::BinanceProvider::new(
            config.binance_base_url(),
            config.delay(),
        )),
        Source::Yahoo | Source::Tiingo => bail!("{} does not provide a market list", source),
    };
    Ok(provider)
}
