use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const YAHOO_BASE_URL: &str = "https://query2.finance.yahoo.com";
pub const TIINGO_BASE_URL: &str = "https://api.tiingo.com";
pub const COINBASE_BASE_URL: &str = "https://api.exchange.coinbase.com";
pub const BITTREX_BASE_URL: &str = "https://bittrex.com";
pub const BINANCE_BASE_URL: &str = "https://api.binance.com";

pub const TIINGO_TOKEN_ENV: &str = "TIINGO_API_TOKEN";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TiingoProviderConfig {
    #[serde(default = "default_tiingo_base_url")]
    pub base_url: String,
    pub token: Option<String>,
}

fn default_tiingo_base_url() -> String {
    TIINGO_BASE_URL.to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    pub yahoo: Option<ProviderConfig>,
    pub tiingo: Option<TiingoProviderConfig>,
    pub coinbase: Option<ProviderConfig>,
    pub bittrex: Option<ProviderConfig>,
    pub binance: Option<ProviderConfig>,
}

fn default_delay_ms() -> u64 {
    100
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Pause between consecutive requests, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl AppConfig {
    /// Loads the default config file, or built-in defaults when there is none.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "marketquote", "marketquote")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn yahoo_base_url(&self) -> &str {
        self.providers
            .yahoo
            .as_ref()
            .map_or(YAHOO_BASE_URL, |p| &p.base_url)
    }

    pub fn tiingo_base_url(&self) -> &str {
        self.providers
            .tiingo
            .as_ref()
            .map_or(TIINGO_BASE_URL, |p| &p.base_url)
    }

    pub fn coinbase_base_url(&self) -> &str {
        self.providers
            .coinbase
            .as_ref()
            .map_or(COINBASE_BASE_URL, |p| &p.base_url)
    }

    pub fn bittrex_base_url(&self) -> &str {
        self.providers
            .bittrex
            .as_ref()
            .map_or(BITTREX_BASE_URL, |p| &p.base_url)
    }

    pub fn binance_base_url(&self) -> &str {
        self.providers
            .binance
            .as_ref()
            .map_or(BINANCE_BASE_URL, |p| &p.base_url)
    }

    /// Tiingo token from the config file, else from `TIINGO_API_TOKEN`.
    pub fn tiingo_token(&self) -> Result<String> {
        if let Some(token) = self
            .providers
            .tiingo
            .as_ref()
            .and_then(|p| p.token.clone())
            .filter(|t| !t.is_empty())
        {
            return Ok(token);
        }
        std::env::var(TIINGO_TOKEN_ENV)
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "Tiingo token not configured: set providers.tiingo.token or {}",
                    TIINGO_TOKEN_ENV
                )
            })
    }

    pub fn delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.delay_ms)
    }
}
