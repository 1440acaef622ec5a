use crate::core::Source;
use crate::core::config::AppConfig;
use crate::providers;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Writes the tradeable symbols of `source`, one per line.
pub async fn run(source: Source, output: Option<&Path>, config: &AppConfig) -> Result<()> {
    let provider = providers::market_provider(source, config)?;
    let symbols = provider
        .list_symbols()
        .await
        .with_context(|| format!("Failed to list {source} markets"))?;
    info!(count = symbols.len(), %source, "Listed market symbols");

    let mut content = symbols.join("\n");
    content.push('\n');
    match output.filter(|p| p.as_os_str() != "-") {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write output file: {}", path.display())),
        None => {
            print!("{content}");
            Ok(())
        }
    }
}
