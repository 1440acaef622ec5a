use super::ui;
use crate::core::config::AppConfig;
use crate::core::dates::{parse_date_string, years_before};
use crate::core::download::{DownloadSummary, download_quotes};
use crate::core::{FetchRequest, OutputFormat, Period, Source};
use crate::providers;
use anyhow::{Context, Result, bail};
use comfy_table::Cell;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct DownloadArgs {
    pub symbols: Vec<String>,
    pub infile: Option<PathBuf>,
    pub source: Source,
    pub start: Option<String>,
    pub end: Option<String>,
    pub years: u32,
    pub period: Period,
    pub format: OutputFormat,
    pub adjust: bool,
    pub all: bool,
    pub output: Option<PathBuf>,
}

/// Reads one symbol per line, skipping blank lines and `#` comments.
pub fn read_symbols_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read symbols file: {}", path.as_ref().display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn resolve_request(args: &DownloadArgs) -> Result<FetchRequest> {
    let end = parse_date_string(args.end.as_deref().unwrap_or(""))?;
    let start = match args.start.as_deref() {
        Some(start) => parse_date_string(start)?,
        None => years_before(end, args.years)?,
    };
    if start >= end {
        bail!("Start date {} is not before end date {}", start, end);
    }
    Ok(FetchRequest {
        start,
        end,
        period: args.period,
        adjust: args.adjust,
    })
}

fn is_stdout(path: Option<&Path>) -> bool {
    path.is_none_or(|p| p.as_os_str() == "-")
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) if !is_stdout(Some(path)) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        _ => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn file_name(symbol: &str, format: OutputFormat) -> String {
    let stem: String = symbol
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '-' } else { c })
        .collect();
    format!("{stem}.{}", format.extension())
}

fn write_quotes(args: &DownloadArgs, requested: usize, summary: &DownloadSummary) -> Result<()> {
    if args.all {
        let dir = args
            .output
            .as_deref()
            .filter(|p| !is_stdout(Some(*p)))
            .unwrap_or(Path::new("."));
        for quote in summary.quotes.iter() {
            let path = dir.join(file_name(&quote.symbol, args.format));
            write_output(Some(path.as_path()), &quote.render(args.format)?)?;
        }
        return Ok(());
    }

    let content = match summary.quotes.first() {
        Some(quote) if requested == 1 => quote.render(args.format)?,
        _ => summary.quotes.render(args.format)?,
    };
    write_output(args.output.as_deref(), &content)
}

fn summary_table(summary: &DownloadSummary) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Bars"),
        ui::header_cell("From"),
        ui::header_cell("To"),
    ]);
    for quote in summary.quotes.iter() {
        let date_cell = |d: Option<chrono::DateTime<chrono::Utc>>| {
            d.map_or_else(|| ui::na_cell(false), |d| Cell::new(d.format("%Y-%m-%d %H:%M")))
        };
        table.add_row(vec![
            Cell::new(&quote.symbol),
            ui::right_cell(quote.len()),
            date_cell(quote.first_date()),
            date_cell(quote.last_date()),
        ]);
    }
    for (symbol, _) in &summary.failures {
        table.add_row(vec![
            Cell::new(symbol),
            ui::na_cell(true),
            ui::na_cell(true),
            ui::na_cell(true),
        ]);
    }

    let mut output = format!(
        "{}\n\n{}\n{}",
        ui::style_text("Download summary", ui::StyleType::Title),
        table,
        ui::style_text(
            &format!(
                "Downloaded {} of {} symbols",
                summary.quotes.len(),
                summary.total()
            ),
            ui::StyleType::Success
        )
    );
    for (symbol, error) in &summary.failures {
        output.push_str(&format!(
            "\n{} {}",
            ui::style_text(symbol, ui::StyleType::Error),
            ui::style_text(error, ui::StyleType::Subtle)
        ));
    }
    output
}

pub async fn run(args: &DownloadArgs, config: &AppConfig) -> Result<()> {
    let mut symbols = args.symbols.clone();
    if let Some(infile) = &args.infile {
        symbols.extend(read_symbols_file(infile)?);
    }
    if symbols.is_empty() {
        bail!("No symbols given");
    }

    let request = resolve_request(args)?;
    debug!(?request, source = %args.source, "Resolved download request");
    let provider = providers::quote_provider(args.source, config)?;

    let interactive = ui::is_interactive();
    let pb = (interactive && symbols.len() > 1).then(|| ui::new_progress_bar(symbols.len() as u64));
    let summary = download_quotes(
        provider.as_ref(),
        &symbols,
        &request,
        config.delay(),
        |symbol, _| {
            if let Some(pb) = &pb {
                pb.set_message(symbol.to_string());
                pb.inc(1);
            }
        },
    )
    .await;
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    if summary.quotes.is_empty() {
        bail!(
            "No quotes downloaded from {} ({} symbols failed)",
            args.source,
            summary.failures.len()
        );
    }

    write_quotes(args, symbols.len(), &summary)?;

    if interactive && !is_stdout(args.output.as_deref()) {
        eprintln!("{}", summary_table(&summary));
    } else if !summary.failures.is_empty() {
        eprintln!(
            "{}",
            ui::style_text(
                &format!(
                    "{} of {} symbols failed",
                    summary.failures.len(),
                    summary.total()
                ),
                ui::StyleType::Error
            )
        );
    }
    Ok(())
}
