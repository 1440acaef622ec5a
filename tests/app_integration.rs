use std::fs;
use std::path::{Path, PathBuf};

use marketquote::core::{OutputFormat, Period, Quote, Quotes, Source};
use marketquote::{AppCommand, DownloadArgs};

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const AAPL_CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": { "currency": "USD", "gmtoffset": -18000 },
                "timestamp": [1704205800, 1704292200],
                "indicators": {
                    "quote": [{
                        "open":   [187.15, 184.22],
                        "high":   [188.44, 185.88],
                        "low":    [183.89, 183.43],
                        "close":  [185.64, 184.25],
                        "volume": [82488700, 58414500]
                    }],
                    "adjclose": [{ "adjclose": [185.64, 184.25] }]
                }
            }],
            "error": null
        }
    }"#;

    pub async fn create_mock_server(symbol: &str, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        mount_chart(&mock_server, symbol, mock_response).await;
        mock_server
    }

    pub async fn mount_chart(mock_server: &MockServer, symbol: &str, mock_response: &str) {
        let url_path = format!("/v8/finance/chart/{symbol}");

        Mock::given(method("GET"))
            .and(path(&url_path))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(mock_server)
            .await;
    }

    pub async fn create_binance_mock_server(mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v3/exchangeInfo"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }
}

fn write_config(dir: &Path, providers: &str) -> PathBuf {
    let config_path = dir.join("config.yaml");
    let config_content = format!("providers:\n{providers}\ndelay_ms: 0\n");
    fs::write(&config_path, config_content).expect("Failed to write config file");
    config_path
}

fn download_args(symbols: &[&str], format: OutputFormat, output: PathBuf) -> DownloadArgs {
    DownloadArgs {
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
        infile: None,
        source: Source::Yahoo,
        start: Some("2024-01-01".to_string()),
        end: Some("2024-01-31".to_string()),
        years: 5,
        period: Period::Daily,
        format,
        adjust: true,
        all: false,
        output: Some(output),
    }
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_single_symbol_csv() {
    let mock_server = test_utils::create_mock_server("AAPL", test_utils::AAPL_CHART).await;
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        temp_dir.path(),
        &format!("  yahoo:\n    base_url: {}", mock_server.uri()),
    );
    let output = temp_dir.path().join("aapl.csv");

    let result = marketquote::run_command(
        AppCommand::Download(download_args(&["AAPL"], OutputFormat::Csv, output.clone())),
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Main function failed with: {:?}",
        result.err()
    );

    let csv = fs::read_to_string(&output).unwrap();
    assert_eq!(
        csv,
        "datetime,open,high,low,close,volume\n\
         2024-01-02 00:00,187.15,188.44,183.89,185.64,82488700.00\n\
         2024-01-03 00:00,184.22,185.88,183.43,184.25,58414500.00\n"
    );
    let parsed = Quote::from_csv("AAPL", &csv).unwrap();
    assert_eq!(parsed.len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_multi_symbol_json_skips_failures() {
    let mock_server = test_utils::create_mock_server("AAPL", test_utils::AAPL_CHART).await;
    test_utils::mount_chart(&mock_server, "MSFT", test_utils::AAPL_CHART).await;
    // No mock for NOPE: wiremock answers 404.

    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        temp_dir.path(),
        &format!("  yahoo:\n    base_url: {}", mock_server.uri()),
    );
    let output = temp_dir.path().join("quotes.json");

    marketquote::run_command(
        AppCommand::Download(download_args(
            &["AAPL", "NOPE", "MSFT"],
            OutputFormat::Json,
            output.clone(),
        )),
        Some(config_path.to_str().unwrap()),
    )
    .await
    .expect("Download should succeed when some symbols fail");

    let quotes = Quotes::from_json(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(
        quotes.iter().map(|q| q.symbol.as_str()).collect::<Vec<_>>(),
        vec!["AAPL", "MSFT"]
    );
    assert_eq!(quotes[1].close, vec![185.64, 184.25]);
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_all_writes_one_file_per_symbol() {
    let mock_server = test_utils::create_mock_server("AAPL", test_utils::AAPL_CHART).await;
    test_utils::mount_chart(&mock_server, "SPY", test_utils::AAPL_CHART).await;

    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        temp_dir.path(),
        &format!("  yahoo:\n    base_url: {}", mock_server.uri()),
    );
    let out_dir = temp_dir.path().join("out");
    let mut args = download_args(&["AAPL", "SPY"], OutputFormat::Highstock, out_dir.clone());
    args.all = true;

    marketquote::run_command(
        AppCommand::Download(args),
        Some(config_path.to_str().unwrap()),
    )
    .await
    .expect("Download failed");

    let spy = fs::read_to_string(out_dir.join("SPY.json")).unwrap();
    assert!(spy.starts_with("[\n[1704153600000,187.15,"), "{spy}");
    assert!(out_dir.join("AAPL.json").exists());
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_all_symbols_fail() {
    let mock_server = wiremock::MockServer::start().await;
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        temp_dir.path(),
        &format!("  yahoo:\n    base_url: {}", mock_server.uri()),
    );
    let output = temp_dir.path().join("none.csv");

    let result = marketquote::run_command(
        AppCommand::Download(download_args(&["NOPE"], OutputFormat::Csv, output.clone())),
        Some(config_path.to_str().unwrap()),
    )
    .await;

    assert_eq!(
        result.unwrap_err().to_string(),
        "No quotes downloaded from yahoo (1 symbols failed)"
    );
    assert!(!output.exists());
}

#[test_log::test(tokio::test)]
async fn test_markets_command_writes_symbol_list() {
    let mock_server = test_utils::create_binance_mock_server(
        r#"{"symbols":[{"symbol":"ETHBTC"},{"symbol":"BNBBTC"}]}"#,
    )
    .await;
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        temp_dir.path(),
        &format!("  binance:\n    base_url: {}", mock_server.uri()),
    );
    let output = temp_dir.path().join("binance.txt");

    marketquote::run_command(
        AppCommand::Markets {
            source: Source::Binance,
            output: Some(output.clone()),
        },
        Some(config_path.to_str().unwrap()),
    )
    .await
    .expect("Market listing failed");

    assert_eq!(fs::read_to_string(&output).unwrap(), "BNBBTC\nETHBTC\n");
}
