use anyhow::{Result, anyhow};
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "marketquote/0.1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

/// Joins `base_url` and `path` and appends `params` as an encoded query string.
pub fn build_url(base_url: &str, path: &str, params: &[(&str, String)]) -> Result<Url> {
    let raw = format!("{}{}", base_url.trim_end_matches('/'), path);
    let parsed = if params.is_empty() {
        Url::parse(&raw)
    } else {
        Url::parse_with_params(&raw, params)
    };
    parsed.map_err(|e| anyhow!("Invalid URL {}: {}", raw, e))
}

/// GETs `url` and returns the body, failing on any non-2xx status.
///
/// `subject` names what is being fetched (a symbol, a market list) in errors.
pub async fn get_text(client: &reqwest::Client, url: Url, subject: &str) -> Result<String> {
    debug!("Requesting {}", url);
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| anyhow!("Request error: {} for {} URL: {}", e, subject, url))?;

    let status = response.status();
    let text = response.text().await?;
    debug!(%status, bytes = text.len(), "Received response");

    if !status.is_success() {
        let detail = text.trim();
        return if detail.is_empty() {
            Err(anyhow!("HTTP error: {} for {}", status, subject))
        } else {
            Err(anyhow!("HTTP error: {} for {}: {}", status, subject, detail))
        };
    }
    Ok(text)
}

pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: Url,
    subject: &str,
) -> Result<T> {
    let text = get_text(client, url, subject).await?;
    serde_json::from_str(&text)
        .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", subject, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_build_url_encodes_params() {
        let url = build_url(
            "http://localhost:1234/",
            "/a/b",
            &[("tickers", "btcusd".into()), ("events", "div|split".into())],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:1234/a/b?tickers=btcusd&events=div%7Csplit"
        );
    }

    #[tokio::test]
    async fn test_get_json_reports_status_and_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/x"))
            .and(query_param("k", "v"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&mock_server)
            .await;

        let client = http_client().unwrap();
        let url = build_url(&mock_server.uri(), "/x", &[("k", "v".into())]).unwrap();
        let err = get_json::<serde_json::Value>(&client, url, "AAPL")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "HTTP error: 404 Not Found for AAPL: not here");
    }

    #[tokio::test]
    async fn test_get_json_reports_parse_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/x"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&mock_server)
            .await;

        let client = http_client().unwrap();
        let url = build_url(&mock_server.uri(), "/x", &[]).unwrap();
        let err = get_json::<serde_json::Value>(&client, url, "AAPL")
            .await
            .unwrap_err();
        assert!(
            err.to_string()
                .starts_with("Failed to parse JSON response for AAPL"),
            "{err}"
        );
    }
}
