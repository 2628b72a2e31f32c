//! Pattern search against the catalog API.
//!
//! Stage 1 of the build. One authenticated GET to `patterns/search.json`; the
//! response body is kept as-is and written to `patterns.json` for the
//! generate stage.

use crate::config::{ApiCredentials, ConfigError, SearchConfig};
use crate::types::SearchResponse;
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const SEARCH_ENDPOINT: &str = "patterns/search.json";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid API URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to fetch data: API responded {0}")]
    Status(StatusCode),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Build the search URL: `{base}patterns/search.json?{params}`.
///
/// The base is joined by plain concatenation, so it must end in `/`.
pub fn search_url(base_url: &str, search: &SearchConfig) -> Result<Url, FetchError> {
    let url = format!("{base_url}{SEARCH_ENDPOINT}");
    Url::parse_with_params(&url, search.query_pairs()).map_err(|e| FetchError::InvalidUrl {
        url,
        reason: e.to_string(),
    })
}

/// Client for the single search request. Build failures are logged like request failures.
fn http_client() -> Result<Client, FetchError> {
    let client = Client::builder()
        .user_agent(concat!("knit-grid/", env!("CARGO_PKG_VERSION")))
        .build()
        .inspect_err(|e| tracing::error!(error = %e, "error building HTTP client"))?;
    Ok(client)
}

/// Perform the search and decode the response.
pub fn fetch_patterns(
    credentials: &ApiCredentials,
    search: &SearchConfig,
) -> Result<SearchResponse, FetchError> {
    let url = search_url(&credentials.base_url, search)?;
    tracing::info!(%url, "fetching patterns");

    let client = http_client()?;

    let response = client
        .get(url)
        .basic_auth(&credentials.username, Some(&credentials.password))
        .send()
        .inspect_err(|e| tracing::error!(error = %e, "error fetching patterns"))?;

    let status = response.status();
    if !status.is_success() {
        tracing::error!(%status, "pattern search rejected");
        return Err(FetchError::Status(status));
    }

    let body: SearchResponse = response
        .json()
        .inspect_err(|e| tracing::error!(error = %e, "error decoding pattern search response"))?;
    tracing::info!(count = body.patterns.len(), "fetched patterns");
    Ok(body)
}

/// Write the fetched response where the generate stage expects it.
pub fn write_patterns(path: &Path, response: &SearchResponse) -> Result<(), FetchError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(response)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PatternRecord;
    use tempfile::TempDir;

    #[test]
    fn search_url_has_endpoint_and_stock_params() {
        let url = search_url("https://api.example.com/", &SearchConfig::default()).unwrap();
        assert_eq!(url.path(), "/patterns/search.json");
        let query = url.query().unwrap();
        assert!(query.contains("craft=knitting"));
        assert!(query.contains("query=sweater"));
        assert!(query.contains("sort=favorites"));
        assert!(query.contains("language=en"));
        assert!(query.contains("photo=yes"));
        assert!(query.contains("availability=ravelry%7Cinprint%7Conline%7Cfree"));
    }

    #[test]
    fn search_url_keeps_base_path() {
        let url = search_url("https://api.example.com/v2/", &SearchConfig::default()).unwrap();
        assert_eq!(url.path(), "/v2/patterns/search.json");
    }

    #[test]
    fn search_url_round_trips_params() {
        let mut search = SearchConfig::default();
        search.query = "fair isle".into();
        let url = search_url("https://api.example.com/", &search).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("query".to_string(), "fair isle".to_string())));
        assert_eq!(pairs.len(), 6);
    }

    #[test]
    fn invalid_base_url_is_error() {
        let err = search_url("not a url/", &SearchConfig::default()).unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[test]
    fn http_client_builds_with_default_tls() {
        assert!(http_client().is_ok());
    }

    #[test]
    fn client_build_error_converts_to_http_error() {
        // Any reqwest::Error takes the same path as a builder failure.
        let err = Client::new().get("not a url").build().unwrap_err();
        let fetch_err: FetchError = err.into();
        assert!(matches!(fetch_err, FetchError::Http(_)));
        assert!(fetch_err.to_string().starts_with("Request failed"));
    }

    #[test]
    fn write_patterns_creates_parent_dir() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/patterns.json");
        let response = SearchResponse {
            patterns: vec![PatternRecord {
                id: 7,
                name: "Flax".into(),
                ..Default::default()
            }],
        };
        write_patterns(&path, &response).unwrap();
        let read: SearchResponse =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read.patterns[0].id, 7);
    }
}
