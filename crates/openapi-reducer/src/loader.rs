//! Fetch and parse raw OpenAPI documents

use crate::error::{SpecError, SpecResult};
use crate::types::RawSpec;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Default timeout for spec fetches
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where an OpenAPI document is read from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpecSource {
    /// Remote document fetched with a single GET
    Url(Url),
    /// Local file
    File(PathBuf),
}

impl SpecSource {
    /// Parse a location string. `http(s)://` selects a remote source,
    /// `file://` URLs and bare paths select a local file.
    pub fn parse(location: &str) -> SpecResult<Self> {
        let location = location.trim();
        if location.is_empty() {
            return Err(SpecError::InvalidSource("empty location".to_string()));
        }

        if location.starts_with("http://") || location.starts_with("https://") {
            let url = Url::parse(location)
                .map_err(|e| SpecError::InvalidSource(format!("{}: {}", location, e)))?;
            return Ok(SpecSource::Url(url));
        }

        if location.starts_with("file://") {
            let path = Url::parse(location)
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .ok_or_else(|| SpecError::InvalidSource(location.to_string()))?;
            return Ok(SpecSource::File(path));
        }

        Ok(SpecSource::File(PathBuf::from(location)))
    }
}

impl std::fmt::Display for SpecSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecSource::Url(url) => write!(f, "{}", url),
            SpecSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Loads raw OpenAPI documents from a [`SpecSource`]
#[derive(Debug, Clone)]
pub struct SpecLoader {
    client: reqwest::Client,
}

impl SpecLoader {
    /// Create a loader with the default fetch timeout
    pub fn new() -> SpecResult<Self> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    /// Create a loader whose HTTP client gives up after `timeout`
    pub fn with_timeout(timeout: Duration) -> SpecResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SpecError::HttpError(e.to_string()))?;

        Ok(Self { client })
    }

    /// Load and parse the document behind `source`
    pub async fn load(&self, source: &SpecSource) -> SpecResult<RawSpec> {
        let content = match source {
            SpecSource::Url(url) => self.fetch(url).await?,
            SpecSource::File(path) => {
                info!("Reading OpenAPI spec from: {}", path.display());
                tokio::fs::read_to_string(path).await?
            }
        };

        debug!("Loaded {} bytes from {}", content.len(), source);
        Self::parse(&content)
    }

    /// GET the document body. Any non-success status is a fetch error carrying the body.
    async fn fetch(&self, url: &Url) -> SpecResult<String> {
        info!("Fetching OpenAPI spec from: {}", url);

        let response = self
            .client
            .get(url.clone())
            .header("Accept", "application/yaml, application/json, text/yaml")
            .send()
            .await
            .map_err(|e| SpecError::FetchError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SpecError::FetchError(e.to_string()))?;

        if !status.is_success() {
            return Err(SpecError::FetchError(format!(
                "HTTP {} from {}: {}",
                status, url, body
            )));
        }

        Ok(body)
    }

    /// Parse a YAML (or JSON) document into a [`RawSpec`]
    pub fn parse(content: &str) -> SpecResult<RawSpec> {
        let raw: RawSpec = serde_yaml::from_str(content)?;

        let paths = raw
            .as_mapping()
            .ok_or_else(|| SpecError::InvalidFormat("document root is not a mapping".to_string()))?
            .get("paths")
            .ok_or_else(|| SpecError::InvalidFormat("missing `paths`".to_string()))?;

        if !paths.is_mapping() {
            return Err(SpecError::InvalidFormat("`paths` is not a mapping".to_string()));
        }

        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_SPEC: &str = r#"
openapi: "3.0.0"
info:
  title: Catalog
  version: "1.0.0"
paths:
  /pcm/products:
    get:
      description: Get all products
"#;

    #[test]
    fn test_source_parse() {
        assert!(matches!(
            SpecSource::parse("https://example.com/pim.yaml").unwrap(),
            SpecSource::Url(_)
        ));
        assert_eq!(
            SpecSource::parse("./specs/pim.yaml").unwrap(),
            SpecSource::File(PathBuf::from("./specs/pim.yaml"))
        );
        assert_eq!(
            SpecSource::parse("file:///tmp/pim.yaml").unwrap(),
            SpecSource::File(PathBuf::from("/tmp/pim.yaml"))
        );
        assert!(SpecSource::parse("  ").is_err());
    }

    #[test]
    fn test_parse_yaml_and_json() {
        let raw = SpecLoader::parse(MINIMAL_SPEC).unwrap();
        assert!(raw["paths"]["/pcm/products"]["get"].is_mapping());

        let raw = SpecLoader::parse(r#"{"openapi": "3.0.0", "paths": {"/a": {"get": {}}}}"#).unwrap();
        assert!(raw["paths"]["/a"].is_mapping());
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = SpecLoader::parse("paths: [unclosed");
        assert!(matches!(result, Err(SpecError::ParseError(_))));
    }

    #[test]
    fn test_parse_requires_paths() {
        let result = SpecLoader::parse("openapi: 3.0.0\ninfo:\n  title: x\n");
        assert!(matches!(result, Err(SpecError::InvalidFormat(_))));

        let result = SpecLoader::parse("- just\n- a list\n");
        assert!(matches!(result, Err(SpecError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/openapispecs/pim/pim.yaml")
            .with_status(200)
            .with_header("content-type", "text/yaml")
            .with_body(MINIMAL_SPEC)
            .create_async()
            .await;

        let loader = SpecLoader::new().unwrap();
        let source = SpecSource::parse(&format!("{}/openapispecs/pim/pim.yaml", server.url())).unwrap();
        let raw = loader.load(&source).await.unwrap();

        assert_eq!(raw["info"]["title"].as_str(), Some("Catalog"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_non_success_includes_body() {
        for (status, body) in [(404, "404: Not Found"), (500, "upstream exploded")] {
            let mut server = mockito::Server::new_async().await;
            let mock = server
                .mock("GET", "/pim.yaml")
                .with_status(status)
                .with_body(body)
                .create_async()
                .await;

            let loader = SpecLoader::new().unwrap();
            let source = SpecSource::parse(&format!("{}/pim.yaml", server.url())).unwrap();

            match loader.load(&source).await {
                Err(SpecError::FetchError(message)) => {
                    assert!(message.contains(body), "missing body in: {}", message);
                    assert!(message.contains(&status.to_string()));
                }
                other => panic!("expected FetchError, got {:?}", other),
            }

            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_fetch_invalid_yaml_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/broken.yaml")
            .with_status(200)
            .with_body("paths: {unclosed")
            .create_async()
            .await;

        let loader = SpecLoader::new().unwrap();
        let source = SpecSource::parse(&format!("{}/broken.yaml", server.url())).unwrap();
        let result = loader.load(&source).await;

        assert!(matches!(result, Err(SpecError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL_SPEC.as_bytes()).unwrap();

        let loader = SpecLoader::new().unwrap();
        let raw = loader
            .load(&SpecSource::File(file.path().to_path_buf()))
            .await
            .unwrap();

        assert!(raw["paths"].is_mapping());
    }
}
