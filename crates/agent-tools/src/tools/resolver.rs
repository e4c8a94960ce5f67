//! Endpoint lookup tools

use openapi_reducer::{
    EndpointMatcher, ExtractOptions, ReduceOptions, ReducedSpec, SpecCache, SpecExtractor,
    SpecLoader, SpecSource, TextMatcher,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::Settings;
use crate::error::Result;

/// Resolves actions and `METHOD /path` queries against the configured spec
pub struct EndpointResolver {
    source: SpecSource,
    loader: SpecLoader,
    cache: SpecCache,
    matcher: EndpointMatcher<Arc<dyn TextMatcher>>,
    reduce_options: ReduceOptions,
    extract_options: ExtractOptions,
}

impl EndpointResolver {
    /// Create a resolver from settings and a matcher capability
    pub fn new(settings: &Settings, matcher: Arc<dyn TextMatcher>) -> Result<Self> {
        Ok(Self {
            source: settings.spec_source()?,
            loader: SpecLoader::with_timeout(Duration::from_secs(settings.fetch_timeout_secs))?,
            cache: SpecCache::new(settings.cache_ttl()),
            matcher: EndpointMatcher::new(matcher),
            reduce_options: settings.reduce_options(),
            extract_options: settings.extract_options(),
        })
    }

    /// Load and reduce the OpenAPI document (or reuse a cached copy)
    pub async fn reduced_spec(&self) -> Result<Arc<ReducedSpec>> {
        Ok(self
            .cache
            .get_or_load(&self.source, &self.loader, &self.reduce_options)
            .await?)
    }

    /// Best matching `"METHOD /path"` for a natural-language action
    pub async fn find_matching_endpoint(&self, action: &str) -> Result<String> {
        let spec = self.reduced_spec().await?;
        Ok(self.matcher.find(action, &spec.endpoints).await?)
    }

    /// Rendered docs for every `METHOD /path` found in `query`
    pub async fn get_spec_for_endpoint(&self, query: &str) -> Result<String> {
        let spec = self.reduced_spec().await?;
        Ok(SpecExtractor::extract(query, &spec.endpoints, &self.extract_options)?)
    }

    /// Find the endpoint for `action`, then return its docs
    pub async fn get_api_spec(&self, action: &str) -> Result<String> {
        let endpoint = self.find_matching_endpoint(action).await?;
        debug!("Resolving docs for matched endpoint: {}", endpoint.trim());
        self.get_spec_for_endpoint(&endpoint).await
    }

    /// Drop any cached copy of the reduced document
    pub async fn refresh(&self) {
        self.cache.invalidate(&self.source).await;
    }
}
