//! Agent settings
//!
//! Spec source, API base URL, matcher model and resolution options live in a
//! plain JSON file. Every field has a default, so a missing file or a partial
//! file is fine.

use openapi_reducer::{ExtractOptions, MatchMode, OpenAiConfig, ReduceOptions, SpecSource};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{AgentError, Result};

/// Default OpenAPI document for the Product Experience Manager API
pub const DEFAULT_SPEC_URL: &str =
    "https://raw.githubusercontent.com/elasticpath/elasticpath-dev/main/openapispecs/pim/pim.yaml";

/// Default commerce API root
pub const DEFAULT_BASE_URL: &str = "https://useast.api.elasticpath.com";

/// Settings for the external matcher model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatcherSettings {
    /// OpenAI-compatible API root
    pub api_base: String,
    /// Model name
    pub model: String,
    pub temperature: f32,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

impl MatcherSettings {
    /// Build the client config, reading the key from `api_key_env`
    pub fn openai_config(&self) -> Result<OpenAiConfig> {
        let api_key = std::env::var(&self.api_key_env).map_err(|_| {
            AgentError::Config(format!("{} is not set", self.api_key_env))
        })?;

        Ok(OpenAiConfig {
            api_base: self.api_base.clone(),
            api_key,
            model: self.model.clone(),
            temperature: self.temperature,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

/// Agent settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Settings file version
    pub version: u32,
    /// OpenAPI document location (URL or local path)
    pub spec_url: String,
    /// Root URL the execution tools call
    pub base_url: String,
    /// Matcher model settings
    pub matcher: MatcherSettings,
    /// How long a reduced spec is reused, in seconds (0 = reload on every call)
    pub cache_ttl_secs: u64,
    /// Path template comparison mode
    pub match_mode: MatchMode,
    /// Fail queries that match more than one endpoint
    pub reject_ambiguous: bool,
    /// Inline `$ref` pointers in endpoint docs
    pub dereference: bool,
    /// Spec fetch timeout in seconds
    pub fetch_timeout_secs: u64,
    /// Timeout for execution tool requests in seconds
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: 1,
            spec_url: DEFAULT_SPEC_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            matcher: MatcherSettings::default(),
            cache_ttl_secs: 0,
            match_mode: MatchMode::Prefix,
            reject_ambiguous: false,
            dereference: false,
            fetch_timeout_secs: 30,
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spec_source(&self) -> Result<SpecSource> {
        Ok(SpecSource::parse(&self.spec_url)?)
    }

    /// `None` when caching is off
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }

    pub fn reduce_options(&self) -> ReduceOptions {
        ReduceOptions {
            dereference: self.dereference,
        }
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            mode: self.match_mode,
            reject_ambiguous: self.reject_ambiguous,
        }
    }
}

/// Settings manager
pub struct SettingsManager {
    settings_file: PathBuf,
    settings: Settings,
}

impl SettingsManager {
    /// Load settings from `config_dir/settings.json`, falling back to defaults
    pub fn new(config_dir: &Path) -> Self {
        let settings_file = config_dir.join("settings.json");
        let settings = Self::load_from_file(&settings_file).unwrap_or_else(|e| {
            warn!("Ignoring unreadable settings file {:?}: {}", settings_file, e);
            Settings::new()
        });

        Self {
            settings_file,
            settings,
        }
    }

    /// Platform config directory, e.g. `~/.config/commerce-agent`
    pub fn default_dir() -> Result<PathBuf> {
        directories::ProjectDirs::from("com", "commerce-agent", "commerce-agent")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| AgentError::Config("no home directory found".to_string()))
    }

    /// Load settings from file
    fn load_from_file(path: &Path) -> Result<Settings> {
        if !path.exists() {
            debug!("No settings file found, using defaults");
            return Ok(Settings::new());
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&contents)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub async fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.settings)?;

        if let Some(parent) = self.settings_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write atomically using temp file
        let temp_path = self.settings_file.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &self.settings_file).await?;

        debug!("Saved settings to {:?}", self.settings_file);
        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Get mutable settings
    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Take the settings, dropping the manager
    pub fn into_settings(self) -> Settings {
        self.settings
    }

    /// Path of the backing `settings.json`
    pub fn settings_file(&self) -> &Path {
        &self.settings_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_settings_default() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path());

        let settings = manager.get();
        assert_eq!(settings.spec_url, DEFAULT_SPEC_URL);
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.matcher.model, "gpt-4o-mini");
        assert_eq!(settings.match_mode, MatchMode::Prefix);
        assert!(settings.cache_ttl().is_none());
    }

    #[tokio::test]
    async fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();

        {
            let mut manager = SettingsManager::new(temp_dir.path());
            manager.get_mut().base_url = "https://euwest.api.elasticpath.com".to_string();
            manager.get_mut().cache_ttl_secs = 600;
            manager.get_mut().match_mode = MatchMode::Exact;
            manager.save().await.unwrap();
        }

        {
            let manager = SettingsManager::new(temp_dir.path());
            assert_eq!(manager.settings_file(), temp_dir.path().join("settings.json"));
            assert_eq!(manager.get().base_url, "https://euwest.api.elasticpath.com");
            assert_eq!(manager.get().cache_ttl(), Some(Duration::from_secs(600)));
            assert_eq!(manager.get().extract_options().mode, MatchMode::Exact);
        }
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("settings.json"),
            r#"{"specUrl": "./specs/catalog_view.yaml", "matchMode": "exact"}"#,
        )
        .unwrap();

        let settings = SettingsManager::new(temp_dir.path()).into_settings();
        assert_eq!(settings.spec_url, "./specs/catalog_view.yaml");
        assert_eq!(settings.match_mode, MatchMode::Exact);
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert!(matches!(settings.spec_source().unwrap(), SpecSource::File(_)));
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("settings.json"), "{not json").unwrap();

        let manager = SettingsManager::new(temp_dir.path());
        assert_eq!(manager.get(), &Settings::new());
    }

    #[test]
    fn test_missing_api_key_env() {
        let matcher = MatcherSettings {
            api_key_env: "COMMERCE_AGENT_TEST_UNSET_KEY".to_string(),
            ..MatcherSettings::default()
        };
        assert!(matches!(matcher.openai_config(), Err(AgentError::Config(_))));
    }
}
