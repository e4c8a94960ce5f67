//! commerce-agent CLI
//!
//! Serves the endpoint lookup and request tools over stdio (default) or HTTP,
//! or answers a single `--find` / `--docs` query and exits. `--save-settings`
//! persists the effective configuration instead.

use async_trait::async_trait;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use agent_tools::{AgentServer, EndpointResolver, RequestExecutor, ServerMode, SettingsManager, ToolCatalog};
use openapi_reducer::{MatchPrompt, OpenAiMatcher, SpecError, SpecResult, TextMatcher};

/// commerce-agent - resolve actions to commerce API endpoints and call them
#[derive(Parser, Debug)]
#[command(name = "commerce-agent")]
#[command(version)]
#[command(about = "Resolve natural-language actions to OpenAPI endpoints and execute them")]
struct Args {
    /// Run in stdio mode (default)
    #[arg(long)]
    stdio: bool,

    /// Run in HTTP mode
    #[arg(long)]
    http: bool,

    /// Port for HTTP server
    #[arg(long, default_value = "3000")]
    port: u16,

    /// Directory holding settings.json
    #[arg(long, env = "COMMERCE_AGENT_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// OpenAPI document URL or path (overrides settings)
    #[arg(long, env = "COMMERCE_AGENT_SPEC_URL")]
    spec_url: Option<String>,

    /// Commerce API base URL (overrides settings)
    #[arg(long, env = "COMMERCE_AGENT_BASE_URL")]
    base_url: Option<String>,

    /// Print the endpoint matching this action and exit
    #[arg(long, value_name = "ACTION", conflicts_with = "docs")]
    find: Option<String>,

    /// Print docs for the METHOD /path strings in this text and exit
    #[arg(long, value_name = "QUERY")]
    docs: Option<String>,

    /// Write the effective settings, overrides included, to settings.json and exit
    #[arg(long, conflicts_with_all = ["find", "docs"])]
    save_settings: bool,
}

/// Stands in when no matcher API key is configured
struct UnconfiguredMatcher(String);

#[async_trait]
impl TextMatcher for UnconfiguredMatcher {
    async fn complete(&self, _prompt: &MatchPrompt) -> SpecResult<String> {
        Err(SpecError::MatcherError(self.0.clone()))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let one_shot = args.find.is_some() || args.docs.is_some() || args.save_settings;
    let stdio = args.stdio || (!one_shot && !args.http);

    // stdout carries the protocol in stdio mode
    if !stdio {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive(tracing::Level::INFO.into()),
            )
            .init();
    }

    let config_dir = match args.config_dir {
        Some(dir) => dir,
        None => SettingsManager::default_dir()?,
    };
    let mut manager = SettingsManager::new(&config_dir);
    if let Some(spec_url) = args.spec_url {
        manager.get_mut().spec_url = spec_url;
    }
    if let Some(base_url) = args.base_url {
        manager.get_mut().base_url = base_url;
    }

    if args.save_settings {
        manager.save().await?;
        println!("{}", manager.settings_file().display());
        return Ok(());
    }

    let settings = manager.into_settings();

    let matcher: Arc<dyn TextMatcher> = match settings.matcher.openai_config() {
        Ok(config) => Arc::new(OpenAiMatcher::new(config)?),
        Err(e) => {
            warn!("Endpoint matching disabled: {}", e);
            Arc::new(UnconfiguredMatcher(e.to_string()))
        }
    };

    let resolver = Arc::new(EndpointResolver::new(&settings, matcher)?);

    if let Some(action) = args.find {
        println!("{}", resolver.find_matching_endpoint(&action).await?);
        return Ok(());
    }
    if let Some(query) = args.docs {
        print!("{}", resolver.get_spec_for_endpoint(&query).await?);
        return Ok(());
    }

    let executor = Arc::new(RequestExecutor::new(&settings)?);
    let catalog = Arc::new(ToolCatalog::new(resolver, executor));

    let mode = if args.http && !args.stdio {
        ServerMode::Http { port: args.port }
    } else {
        ServerMode::Stdio
    };

    if !stdio {
        info!("Serving tools for {} against {}", settings.spec_url, settings.base_url);
    }

    AgentServer::new(catalog).with_mode(mode).run().await?;

    Ok(())
}
