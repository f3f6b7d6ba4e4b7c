// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

mod challenge_solver;
mod command_line;
mod crawler_framework;
mod direct_http;
mod headless_browser_a;
mod headless_browser_b;
mod proxy_gateway;
mod render_api;
mod static_parser;

pub use challenge_solver::ChallengeSolverClient;
pub use command_line::CommandLineClient;
pub use crawler_framework::CrawlerFrameworkClient;
pub use direct_http::DirectHttpClient;
pub use headless_browser_a::HeadlessBrowserAClient;
pub use headless_browser_b::HeadlessBrowserBClient;
pub use proxy_gateway::ProxyGatewayClient;
pub use render_api::RenderApiClient;
pub use static_parser::StaticParserClient;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::errors::OrchestratorError;
use crate::headers::HttpHeaders;

/// Uniform contract shared by every fetch backend: `fetch(url, headers) →
/// body-string`. Implementations own their own retry loop, backoff, and
/// anti-bot response policy.
#[async_trait]
pub trait FetchClient: Send + Sync {
    async fn fetch(&self, url: &str, headers: Option<&HttpHeaders>) -> Result<String, OrchestratorError>;

    fn name(&self) -> &'static str;
}

/// Tagged variant over the nine fetch-backend strategies. Behavior-specific
/// configuration lives in the variant's payload rather than in a class
/// hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchBackendKind {
    DirectHttp,
    CommandLine,
    ProxyGateway,
    HeadlessBrowserA,
    HeadlessBrowserB,
    ChallengeSolver,
    RenderApi,
    CrawlerFramework,
    StaticParser,
}

impl FetchBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchBackendKind::DirectHttp => "direct_http",
            FetchBackendKind::CommandLine => "command_line",
            FetchBackendKind::ProxyGateway => "proxy_gateway",
            FetchBackendKind::HeadlessBrowserA => "headless_browser_a",
            FetchBackendKind::HeadlessBrowserB => "headless_browser_b",
            FetchBackendKind::ChallengeSolver => "challenge_solver",
            FetchBackendKind::RenderApi => "render_api",
            FetchBackendKind::CrawlerFramework => "crawler_framework",
            FetchBackendKind::StaticParser => "static_parser",
        }
    }
}

impl std::fmt::Display for FetchBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FetchBackendKind {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct_http" | "request" => Ok(FetchBackendKind::DirectHttp),
            "command_line" | "curl" => Ok(FetchBackendKind::CommandLine),
            "proxy_gateway" | "agent" => Ok(FetchBackendKind::ProxyGateway),
            "headless_browser_a" | "selenium" => Ok(FetchBackendKind::HeadlessBrowserA),
            "headless_browser_b" | "playwright" => Ok(FetchBackendKind::HeadlessBrowserB),
            "challenge_solver" | "cloudscraper" => Ok(FetchBackendKind::ChallengeSolver),
            "render_api" | "firecrawl" => Ok(FetchBackendKind::RenderApi),
            "crawler_framework" | "scrapy" => Ok(FetchBackendKind::CrawlerFramework),
            "static_parser" | "beautifulsoup" => Ok(FetchBackendKind::StaticParser),
            other => Err(OrchestratorError::UnknownEngine {
                name: other.to_string(),
            }),
        }
    }
}

/// Shared construction parameters threaded through every backend.
#[derive(Debug, Clone, Copy)]
pub struct BackendSettings {
    pub retries: u32,
    pub timeout: Duration,
}

impl BackendSettings {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            retries: config.default_retries,
            timeout: Duration::from_secs(config.default_timeout),
        }
    }
}

/// Constructs the backend named by `kind`, pulling any backend-specific
/// configuration (proxy URL, API key) out of `config`.
pub fn build_client(kind: &FetchBackendKind, config: &EngineConfig) -> Arc<dyn FetchClient> {
    let settings = BackendSettings::from_config(config);
    match kind {
        FetchBackendKind::DirectHttp => Arc::new(DirectHttpClient::new(settings)),
        FetchBackendKind::CommandLine => Arc::new(CommandLineClient::new(settings)),
        FetchBackendKind::ProxyGateway => {
            Arc::new(ProxyGatewayClient::new(settings, config.agent_url.clone()))
        }
        FetchBackendKind::HeadlessBrowserA => Arc::new(HeadlessBrowserAClient::new(settings)),
        FetchBackendKind::HeadlessBrowserB => Arc::new(HeadlessBrowserBClient::new(settings)),
        FetchBackendKind::ChallengeSolver => Arc::new(ChallengeSolverClient::new(settings, Vec::new())),
        FetchBackendKind::RenderApi => {
            Arc::new(RenderApiClient::new(settings, config.firecrawl_api_key.clone()))
        }
        FetchBackendKind::CrawlerFramework => Arc::new(CrawlerFrameworkClient::new(settings)),
        FetchBackendKind::StaticParser => Arc::new(StaticParserClient::new(settings)),
    }
}
