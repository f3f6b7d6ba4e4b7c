// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

mod baidu;
mod bing;
mod douban;
mod duckduckgo;
mod google;
mod pipeline;
mod so360;
mod sogou;

pub use baidu::BaiduEngine;
pub use bing::BingEngine;
pub use douban::DoubanEngine;
pub use duckduckgo::DuckDuckGoEngine;
pub use google::GoogleEngine;
pub use pipeline::{select_secondary_urls, SerpItem};
pub use so360::So360Engine;
pub use sogou::SogouEngine;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::envelope::ResponseEnvelope;
use crate::errors::OrchestratorError;
use crate::fetch::{FetchBackendKind, FetchClient};
use crate::headers::HttpHeaders;

/// Tagged variant over the seven search-engine strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchEngineKind {
    Baidu,
    Bing,
    Google,
    Sogou,
    So360,
    DuckDuckGo,
    Douban,
}

impl SearchEngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchEngineKind::Baidu => "baidu",
            SearchEngineKind::Bing => "bing",
            SearchEngineKind::Google => "google",
            SearchEngineKind::Sogou => "sogou",
            SearchEngineKind::So360 => "so",
            SearchEngineKind::DuckDuckGo => "duckduckgo",
            SearchEngineKind::Douban => "douban",
        }
    }

    /// Per-engine default backend: DuckDuckGo and Google default to the
    /// render API, the rest to direct HTTP.
    pub fn default_backend(&self) -> FetchBackendKind {
        match self {
            SearchEngineKind::DuckDuckGo | SearchEngineKind::Google => FetchBackendKind::RenderApi,
            _ => FetchBackendKind::DirectHttp,
        }
    }
}

impl std::fmt::Display for SearchEngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SearchEngineKind {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "baidu" => Ok(SearchEngineKind::Baidu),
            "bing" => Ok(SearchEngineKind::Bing),
            "google" => Ok(SearchEngineKind::Google),
            "sogou" => Ok(SearchEngineKind::Sogou),
            "so" | "so360" | "so_360" => Ok(SearchEngineKind::So360),
            "duckduckgo" => Ok(SearchEngineKind::DuckDuckGo),
            "douban" => Ok(SearchEngineKind::Douban),
            other => Err(OrchestratorError::UnknownEngine {
                name: other.to_string(),
            }),
        }
    }
}

/// Result mode requested by a caller of `search_web`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Link,
    Html,
    Text,
}

impl std::str::FromStr for SearchMode {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "link" => Ok(SearchMode::Link),
            "html" => Ok(SearchMode::Html),
            "text" => Ok(SearchMode::Text),
            other => Err(OrchestratorError::BadRequest(format!(
                "unknown search mode: {other}"
            ))),
        }
    }
}

/// Per-engine abstraction implementing the shared search-result-page
/// retrieval algorithm.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    async fn search_web(
        &self,
        query: &str,
        mode: SearchMode,
        links_num: u32,
        headers: Option<&HttpHeaders>,
    ) -> ResponseEnvelope;

    fn kind(&self) -> SearchEngineKind;

    fn allowed_domains(&self) -> &[String];
}

/// Shared constructor parameters every engine needs: its fetch backend and
/// the process-wide allowed-domain/result-cap configuration.
pub struct EngineDeps {
    pub backend: Arc<dyn FetchClient>,
    pub max_results: u32,
    pub allowed_domain: Vec<String>,
}
