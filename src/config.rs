// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Process-wide configuration constants.
///
/// Every field has a usable default, so the crate runs with no environment
/// configured at all except for secrets, which default to empty.
///
/// # Example
///
/// ```rust
/// use fetchrs::config::EngineConfig;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = EngineConfig::load()?;
///     println!("max results per SERP: {}", config.max_results);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Cap on links parsed per SERP and on `links_num`.
    pub max_results: u32,
    /// Default retry budget for every fetch backend.
    pub default_retries: u32,
    /// Default per-attempt timeout, in seconds.
    pub default_timeout: u64,
    /// Ordered set of domain suffixes eligible for secondary fetch.
    pub allowed_domain: Vec<String>,
    /// Base URL for an external proxy-gateway agent. Empty disables PROXY_GATEWAY.
    pub agent_url: String,
    /// API key for the RENDER_API backend. Empty disables that backend.
    pub firecrawl_api_key: String,

    pub baidu_url: String,
    pub bing_url: String,
    pub google_url: String,
    pub sogou_url: String,
    pub so_url: String,
    pub douban_search_url: String,
    pub duckduckgo_url: String,
    pub lite_duckduckgo_url: String,
    pub duckduckgo_api: String,
}

impl EngineConfig {
    /// Loads configuration from (in increasing priority order) built-in
    /// defaults, `config/default.*`, `config/{APP_ENVIRONMENT}.*`, and
    /// `FETCHRS__`-prefixed environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());

        let builder = Config::builder()
            .set_default("max_results", 60)?
            .set_default("default_retries", 3)?
            .set_default("default_timeout", 10)?
            .set_default(
                "allowed_domain",
                vec![
                    "baidu.com",
                    "www.baidu.com",
                    "baike.baidu.com",
                    "movie.douban.com",
                    "zh.wikipedia.org",
                    "wikipedia.org",
                    "zhihu.com",
                    "bing.com",
                    "sogou.com",
                    "so.com",
                    "baike.com",
                ],
            )?
            .set_default("agent_url", "")?
            .set_default("firecrawl_api_key", "")?
            .set_default("baidu_url", "https://www.baidu.com/s")?
            .set_default("bing_url", "https://www.bing.com/search")?
            .set_default("google_url", "https://www.google.com/search")?
            .set_default("sogou_url", "https://sogou.com/web")?
            .set_default("so_url", "https://www.so.com/s")?
            .set_default(
                "douban_search_url",
                "https://search.douban.com/movie/subject_search",
            )?
            .set_default("duckduckgo_url", "https://duckduckgo.com/html/")?
            .set_default("lite_duckduckgo_url", "https://lite.duckduckgo.com/lite/")?
            .set_default("duckduckgo_api", "https://duckduckgo.com/ac/")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("FETCHRS").separator("__"));

        builder.build()?.try_deserialize()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::load().expect("default EngineConfig must build from built-in defaults")
    }
}
