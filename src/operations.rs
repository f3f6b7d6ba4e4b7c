// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::json;

use crate::config::EngineConfig;
use crate::envelope::ResponseEnvelope;
use crate::errors::OrchestratorError;
use crate::extract;
use crate::fetch::{self, FetchBackendKind};
use crate::headers::HttpHeaders;
use crate::registry::Registry;
use crate::search::SearchMode;

const MAX_FETCH_URLS: usize = 20;

/// *fetch-list-of-urls*: fetches every URL with `backend`, continuing
/// through per-URL failures rather than aborting the whole batch — a
/// single bad URL must never take down its siblings' results.
pub async fn process_fetch(
    urls: &[String],
    backend: FetchBackendKind,
    headers: Option<&HttpHeaders>,
    mode: &str,
    config: &EngineConfig,
) -> ResponseEnvelope {
    if urls.is_empty() {
        return OrchestratorError::BadRequest("urls must not be empty".to_string()).into_envelope();
    }
    if urls.len() > MAX_FETCH_URLS {
        return OrchestratorError::BadRequest(format!(
            "at most {MAX_FETCH_URLS} urls are allowed, got {}",
            urls.len()
        ))
        .into_envelope();
    }
    if mode != "html" && mode != "text" {
        return OrchestratorError::BadRequest(format!("unknown fetch mode: {mode}")).into_envelope();
    }

    let client = fetch::build_client(&backend, config);

    let mut items = Vec::with_capacity(urls.len());
    for url in urls {
        match client.fetch(url, headers).await {
            Ok(body) => {
                let data = if mode == "text" { extract::extract(&body) } else { body };
                items.push(json!({ "url": url, "data": data }));
            }
            Err(e) => {
                items.push(json!({ "url": url, "error": e.to_string() }));
            }
        }
    }

    ResponseEnvelope::success("ok", json!(items))
}

/// *search-by-query*: resolves the engine, its default (or caller-chosen)
/// backend, and delegates to the shared SERP pipeline.
pub async fn search_web(
    registry: &Registry,
    engine_name: &str,
    query: &str,
    mode: &str,
    links_num: u32,
    headers: Option<&HttpHeaders>,
    http_tool: Option<FetchBackendKind>,
    max_results: u32,
) -> ResponseEnvelope {
    if query.trim().is_empty() {
        return OrchestratorError::BadRequest("q must not be empty".to_string()).into_envelope();
    }

    let engine_kind = match Registry::resolve_engine(engine_name) {
        Ok(k) => k,
        Err(e) => return e.into_envelope(),
    };

    let mode = match mode.parse::<SearchMode>() {
        Ok(m) => m,
        Err(e) => return e.into_envelope(),
    };

    let links_num = links_num.min(max_results);
    let backend = http_tool.unwrap_or_else(|| engine_kind.default_backend());
    let service = registry.get_service(engine_kind, backend, false);

    service.search_web(query, mode, links_num, headers).await
}

/// *suggest*: DuckDuckGo-only autocomplete lookup.
pub async fn search_suggest(
    registry: &Registry,
    query: &str,
    headers: Option<&HttpHeaders>,
    http_tool: Option<FetchBackendKind>,
) -> ResponseEnvelope {
    if query.trim().is_empty() {
        return OrchestratorError::BadRequest("q must not be empty".to_string()).into_envelope();
    }

    let backend = http_tool.unwrap_or(FetchBackendKind::RenderApi);
    let service = registry.get_duckduckgo(backend, false);
    service.search_suggest(query, headers).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_empty_url_list_without_network_activity() {
        let config = EngineConfig::default();
        let envelope = process_fetch(&[], FetchBackendKind::DirectHttp, None, "text", &config).await;
        assert_eq!(envelope.code, 400);
    }

    #[tokio::test]
    async fn rejects_more_than_twenty_urls() {
        let config = EngineConfig::default();
        let urls: Vec<String> = (0..21).map(|i| format!("https://example.com/{i}")).collect();
        let envelope = process_fetch(&urls, FetchBackendKind::DirectHttp, None, "text", &config).await;
        assert_eq!(envelope.code, 400);
    }

    #[tokio::test]
    async fn rejects_empty_query() {
        let config = EngineConfig::default();
        let registry = Registry::new(config.clone());
        let envelope = search_web(&registry, "bing", "", "link", 2, None, None, config.max_results).await;
        assert_eq!(envelope.code, 400);
    }

    #[tokio::test]
    async fn rejects_unknown_engine_name() {
        let config = EngineConfig::default();
        let registry = Registry::new(config.clone());
        let envelope = search_web(&registry, "altavista", "q", "link", 2, None, None, config.max_results).await;
        assert_eq!(envelope.code, 500);
    }
}
