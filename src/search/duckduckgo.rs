// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::envelope::ResponseEnvelope;
use crate::errors::OrchestratorError;
use crate::headers::{self, HttpHeaders};

use super::pipeline::{run_pipeline, PipelineInput, SerpItem};
use super::{EngineDeps, SearchEngine, SearchEngineKind, SearchMode};

/// DuckDuckGo scans every `<a>` tag on the lite HTML result page rather than
/// relying on a stable container class, and its hrefs wrap the real target
/// behind a `uddg=<url-encoded>` redirect parameter that must be unwrapped.
pub struct DuckDuckGoEngine {
    deps: EngineDeps,
    base_url: String,
    api_url: String,
}

impl DuckDuckGoEngine {
    pub fn new(deps: EngineDeps, base_url: String, api_url: String) -> Self {
        Self {
            deps,
            base_url,
            api_url,
        }
    }

    fn build_url(&self, query: &str) -> String {
        format!("{}?q={}", self.base_url, urlencoding::encode(query))
    }

    /// Same base query, region-pinned to `cn-zh`, safesearch off (`kp=-2`),
    /// and filtered to the past year (`df=y`).
    fn build_api_url(&self, query: &str) -> String {
        format!(
            "{}?q={}&kl=cn-zh&kp=-2&df=y",
            self.base_url,
            urlencoding::encode(query)
        )
    }

    /// Extracts the `uddg` query parameter from a wrapper href and
    /// URL-decodes it. Returns the original href unchanged when no wrapper
    /// parameter is present.
    fn unwrap_redirect(href: &str) -> String {
        let Some(query_start) = href.find('?') else {
            return href.to_string();
        };
        let query = &href[query_start + 1..];
        for pair in query.split('&') {
            if let Some(value) = pair.strip_prefix("uddg=") {
                if let Ok(decoded) = urlencoding::decode(value) {
                    return decoded.into_owned();
                }
            }
        }
        href.to_string()
    }

    fn parse_serp(html: &str) -> Vec<SerpItem> {
        let document = Html::parse_document(html);
        let Ok(anchor) = Selector::parse("a") else {
            return Vec::new();
        };

        document
            .select(&anchor)
            .filter_map(|a| {
                let raw_href = a.value().attr("href")?;
                if raw_href.is_empty() || raw_href.starts_with('#') {
                    return None;
                }
                let href = Self::unwrap_redirect(raw_href);
                let title = a.text().collect::<String>().trim().to_string();
                if title.is_empty() {
                    return None;
                }
                Some(SerpItem { title, href })
            })
            .collect()
    }

    /// Hits the autocomplete endpoint and returns the parsed JSON payload
    /// unmodified.
    pub async fn search_suggest(&self, query: &str, headers: Option<&HttpHeaders>) -> ResponseEnvelope {
        if query.trim().is_empty() {
            return OrchestratorError::BadRequest("q must not be empty".to_string()).into_envelope();
        }

        let url = format!("{}?q={}&type=list", self.api_url, urlencoding::encode(query));
        let enhanced = headers::enhance(Some(&url), headers);

        let body = match self.deps.backend.fetch(&url, Some(&enhanced)).await {
            Ok(b) => b,
            Err(e) => return e.into_envelope(),
        };

        match serde_json::from_str::<Value>(&body) {
            Ok(value) => ResponseEnvelope::success("ok", value),
            Err(e) => ResponseEnvelope::error(500, format!("malformed suggest payload: {e}"), None),
        }
    }

    /// Runs the shared pipeline against a region-pinned (`cn-zh`),
    /// safesearch-off, one-year-timelimited query, capped at the configured
    /// result limit.
    pub async fn search_api(
        &self,
        query: &str,
        mode: SearchMode,
        headers: Option<&HttpHeaders>,
    ) -> ResponseEnvelope {
        let input = PipelineInput {
            serp_url: self.build_api_url(query),
            backend: self.deps.backend.clone(),
            allowed_domain: &self.deps.allowed_domain,
            links_num: self.deps.max_results,
            headers,
            parse_serp: Self::parse_serp,
        };
        run_pipeline(input, mode).await
    }
}

#[async_trait]
impl SearchEngine for DuckDuckGoEngine {
    async fn search_web(
        &self,
        query: &str,
        mode: SearchMode,
        links_num: u32,
        headers: Option<&HttpHeaders>,
    ) -> ResponseEnvelope {
        let input = PipelineInput {
            serp_url: self.build_url(query),
            backend: self.deps.backend.clone(),
            allowed_domain: &self.deps.allowed_domain,
            links_num,
            headers,
            parse_serp: Self::parse_serp,
        };
        run_pipeline(input, mode).await
    }

    fn kind(&self) -> SearchEngineKind {
        SearchEngineKind::DuckDuckGo
    }

    fn allowed_domains(&self) -> &[String] {
        &self.deps.allowed_domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_uddg_redirect_parameter() {
        let wrapped = "https://duckduckgo.com/l/?uddg=https%3A%2F%2Fzhihu.com%2Fx&rut=abc";
        assert_eq!(DuckDuckGoEngine::unwrap_redirect(wrapped), "https://zhihu.com/x");
    }

    #[test]
    fn leaves_unwrapped_hrefs_untouched() {
        assert_eq!(
            DuckDuckGoEngine::unwrap_redirect("https://zhihu.com/x"),
            "https://zhihu.com/x"
        );
    }

    #[test]
    fn parses_all_anchor_tags_skipping_empty_fragments() {
        let html = r#"
            <html><body>
                <a href="#">skip</a>
                <a href="https://duckduckgo.com/l/?uddg=https%3A%2F%2Fzhihu.com%2Fx">Title</a>
            </body></html>
        "#;
        let items = DuckDuckGoEngine::parse_serp(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].href, "https://zhihu.com/x");
    }
}
