// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::json;

use crate::envelope::ResponseEnvelope;
use crate::extract;
use crate::headers::{self, HttpHeaders};

use super::pipeline::{filter_by_domain, secondary_fetch, select_secondary_urls, SerpItem};
use super::{EngineDeps, SearchEngine, SearchEngineKind, SearchMode};

/// SO (360 Search) SERP results use a broad `<h3>` heading selector rather
/// than a stable container class.
///
/// Every candidate href is resolved through a `HEAD` redirect-follow before
/// domain filtering, so the allowed-domain check sees the real target rather
/// than a search-engine redirect wrapper. The resolution step runs
/// concurrently across candidates rather than one at a time.
pub struct So360Engine {
    deps: EngineDeps,
    base_url: String,
}

impl So360Engine {
    pub fn new(deps: EngineDeps, base_url: String) -> Self {
        Self { deps, base_url }
    }

    fn build_url(&self, query: &str) -> String {
        format!("{}?q={}", self.base_url, urlencoding::encode(query))
    }

    fn parse_serp(html: &str) -> Vec<SerpItem> {
        let document = Html::parse_document(html);
        let Ok(heading) = Selector::parse("h3") else {
            return Vec::new();
        };
        let Ok(anchor) = Selector::parse("a") else {
            return Vec::new();
        };

        document
            .select(&heading)
            .filter_map(|h3| {
                let a = h3.select(&anchor).next()?;
                let href = a.value().attr("href")?.to_string();
                let title = a.text().collect::<String>().trim().to_string();
                Some(SerpItem { title, href })
            })
            .collect()
    }

    /// Resolves one candidate's href to its final location via `HEAD` with
    /// redirect-follow, falling back to the original href on any error.
    async fn resolve(client: &reqwest::Client, item: SerpItem) -> SerpItem {
        match client.head(&item.href).send().await {
            Ok(resp) => SerpItem {
                title: item.title,
                href: resp.url().to_string(),
            },
            Err(_) => item,
        }
    }

    async fn resolve_all(items: Vec<SerpItem>) -> Vec<SerpItem> {
        let client = reqwest::Client::new();
        let futures = items.into_iter().map(|item| Self::resolve(&client, item));
        futures::future::join_all(futures).await
    }
}

#[async_trait]
impl SearchEngine for So360Engine {
    async fn search_web(
        &self,
        query: &str,
        mode: SearchMode,
        links_num: u32,
        headers: Option<&HttpHeaders>,
    ) -> ResponseEnvelope {
        let serp_url = self.build_url(query);
        let enhanced = headers::enhance(Some(&serp_url), headers);

        let body = match self.deps.backend.fetch(&serp_url, Some(&enhanced)).await {
            Ok(b) => b,
            Err(e) => return e.into_envelope(),
        };

        let candidates = Self::parse_serp(&body);
        let resolved = Self::resolve_all(candidates).await;
        let filtered = filter_by_domain(resolved, &self.deps.allowed_domain);

        if filtered.is_empty() {
            return ResponseEnvelope::error(500, "SERP parse yielded no candidates", None);
        }

        if mode == SearchMode::Link {
            return ResponseEnvelope::success("ok", json!(filtered));
        }

        let selected = select_secondary_urls(&filtered, &self.deps.allowed_domain, links_num);
        let tasks = secondary_fetch(selected, self.deps.backend.clone(), headers.cloned()).await;

        let items: Vec<_> = tasks
            .into_iter()
            .filter_map(|task| {
                let content = task.content?;
                let content = if mode == SearchMode::Text {
                    extract::extract(&content)
                } else {
                    content
                };
                Some(json!({ "url": task.url, "content": content }))
            })
            .collect();

        ResponseEnvelope::success("ok", json!(items))
    }

    fn kind(&self) -> SearchEngineKind {
        SearchEngineKind::So360
    }

    fn allowed_domains(&self) -> &[String] {
        &self.deps.allowed_domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_broad_h3_headings() {
        let html = r#"
            <html><body>
                <h3><a href="https://so.com/x">Result</a></h3>
            </body></html>
        "#;
        let items = So360Engine::parse_serp(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].href, "https://so.com/x");
    }
}
