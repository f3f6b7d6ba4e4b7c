// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::envelope::ResponseEnvelope;
use crate::headers::HttpHeaders;

use super::pipeline::{run_pipeline, PipelineInput, SerpItem};
use super::{EngineDeps, SearchEngine, SearchEngineKind, SearchMode};

static WINDOW_DATA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)window\.__DATA__\s*=\s*(\{.*?\})\s*;?\s*</script>").unwrap());

/// Douban results are normally embedded as a `window.__DATA__` JSON blob;
/// when that payload is absent the engine falls back to scraping
/// `div.item-root > div.title > a`.
pub struct DoubanEngine {
    deps: EngineDeps,
    base_url: String,
}

impl DoubanEngine {
    pub fn new(deps: EngineDeps, base_url: String) -> Self {
        Self { deps, base_url }
    }

    fn build_url(&self, query: &str) -> String {
        format!("{}?search_text={}", self.base_url, urlencoding::encode(query))
    }

    fn items_from_json(value: &Value) -> Vec<SerpItem> {
        let Some(items) = value.get("items").and_then(Value::as_array) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for item in items {
            if let (Some(title), Some(url)) = (
                item.get("title").and_then(Value::as_str),
                item.get("url").and_then(Value::as_str),
            ) {
                out.push(SerpItem {
                    title: title.to_string(),
                    href: url.to_string(),
                });
                continue;
            }
            if let Some(urls) = item.get("urls").and_then(Value::as_array) {
                for entry in urls {
                    if let (Some(text), Some(url)) = (
                        entry.get("text").and_then(Value::as_str),
                        entry.get("url").and_then(Value::as_str),
                    ) {
                        out.push(SerpItem {
                            title: text.to_string(),
                            href: url.to_string(),
                        });
                    }
                }
            }
        }
        out
    }

    fn parse_window_data(html: &str) -> Option<Vec<SerpItem>> {
        let captured = WINDOW_DATA.captures(html)?;
        let json_text = captured.get(1)?.as_str();
        let value: Value = serde_json::from_str(json_text).ok()?;
        let items = Self::items_from_json(&value);
        if items.is_empty() {
            None
        } else {
            Some(items)
        }
    }

    fn parse_fallback(html: &str) -> Vec<SerpItem> {
        let document = Html::parse_document(html);
        let Ok(selector) = Selector::parse("div.item-root > div.title > a") else {
            return Vec::new();
        };

        document
            .select(&selector)
            .filter_map(|a| {
                let href = a.value().attr("href")?.to_string();
                let title = a.text().collect::<String>().trim().to_string();
                Some(SerpItem { title, href })
            })
            .collect()
    }

    fn parse_serp(html: &str) -> Vec<SerpItem> {
        Self::parse_window_data(html).unwrap_or_else(|| Self::parse_fallback(html))
    }
}

#[async_trait]
impl SearchEngine for DoubanEngine {
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
        SearchEngineKind::Douban
    }

    fn allowed_domains(&self) -> &[String] {
        &self.deps.allowed_domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_items_from_window_data() {
        let html = r#"<script>window.__DATA__ = {"items":[{"title":"A","url":"https://movie.douban.com/a"}]};</script>"#;
        let items = DoubanEngine::parse_serp(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].href, "https://movie.douban.com/a");
    }

    #[test]
    fn parses_nested_urls_from_window_data() {
        let html = r#"<script>window.__DATA__ = {"items":[{"urls":[{"text":"B","url":"https://movie.douban.com/b"}]}]};</script>"#;
        let items = DoubanEngine::parse_serp(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].href, "https://movie.douban.com/b");
    }

    #[test]
    fn falls_back_to_item_root_markup() {
        let html = r#"
            <html><body>
                <div class="item-root"><div class="title"><a href="https://movie.douban.com/c">C</a></div></div>
            </body></html>
        "#;
        let items = DoubanEngine::parse_serp(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].href, "https://movie.douban.com/c");
    }
}
