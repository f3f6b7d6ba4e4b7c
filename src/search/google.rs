// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::envelope::ResponseEnvelope;
use crate::headers::HttpHeaders;

use super::pipeline::{run_pipeline, PipelineInput, SerpItem};
use super::{EngineDeps, SearchEngine, SearchEngineKind, SearchMode};

/// Google SERP results sit under `div.yuRUbf > a`, with the title in a
/// nested `h3`.
pub struct GoogleEngine {
    deps: EngineDeps,
    base_url: String,
}

impl GoogleEngine {
    pub fn new(deps: EngineDeps, base_url: String) -> Self {
        Self { deps, base_url }
    }

    fn build_url(&self, query: &str) -> String {
        format!("{}?q={}", self.base_url, urlencoding::encode(query))
    }

    fn parse_serp(html: &str) -> Vec<SerpItem> {
        let document = Html::parse_document(html);
        let Ok(container) = Selector::parse("div.yuRUbf > a") else {
            return Vec::new();
        };
        let Ok(heading) = Selector::parse("h3") else {
            return Vec::new();
        };

        document
            .select(&container)
            .filter_map(|a| {
                let href = a.value().attr("href")?.to_string();
                let title = a
                    .select(&heading)
                    .next()
                    .map(|h3| h3.text().collect::<String>())
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                Some(SerpItem { title, href })
            })
            .collect()
    }
}

#[async_trait]
impl SearchEngine for GoogleEngine {
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
        SearchEngineKind::Google
    }

    fn allowed_domains(&self) -> &[String] {
        &self.deps.allowed_domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yurubf_anchors() {
        let html = r#"
            <html><body>
                <div class="yuRUbf"><a href="https://zhihu.com/x"><h3>Title</h3></a></div>
            </body></html>
        "#;
        let items = GoogleEngine::parse_serp(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].href, "https://zhihu.com/x");
        assert_eq!(items[0].title, "Title");
    }
}
