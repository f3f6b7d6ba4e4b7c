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

/// Bing SERP results live in `li.b_algo` blocks, title in a nested `h2 > a`.
pub struct BingEngine {
    deps: EngineDeps,
    base_url: String,
}

impl BingEngine {
    pub fn new(deps: EngineDeps, base_url: String) -> Self {
        Self { deps, base_url }
    }

    fn build_url(&self, query: &str) -> String {
        format!("{}?q={}", self.base_url, urlencoding::encode(query))
    }

    fn parse_serp(html: &str) -> Vec<SerpItem> {
        let document = Html::parse_document(html);
        let Ok(result) = Selector::parse("li.b_algo") else {
            return Vec::new();
        };
        let Ok(heading_anchor) = Selector::parse("h2 a") else {
            return Vec::new();
        };

        document
            .select(&result)
            .filter_map(|li| {
                let a = li.select(&heading_anchor).next()?;
                let href = a.value().attr("href")?.to_string();
                let title = a.text().collect::<String>().trim().to_string();
                Some(SerpItem { title, href })
            })
            .collect()
    }
}

#[async_trait]
impl SearchEngine for BingEngine {
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
        SearchEngineKind::Bing
    }

    fn allowed_domains(&self) -> &[String] {
        &self.deps.allowed_domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_b_algo_blocks() {
        let html = r#"
            <html><body>
                <li class="b_algo"><h2><a href="https://bing.com/x">Result</a></h2></li>
            </body></html>
        "#;
        let items = BingEngine::parse_serp(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].href, "https://bing.com/x");
    }
}
