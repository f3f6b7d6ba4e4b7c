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

/// Sogou SERP results sit in `.vrwrap` or `.rb` containers, title under a
/// nested `h3 > a`.
pub struct SogouEngine {
    deps: EngineDeps,
    base_url: String,
}

impl SogouEngine {
    pub fn new(deps: EngineDeps, base_url: String) -> Self {
        Self { deps, base_url }
    }

    fn build_url(&self, query: &str) -> String {
        format!("{}?query={}", self.base_url, urlencoding::encode(query))
    }

    fn parse_serp(html: &str) -> Vec<SerpItem> {
        let document = Html::parse_document(html);
        let Ok(container) = Selector::parse(".vrwrap, .rb") else {
            return Vec::new();
        };
        let Ok(heading_anchor) = Selector::parse("h3 > a") else {
            return Vec::new();
        };

        document
            .select(&container)
            .filter_map(|block| {
                let a = block.select(&heading_anchor).next()?;
                let href = a.value().attr("href")?.to_string();
                let title = a.text().collect::<String>().trim().to_string();
                Some(SerpItem { title, href })
            })
            .collect()
    }
}

#[async_trait]
impl SearchEngine for SogouEngine {
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
        SearchEngineKind::Sogou
    }

    fn allowed_domains(&self) -> &[String] {
        &self.deps.allowed_domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vrwrap_blocks() {
        let html = r#"
            <html><body>
                <div class="vrwrap"><h3><a href="https://sogou.com/x">Result</a></h3></div>
            </body></html>
        "#;
        let items = SogouEngine::parse_serp(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].href, "https://sogou.com/x");
    }
}
