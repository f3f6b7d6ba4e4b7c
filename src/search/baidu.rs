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

/// Baidu SERP parsing targets `<h3 class="t"><a>` per result block.
pub struct BaiduEngine {
    deps: EngineDeps,
    base_url: String,
}

impl BaiduEngine {
    pub fn new(deps: EngineDeps, base_url: String) -> Self {
        Self { deps, base_url }
    }

    fn build_url(&self, query: &str) -> String {
        format!("{}?wd={}", self.base_url, urlencoding::encode(query))
    }

    fn parse_serp(html: &str) -> Vec<SerpItem> {
        let document = Html::parse_document(html);
        let Ok(heading) = Selector::parse("h3.t") else {
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
}

#[async_trait]
impl SearchEngine for BaiduEngine {
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
        SearchEngineKind::Baidu
    }

    fn allowed_domains(&self) -> &[String] {
        &self.deps.allowed_domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_heading_anchor_pairs() {
        let html = r#"
            <html><body>
                <h3 class="t"><a href="https://baike.baidu.com/a">Entry A</a></h3>
                <h3 class="t"><a href="https://evil.example/b">Entry B</a></h3>
            </body></html>
        "#;
        let items = BaiduEngine::parse_serp(html);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].href, "https://baike.baidu.com/a");
        assert_eq!(items[0].title, "Entry A");
    }
}
