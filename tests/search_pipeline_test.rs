// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use fetchrs::errors::OrchestratorError;
use fetchrs::fetch::FetchClient;
use fetchrs::headers::HttpHeaders;
use fetchrs::search::{select_secondary_urls, BaiduEngine, EngineDeps, SearchEngine, SearchMode};

struct FixtureClient {
    body: String,
}

#[async_trait]
impl FetchClient for FixtureClient {
    async fn fetch(&self, _url: &str, _headers: Option<&HttpHeaders>) -> Result<String, OrchestratorError> {
        Ok(self.body.clone())
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

const BAIDU_SERP_FIXTURE: &str = r#"
    <html><body>
        <h3 class="t"><a href="https://baike.baidu.com/item/a">Baike A</a></h3>
        <h3 class="t"><a href="https://baike.baidu.com/item/b">Baike B</a></h3>
        <h3 class="t"><a href="https://movie.douban.com/subject/1">Douban</a></h3>
        <h3 class="t"><a href="https://evil.example/1">Evil A</a></h3>
        <h3 class="t"><a href="https://evil.example/2">Evil B</a></h3>
    </body></html>
"#;

fn allowed_domain() -> Vec<String> {
    vec!["baike.baidu.com".to_string(), "movie.douban.com".to_string()]
}

#[tokio::test]
async fn link_mode_returns_every_allowed_item_regardless_of_links_num() {
    let deps = EngineDeps {
        backend: Arc::new(FixtureClient {
            body: BAIDU_SERP_FIXTURE.to_string(),
        }),
        max_results: 60,
        allowed_domain: allowed_domain(),
    };
    let engine = BaiduEngine::new(deps, "https://www.baidu.com/s".to_string());

    let envelope = engine.search_web("rust", SearchMode::Link, 2, None).await;

    assert_eq!(envelope.code, 200);
    let items = envelope.data.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["href"], "https://baike.baidu.com/item/a");
    assert_eq!(items[1]["href"], "https://baike.baidu.com/item/b");
    assert_eq!(items[2]["href"], "https://movie.douban.com/subject/1");
}

#[test]
fn secondary_fetch_selection_picks_one_per_domain_then_fills() {
    use fetchrs::search::SerpItem;

    let filtered = vec![
        SerpItem {
            title: "Baike A".to_string(),
            href: "https://baike.baidu.com/item/a".to_string(),
        },
        SerpItem {
            title: "Baike B".to_string(),
            href: "https://baike.baidu.com/item/b".to_string(),
        },
        SerpItem {
            title: "Douban".to_string(),
            href: "https://movie.douban.com/subject/1".to_string(),
        },
    ];

    let selected = select_secondary_urls(&filtered, &allowed_domain(), 2);
    assert_eq!(
        selected,
        vec![
            "https://baike.baidu.com/item/a".to_string(),
            "https://movie.douban.com/subject/1".to_string(),
        ]
    );
}
