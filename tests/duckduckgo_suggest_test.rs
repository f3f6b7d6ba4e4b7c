// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use fetchrs::config::EngineConfig;
use fetchrs::fetch::FetchBackendKind;
use fetchrs::operations::search_suggest;
use fetchrs::registry::Registry;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn search_suggest_returns_parsed_autocomplete_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"[{"phrase":"茅台一号"},{"phrase":"茅台镇"}]"#),
        )
        .mount(&server)
        .await;

    let mut config = EngineConfig::default();
    config.duckduckgo_api = server.uri();
    let registry = Registry::new(config);

    let envelope = search_suggest(&registry, "茅台", None, Some(FetchBackendKind::DirectHttp)).await;

    assert_eq!(envelope.code, 200);
    let items = envelope.data.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["phrase"], "茅台一号");
}

#[tokio::test]
async fn search_suggest_rejects_empty_query() {
    let registry = Registry::new(EngineConfig::default());
    let envelope = search_suggest(&registry, "  ", None, None).await;
    assert_eq!(envelope.code, 400);
}
