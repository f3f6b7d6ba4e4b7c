// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use fetchrs::config::EngineConfig;
use fetchrs::fetch::FetchBackendKind;
use fetchrs::operations::process_fetch;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config() -> EngineConfig {
    EngineConfig::default()
}

#[tokio::test]
async fn fetches_two_urls_and_extracts_text_in_order() {
    let server_a = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Hi</body></html>"))
        .mount(&server_a)
        .await;
    let server_b = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Hi</body></html>"))
        .mount(&server_b)
        .await;

    let urls = vec![server_a.uri(), server_b.uri()];
    let envelope = process_fetch(&urls, FetchBackendKind::DirectHttp, None, "text", &config()).await;

    assert_eq!(envelope.code, 200);
    let items = envelope.data.as_array().expect("array data");
    assert_eq!(items.len(), 2);
    for (item, expected_url) in items.iter().zip(urls.iter()) {
        assert_eq!(item["url"].as_str().unwrap(), expected_url);
        assert_eq!(item["data"].as_str().unwrap(), "Hi");
    }
}

#[tokio::test]
async fn continues_past_a_failing_url() {
    let good = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>ok</p>"))
        .mount(&good)
        .await;

    let mut config = config();
    config.default_retries = 1;

    let urls = vec!["http://127.0.0.1:1/unreachable".to_string(), good.uri()];
    let envelope = process_fetch(&urls, FetchBackendKind::DirectHttp, None, "text", &config).await;

    assert_eq!(envelope.code, 200);
    let items = envelope.data.as_array().expect("array data");
    assert_eq!(items.len(), 2);
    assert!(items[0].get("error").is_some());
    assert_eq!(items[1]["data"].as_str().unwrap(), "ok");
}

#[tokio::test]
async fn rejects_empty_mode_free_of_network_activity_when_url_count_exceeds_cap() {
    let urls: Vec<String> = (0..21).map(|i| format!("https://example.com/{i}")).collect();
    let envelope = process_fetch(&urls, FetchBackendKind::DirectHttp, None, "text", &config()).await;
    assert_eq!(envelope.code, 400);
}
