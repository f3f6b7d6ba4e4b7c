// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use fetchrs::fetch::{BackendSettings, DirectHttpClient, FetchClient};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Scenario 4 of the testable-properties list: two `503`s followed by a
/// `200` costs roughly `(2^1 + j1) + (2^2 + j2)` seconds of backoff, with
/// `j_i` uniform in `[0, 1)`, and is fetched exactly once it succeeds.
#[tokio::test(start_paused = true)]
async fn retries_through_two_anti_bot_responses_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .mount(&server)
        .await;

    let client = DirectHttpClient::new(BackendSettings {
        retries: 3,
        timeout: std::time::Duration::from_secs(5),
    });

    let start = tokio::time::Instant::now();
    let body = client.fetch(&server.uri(), None).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(body, "recovered");
    assert!(elapsed.as_secs_f64() >= 2.0 + 4.0);
    assert!(elapsed.as_secs_f64() < 2.0 + 4.0 + 2.0);
}
