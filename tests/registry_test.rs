// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use fetchrs::config::EngineConfig;
use fetchrs::fetch::FetchBackendKind;
use fetchrs::registry::Registry;
use fetchrs::search::SearchEngineKind;

#[test]
fn same_pair_returns_identical_instance_until_force_new() {
    let registry = Registry::new(EngineConfig::default());

    let first = registry.get_service(SearchEngineKind::Bing, FetchBackendKind::DirectHttp, false);
    let second = registry.get_service(SearchEngineKind::Bing, FetchBackendKind::DirectHttp, false);
    assert!(Arc::ptr_eq(&first, &second));

    let forced = registry.get_service(SearchEngineKind::Bing, FetchBackendKind::DirectHttp, true);
    assert!(!Arc::ptr_eq(&first, &forced));

    let after_force = registry.get_service(SearchEngineKind::Bing, FetchBackendKind::DirectHttp, false);
    assert!(Arc::ptr_eq(&forced, &after_force));
}

#[test]
fn distinct_backends_for_the_same_engine_are_cached_independently() {
    let registry = Registry::new(EngineConfig::default());

    let direct = registry.get_service(SearchEngineKind::Google, FetchBackendKind::DirectHttp, false);
    let render = registry.get_service(SearchEngineKind::Google, FetchBackendKind::RenderApi, false);
    assert!(!Arc::ptr_eq(&direct, &render));
}
