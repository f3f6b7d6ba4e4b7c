// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::EngineConfig;
use crate::errors::OrchestratorError;
use crate::fetch::{self, FetchBackendKind};
use crate::search::{
    BaiduEngine, BingEngine, DoubanEngine, DuckDuckGoEngine, EngineDeps, GoogleEngine,
    SearchEngine, SearchEngineKind, So360Engine, SogouEngine,
};

/// Thread-safe memoized construction of `(engine, backend)` service
/// instances, keyed by `"<engine>_<backend>"`.
///
/// The lock (via [`DashMap`]'s internal sharding) guards only the cache
/// map; constructed services are immutable afterward and safe to share
/// across concurrent `search_web` calls.
pub struct Registry {
    config: EngineConfig,
    cache: DashMap<String, Arc<dyn SearchEngine>>,
    duckduckgo_cache: DashMap<String, Arc<DuckDuckGoEngine>>,
}

impl Registry {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            cache: DashMap::new(),
            duckduckgo_cache: DashMap::new(),
        }
    }

    fn cache_key(engine: SearchEngineKind, backend: &FetchBackendKind) -> String {
        format!("{}_{}", engine.as_str(), backend.as_str())
    }

    fn allowed_domain_for(&self, engine: SearchEngineKind) -> Vec<String> {
        match engine {
            SearchEngineKind::Douban => self
                .config
                .allowed_domain
                .iter()
                .filter(|d| d.contains("douban"))
                .cloned()
                .collect(),
            _ => self.config.allowed_domain.clone(),
        }
    }

    fn deps_for(&self, engine: SearchEngineKind, backend: &FetchBackendKind) -> EngineDeps {
        EngineDeps {
            backend: fetch::build_client(backend, &self.config),
            max_results: self.config.max_results,
            allowed_domain: self.allowed_domain_for(engine),
        }
    }

    fn build_service(&self, engine: SearchEngineKind, backend: &FetchBackendKind) -> Arc<dyn SearchEngine> {
        let deps = self.deps_for(engine, backend);
        match engine {
            SearchEngineKind::Baidu => Arc::new(BaiduEngine::new(deps, self.config.baidu_url.clone())),
            SearchEngineKind::Bing => Arc::new(BingEngine::new(deps, self.config.bing_url.clone())),
            SearchEngineKind::Google => Arc::new(GoogleEngine::new(deps, self.config.google_url.clone())),
            SearchEngineKind::Sogou => Arc::new(SogouEngine::new(deps, self.config.sogou_url.clone())),
            SearchEngineKind::So360 => Arc::new(So360Engine::new(deps, self.config.so_url.clone())),
            SearchEngineKind::Douban => {
                Arc::new(DoubanEngine::new(deps, self.config.douban_search_url.clone()))
            }
            SearchEngineKind::DuckDuckGo => Arc::new(DuckDuckGoEngine::new(
                deps,
                self.config.lite_duckduckgo_url.clone(),
                self.config.duckduckgo_api.clone(),
            )),
        }
    }

    /// Returns the cached `(engine, backend)` service, constructing and
    /// caching it on first use. `force_new=true` bypasses and replaces the
    /// cache entry; the prior instance remains valid for anyone still
    /// holding an `Arc` to it.
    pub fn get_service(
        &self,
        engine: SearchEngineKind,
        backend: FetchBackendKind,
        force_new: bool,
    ) -> Arc<dyn SearchEngine> {
        let key = Self::cache_key(engine, &backend);

        if !force_new {
            if let Some(existing) = self.cache.get(&key) {
                return existing.clone();
            }
        }

        let service = self.build_service(engine, &backend);
        self.cache.insert(key, service.clone());
        service
    }

    /// Same contract as [`Registry::get_service`], but returns the concrete
    /// `DuckDuckGoEngine` type so callers can reach `search_api` and
    /// `search_suggest`, which aren't part of the shared `SearchEngine`
    /// trait.
    pub fn get_duckduckgo(&self, backend: FetchBackendKind, force_new: bool) -> Arc<DuckDuckGoEngine> {
        let key = Self::cache_key(SearchEngineKind::DuckDuckGo, &backend);

        if !force_new {
            if let Some(existing) = self.duckduckgo_cache.get(&key) {
                return existing.clone();
            }
        }

        let deps = self.deps_for(SearchEngineKind::DuckDuckGo, &backend);
        let service = Arc::new(DuckDuckGoEngine::new(
            deps,
            self.config.lite_duckduckgo_url.clone(),
            self.config.duckduckgo_api.clone(),
        ));
        self.duckduckgo_cache.insert(key, service.clone());
        service
    }

    pub fn resolve_engine(name: &str) -> Result<SearchEngineKind, OrchestratorError> {
        name.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_service_returns_same_instance_until_force_new() {
        let registry = Registry::new(EngineConfig::default());
        let first = registry.get_service(SearchEngineKind::Bing, FetchBackendKind::DirectHttp, false);
        let second = registry.get_service(SearchEngineKind::Bing, FetchBackendKind::DirectHttp, false);
        assert!(Arc::ptr_eq(&first, &second));

        let third = registry.get_service(SearchEngineKind::Bing, FetchBackendKind::DirectHttp, true);
        assert!(!Arc::ptr_eq(&first, &third));

        let fourth = registry.get_service(SearchEngineKind::Bing, FetchBackendKind::DirectHttp, false);
        assert!(Arc::ptr_eq(&third, &fourth));
    }

    #[test]
    fn douban_allowed_domain_is_restricted_to_douban_family() {
        let registry = Registry::new(EngineConfig::default());
        let deps = registry.deps_for(SearchEngineKind::Douban, &FetchBackendKind::DirectHttp);
        assert!(deps.allowed_domain.iter().all(|d| d.contains("douban")));
        assert!(!deps.allowed_domain.is_empty());
    }

    #[test]
    fn unknown_engine_name_is_rejected() {
        let result = Registry::resolve_engine("not-a-real-engine");
        assert!(matches!(result, Err(OrchestratorError::UnknownEngine { .. })));
    }
}
