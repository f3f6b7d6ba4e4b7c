// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use serde_json::json;
use tokio::sync::Semaphore;
use url::Url;

use crate::envelope::ResponseEnvelope;
use crate::extract;
use crate::fetch::FetchClient;
use crate::headers::{self, HttpHeaders};

use super::SearchMode;

/// One SERP candidate before domain filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerpItem {
    pub title: String,
    pub href: String,
}

/// Outcome of a single secondary fetch, aggregated into the final envelope.
#[derive(Debug, Clone, Serialize)]
pub struct FetchTask {
    pub url: String,
    pub content: Option<String>,
    pub error: Option<String>,
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string))
}

/// Retains only the items whose host contains at least one entry of
/// `allowed_domain`, preserving SERP order and suppressing duplicate URLs.
pub fn filter_by_domain(items: Vec<SerpItem>, allowed_domain: &[String]) -> Vec<SerpItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            if !seen.insert(item.href.clone()) {
                return false;
            }
            match host_of(&item.href) {
                Some(host) => allowed_domain.iter().any(|d| host.contains(d.as_str())),
                None => false,
            }
        })
        .collect()
}

/// Two-pass selection of at most `links_num` URLs for secondary fetch: first
/// one URL per distinct `allowed_domain` entry in input order, then filling
/// any remainder from the rest of `filtered` in order.
pub fn select_secondary_urls(
    filtered: &[SerpItem],
    allowed_domain: &[String],
    links_num: u32,
) -> Vec<String> {
    let cap = links_num as usize;
    if cap == 0 {
        return Vec::new();
    }

    let mut selected = Vec::with_capacity(cap);
    let mut used_domains = HashSet::new();
    let mut taken = HashSet::new();

    for item in filtered {
        if selected.len() >= cap {
            break;
        }
        let Some(host) = host_of(&item.href) else { continue };
        let Some(domain) = allowed_domain.iter().find(|d| host.contains(d.as_str())) else {
            continue;
        };
        if used_domains.insert(domain.clone()) {
            taken.insert(item.href.clone());
            selected.push(item.href.clone());
        }
    }

    if selected.len() < cap {
        for item in filtered {
            if selected.len() >= cap {
                break;
            }
            if taken.insert(item.href.clone()) {
                selected.push(item.href.clone());
            }
        }
    }

    selected
}

const SECONDARY_FETCH_CONCURRENCY: usize = 5;

/// Fans out a bounded pool of up to 5 concurrent secondary fetches, each
/// delayed by a `uniform(0.3, 1.0)` second jitter sleep. Failures are
/// absorbed into `FetchTask::error` rather than aborting the whole call.
pub async fn secondary_fetch(
    urls: Vec<String>,
    backend: Arc<dyn FetchClient>,
    headers: Option<HttpHeaders>,
) -> Vec<FetchTask> {
    let semaphore = Arc::new(Semaphore::new(SECONDARY_FETCH_CONCURRENCY));
    let headers = headers.map(Arc::new);

    let handles: Vec<_> = urls
        .into_iter()
        .map(|url| {
            let semaphore = semaphore.clone();
            let backend = backend.clone();
            let headers = headers.clone();
            tokio::spawn(async move {
                let _permit = semaphore.acquire().await;
                let jitter = {
                    let mut rng = rand::rng();
                    rng.random_range(0.3_f64..1.0_f64)
                };
                tokio::time::sleep(Duration::from_secs_f64(jitter)).await;

                match backend.fetch(&url, headers.as_deref()).await {
                    Ok(body) => FetchTask {
                        url,
                        content: Some(body),
                        error: None,
                    },
                    Err(e) => FetchTask {
                        url,
                        content: None,
                        error: Some(e.to_string()),
                    },
                }
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        if let Ok(task) = handle.await {
            results.push(task);
        }
    }
    results
}

/// Parameters shared by every engine's SERP pipeline, assembled by each
/// engine module before delegating to [`run_pipeline`].
pub struct PipelineInput<'a> {
    pub serp_url: String,
    pub backend: Arc<dyn FetchClient>,
    pub allowed_domain: &'a [String],
    pub links_num: u32,
    pub headers: Option<&'a HttpHeaders>,
    pub parse_serp: fn(&str) -> Vec<SerpItem>,
}

/// The shared fetch-parse-filter-secondary-fetch pipeline used by every
/// direct-HTTP search engine, generic over the engine-specific URL builder
/// and DOM parser supplied by the caller.
pub async fn run_pipeline(input: PipelineInput<'_>, mode: SearchMode) -> ResponseEnvelope {
    let enhanced = headers::enhance(Some(&input.serp_url), input.headers);

    let body = match input.backend.fetch(&input.serp_url, Some(&enhanced)).await {
        Ok(b) => b,
        Err(e) => return e.into_envelope(),
    };

    let candidates = (input.parse_serp)(&body);
    let filtered = filter_by_domain(candidates, input.allowed_domain);

    if filtered.is_empty() {
        return ResponseEnvelope::error(500, "SERP parse yielded no candidates", None);
    }

    if mode == SearchMode::Link {
        return ResponseEnvelope::success("ok", json!(filtered));
    }

    let selected = select_secondary_urls(&filtered, input.allowed_domain, input.links_num);
    let tasks = secondary_fetch(selected, input.backend.clone(), input.headers.cloned()).await;

    let items: Vec<_> = tasks
        .into_iter()
        .filter_map(|task| {
            let content = task.content?;
            let content = if mode == SearchMode::Text {
                extract::extract(&content)
            } else {
                content
            };
            Some(json!({ "url": task.url, "content": content }))
        })
        .collect();

    ResponseEnvelope::success("ok", json!(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(href: &str) -> SerpItem {
        SerpItem {
            title: "t".to_string(),
            href: href.to_string(),
        }
    }

    #[test]
    fn picks_one_per_domain_before_filling() {
        let allowed = vec!["baike.baidu.com".to_string(), "movie.douban.com".to_string()];
        let filtered = vec![
            item("https://baike.baidu.com/a"),
            item("https://baike.baidu.com/b"),
            item("https://movie.douban.com/c"),
        ];
        let selected = select_secondary_urls(&filtered, &allowed, 2);
        assert_eq!(
            selected,
            vec![
                "https://baike.baidu.com/a".to_string(),
                "https://movie.douban.com/c".to_string()
            ]
        );
    }

    #[test]
    fn fills_remainder_when_domains_exhausted() {
        let allowed = vec!["baike.baidu.com".to_string()];
        let filtered = vec![item("https://baike.baidu.com/a"), item("https://baike.baidu.com/b")];
        let selected = select_secondary_urls(&filtered, &allowed, 2);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn filter_drops_disallowed_hosts_and_duplicates() {
        let allowed = vec!["baike.baidu.com".to_string()];
        let items = vec![
            item("https://baike.baidu.com/a"),
            item("https://baike.baidu.com/a"),
            item("https://evil.example/x"),
        ];
        let filtered = filter_by_domain(items, &allowed);
        assert_eq!(filtered.len(), 1);
    }
}
