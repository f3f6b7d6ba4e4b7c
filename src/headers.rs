// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashMap;

use rand::Rng;
use url::Url;

/// Mapping from header-name to header-value. Canonicalization rule: header
/// names supplied by upstream are normalized to Title-Case hyphenated form
/// before merging.
pub type HttpHeaders = HashMap<String, String>;

const RANDOM_USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/117.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/117.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36",
];

const ACCEPT_LANGUAGES: [&str; 2] = ["zh-CN,zh;q=0.8", "zh-CN,zh;q=0.9,en;q=0.8"];

/// Header names whose upstream-supplied values always override the
/// synthesized default.
const OVERRIDE_KEYS: [&str; 4] = ["user-agent", "cookie", "accept", "referer"];

fn title_case_header(key: &str) -> String {
    key.to_lowercase()
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn random_alphanumeric(n: usize) -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..n)
        .map(|_| CHARS[rng.random_range(0..CHARS.len())] as char)
        .collect()
}

fn random_hex_lower(n: usize) -> String {
    const CHARS: &[u8] = b"0123456789abcdef";
    let mut rng = rand::rng();
    (0..n)
        .map(|_| CHARS[rng.random_range(0..CHARS.len())] as char)
        .collect()
}

fn generate_random_cookie() -> String {
    format!(
        "session_id={}; token={}",
        random_alphanumeric(24),
        random_hex_lower(32)
    )
}

/// `<32-hex>:SL={0|1}:NR={1..999}:FG={0|1}`, the synthetic shape of a
/// Baidu-issued `BAIDUID` cookie.
fn generate_baiduid_value() -> String {
    let mut rng = rand::rng();
    let hex_part = random_hex_lower(32).to_uppercase();
    let sl = rng.random_range(0..=1);
    let nr = rng.random_range(1..=999);
    let fg = rng.random_range(0..=1);
    format!("{hex_part}:SL={sl}:NR={nr}:FG={fg}")
}

fn default_headers() -> HttpHeaders {
    let mut rng = rand::rng();
    let ua = RANDOM_USER_AGENTS[rng.random_range(0..RANDOM_USER_AGENTS.len())];
    let lang = ACCEPT_LANGUAGES[rng.random_range(0..ACCEPT_LANGUAGES.len())];

    let mut headers = HttpHeaders::new();
    headers.insert("User-Agent".into(), ua.to_string());
    headers.insert(
        "Accept".into(),
        "text/html,application/xhtml+xml,application/xml;application/json;q=0.9,image/webp,image/apng,*/*;q=0.8"
            .into(),
    );
    headers.insert("Accept-Encoding".into(), "identity".into());
    headers.insert("Accept-Language".into(), lang.to_string());
    headers.insert("Connection".into(), "keep-alive".into());
    headers.insert("Cookie".into(), generate_random_cookie());
    headers
}

fn cookie_lacks(headers: &HttpHeaders, marker: &str) -> bool {
    !headers
        .get("Cookie")
        .map(|c| c.contains(marker))
        .unwrap_or(false)
}

fn append_cookie(headers: &mut HttpHeaders, extra: &str) {
    let entry = headers.entry("Cookie".into()).or_insert_with(String::new);
    entry.push_str("; ");
    entry.push_str(extra);
}

/// Appends per-host anti-bot hints (Referer, Sec-Fetch-*, synthetic
/// tracking cookies) for the handful of search-engine families the
/// orchestrator talks to. Mirrors `WebUtils.get_enhanced_headers`.
fn apply_host_hints(headers: &mut HttpHeaders, host: &str) {
    if host.contains("baidu.com") || host.contains("baike.baidu.com") {
        headers.insert("Referer".into(), "https://www.baidu.com/".into());
        headers.insert("Sec-Fetch-Dest".into(), "document".into());
        headers.insert("Sec-Fetch-Mode".into(), "navigate".into());
        headers.insert("Sec-Fetch-Site".into(), "none".into());
        headers.insert("Sec-Fetch-User".into(), "?1".into());
        if cookie_lacks(headers, "BAIDUID") {
            let baiduid = generate_baiduid_value();
            append_cookie(headers, &format!("BAIDUID={baiduid}"));
        }
    }

    if host.contains("so.com") {
        headers.insert("Referer".into(), "https://www.so.com/".into());
        headers.insert("Sec-Fetch-Dest".into(), "document".into());
        headers.insert("Sec-Fetch-Mode".into(), "navigate".into());
        headers.insert("Sec-Fetch-Site".into(), "none".into());
        headers.insert("Sec-Fetch-User".into(), "?1".into());
        headers.insert("Connection".into(), "keep-alive".into());
        headers.insert("Priority".into(), "u=0, i".into());
        if cookie_lacks(headers, "QiHooGUID") {
            append_cookie(
                headers,
                "QiHooGUID=68676EB9A427AAEA16C4C1E8899D6209.1744163253954; \
                 __guid=15484592.58638361683777900.1744163254047.47; \
                 _S=11KMTkrjcvB4r9r54yEmpMUcRuub9JfSBnh+Cq00aekeo=; \
                 so_huid=11KMTkrjcvB4r9r54yEmpMUcRuub9JfSBnh%2BCq00aekeo%3D",
            );
        }
    }

    if host.contains("douban.com") {
        if cookie_lacks(headers, "bid") {
            append_cookie(headers, "bid=\"4mTU3-etpfY\"");
        }
        headers.insert("Referer".into(), "https://www.douban.com/".into());
        headers.insert("Sec-Fetch-Dest".into(), "document".into());
        headers.insert("Sec-Fetch-Mode".into(), "navigate".into());
        headers.insert("Sec-Fetch-Site".into(), "none".into());
        headers.insert("Sec-Fetch-User".into(), "?1".into());
    }

    if host.contains("movie.douban.com") {
        if cookie_lacks(headers, "__yadk_uid") {
            append_cookie(headers, "__yadk_uid=xhp8umkXwrifRJee6NIEDFwyPscmNndJ");
        }
        headers.insert("Referer".into(), "https://movie.douban.com/".into());
        headers.insert("Sec-Fetch-Dest".into(), "document".into());
        headers.insert("Sec-Fetch-Mode".into(), "navigate".into());
        headers.insert("Sec-Fetch-Site".into(), "none".into());
        headers.insert("Sec-Fetch-User".into(), "?1".into());
    }

    if host.contains("bing.com") {
        headers.insert("Referer".into(), "https://www.bing.com/".into());
        headers.insert("Sec-Fetch-Dest".into(), "document".into());
        headers.insert("Sec-Fetch-Mode".into(), "navigate".into());
        headers.insert("Sec-Fetch-Site".into(), "none".into());
        headers.insert("Sec-Fetch-User".into(), "?1".into());
        if cookie_lacks(headers, "_EDGE_V") {
            append_cookie(
                headers,
                "_EDGE_V=1; MUID=1234567890ABCDEF1234567890ABCDEF",
            );
        }
    }

    if host.contains("google.com") {
        headers.insert("Referer".into(), "https://www.google.com/".into());
        headers.insert("Sec-Fetch-Dest".into(), "document".into());
        headers.insert("Sec-Fetch-Mode".into(), "navigate".into());
        headers.insert("Sec-Fetch-Site".into(), "none".into());
        headers.insert("Sec-Fetch-User".into(), "?1".into());
        if cookie_lacks(headers, "NID") {
            append_cookie(headers, "NID=523=synthetic-nid-value-for-testing-only");
        }
    }

    if host.contains("sogou.com") {
        headers.insert("Referer".into(), "https://www.sogou.com/".into());
        headers.insert("Sec-Fetch-Dest".into(), "document".into());
        headers.insert("Sec-Fetch-Mode".into(), "navigate".into());
        headers.insert("Sec-Fetch-Site".into(), "same-origin".into());
        headers.insert("Connection".into(), "keep-alive".into());
    }

    if host.contains("duckduckgo.com") {
        headers.insert("Referer".into(), "https://duckduckgo.com/".into());
        headers.insert("Sec-Fetch-Dest".into(), "document".into());
        headers.insert("Sec-Fetch-Mode".into(), "navigate".into());
        headers.insert("Sec-Fetch-Site".into(), "none".into());
        headers.insert("Sec-Fetch-User".into(), "?1".into());
        if cookie_lacks(headers, "dcm") {
            append_cookie(headers, "dcm=1; __ddg1_=1234567890ABCDEF1234567890ABCDEF");
        }
    }
}

/// Produces a realistic, rotated request-header set from an optional target
/// URL and optional caller-supplied headers.
///
/// Idempotent on repeated calls with the same inputs except for randomized
/// components (UA, cookies, `BAIDUID` hex). Never raises.
pub fn enhance(url: Option<&str>, upstream_headers: Option<&HttpHeaders>) -> HttpHeaders {
    let mut headers = default_headers();

    if let Some(upstream) = upstream_headers {
        for (key, value) in upstream {
            let normalized = title_case_header(key);
            let lower = key.to_lowercase();
            if OVERRIDE_KEYS.contains(&lower.as_str()) {
                headers.insert(normalized, value.clone());
            } else {
                headers.entry(normalized).or_insert_with(|| value.clone());
            }
        }
    }

    if let Some(url) = url {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                apply_host_hints(&mut headers, host);
            }
        }
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_upstream_user_agent_verbatim() {
        let mut upstream = HttpHeaders::new();
        upstream.insert("User-Agent".into(), "my-custom-agent/1.0".into());
        let headers = enhance(None, Some(&upstream));
        assert_eq!(headers.get("User-Agent").unwrap(), "my-custom-agent/1.0");
    }

    #[test]
    fn passes_through_unrelated_upstream_headers() {
        let mut upstream = HttpHeaders::new();
        upstream.insert("X-Trace-Id".into(), "abc-123".into());
        let headers = enhance(None, Some(&upstream));
        assert_eq!(headers.get("X-Trace-Id").unwrap(), "abc-123");
    }

    #[test]
    fn applies_baidu_host_hints() {
        let headers = enhance(Some("https://www.baidu.com/s?wd=x"), None);
        assert_eq!(headers.get("Referer").unwrap(), "https://www.baidu.com/");
        assert!(headers.get("Cookie").unwrap().contains("BAIDUID"));
    }

    #[test]
    fn never_panics_on_malformed_url() {
        let headers = enhance(Some("not a url"), None);
        assert!(headers.contains_key("User-Agent"));
    }
}
