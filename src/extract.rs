// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use ego_tree::NodeRef;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Node, Selector};

const EXCLUDED_TAGS: [&str; 19] = [
    "script", "style", "head", "title", "meta", "nav", "footer", "header", "iframe", "noscript",
    "svg", "button", "input", "textarea", "select", "link", "img", "figure", "aside",
];

static MULTI_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());
static SPACE_BEFORE_PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+([.!?])").unwrap());
static BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s+\n").unwrap());

/// Advanced HTML-to-readable-text extraction. This is the default variant:
/// it removes non-content elements and comments, then applies whitespace
/// normalization rules in a fixed order.
///
/// Idempotent after the first pass: `extract(extract(html)) == extract(html)`.
pub fn extract(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut text = String::new();
    collect_text(document.tree.root(), &mut text);

    normalize_whitespace(text.trim())
}

/// Depth-first walk that skips entire subtrees rooted at an excluded tag
/// (and at comment nodes, which html5ever keeps separate from text nodes).
fn collect_text(node: NodeRef<Node>, out: &mut String) {
    match node.value() {
        Node::Element(element) if EXCLUDED_TAGS.contains(&element.name()) => return,
        Node::Comment(_) => return,
        Node::Text(text_node) => {
            let trimmed = text_node.trim();
            if !trimmed.is_empty() {
                out.push_str(trimmed);
                out.push('\n');
            }
            return;
        }
        _ => {}
    }

    for child in node.children() {
        collect_text(child, out);
    }
}

fn normalize_whitespace(text: &str) -> String {
    let text = MULTI_NEWLINE.replace_all(text, "\n\n");
    let text = MULTI_SPACE.replace_all(&text, " ");
    let text = SPACE_BEFORE_PUNCTUATION.replace_all(&text, "$1");
    let text = BLANK_LINE.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// A simpler variant that only skips a fixed parent-tag list rather than
/// decomposing the tree; kept for callers that accept looser output.
pub fn extract_simple(html: &str) -> String {
    let document = Html::parse_document(html);
    let selector = Selector::parse("body").unwrap_or_else(|_| Selector::parse("*").unwrap());
    let skip = ["style", "script", "head", "title", "meta"];

    let mut pieces = Vec::new();
    for root in document.select(&selector) {
        for text_node in root.text() {
            let trimmed = text_node.trim();
            if trimmed.is_empty() {
                continue;
            }
            pieces.push(trimmed.to_string());
        }
    }

    if pieces.is_empty() {
        for text_node in document.root_element().text() {
            let trimmed = text_node.trim();
            if !trimmed.is_empty() && !skip.contains(&trimmed) {
                pieces.push(trimmed.to_string());
            }
        }
    }

    pieces.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_and_collapses_blank_lines() {
        let html = "<html><script>x</script><p>Hello\n\n\nWorld</p></html>";
        assert_eq!(extract(html), "Hello\n\nWorld");
    }

    #[test]
    fn idempotent_after_first_pass() {
        let html = "<html><body><p>Hello   world</p><p>.  Again</p></body></html>";
        let once = extract(html);
        let twice = extract(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn removes_comments() {
        let html = "<html><body><!-- hidden --><p>Visible</p></body></html>";
        let text = extract(html);
        assert!(!text.contains("hidden"));
        assert!(text.contains("Visible"));
    }
}
