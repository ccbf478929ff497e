use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// `[^:]*` stops at the first colon, so later colons stay in the value.
static KEY_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([^:]*):(.*)$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectiveKind {
    /// `User-agent`: opens a new rule group.
    UserAgent,
    Allow,
    Disallow,
    CrawlDelay,
    Sitemap,
    /// Anything else, with the key as written.
    Unknown { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub value: String,
}

impl Directive {
    pub fn is_marker(&self) -> bool {
        self.kind == DirectiveKind::UserAgent
    }
}

/// Classify every normalized line, in order.
pub fn classify_lines(lines: &[&str]) -> Vec<Directive> {
    lines.iter().map(|line| classify_line(line)).collect()
}

/// Split a line once on its first `:` and classify the key.
///
/// A line without a colon is kept as an unknown directive with an empty value.
pub fn classify_line(line: &str) -> Directive {
    let (key, value) = match KEY_VALUE_RE.captures(line) {
        Some(caps) => (
            caps.get(1).map_or("", |m| m.as_str()).trim(),
            caps.get(2).map_or("", |m| m.as_str()).trim(),
        ),
        None => (line.trim(), ""),
    };

    Directive {
        kind: classify_key(key),
        value: value.to_string(),
    }
}

fn classify_key(key: &str) -> DirectiveKind {
    match key.to_ascii_lowercase().as_str() {
        "user-agent" => DirectiveKind::UserAgent,
        "allow" => DirectiveKind::Allow,
        "disallow" => DirectiveKind::Disallow,
        "crawl-delay" => DirectiveKind::CrawlDelay,
        "sitemap" => DirectiveKind::Sitemap,
        _ => DirectiveKind::Unknown {
            key: key.to_string(),
        },
    }
}
