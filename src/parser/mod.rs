pub mod directives;
pub mod groups;
pub mod lines;
pub mod rules;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, RobotsError};
pub use rules::RuleSet;

/// Everything one robots.txt document declares.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub rulesets: BTreeMap<String, RuleSet>,
    pub sitemaps: Vec<String>,
    pub unknown: Vec<String>,
}

impl ParseResult {
    /// Rules for `agent`, matching the group title case-insensitively.
    pub fn ruleset(&self, agent: &str) -> Option<&RuleSet> {
        self.rulesets.get(agent).or_else(|| {
            self.rulesets
                .iter()
                .find(|(title, _)| title.eq_ignore_ascii_case(agent))
                .map(|(_, rules)| rules)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rulesets.is_empty() && self.sitemaps.is_empty() && self.unknown.is_empty()
    }
}

/// Four-pass pipeline: text → lines → directives → groups → rulesets.
pub fn parse(text: &str) -> ParseResult {
    let lines = lines::normalize(text);
    let directives = directives::classify_lines(&lines);
    let segments = groups::segment(directives);
    let rulesets = rules::extract_all(&segments.groups);

    debug!(
        lines = lines.len(),
        groups = segments.groups.len(),
        rulesets = rulesets.len(),
        sitemaps = segments.sitemaps.len(),
        unknown = segments.unknown.len(),
        "parsed robots.txt"
    );

    ParseResult {
        rulesets,
        sitemaps: segments.sitemaps,
        unknown: segments.unknown,
    }
}

/// Parse raw bytes, rejecting anything that is not UTF-8 text.
pub fn parse_bytes(bytes: &[u8]) -> Result<ParseResult> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| RobotsError::InvalidInput(format!("robots.txt is not UTF-8 text: {}", e)))?;
    Ok(parse(text.strip_prefix('\u{feff}').unwrap_or(text)))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> ParseResult {
        let text = std::fs::read_to_string(format!("tests/fixtures/{}.txt", name)).unwrap();
        parse(&text)
    }

    #[test]
    fn basic_document() {
        let r = parse(
            "User-agent: *\nDisallow: /admin\nAllow: /admin/public\nSitemap: https://example.com/sitemap.xml",
        );
        assert_eq!(r.rulesets.len(), 1);
        assert_eq!(r.rulesets["*"].allow, vec!["/admin/public"]);
        assert_eq!(r.rulesets["*"].disallow, vec!["/admin"]);
        assert_eq!(r.rulesets["*"].delay, None);
        assert_eq!(r.sitemaps, vec!["https://example.com/sitemap.xml"]);
        assert!(r.unknown.is_empty());
    }

    #[test]
    fn blank_and_comment_only() {
        assert!(parse("").is_empty());
        assert!(parse("# nothing here\n\n   \n# still nothing").is_empty());
    }

    #[test]
    fn same_title_last_group_wins() {
        let r = parse("User-agent: bot\nDisallow: /a\nUser-agent: bot\nDisallow: /b");
        assert_eq!(
            r.rulesets["bot"],
            RuleSet {
                allow: vec![],
                disallow: vec!["/b".into()],
                delay: None,
            }
        );
    }

    #[test]
    fn crawl_delay_overwrite() {
        let r = parse("User-agent: x\nCrawl-delay: 5\nCrawl-delay: 10");
        assert_eq!(r.rulesets["x"].delay.as_deref(), Some("10"));
    }

    #[test]
    fn unknown_without_agent() {
        let r = parse("Foo: bar");
        assert_eq!(r.unknown, vec!["bar"]);
        assert!(r.rulesets.is_empty());
    }

    // Whitespace before the colon is tolerated for every key, not only user-agent.
    #[test]
    fn space_before_colon() {
        let r = parse("User-agent : bot\nDisallow : /x\nAllow :/y\nCrawl-delay : 2\nSitemap : https://example.com/s.xml");
        assert_eq!(r.rulesets["bot"].disallow, vec!["/x"]);
        assert_eq!(r.rulesets["bot"].allow, vec!["/y"]);
        assert_eq!(r.rulesets["bot"].delay.as_deref(), Some("2"));
        assert_eq!(r.sitemaps, vec!["https://example.com/s.xml"]);
        assert!(r.unknown.is_empty());
    }

    #[test]
    fn deterministic() {
        let text = std::fs::read_to_string("tests/fixtures/wild.txt").unwrap();
        assert_eq!(parse(&text), parse(&text));
    }

    #[test]
    fn values_come_from_input_in_order() {
        let text = std::fs::read_to_string("tests/fixtures/wild.txt").unwrap();
        let r = parse(&text);
        let source: Vec<&str> = text
            .lines()
            .filter_map(|l| l.split_once(':'))
            .filter(|(k, _)| k.trim().eq_ignore_ascii_case("disallow"))
            .map(|(_, v)| v.trim())
            .collect();

        for rules in r.rulesets.values() {
            let mut from = 0;
            for value in &rules.disallow {
                let pos = source[from..]
                    .iter()
                    .position(|s| *s == value.as_str())
                    .unwrap_or_else(|| panic!("{} missing or out of order", value));
                from += pos + 1;
            }
        }
    }

    #[test]
    fn wild_fixture() {
        let r = fixture("wild");
        assert_eq!(
            r.rulesets["*"].disallow,
            vec!["/admin/", "/cgi/", "/beta/", "/*/comments/*/", "/*.embed"]
        );
        assert!(r.rulesets["008"].disallow.is_empty());
        assert_eq!(r.rulesets["voltron"].disallow, vec!["/"]);
        assert_eq!(r.rulesets["bender"].disallow, vec!["/my_shiny_metal_ass"]);
        assert_eq!(r.rulesets["bender"].delay.as_deref(), Some("2.5"));
        assert_eq!(
            r.sitemaps,
            vec![
                "https://www.example.web/sitemaps/sitemap-section.xml",
                "https://www.example.web/sitemaps/foo/index.xml",
            ]
        );
        assert_eq!(r.unknown, vec!["www.example.web"]);
    }

    #[test]
    fn stripe_fixture() {
        let r = fixture("stripe");
        assert_eq!(r.rulesets.len(), 3);
        assert_eq!(r.rulesets["Googlebot"].allow, vec!["/docs/"]);
        assert_eq!(r.rulesets["Bingbot"].delay.as_deref(), Some("1"));
        assert!(r.sitemaps.iter().all(|s| s.starts_with("https://stripe.example/")));
        // Leading Disallow before any agent is dropped
        assert!(r
            .rulesets
            .values()
            .all(|rules| !rules.disallow.contains(&"/before-agent".to_string())));
    }

    #[test]
    fn ruleset_lookup_ignores_case() {
        let r = fixture("stripe");
        assert!(r.ruleset("googlebot").is_some());
        assert!(r.ruleset("GOOGLEBOT").is_some());
        assert!(r.ruleset("DuckDuckBot").is_none());
    }

    #[test]
    fn parse_bytes_rejects_non_utf8() {
        let err = parse_bytes(&[0x55, 0x73, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, RobotsError::InvalidInput(_)));
    }

    #[test]
    fn parse_bytes_strips_bom() {
        let r = parse_bytes("\u{feff}User-agent: *\nDisallow: /".as_bytes()).unwrap();
        assert_eq!(r.rulesets["*"].disallow, vec!["/"]);
    }

    #[test]
    fn json_shape() {
        let r = parse("User-agent: *\nDisallow: /x\nUser-agent: slow\nCrawl-delay: 3");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["rulesets"]["*"]["disallow"][0], "/x");
        assert!(json["rulesets"]["*"].get("delay").is_none());
        assert_eq!(json["rulesets"]["slow"]["delay"], "3");
        assert_eq!(json["sitemaps"], serde_json::json!([]));
    }
}
