use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::directives::DirectiveKind;
use super::groups::RuleGroup;

/// Access rules for one user-agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub allow: Vec<String>,
    pub disallow: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
}

impl RuleSet {
    /// Crawl-delay in seconds, if present and numeric.
    pub fn delay_seconds(&self) -> Option<f64> {
        self.delay
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d >= 0.0)
    }
}

/// Build a `RuleSet` from one group's directives.
pub fn extract(group: &RuleGroup) -> RuleSet {
    let mut rules = RuleSet::default();

    for directive in &group.directives {
        match directive.kind {
            DirectiveKind::Allow => rules.allow.push(directive.value.clone()),
            DirectiveKind::Disallow => rules.disallow.push(directive.value.clone()),
            DirectiveKind::CrawlDelay => rules.delay = Some(directive.value.clone()),
            _ => {}
        }
    }

    rules
}

/// Extract every group; a later group replaces an earlier one with the same title.
pub fn extract_all(groups: &[RuleGroup]) -> BTreeMap<String, RuleSet> {
    let mut rulesets = BTreeMap::new();
    for group in groups {
        rulesets.insert(group.title.clone(), extract(group));
    }
    rulesets
}
