use tracing::debug;

use super::directives::{Directive, DirectiveKind};

/// Directives that followed one `User-agent` marker.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleGroup {
    pub title: String,
    pub directives: Vec<Directive>,
}

/// Output of the segmenting pass: agent groups in source order plus the
/// top-level directives routed out of the stream.
#[derive(Debug, Default)]
pub struct Segments {
    pub groups: Vec<RuleGroup>,
    pub sitemaps: Vec<String>,
    pub unknown: Vec<String>,
}

/// Partition classified directives into rule groups at each user-agent marker.
///
/// Sitemap and unknown directives go to the top-level lists wherever they
/// appear. Rules with no named group to belong to (before the first marker,
/// or after a marker with an empty value) are dropped. Groups that share a
/// title are kept apart.
pub fn segment(directives: Vec<Directive>) -> Segments {
    let mut segments = Segments::default();
    let mut current: Option<RuleGroup> = None;

    for directive in directives {
        match directive.kind {
            DirectiveKind::Sitemap => segments.sitemaps.push(directive.value),
            DirectiveKind::Unknown { .. } => segments.unknown.push(directive.value),
            DirectiveKind::UserAgent => {
                if let Some(group) = current.take() {
                    segments.groups.push(group);
                }
                if directive.value.is_empty() {
                    debug!("user-agent marker without a name, rules until the next marker are dropped");
                } else {
                    current = Some(RuleGroup {
                        title: directive.value,
                        directives: Vec::new(),
                    });
                }
            }
            _ => match current.as_mut() {
                Some(group) => group.directives.push(directive),
                None => debug!(?directive, "dropping rule outside any user-agent group"),
            },
        }
    }

    if let Some(group) = current {
        segments.groups.push(group);
    }

    segments
}
