//! Disable-comment directives.
//!
//! A comment directly above a declaration suppresses checks for it:
//! ```text
//! # extra-checks-disable-next-line field-verbose-name, X061
//! # extra-checks-disable-next-line
//! ```
//! The bare form disables every check.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::check_id::CheckId;

const DISABLE_COMMENT_PATTERN: &str = r"^#\s*extra-checks-disable-next-line(?:\s+(.*))?$";

fn pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(DISABLE_COMMENT_PATTERN).ok())
        .as_ref()
}

/// Checks disabled for one source line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisabledChecks {
    all: bool,
    ids: BTreeSet<CheckId>,
}

impl DisabledChecks {
    /// Nothing disabled.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Everything disabled, including checks unknown to this build.
    #[must_use]
    pub fn all() -> Self {
        Self {
            all: true,
            ids: BTreeSet::new(),
        }
    }

    /// Whether `id` is disabled.
    #[must_use]
    pub fn contains(&self, id: CheckId) -> bool {
        self.all || self.ids.contains(&id)
    }

    /// Whether nothing is disabled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.all && self.ids.is_empty()
    }

    /// Adds everything disabled by `other`.
    pub fn union(&mut self, other: &DisabledChecks) {
        self.all |= other.all;
        self.ids.extend(other.ids.iter().copied());
    }
}

/// Parses one comment line. Returns `None` if it is not a directive.
///
/// Unknown names in the payload are ignored.
#[must_use]
pub fn parse_disable_comment(line: &str) -> Option<DisabledChecks> {
    let captures = pattern()?.captures(line.trim())?;
    let payload = captures.get(1).map_or("", |m| m.as_str());
    if payload.trim().is_empty() {
        return Some(DisabledChecks::all());
    }
    Some(DisabledChecks {
        all: false,
        ids: payload.split(',').filter_map(CheckId::find).collect(),
    })
}

/// Unions the directives found in `comments`.
pub fn disabled_checks<'a>(comments: impl IntoIterator<Item = &'a str>) -> DisabledChecks {
    let mut result = DisabledChecks::none();
    for line in comments {
        if let Some(found) = parse_disable_comment(line) {
            result.union(&found);
        }
    }
    result
}
