use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PLATFORM: &str = "unknown_platform";

/// One catalog entry describing a single downloadable target. Never mutated
/// after parsing; consumed exactly once by a single worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub url: String,
    pub platform: String,
    pub bounty: bool,
}

/// Maps any string to a filesystem-safe path segment: ASCII letters, digits,
/// `-` and `_` pass through, everything else becomes `_`.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

pub fn bounty_segment(bounty: bool) -> &'static str {
    if bounty { "bounty" } else { "no_bounty" }
}

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(https?://)?([A-Za-z0-9][A-Za-z0-9-]*[A-Za-z0-9]\.)+[A-Za-z]{2,6}(:[0-9]{1,5})?(/.*)?$",
    )
    .unwrap()
});

/// Syntactic gate only: a match says the string looks like a fetchable host
/// URL, not that the host is reachable.
pub fn is_valid_url(candidate: &str) -> bool {
    URL_RE.is_match(candidate)
}
