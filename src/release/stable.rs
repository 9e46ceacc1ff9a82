//! Stable release detection
//!
//! A stable release is tagged exactly `X.Y.Z` with single-digit components.
//! Entries coming from the version chooser inventory must also belong to the
//! core repository; tags from the public release feed carry no repository.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::release::types::Release;

static STABLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d\.\d\.\d$").expect("stable pattern is valid"));

/// Returns true if the tag has the stable `X.Y.Z` form
pub fn is_stable_tag(tag: &str) -> bool {
    STABLE_PATTERN.is_match(tag)
}

/// Filter releases down to unique stable tags, sorted newest first.
///
/// When `repository` is given, releases from other repositories are dropped.
/// Lexicographic order on `X.Y.Z` with single digits matches semver order.
pub fn filter_stable<'a>(
    releases: impl IntoIterator<Item = &'a Release>,
    repository: Option<&str>,
) -> Vec<String> {
    let unique: BTreeSet<&str> = releases
        .into_iter()
        .filter(|r| is_stable_tag(&r.tag) && repository.is_none_or(|repo| r.repository == repo))
        .map(|r| r.tag.as_str())
        .collect();

    unique.into_iter().rev().map(str::to_string).collect()
}

/// Filter bare tags (release feed entries) down to unique stable tags, newest first
pub fn filter_stable_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let unique: BTreeSet<&str> = tags.into_iter().filter(|t| is_stable_tag(t)).collect();
    unique.into_iter().rev().map(str::to_string).collect()
}
