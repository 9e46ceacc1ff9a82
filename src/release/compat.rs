use semver::Version;

/// Number of catalog entries offered when the running version is not semver
pub const FALLBACK_VERSION_COUNT: usize = 4;

/// Returns true if `candidate` belongs to the same release family as `current`.
///
/// Families share a major version; for 0.x releases the minor must match too.
pub fn is_compatible(current: &Version, candidate: &Version) -> bool {
    if current.major != candidate.major {
        return false;
    }
    current.major != 0 || current.minor == candidate.minor
}

/// Filter the catalog down to the versions that may be offered while `current` runs.
///
/// `stables` must already be sorted newest first; the order is preserved.
/// A pre-release `current` accepts every compatible candidate, otherwise only
/// candidates at or above `current` are kept. If `current` is not a semantic
/// version, the newest [`FALLBACK_VERSION_COUNT`] entries are returned.
pub fn enabled_versions(current: &str, stables: &[String]) -> Vec<String> {
    let Ok(current) = Version::parse(current) else {
        return stables
            .iter()
            .take(FALLBACK_VERSION_COUNT)
            .cloned()
            .collect();
    };

    let is_prerelease = !current.pre.is_empty();

    stables
        .iter()
        .filter(|stable| {
            Version::parse(stable).is_ok_and(|candidate| {
                is_compatible(&current, &candidate)
                    && (is_prerelease || candidate.cmp_precedence(&current).is_ge())
            })
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn stables(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case("1.2.0", &["2.0.0", "1.3.0", "1.2.0", "1.1.0", "0.9.0"], &["1.3.0", "1.2.0"])]
    #[case("1.3.0", &["2.0.0", "1.3.0", "1.2.0"], &["1.3.0"])]
    #[case("1.4.0", &["2.0.0", "1.3.0", "1.2.0"], &[])] // nothing compatible and newer
    #[case("2.0.0", &["2.1.0", "2.0.0", "1.9.0"], &["2.1.0", "2.0.0"])]
    #[case("0.2.1", &["1.0.0", "0.3.0", "0.2.5", "0.2.0"], &["0.2.5"])] // 0.x pins minor
    #[case("1.2.0+abc", &["1.3.0", "1.2.0"], &["1.3.0", "1.2.0"])] // build metadata ignored
    fn enabled_versions_for_stable_current(
        #[case] current: &str,
        #[case] catalog: &[&str],
        #[case] expected: &[&str],
    ) {
        assert_eq!(enabled_versions(current, &stables(catalog)), stables(expected));
    }

    #[test]
    fn enabled_versions_for_prerelease_current_skips_lower_bound() {
        let catalog = stables(&["2.0.0", "1.3.0", "1.2.0", "1.1.0", "0.9.0"]);

        let result = enabled_versions("1.2.0-rc1", &catalog);

        assert_eq!(result, stables(&["1.3.0", "1.2.0", "1.1.0"]));
    }

    #[rstest]
    #[case("not-a-version")]
    #[case("master")]
    #[case("1.2")]
    #[case("")]
    fn enabled_versions_falls_back_to_first_four(#[case] current: &str) {
        let catalog = stables(&["1.5.0", "1.4.0", "1.3.0", "1.2.0", "1.1.0", "1.0.0"]);

        let result = enabled_versions(current, &catalog);

        assert_eq!(result, stables(&["1.5.0", "1.4.0", "1.3.0", "1.2.0"]));
    }

    #[test]
    fn enabled_versions_fallback_with_short_catalog_returns_all() {
        let catalog = stables(&["1.1.0", "1.0.0"]);
        assert_eq!(enabled_versions("dev", &catalog), catalog);
    }

    #[test]
    fn enabled_versions_skips_unparseable_candidates() {
        let catalog = stables(&["1.3.0", "garbage", "1.2.0"]);
        assert_eq!(
            enabled_versions("1.2.0", &catalog),
            stables(&["1.3.0", "1.2.0"])
        );
    }

    #[test]
    fn enabled_versions_of_empty_catalog_is_empty() {
        assert!(enabled_versions("1.2.0", &[]).is_empty());
        assert!(enabled_versions("dev", &[]).is_empty());
    }
}
