use once_cell::sync::Lazy;
use regex::Regex;

static SEMVER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?(?:\+[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?$",
    )
    .expect("semver pattern is valid")
});

/// `MAJOR.MINOR.PATCH` with optional `-prerelease` and `+build` suffixes.
pub fn is_semver(value: &str) -> bool {
    SEMVER.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_release_and_suffixes() {
        assert!(is_semver("3.0.0"));
        assert!(is_semver("1.2.3-beta.1"));
        assert!(is_semver("1.2.3+build.7"));
        assert!(is_semver("0.10.2-rc.1+sha.abc"));
    }

    #[test]
    fn test_rejects_partial_versions() {
        assert!(!is_semver("3.0"));
        assert!(!is_semver("v3.0.0"));
        assert!(!is_semver("01.0.0"));
        assert!(!is_semver(""));
        assert!(!is_semver("1.0.0 "));
    }
}
