use crate::facts::VersionRange;
use serde::{Deserialize, Serialize};

/// Downloads of one published version of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDownloads {
    pub version: String,
    pub downloads: u64,

    #[serde(default, skip_serializing_if = "core::ops::Not::not")]
    pub deprecated: bool,

    /// The version shows up in the download counts but the registry no longer lists it.
    #[serde(default, skip_serializing_if = "core::ops::Not::not")]
    pub unpublished: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct FilterOptions<'a> {
    pub range: &'a VersionRange,

    /// Keep deprecated and unpublished versions.
    pub show_deprecated: bool,
}

/// The observations whose version lies in `options.range`.
///
/// Versions that are not valid semantic versions never match.
#[must_use]
pub fn filter(stats: &[VersionDownloads], options: FilterOptions<'_>) -> Vec<VersionDownloads> {
    stats
        .iter()
        .filter(|entry| options.show_deprecated || !(entry.deprecated || entry.unpublished))
        .filter(|entry| options.range.matches_str(&entry.version))
        .cloned()
        .collect()
}

#[must_use]
pub fn sum_downloads(stats: &[VersionDownloads]) -> u64 {
    stats.iter().map(|entry| entry.downloads).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(version: &str, downloads: u64) -> VersionDownloads {
        VersionDownloads {
            version: version.to_string(),
            downloads,
            deprecated: false,
            unpublished: false,
        }
    }

    #[test]
    fn test_filter_by_range() {
        let stats = vec![entry("1.0.0", 100), entry("2.0.0", 300), entry("2.5.1", 50)];
        let range = VersionRange::parse(">=2.0.0").unwrap();

        let subset = filter(&stats, FilterOptions { range: &range, show_deprecated: true });
        assert_eq!(subset.len(), 2);
        assert_eq!(sum_downloads(&subset), 350);
    }

    #[test]
    fn test_filter_drops_deprecated_unless_shown() {
        let mut old = entry("2.0.0", 300);
        old.deprecated = true;
        let mut gone = entry("2.1.0", 20);
        gone.unpublished = true;
        let stats = vec![old, gone, entry("2.2.0", 5)];
        let range = VersionRange::parse("^2").unwrap();

        assert_eq!(sum_downloads(&filter(&stats, FilterOptions { range: &range, show_deprecated: true })), 325);
        assert_eq!(sum_downloads(&filter(&stats, FilterOptions { range: &range, show_deprecated: false })), 5);
    }

    #[test]
    fn test_invalid_versions_never_match() {
        let stats = vec![entry("latest", 1000), entry("1.0.0", 1)];
        let range = VersionRange::parse("*").unwrap();
        assert_eq!(sum_downloads(&filter(&stats, FilterOptions { range: &range, show_deprecated: true })), 1);
    }

    #[test]
    fn test_sum_empty() {
        assert_eq!(sum_downloads(&[]), 0);
    }

    #[test]
    fn test_serde_omits_false_flags() {
        let json = serde_json::to_value(entry("1.0.0", 7)).unwrap();
        assert_eq!(json, serde_json::json!({ "version": "1.0.0", "downloads": 7 }));

        let mut flagged = entry("1.0.0", 7);
        flagged.deprecated = true;
        let json = serde_json::to_string(&flagged).unwrap();
        let back: VersionDownloads = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flagged);
    }
}
