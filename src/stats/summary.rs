use super::{FilterOptions, VersionDownloads, filter, sum_downloads};
use crate::facts::VersionRange;
use serde::{Deserialize, Serialize};

/// How a package's downloads split across a plugin's supported and tested ranges.
///
/// `tested_supported` counts downloads of versions in both ranges, so it never exceeds
/// `supported` or `tested`, and none of the three exceeds `sum`. Ratios are percentages with
/// one decimal; `tested_supported_ratio` is relative to `supported`, the others to `sum`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadStatsSummary {
    pub sum: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tested: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tested_supported: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_ratio: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tested_ratio: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tested_supported_ratio: Option<f64>,
}

impl DownloadStatsSummary {
    /// Compute the summary for a set of observations. A missing range leaves its counts unset.
    #[must_use]
    pub fn reconcile(stats: &[VersionDownloads], supported_range: Option<&VersionRange>, tested_range: Option<&VersionRange>) -> Self {
        let sum = sum_downloads(stats);

        let supported_subset = supported_range.map(|range| subset(stats, range));
        let supported = supported_subset.as_deref().map(sum_downloads);
        let tested = tested_range.map(|range| sum_downloads(&subset(stats, range)));
        let tested_supported = supported_subset
            .as_deref()
            .zip(tested_range)
            .map(|(supported_subset, range)| sum_downloads(&subset(supported_subset, range)));

        Self {
            sum,
            supported,
            tested,
            tested_supported,
            supported_ratio: format_ratio(supported, Some(sum)),
            tested_ratio: format_ratio(tested, Some(sum)),
            tested_supported_ratio: format_ratio(tested_supported, supported),
        }
    }
}

fn subset(stats: &[VersionDownloads], range: &VersionRange) -> Vec<VersionDownloads> {
    filter(stats, FilterOptions { range, show_deprecated: true })
}

/// `part` as a percentage of `whole`, rounded to one decimal.
///
/// A missing or zero `whole` gives `None`; a missing `part` counts as zero.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "download counts stay far below 2^52")]
pub fn format_ratio(part: Option<u64>, whole: Option<u64>) -> Option<f64> {
    let whole = whole.filter(|&w| w > 0)?;
    let part = part.unwrap_or(0);
    Some(round(100.0 * part as f64 / whole as f64, 1))
}

/// Round half away from zero to `decimals` places, nudged by `f64::EPSILON` so values such as
/// `1.005` land on the expected side.
#[must_use]
pub fn round(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    ((value + f64::EPSILON) * factor).round() / factor
}
