//! Download statistics for npm packages
//!
//! The [`Provider`] fetches last week's per-version download counts for a package from the
//! npm downloads API, and flags versions the registry marks as deprecated or no longer lists.
//! [`filter`] and [`sum_downloads`] slice those observations by a [`VersionRange`], and
//! [`DownloadStatsSummary::reconcile`] turns them into the totals and ratios the report shows.
//!
//! [`VersionRange`]: crate::facts::VersionRange

mod provider;
mod summary;
mod version_downloads;

pub use provider::Provider;
pub use summary::{DownloadStatsSummary, format_ratio, round};
pub use version_downloads::{FilterOptions, VersionDownloads, filter, sum_downloads};
