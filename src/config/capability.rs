use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// A pipeline step that the policy can switch off for individual plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Extract the supported version range from the plugin's README.
    SupportedRange,

    /// Work out which package the plugin instruments.
    TargetPackage,

    /// Download statistics for the instrumented package.
    FetchStats,
}
