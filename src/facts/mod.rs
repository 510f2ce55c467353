//! Per-plugin data extraction
//!
//! Each plugin directory holds a `package.json`, a `README.md`, and usually a test matrix
//! config. From these the [`Loader`] derives one [`PluginRecord`] per plugin:
//!
//! - **Target package**: which npm package the plugin instruments, from its own name or from
//!   its README ([`package_identity`])
//! - **Supported range**: the versions its README claims to support ([`supported_range`])
//! - **Tested range**: the versions its test matrix or devDependencies cover ([`tav`])
//! - **Downloads**: per-version download counts of the target package
//!
//! Every step runs only when the policy allows it and the steps it depends on produced a
//! value; each outcome is tracked as a [`Resolution`]. Failures stay with the plugin they
//! belong to and never abort the batch.

mod loader;
mod manifest;
pub mod package_identity;
mod plugin_record;
mod resolution;
pub mod supported_range;
pub mod tav;
mod version_range;

pub use loader::Loader;
pub use manifest::Manifest;
pub use plugin_record::{FailureKind, PipelineStage, PluginFailure, PluginFiles, PluginRecord, TavInfo};
pub use resolution::Resolution;
pub use version_range::VersionRange;
