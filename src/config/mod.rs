//! Policy configuration
//!
//! The tool carries a handful of per-package special cases: README texts that describe their
//! supported versions in prose, plugin names that do not map directly to the instrumented
//! package, and plugins that must skip some steps altogether. All of these live in a
//! configuration file (with an embedded default) rather than in code, so new irregular
//! plugins can be handled without a rebuild.
//!
//! [`Capability`] names the steps that can be switched off per plugin; [`Config::allows`]
//! answers whether a given plugin may perform a given step.

mod capability;
#[expect(clippy::module_inception, reason = "config module contains Config type")]
mod config;

pub use capability::Capability;
pub use config::{Config, DEFAULT_CONFIG_YAML, Exclusions, ReadmeOverride};
