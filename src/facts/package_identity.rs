//! Work out which npm package an instrumentation plugin instruments

use crate::Result;
use crate::config::Config;
use ohno::app_err;
use regex::Regex;
use std::sync::LazyLock;

static README_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)This module provides(?: basic)? automatic instrumentation [\sa-z]+ \[`([^\]`]+)").expect("invalid regex")
});

/// Resolve the target package of a plugin.
///
/// The plugin's own name is tried first; the README is only consulted when the name alone
/// does not identify a single package.
///
/// # Errors
///
/// Returns an error if neither the name nor the README identify the package.
pub fn resolve_target_package(instrumentation_name: &str, readme: Option<&str>, config: &Config) -> Result<String> {
    if let Some(name) = package_from_instrumentation_name(instrumentation_name, config) {
        return Ok(name);
    }

    log::debug!(target: super::loader::LOG_TARGET, "No naive package name for {instrumentation_name}, looking at the README");

    let readme = readme.ok_or_else(|| app_err!("no README to take the instrumented package name of {instrumentation_name} from"))?;
    package_from_readme(readme)?.ok_or_else(|| app_err!("unable to work out the instrumented package of {instrumentation_name}"))
}

/// The package named by the part of `instrumentation_name` after the configured prefix.
///
/// Configured renames apply first. Otherwise the remainder must be a single word; a `-` means
/// it names something other than one package.
#[must_use]
pub fn package_from_instrumentation_name(instrumentation_name: &str, config: &Config) -> Option<String> {
    let suffix = instrumentation_name.strip_prefix(config.instrumentation_prefix.as_str())?;

    if let Some(renamed) = config.rename_for(suffix) {
        return Some(renamed.to_string());
    }

    if suffix.is_empty() || suffix.contains('-') {
        return None;
    }

    Some(suffix.to_string())
}

/// The package linked from the README's "This module provides automatic instrumentation for ..."
/// sentence.
///
/// # Errors
///
/// Returns an error if there is no such sentence. A link text containing whitespace is prose
/// rather than a package name and yields `Ok(None)`.
pub fn package_from_readme(readme: &str) -> Result<Option<String>> {
    let name = README_NAME_REGEX
        .captures(readme)
        .and_then(|captures| captures.get(1))
        .ok_or_else(|| app_err!("could not find the instrumented package name in the README"))?
        .as_str();

    if name.contains(char::is_whitespace) {
        log::debug!(target: super::loader::LOG_TARGET, "README names '{name}' rather than a package");
        return Ok(None);
    }

    Ok(Some(name.to_string()))
}
