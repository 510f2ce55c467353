//! Read a plugin's version test matrix
//!
//! Plugins run their tests against many versions of the instrumented package with
//! `test-all-versions`, configured by a `.tav.yml` file next to `package.json`. This module
//! reports whether that setup is complete and which versions it covers.

use crate::Result;
use crate::config::Config;
use crate::facts::{Manifest, TavInfo, VersionRange};
use camino::Utf8Path;
use ohno::{EnrichableExt, IntoAppError, app_err};
use serde_json::Value;
use std::io;

/// Read the test matrix config file from a plugin directory.
///
/// A missing file is not an error and yields `Ok(None)`.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or is not valid YAML.
pub async fn read_tav_config(root: &Utf8Path, config: &Config) -> Result<Option<Value>> {
    let path = root.join(&config.tav_file);
    let text = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).into_app_err_with(|| format!("reading {path}")),
    };

    let value: Value = serde_yaml::from_str(&text).into_app_err_with(|| format!("parsing {path}"))?;
    Ok(Some(value).filter(|v| !v.is_null()))
}

/// Summarize the test matrix setup from the config file and the manifest.
#[must_use]
pub fn tav_info(tav_config: Option<Value>, manifest: &Manifest, config: &Config) -> TavInfo {
    let tav_version = manifest.dev_dependency(&config.tav_package).map(str::to_string);
    let script = manifest.script(&config.tav_package).map(str::to_string);

    TavInfo {
        valid: tav_config.is_some() && tav_version.is_some() && script.is_some(),
        config: tav_config,
        tav_version,
        script,
    }
}

/// The range of `package` versions the plugin tests against.
///
/// With a test matrix config, the package's entry is either a mapping with a `versions` range
/// or a list of such mappings, whose ranges are combined as alternatives. Without one, the
/// version pinned in `devDependencies` is used, or for configured packages the one in
/// `dependencies`.
///
/// # Errors
///
/// Returns an error if no source names a tested version, or the version found is not a valid
/// range.
pub fn tested_range(package: &str, manifest: &Manifest, tav_config: Option<&Value>, config: &Config) -> Result<VersionRange> {
    if let Some(tav_config) = tav_config {
        let text = tested_versions_from_tav_config(package, tav_config)?;
        return VersionRange::parse(&text).map_err(|e| e.enrich_with(|| format!("invalid tested range for {package} in {}", config.tav_file)));
    }

    if let Some(version) = manifest.dev_dependency(package) {
        return VersionRange::parse(version).map_err(|e| e.enrich_with(|| format!("invalid devDependency version for {package}")));
    }

    if config.has_dependency_fallback(package)
        && let Some(version) = manifest.dependency(package)
    {
        return VersionRange::parse(version).map_err(|e| e.enrich_with(|| format!("invalid dependency version for {package}")));
    }

    Err(app_err!("no tested version for {package}"))
}

fn tested_versions_from_tav_config(package: &str, tav_config: &Value) -> Result<String> {
    match tav_config.get(package) {
        Some(Value::Object(entry)) => {
            if let Some(Value::String(versions)) = entry.get("versions")
                && !versions.is_empty()
            {
                return Ok(versions.clone());
            }
        }
        Some(Value::Array(entries)) if !entries.is_empty() => {
            let versions: Option<Vec<&str>> = entries
                .iter()
                .map(|entry| entry.get("versions").and_then(Value::as_str).map(str::trim))
                .collect();
            if let Some(versions) = versions {
                return Ok(versions.join(" || "));
            }
        }
        _ => {}
    }

    Err(app_err!("unable to find tested versions for {package} in the test matrix config"))
}
