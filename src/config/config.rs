use crate::Result;
use crate::config::Capability;
use crate::facts::VersionRange;
use camino::{Utf8Path, Utf8PathBuf};
use ohno::{EnrichableExt, IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;

const LOG_TARGET: &str = "  config";

/// The default configuration YAML content, embedded from `default_config.yml`
pub const DEFAULT_CONFIG_YAML: &str = include_str!("../../default_config.yml");

/// A README whose supported versions are written in prose.
///
/// When `pattern` occurs anywhere in the README text, `range` is used instead of looking for a
/// "Supported Versions" section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReadmeOverride {
    pub pattern: String,
    pub range: VersionRange,
}

/// Plugins for which a given pipeline step is skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Exclusions {
    #[serde(default)]
    pub supported_range: Vec<String>,

    #[serde(default)]
    pub target_package: Vec<String>,

    #[serde(default)]
    pub fetch_stats: Vec<String>,
}

impl Exclusions {
    #[must_use]
    pub fn for_capability(&self, capability: Capability) -> &[String] {
        match capability {
            Capability::SupportedRange => &self.supported_range,
            Capability::TargetPackage => &self.target_package,
            Capability::FetchStats => &self.fetch_stats,
        }
    }
}

// Scalars and plain arrays come before the nested tables so the struct serializes cleanly to TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Common prefix of instrumentation plugin package names
    #[serde(default = "default_instrumentation_prefix")]
    pub instrumentation_prefix: String,

    /// Packages whose tested version may be taken from `dependencies`
    #[serde(default)]
    pub dependency_fallbacks: Vec<String>,

    /// Name of the version test matrix file in each plugin directory
    #[serde(default = "default_tav_file")]
    pub tav_file: String,

    /// Name of the version test matrix tool in `devDependencies` and `scripts`
    #[serde(default = "default_tav_package")]
    pub tav_package: String,

    /// Base URL of the per-version downloads API
    #[serde(default = "default_downloads_base_url")]
    pub downloads_base_url: String,

    /// Base URL of the package metadata registry
    #[serde(default = "default_registry_base_url")]
    pub registry_base_url: String,

    /// Plugin name suffixes that map to a differently named package
    #[serde(default)]
    pub package_renames: BTreeMap<String, String>,

    #[serde(default)]
    pub exclusions: Exclusions,

    #[serde(default)]
    pub readme_overrides: Vec<ReadmeOverride>,
}

fn default_instrumentation_prefix() -> String {
    "@opentelemetry/instrumentation-".to_string()
}

fn default_tav_file() -> String {
    ".tav.yml".to_string()
}

fn default_tav_package() -> String {
    "test-all-versions".to_string()
}

fn default_downloads_base_url() -> String {
    "https://api.npmjs.org".to_string()
}

fn default_registry_base_url() -> String {
    "https://registry.npmjs.org".to_string()
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// When no explicit path is given, `plugin-stats.{yml,yaml,toml,json}` is looked up in `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading plugin-stats configuration from {path}"))?;
            (path.clone(), text)
        } else {
            let candidates = [
                base_dir.join("plugin-stats.yml"),
                base_dir.join("plugin-stats.yaml"),
                base_dir.join("plugin-stats.toml"),
                base_dir.join("plugin-stats.json"),
            ];

            let mut found = None;
            for path in &candidates {
                match fs::read_to_string(path) {
                    Ok(text) => {
                        found = Some((path.clone(), text));
                        break;
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e).into_app_err_with(|| format!("reading plugin-stats configuration from {path}")),
                }
            }

            let Some(result) = found else {
                log::debug!(target: LOG_TARGET, "No configuration file found in {base_dir}, using defaults");
                return Ok(Self::default());
            };
            result
        };

        log::info!(target: LOG_TARGET, "Loading configuration from {final_path}");

        let extension = final_path.extension().unwrap_or_default();
        let config: Self = match extension {
            "toml" => toml::from_str(&text).into_app_err_with(|| format!("parsing TOML configuration from {final_path}"))?,
            "yml" | "yaml" => serde_yaml::from_str(&text).into_app_err_with(|| format!("parsing YAML configuration from {final_path}"))?,
            "json" => serde_json::from_str(&text).into_app_err_with(|| format!("parsing JSON configuration from {final_path}"))?,
            _ => return Err(app_err!("unsupported configuration file extension: {extension}")),
        };

        config
            .validate()
            .map_err(|e| e.enrich_with(|| format!("validating configuration from {final_path}")))?;

        Ok(config)
    }

    /// Save the default configuration to a file, picking the format from the extension
    ///
    /// YAML output keeps the comments of the embedded default.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        let extension = output_path.extension().unwrap_or_default();
        let text = match extension {
            "yml" | "yaml" => DEFAULT_CONFIG_YAML.to_string(),
            "toml" => toml::to_string_pretty(&Self::default())
                .into_app_err_with(|| format!("serializing configuration to TOML for saving to {output_path}"))?,
            "json" => serde_json::to_string_pretty(&Self::default())
                .into_app_err_with(|| format!("serializing configuration to JSON for saving to {output_path}"))?,
            _ => return Err(app_err!("unsupported configuration file extension: {extension}")),
        };

        fs::write(output_path, text).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Whether `plugin` may perform the given pipeline step.
    #[must_use]
    pub fn allows(&self, capability: Capability, plugin: &str) -> bool {
        let allowed = !self.exclusions.for_capability(capability).iter().any(|name| name == plugin);
        if !allowed {
            log::info!(target: LOG_TARGET, "Skipping {capability} for {plugin} as configured");
        }
        allowed
    }

    /// The configured rename for a plugin name suffix, if any.
    #[must_use]
    pub fn rename_for(&self, suffix: &str) -> Option<&str> {
        self.package_renames.get(suffix).map(String::as_str)
    }

    /// Whether `package` may fall back to `dependencies` for its tested version.
    #[must_use]
    pub fn has_dependency_fallback(&self, package: &str) -> bool {
        self.dependency_fallbacks.iter().any(|name| name == package)
    }

    fn validate(&self) -> Result<()> {
        if self.instrumentation_prefix.is_empty() {
            return Err(app_err!("instrumentation_prefix must not be empty"));
        }

        if self.tav_file.is_empty() {
            return Err(app_err!("tav_file must not be empty"));
        }

        if self.tav_package.is_empty() {
            return Err(app_err!("tav_package must not be empty"));
        }

        for (name, url) in [("downloads_base_url", &self.downloads_base_url), ("registry_base_url", &self.registry_base_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(app_err!("{name} must be an http(s) URL, got '{url}'"));
            }
        }

        if let Some(index) = self.readme_overrides.iter().position(|o| o.pattern.trim().is_empty()) {
            return Err(app_err!("readme_overrides[{index}] has an empty pattern"));
        }

        if let Some((suffix, _)) = self.package_renames.iter().find(|(_, target)| target.is_empty()) {
            return Err(app_err!("package_renames entry for '{suffix}' has an empty target"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        serde_yaml::from_str(DEFAULT_CONFIG_YAML).expect("default_config.yml should be valid YAML that deserializes to Config")
    }
}
