use crate::config::Capability;
use crate::facts::VersionRange;
use crate::stats::{DownloadStatsSummary, VersionDownloads};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::Display;

/// Everything known about one instrumentation plugin.
///
/// Fields that a step did not produce are `None`; why they are missing is recorded in
/// [`skipped`](Self::skipped) and [`failures`](Self::failures).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginRecord {
    pub root: Utf8PathBuf,

    pub files: PluginFiles,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrumentation_name: Option<String>,

    /// The npm package this plugin instruments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_range: Option<VersionRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tested_range: Option<VersionRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tav: Option<TavInfo>,

    /// Raw per-version download counts for [`name`](Self::name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<Vec<VersionDownloads>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<DownloadStatsSummary>,

    /// Steps the policy declined for this plugin.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Capability>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<PluginFailure>,

    /// npm script names from the manifest, filled in just before rendering.
    #[serde(skip)]
    pub scripts: BTreeMap<String, bool>,
}

impl PluginRecord {
    /// A record holding nothing but the plugin's location and raw files.
    #[must_use]
    pub fn new(root: Utf8PathBuf, files: PluginFiles) -> Self {
        Self {
            root,
            files,
            instrumentation_name: None,
            name: None,
            supported_range: None,
            tested_range: None,
            tav: None,
            downloads: None,
            stats: None,
            skipped: Vec::new(),
            failures: Vec::new(),
            scripts: BTreeMap::new(),
        }
    }

    /// The name to show for this plugin: the instrumented package, else the plugin's own name,
    /// else its directory.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.instrumentation_name.as_deref())
            .or_else(|| self.root.file_name())
            .unwrap_or_else(|| self.root.as_str())
    }

    /// Total downloads, with a missing summary counting as zero.
    #[must_use]
    pub fn total_downloads(&self) -> u64 {
        self.stats.as_ref().map_or(0, |stats| stats.sum)
    }

    pub fn record_failure(&mut self, stage: PipelineStage, error: &ohno::AppError) {
        log::error!(target: super::loader::LOG_TARGET, "{}: {stage} failed: {error}", self.display_name());
        self.failures.push(PluginFailure {
            stage,
            message: error.to_string(),
        });
    }

    /// Replace the scripts annotation with the script names found in the raw manifest.
    pub fn annotate_scripts(&mut self) {
        self.scripts = self
            .files
            .package_json
            .as_ref()
            .and_then(|manifest| manifest.get("scripts"))
            .and_then(serde_json::Value::as_object)
            .map(|scripts| scripts.keys().map(|name| (name.clone(), true)).collect())
            .unwrap_or_default();
    }
}

/// The raw files read from a plugin directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginFiles {
    pub package_json: Option<serde_json::Value>,
    pub readme: Option<String>,
}

/// State of a plugin's version test matrix setup.
///
/// The setup is `valid` only when the config file, the tool's devDependency, and the script
/// that runs it are all present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TavInfo {
    pub valid: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tav_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}

/// The pipeline step a per-plugin failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Manifest,
    Readme,
    TavConfig,
    TargetPackage,
    SupportedRange,
    TestedRange,
    Fetch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// A document could not be read or did not contain what was expected.
    Parse,

    /// Download statistics could not be retrieved.
    Fetch,
}

impl PipelineStage {
    #[must_use]
    pub const fn kind(self) -> FailureKind {
        match self {
            Self::Fetch => FailureKind::Fetch,
            Self::Manifest | Self::Readme | Self::TavConfig | Self::TargetPackage | Self::SupportedRange | Self::TestedRange => {
                FailureKind::Parse
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginFailure {
    pub stage: PipelineStage,
    pub message: String,
}
