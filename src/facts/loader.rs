use super::package_identity::resolve_target_package;
use super::supported_range::find_supported_range;
use super::tav::{read_tav_config, tav_info, tested_range};
use super::{Manifest, PipelineStage, PluginFiles, PluginRecord, Resolution};
use crate::Result;
use crate::config::{Capability, Config};
use crate::stats::Provider;
use camino::{Utf8Path, Utf8PathBuf};
use futures::future::join_all;
use ohno::{IntoAppError, app_err};
use std::io;
use std::sync::Arc;

pub(crate) const LOG_TARGET: &str = "   plugins";

/// Builds a [`PluginRecord`] for every plugin directory.
#[derive(Debug, Clone)]
pub struct Loader {
    config: Arc<Config>,
    provider: Provider,
}

impl Loader {
    #[must_use]
    pub const fn new(config: Arc<Config>, provider: Provider) -> Self {
        Self { config, provider }
    }

    /// Load every subdirectory of `plugins_dir`, in directory listing order.
    ///
    /// Plugins are processed concurrently. A plugin whose files are missing or malformed still
    /// yields a record; only a plugins directory that cannot be listed is an error.
    pub async fn load_plugins(&self, plugins_dir: &Utf8Path) -> Result<Vec<PluginRecord>> {
        let roots = list_plugin_dirs(plugins_dir).await?;
        log::info!(target: LOG_TARGET, "Loading {} plugins from {plugins_dir}", roots.len());

        Ok(join_all(roots.into_iter().map(|root| {
            let loader = self.clone();
            tokio::spawn(async move { loader.load_plugin(root).await })
        }))
        .await
        .into_iter()
        .map(|task_result| task_result.expect("tasks must not panic"))
        .collect())
    }

    /// Load a single plugin directory.
    pub async fn load_plugin(&self, root: Utf8PathBuf) -> PluginRecord {
        let (files, problems) = load_files(&root).await;
        let mut record = PluginRecord::new(root, files);
        for (stage, e) in problems {
            record.record_failure(stage, &e);
        }

        let Some(package_json) = &record.files.package_json else {
            return record;
        };

        let manifest = match Manifest::from_value(package_json) {
            Ok(manifest) => manifest,
            Err(e) => {
                record.record_failure(PipelineStage::Manifest, &e);
                return record;
            }
        };

        let plugin = manifest.name.clone().unwrap_or_default();
        record.instrumentation_name.clone_from(&manifest.name);

        let tav_config = match read_tav_config(&record.root, &self.config).await {
            Ok(tav_config) => tav_config,
            Err(e) => {
                record.record_failure(PipelineStage::TavConfig, &e);
                None
            }
        };
        let tav = tav_info(tav_config, &manifest, &self.config);

        let readme = record.files.readme.as_deref();

        let target = if self.config.allows(Capability::TargetPackage, &plugin) {
            Resolution::from_result(resolve_target_package(&plugin, readme, &self.config))
        } else {
            Resolution::Skipped(Capability::TargetPackage)
        };

        let supported = if !self.config.allows(Capability::SupportedRange, &plugin) {
            Resolution::Skipped(Capability::SupportedRange)
        } else if let Some(readme) = readme {
            Resolution::from_result(find_supported_range(readme, &self.config.readme_overrides))
        } else {
            Resolution::Gated
        };

        let tested = supported.and_then(|_| {
            target.and_then(|name| Resolution::from_result(tested_range(name, &manifest, tav.config.as_ref(), &self.config)))
        });

        let downloads = match target.as_ref() {
            Some(name) if self.config.allows(Capability::FetchStats, &plugin) => {
                Resolution::from_result(self.provider.fetch(name).await)
            }
            Some(_) => Resolution::Skipped(Capability::FetchStats),
            None => Resolution::Gated,
        };

        record.tav = Some(tav);
        record.name = settle(&mut record, PipelineStage::TargetPackage, target);
        record.supported_range = settle(&mut record, PipelineStage::SupportedRange, supported);
        record.tested_range = settle(&mut record, PipelineStage::TestedRange, tested);
        record.downloads = settle(&mut record, PipelineStage::Fetch, downloads);

        log::info!(
            target: LOG_TARGET,
            "{}: tested range {}",
            record.display_name(),
            record.tested_range.as_ref().map_or("<none>", |range| range.as_str())
        );

        record
    }
}

/// Fold a step's outcome into the record, keeping skip reasons and failures.
fn settle<T>(record: &mut PluginRecord, stage: PipelineStage, resolution: Resolution<T>) -> Option<T> {
    match resolution {
        Resolution::Resolved(value) => Some(value),
        Resolution::Skipped(capability) => {
            record.skipped.push(capability);
            None
        }
        Resolution::Gated => None,
        Resolution::Failed(e) => {
            record.record_failure(stage, &e);
            None
        }
    }
}

async fn list_plugin_dirs(plugins_dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let absolute = std::path::absolute(plugins_dir).into_app_err_with(|| format!("resolving plugins directory {plugins_dir}"))?;
    let absolute = Utf8PathBuf::from_path_buf(absolute).map_err(|p| app_err!("plugins directory {} is not valid UTF-8", p.display()))?;

    let mut entries = tokio::fs::read_dir(&absolute)
        .await
        .into_app_err_with(|| format!("reading plugins directory {absolute}"))?;

    let mut roots = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .into_app_err_with(|| format!("reading plugins directory {absolute}"))?
    {
        let file_type = entry
            .file_type()
            .await
            .into_app_err_with(|| format!("inspecting {}", entry.path().display()))?;
        if !file_type.is_dir() {
            continue;
        }

        match Utf8PathBuf::from_path_buf(entry.path()) {
            Ok(path) => roots.push(path),
            Err(path) => log::warn!(target: LOG_TARGET, "Skipping plugin directory with non-UTF-8 name: {}", path.display()),
        }
    }

    Ok(roots)
}

/// Read `package.json` and `README.md`. Absent files are left out quietly; files that exist
/// but cannot be read or parsed are returned as failures for their stage.
async fn load_files(root: &Utf8Path) -> (PluginFiles, Vec<(PipelineStage, ohno::AppError)>) {
    let mut problems = Vec::new();

    let package_json_path = root.join("package.json");
    let package_json = match read_optional(&package_json_path).await {
        Ok(Some(text)) => match serde_json::from_str(&text).into_app_err_with(|| format!("parsing {package_json_path}")) {
            Ok(value) => Some(value),
            Err(e) => {
                problems.push((PipelineStage::Manifest, e));
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            problems.push((PipelineStage::Manifest, e));
            None
        }
    };

    let readme = match read_optional(&root.join("README.md")).await {
        Ok(readme) => readme,
        Err(e) => {
            problems.push((PipelineStage::Readme, e));
            None
        }
    };

    (PluginFiles { package_json, readme }, problems)
}

async fn read_optional(path: &Utf8Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!(target: LOG_TARGET, "Missing {path}");
            Ok(None)
        }
        Err(e) => Err(e).into_app_err_with(|| format!("reading {path}")),
    }
}
