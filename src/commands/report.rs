use super::Host;
use super::common::{ColorMode, LogLevel, init_logging};
use crate::Result;
use crate::config::Config;
use crate::facts::{FailureKind, Loader, PluginRecord};
use crate::reports::{generate_console, snapshot};
use crate::stats::{DownloadStatsSummary, Provider};
use camino::Utf8PathBuf;
use clap::Args;
use core::fmt::Write as _;
use ohno::{IntoAppError, app_err};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::sync::Arc;

const LOG_TARGET: &str = "    report";

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Directory holding one subdirectory per instrumentation plugin
    #[arg(long, value_name = "PATH", default_value = "../opentelemetry-js-contrib/plugins/node/")]
    pub plugins_dir: Utf8PathBuf,

    /// Snapshot file read by default and rewritten by `--reload`
    #[arg(long, value_name = "PATH", default_value = "./data.json")]
    pub data_file: Utf8PathBuf,

    /// Recompute everything from the plugins directory and rewrite the snapshot
    #[arg(long)]
    pub reload: bool,

    /// Show ranges, ratios and test matrix state in addition to download totals
    #[arg(long)]
    pub detailed: bool,

    /// Path to configuration file (default is `plugin-stats.yml` in the current directory)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    pub log_level: LogLevel,
}

pub async fn process_report<H: Host>(host: &mut H, args: &ReportArgs) -> Result<()> {
    init_logging(args.log_level);

    let records = if args.reload {
        let config = load_config(args)?;
        let records = recompute(config, args).await?;
        snapshot::save(&records, &args.data_file)?;
        records
    } else {
        snapshot::load(&args.data_file)?
    };

    let unresolved = unresolved_summary(&records);
    let records = prepare(records);

    let mut console_output = String::new();
    generate_console(&records, args.detailed, args.color.use_colors(), &mut console_output)?;
    let _ = write!(host.output(), "{console_output}");

    if let Some(unresolved) = unresolved {
        let _ = write!(host.error(), "{unresolved}");
    }

    Ok(())
}

fn load_config(args: &ReportArgs) -> Result<Config> {
    let cwd = std::env::current_dir().into_app_err("determining the current directory")?;
    let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(|path| app_err!("current directory '{}' is not valid UTF-8", path.display()))?;
    Config::load(&cwd, args.config.as_ref())
}

async fn recompute(config: Config, args: &ReportArgs) -> Result<Vec<PluginRecord>> {
    let provider = Provider::new(&config.downloads_base_url, &config.registry_base_url)?;
    let loader = Loader::new(Arc::new(config), provider);

    let mut records = loader.load_plugins(&args.plugins_dir).await?;
    for record in &mut records {
        if let Some(downloads) = &record.downloads {
            record.stats = Some(DownloadStatsSummary::reconcile(
                downloads,
                record.supported_range.as_ref(),
                record.tested_range.as_ref(),
            ));
        }
    }

    log::info!(target: LOG_TARGET, "Reconciled statistics for {} plugins", records.iter().filter(|r| r.stats.is_some()).count());
    Ok(records)
}

/// Annotate, drop plugins without a supported range, and order by total downloads.
fn prepare(records: Vec<PluginRecord>) -> Vec<PluginRecord> {
    let mut records: Vec<_> = records
        .into_iter()
        .filter_map(|mut record| {
            if record.supported_range.is_none() {
                log::debug!(target: LOG_TARGET, "Leaving {} out of the report: no supported range", record.display_name());
                return None;
            }
            record.annotate_scripts();
            Some(record)
        })
        .collect();

    records.sort_by_key(|record| core::cmp::Reverse(record.total_downloads()));
    records
}

/// One line counting failed plugins per kind of failure, followed by one line per failure.
fn unresolved_summary(records: &[PluginRecord]) -> Option<String> {
    let failed: Vec<_> = records.iter().filter(|record| !record.failures.is_empty()).collect();
    if failed.is_empty() {
        return None;
    }

    let mut by_kind: BTreeMap<FailureKind, usize> = BTreeMap::new();
    for record in &failed {
        let kinds: BTreeSet<_> = record.failures.iter().map(|f| f.stage.kind()).collect();
        for kind in kinds {
            *by_kind.entry(kind).or_default() += 1;
        }
    }

    let reasons = by_kind
        .iter()
        .map(|(kind, count)| format!("{kind}: {count}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut summary = format!("\nunresolved: {} plugins (reasons: {reasons})\n", failed.len());
    for record in failed {
        for failure in &record.failures {
            let _ = writeln!(
                summary,
                "  {}: {} ({}): {}",
                record.display_name(),
                failure.stage,
                failure.stage.kind(),
                failure.message
            );
        }
    }

    Some(summary)
}
