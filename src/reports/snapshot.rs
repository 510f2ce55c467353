use crate::Result;
use crate::facts::PluginRecord;
use camino::Utf8Path;
use ohno::IntoAppError;
use std::fs;

const LOG_TARGET: &str = "  snapshot";

/// Read a snapshot written by [`save`].
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not hold a list of plugin records.
pub fn load(path: &Utf8Path) -> Result<Vec<PluginRecord>> {
    log::info!(target: LOG_TARGET, "Reading plugin data from {path}");
    let text = fs::read_to_string(path).into_app_err_with(|| format!("reading plugin data from {path}"))?;
    serde_json::from_str(&text).into_app_err_with(|| format!("parsing plugin data from {path}"))
}

/// Overwrite `path` with the records as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if the records cannot be serialized or the file cannot be written.
pub fn save(records: &[PluginRecord], path: &Utf8Path) -> Result<()> {
    let text = serde_json::to_string_pretty(records).into_app_err("serializing plugin data")?;
    fs::write(path, text).into_app_err_with(|| format!("writing plugin data to {path}"))?;
    log::info!(target: LOG_TARGET, "Wrote {} plugin records to {path}", records.len());
    Ok(())
}
