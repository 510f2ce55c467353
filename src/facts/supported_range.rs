//! Extract the supported version range from a plugin's README

use crate::Result;
use crate::config::ReadmeOverride;
use crate::facts::VersionRange;
use ohno::app_err;
use regex::Regex;
use std::sync::LazyLock;

static SECTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)#+ Supported Versions\r?\n([^#]+)").expect("invalid regex"));

/// Find the version range a README claims to support.
///
/// Overrides are consulted first, in order; the first pattern found anywhere in the text
/// wins. Otherwise the text between a "Supported Versions" heading and the next heading is
/// taken, stripped of surrounding whitespace, list dashes and backticks.
///
/// # Errors
///
/// Returns an error if no override applies and there is no such section, or if the section
/// is not a valid version range.
pub fn find_supported_range(readme: &str, overrides: &[ReadmeOverride]) -> Result<VersionRange> {
    if let Some(entry) = overrides.iter().find(|o| readme.contains(o.pattern.as_str())) {
        return Ok(entry.range.clone());
    }

    let section = SECTION_REGEX
        .captures(readme)
        .and_then(|captures| captures.get(1))
        .ok_or_else(|| app_err!("could not find a 'Supported Versions' section"))?
        .as_str();

    let text = trim_decorations(section);
    if text.is_empty() {
        return Err(app_err!("the 'Supported Versions' section is empty"));
    }

    VersionRange::parse(text)
}

fn trim_decorations(text: &str) -> &str {
    text.trim_matches(|c: char| c == '-' || c == '`' || c.is_whitespace())
}
