//! npm-flavored semantic version ranges on top of the `semver` crate

use crate::Result;
use core::fmt::{Display, Formatter, Result as FmtResult};
use core::str::FromStr;
use ohno::{IntoAppError, app_err};
use semver::{Version, VersionReq};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const OPERATOR_CHARS: &[char] = &['<', '>', '=', '^', '~'];

/// A version range written in npm syntax, such as `>=1.2.0 <3.0.0 || ^4`.
///
/// Every `||`-separated alternative is compiled into a [`VersionReq`]; a version satisfies the
/// range when it satisfies any alternative. The original text is kept verbatim for display and
/// serialization.
///
/// npm and Cargo disagree on a few spellings, so alternatives are translated before being handed
/// to `semver`:
/// - comparators are separated by whitespace instead of commas
/// - a bare version (`4.17.1`, `7`) is an exact match or x-range, not a caret requirement
/// - hyphen ranges (`1.2.3 - 2.3`) expand to an inclusive lower and upper bound
/// - x-ranges (`1.x`, `1.2.*`) and a leading `v` are accepted
/// - `<*` and `>*` are accepted and admit no version, as `<0.0.0-0` does in npm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    text: String,
    alternatives: Vec<VersionReq>,
}

impl VersionRange {
    /// Parse an npm range expression.
    ///
    /// # Errors
    ///
    /// Returns an error if any alternative is not a valid comparator set.
    pub fn parse(text: &str) -> Result<Self> {
        let alternatives = text
            .split("||")
            .map(compile_comparator_set)
            .collect::<Result<Vec<_>>>()
            .map_err(|e| app_err!("invalid version range '{text}': {e}"))?;

        Ok(Self {
            text: text.to_string(),
            alternatives,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    /// Like [`Self::matches`], for a version that has not been parsed yet. Strings that are not
    /// valid semantic versions never match.
    #[must_use]
    pub fn matches_str(&self, version: &str) -> bool {
        Version::parse(version.trim()).is_ok_and(|v| self.matches(&v))
    }
}

impl FromStr for VersionRange {
    type Err = ohno::AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Display for VersionRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.text)
    }
}

impl Serialize for VersionRange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for VersionRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(D::Error::custom)
    }
}

fn compile_comparator_set(set: &str) -> Result<VersionReq> {
    let set = set.trim();

    let comparators = if let Some((lower, upper)) = set.split_once(" - ") {
        hyphen_comparators(lower, upper)
    } else {
        let mut comparators = Vec::new();
        for token in tokenize(set) {
            if let Some(comparator) = translate_comparator(&token)? {
                comparators.push(comparator);
            }
        }
        comparators
    };

    if comparators.is_empty() {
        return Ok(VersionReq::STAR);
    }

    VersionReq::parse(&comparators.join(", ")).into_app_err_with(|| format!("'{set}' is not a valid comparator set"))
}

fn hyphen_comparators(lower: &str, upper: &str) -> Vec<String> {
    let mut comparators = Vec::with_capacity(2);
    if let Some(version) = normalize_version(lower.trim()) {
        comparators.push(format!(">={version}"));
    }
    if let Some(version) = normalize_version(upper.trim()) {
        comparators.push(format!("<={version}"));
    }
    comparators
}

/// Split a comparator set on whitespace, gluing a detached operator (`>= 1.2.3`) to its version.
fn tokenize(set: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut pending_op = String::new();

    for word in set.split_whitespace() {
        if word.chars().all(|c| OPERATOR_CHARS.contains(&c)) {
            pending_op.push_str(word);
            continue;
        }

        tokens.push(format!("{pending_op}{word}"));
        pending_op.clear();
    }

    if !pending_op.is_empty() {
        tokens.push(pending_op);
    }

    tokens
}

/// Translate one npm comparator into `semver` syntax. `None` means the comparator admits every version.
fn translate_comparator(token: &str) -> Result<Option<String>> {
    let version_start = token.find(|c: char| !OPERATOR_CHARS.contains(&c)).unwrap_or(token.len());
    let (op, version) = token.split_at(version_start);

    let op = match op {
        "" | "=" => "=",
        "~>" => "~",
        "<" | "<=" | ">" | ">=" | "^" | "~" => op,
        _ => return Err(app_err!("unsupported operator '{op}' in '{token}'")),
    };

    match normalize_version(version) {
        Some(version) => Ok(Some(format!("{op}{version}"))),
        None if matches!(op, "=" | ">=" | "<=" | "^" | "~") => Ok(None),
        // `<*` and `>*` are valid but admit nothing
        None => Ok(Some("<0.0.0-0".to_string())),
    }
}

/// Strip a leading `v` and cut the version at its first wildcard component.
///
/// Returns `None` when nothing but wildcards remain (`*`, `x`, `1.x` keeps `1`).
fn normalize_version(text: &str) -> Option<String> {
    let text = text.trim_start_matches(['v', 'V']);
    let (core, suffix) = text.find(['-', '+']).map_or((text, ""), |index| text.split_at(index));

    let mut parts = Vec::new();
    for part in core.split('.') {
        if matches!(part, "" | "x" | "X" | "*") {
            return if parts.is_empty() { None } else { Some(parts.join(".")) };
        }
        parts.push(part);
    }

    Some(format!("{}{suffix}", parts.join(".")))
}
