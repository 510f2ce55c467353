use crate::Result;
use ohno::IntoAppError;
use serde::Deserialize;
use std::collections::BTreeMap;

/// The parts of a plugin's `package.json` the pipeline looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,

    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
}

impl Manifest {
    /// Build the typed view from the raw JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not have the shape of a package manifest.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        Self::deserialize(value).into_app_err("interpreting package.json")
    }

    #[must_use]
    pub fn dev_dependency(&self, package: &str) -> Option<&str> {
        self.dev_dependencies.get(package).map(String::as_str)
    }

    #[must_use]
    pub fn dependency(&self, package: &str) -> Option<&str> {
        self.dependencies.get(package).map(String::as_str)
    }

    #[must_use]
    pub fn script(&self, name: &str) -> Option<&str> {
        self.scripts.get(name).map(String::as_str)
    }
}
