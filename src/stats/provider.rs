use super::VersionDownloads;
use crate::Result;
use ohno::{IntoAppError, app_err};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::StatusCode;
use semver::Version;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;

const LOG_TARGET: &str = "     stats";

/// Characters left as-is in a package name path segment. Everything else, including the `/` of
/// scoped names, is percent-encoded.
const PACKAGE_NAME: &AsciiSet = &NON_ALPHANUMERIC.remove(b'@').remove(b'-').remove(b'.').remove(b'_').remove(b'~');

const ABBREVIATED_METADATA: &str = "application/vnd.npm.install-v1+json";

#[derive(Debug, Deserialize)]
struct DownloadsResponse {
    #[serde(default)]
    downloads: BTreeMap<String, u64>,
}

#[derive(Debug, Deserialize)]
struct RegistryResponse {
    #[serde(default)]
    versions: BTreeMap<String, RegistryVersion>,
}

#[derive(Debug, Deserialize)]
struct RegistryVersion {
    #[serde(default)]
    deprecated: Option<serde_json::Value>,
}

impl RegistryVersion {
    fn is_deprecated(&self) -> bool {
        match &self.deprecated {
            Some(serde_json::Value::String(message)) => !message.is_empty(),
            Some(serde_json::Value::Bool(flag)) => *flag,
            _ => false,
        }
    }
}

/// Fetches per-version download counts from npm.
#[derive(Debug, Clone)]
pub struct Provider {
    client: Arc<reqwest::Client>,
    downloads_base_url: Arc<str>,
    registry_base_url: Arc<str>,
}

impl Provider {
    /// Create a provider talking to the given API endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(downloads_base_url: &str, registry_base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("plugin-stats/", env!("CARGO_PKG_VERSION")))
            .build()
            .into_app_err("unable to create HTTP client")?;

        Ok(Self {
            client: Arc::new(client),
            downloads_base_url: Arc::from(downloads_base_url.trim_end_matches('/')),
            registry_base_url: Arc::from(registry_base_url.trim_end_matches('/')),
        })
    }

    /// Last week's downloads of every version of `package`, in version order.
    ///
    /// # Errors
    ///
    /// Returns an error if the package is unknown or either endpoint cannot be queried.
    pub async fn fetch(&self, package: &str) -> Result<Vec<VersionDownloads>> {
        let encoded = utf8_percent_encode(package, PACKAGE_NAME).to_string();

        log::info!(target: LOG_TARGET, "Querying download statistics for {package}");

        let downloads_url = format!("{}/versions/{encoded}/last-week", self.downloads_base_url);
        let registry_url = format!("{}/{encoded}", self.registry_base_url);

        let (downloads, registry) = tokio::try_join!(
            self.get_json::<DownloadsResponse>(&downloads_url, package, None),
            self.get_json::<RegistryResponse>(&registry_url, package, Some(ABBREVIATED_METADATA)),
        )?;

        let mut stats: Vec<_> = downloads
            .downloads
            .into_iter()
            .map(|(version, count)| {
                let listed = registry.versions.get(&version);
                VersionDownloads {
                    deprecated: listed.is_some_and(RegistryVersion::is_deprecated),
                    unpublished: listed.is_none(),
                    version,
                    downloads: count,
                }
            })
            .collect();

        stats.sort_by_cached_key(|entry| {
            let parsed = Version::parse(&entry.version).ok();
            (parsed.is_none(), parsed, entry.version.clone())
        });

        log::debug!(target: LOG_TARGET, "Got download counts for {} versions of {package}", stats.len());
        Ok(stats)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, package: &str, accept: Option<&str>) -> Result<T> {
        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(reqwest::header::ACCEPT, accept);
        }

        let response = request.send().await.into_app_err_with(|| format!("requesting {url}"))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(app_err!("package {package} not found"));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| String::from("<unable to read body>"));
            log::debug!(target: LOG_TARGET, "Response body (first 500 chars): {}", body.chars().take(500).collect::<String>());
            return Err(app_err!("could not fetch statistics for {package}: {url} returned HTTP {status}"));
        }

        response.json::<T>().await.into_app_err_with(|| format!("parsing response from {url}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount(server: &MockServer, route: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_scoped_names_are_encoded() {
        assert_eq!(utf8_percent_encode("@hapi/hapi", PACKAGE_NAME).to_string(), "@hapi%2Fhapi");
        assert_eq!(utf8_percent_encode("socket.io", PACKAGE_NAME).to_string(), "socket.io");
        assert_eq!(utf8_percent_encode("lru-memoizer", PACKAGE_NAME).to_string(), "lru-memoizer");
    }

    #[tokio::test]
    async fn test_fetch_merges_registry_flags() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/versions/express/last-week",
            serde_json::json!({
                "package": "express",
                "downloads": { "4.17.1": 500, "3.0.0": 10, "4.0.0-rc1": 1, "5.0.0": 300 }
            }),
        )
        .await;

        Mock::given(method("GET"))
            .and(path("/express"))
            .and(header("accept", ABBREVIATED_METADATA))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "express",
                "versions": {
                    "3.0.0": { "deprecated": "no longer maintained" },
                    "4.0.0-rc1": {},
                    "4.17.1": {}
                }
            })))
            .mount(&server)
            .await;

        let provider = Provider::new(&server.uri(), &server.uri()).unwrap();
        let stats = provider.fetch("express").await.unwrap();

        let versions: Vec<_> = stats.iter().map(|s| s.version.as_str()).collect();
        assert_eq!(versions, ["3.0.0", "4.0.0-rc1", "4.17.1", "5.0.0"]);
        assert!(stats[0].deprecated);
        assert!(!stats[2].deprecated);
        assert!(stats[3].unpublished);
        assert_eq!(stats[2].downloads, 500);
    }

    #[tokio::test]
    async fn test_fetch_scoped_package() {
        let server = MockServer::start().await;
        mount(&server, "/versions/@hapi%2Fhapi/last-week", serde_json::json!({ "downloads": { "17.0.0": 42 } })).await;
        mount(&server, "/@hapi%2Fhapi", serde_json::json!({ "versions": { "17.0.0": {} } })).await;

        let provider = Provider::new(&server.uri(), &server.uri()).unwrap();
        let stats = provider.fetch("@hapi/hapi").await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].downloads, 42);
    }

    #[tokio::test]
    async fn test_fetch_unknown_package() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({ "error": "not found" })))
            .mount(&server)
            .await;

        let provider = Provider::new(&server.uri(), &server.uri()).unwrap();
        let err = provider.fetch("no-such-package").await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_fetch_server_error() {
        let server = MockServer::start().await;
        mount(&server, "/versions/express/last-week", serde_json::json!({ "downloads": {} })).await;
        Mock::given(method("GET"))
            .and(path("/express"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = Provider::new(&server.uri(), &server.uri()).unwrap();
        let err = provider.fetch("express").await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let provider = Provider::new(&server.uri(), &server.uri()).unwrap();
        assert!(provider.fetch("express").await.is_err());
    }
}
