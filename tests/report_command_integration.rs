//! Integration tests for the `report` and `init` commands.
//!
//! These tests run the whole CLI in-process against a temporary plugins directory, with a
//! local mock server standing in for the npm downloads API and registry.

use plugin_stats::Host;
use plugin_stats::config::DEFAULT_CONFIG_YAML;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test host that captures output to in-memory buffers.
struct TestHost {
    output_buf: Vec<u8>,
    error_buf: Vec<u8>,
    exit_code: Option<i32>,
}

impl TestHost {
    const fn new() -> Self {
        Self {
            output_buf: Vec::new(),
            error_buf: Vec::new(),
            exit_code: None,
        }
    }

    fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output_buf).into_owned()
    }

    fn error_str(&self) -> String {
        String::from_utf8_lossy(&self.error_buf).into_owned()
    }
}

impl Host for TestHost {
    fn output(&mut self) -> impl std::io::Write {
        &mut self.output_buf
    }

    fn error(&mut self) -> impl std::io::Write {
        &mut self.error_buf
    }

    fn exit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }
}

/// A plugins directory, a configuration pointing at the mock server, and a snapshot path.
struct Workspace {
    _dir: TempDir,
    plugins_dir: String,
    config: String,
    data_file: String,
}

fn path_str(path: &Path) -> String {
    path.to_str().expect("temp paths are valid UTF-8").to_string()
}

fn write_plugin(plugins_dir: &Path, dir: &str, files: &[(&str, &str)]) {
    let root = plugins_dir.join(dir);
    fs::create_dir_all(&root).expect("create plugin dir");
    for (name, text) in files {
        fs::write(root.join(name), text).expect("write plugin file");
    }
}

async fn mount_package(server: &MockServer, encoded: &str, downloads: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/versions/{encoded}/last-week")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "downloads": downloads })))
        .mount(server)
        .await;

    let versions: serde_json::Map<_, _> = downloads
        .as_object()
        .expect("downloads object")
        .keys()
        .map(|version| (version.clone(), serde_json::json!({})))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/{encoded}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "versions": versions })))
        .mount(server)
        .await;
}

async fn workspace(server: &MockServer) -> Workspace {
    mount_package(server, "express", serde_json::json!({ "3.21.2": 500, "4.16.0": 1500, "4.18.2": 3000 })).await;
    mount_package(server, "koa", serde_json::json!({ "1.7.0": 20, "2.14.2": 80 })).await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let plugins_dir = dir.path().join("plugins");

    write_plugin(
        &plugins_dir,
        "opentelemetry-instrumentation-express",
        &[
            (
                "package.json",
                r#"{
                    "name": "@opentelemetry/instrumentation-express",
                    "scripts": { "test": "mocha" },
                    "devDependencies": { "express": "^4.17.1" }
                }"#,
            ),
            ("README.md", "# Express\n\n## Supported Versions\n\n- `^4.0.0`\n\n## Usage\n"),
        ],
    );

    write_plugin(
        &plugins_dir,
        "opentelemetry-instrumentation-koa",
        &[
            (
                "package.json",
                r#"{
                    "name": "@opentelemetry/instrumentation-koa",
                    "scripts": { "test": "mocha", "test-all-versions": "tav" },
                    "devDependencies": { "test-all-versions": "6.1.0" }
                }"#,
            ),
            ("README.md", "# Koa\n\nThis module works with Koa `^2.0.0` and later minors.\n"),
            (".tav.yml", "koa:\n  - versions: \"^2.0.0\"\n    commands: npm test\n"),
        ],
    );

    write_plugin(
        &plugins_dir,
        "opentelemetry-instrumentation-pg",
        &[
            ("package.json", r#"{ "name": "@opentelemetry/instrumentation-pg" }"#),
            ("README.md", "# pg\n\nNothing about versions here.\n"),
        ],
    );

    write_plugin(&plugins_dir, "docs-only", &[("README.md", "# Not a plugin\n")]);

    let config_path = dir.path().join("plugin-stats.yml");
    let config = DEFAULT_CONFIG_YAML
        .replace("https://api.npmjs.org", &server.uri())
        .replace("https://registry.npmjs.org", &server.uri());
    fs::write(&config_path, config).expect("write config");

    Workspace {
        plugins_dir: path_str(&plugins_dir),
        config: path_str(&config_path),
        data_file: path_str(&dir.path().join("data.json")),
        _dir: dir,
    }
}

async fn report(host: &mut TestHost, ws: &Workspace, extra: &[&str]) -> plugin_stats::Result<()> {
    let mut args = vec![
        "plugin-stats",
        "report",
        "--plugins-dir",
        ws.plugins_dir.as_str(),
        "--data-file",
        ws.data_file.as_str(),
        "--config",
        ws.config.as_str(),
        "--color",
        "never",
        "--log-level",
        "none",
    ];
    args.extend_from_slice(extra);
    plugin_stats::run(host, args).await
}

const SUMMARY_TABLE: &str = "\
name       sum
───────  ─────
express  5,000
koa        100
";

#[tokio::test]
async fn test_reload_renders_table_sorted_by_downloads() {
    let server = MockServer::start().await;
    let ws = workspace(&server).await;

    let mut host = TestHost::new();
    let result = report(&mut host, &ws, &["--reload"]).await;

    assert!(result.is_ok(), "report command failed: {result:?}");
    assert_eq!(host.output_str(), SUMMARY_TABLE);
    assert_eq!(host.exit_code, None);
}

#[tokio::test]
async fn test_reload_reports_unresolved_plugins() {
    let server = MockServer::start().await;
    let ws = workspace(&server).await;

    let mut host = TestHost::new();
    report(&mut host, &ws, &["--reload"]).await.expect("report command");

    let errors = host.error_str();
    assert!(errors.contains("unresolved: 1 plugins"), "unexpected error output: {errors}");
    assert!(errors.contains("(reasons: parse: 1, fetch: 1)"), "unexpected error output: {errors}");
    assert!(errors.contains("  pg: supported_range (parse): "), "unexpected error output: {errors}");
    assert!(errors.contains("  pg: fetch (fetch): package pg not found"), "unexpected error output: {errors}");
}

#[tokio::test]
async fn test_reload_writes_snapshot() {
    let server = MockServer::start().await;
    let ws = workspace(&server).await;

    let mut host = TestHost::new();
    report(&mut host, &ws, &["--reload"]).await.expect("report command");

    let text = fs::read_to_string(&ws.data_file).expect("read snapshot");
    assert!(text.starts_with("[\n  {\n    \"root\": "), "snapshot is not 2-space pretty JSON");

    let records: Vec<serde_json::Value> = serde_json::from_str(&text).expect("valid JSON");
    assert_eq!(records.len(), 4);

    let by_dir = |dir: &str| {
        records
            .iter()
            .find(|r| r["root"].as_str().is_some_and(|root| root.ends_with(dir)))
            .unwrap_or_else(|| panic!("no record for {dir}"))
    };

    let express = by_dir("opentelemetry-instrumentation-express");
    assert_eq!(express["name"], "express");
    assert_eq!(express["supportedRange"], "^4.0.0");
    assert_eq!(express["testedRange"], "^4.17.1");
    assert_eq!(express["stats"]["sum"], 5000);
    assert_eq!(express["stats"]["supported"], 4500);
    assert_eq!(express["stats"]["tested"], 3000);
    assert_eq!(express["stats"]["supportedRatio"], 90.0);
    assert_eq!(express["stats"]["testedSupportedRatio"], 66.7);
    assert!(express.get("scripts").is_none());

    let koa = by_dir("opentelemetry-instrumentation-koa");
    assert_eq!(koa["supportedRange"], "^2.0.0");
    assert_eq!(koa["testedRange"], "^2.0.0");
    assert_eq!(koa["tav"]["valid"], true);
    assert_eq!(koa["stats"]["supportedRatio"], 80.0);

    let pg = by_dir("opentelemetry-instrumentation-pg");
    assert_eq!(pg["name"], "pg");
    assert!(pg.get("supportedRange").is_none());
    assert!(pg.get("stats").is_none());
    assert_eq!(pg["failures"][0]["stage"], "supported_range");
    assert_eq!(pg["failures"][1]["stage"], "fetch");

    let bare = by_dir("docs-only").as_object().expect("record object");
    let keys: Vec<&str> = bare.keys().map(String::as_str).collect();
    assert_eq!(keys.len(), 2, "unexpected keys {keys:?}");
    assert!(bare.contains_key("root"));
    assert!(bare["files"]["packageJson"].is_null());
    assert_eq!(bare["files"]["readme"], "# Not a plugin\n");
}

#[tokio::test]
async fn test_snapshot_is_rendered_without_reload() {
    let server = MockServer::start().await;
    let ws = workspace(&server).await;

    let mut first = TestHost::new();
    report(&mut first, &ws, &["--reload"]).await.expect("report command");
    let snapshot = fs::read_to_string(&ws.data_file).expect("read snapshot");

    // Without --reload the plugins directory and the network are not consulted.
    fs::remove_dir_all(&ws.plugins_dir).expect("remove plugins");
    server.reset().await;

    let mut second = TestHost::new();
    report(&mut second, &ws, &[]).await.expect("report command");

    assert_eq!(second.output_str(), first.output_str());
    assert_eq!(fs::read_to_string(&ws.data_file).expect("read snapshot"), snapshot);
}

#[tokio::test]
async fn test_detailed_table() {
    let server = MockServer::start().await;
    let ws = workspace(&server).await;

    let mut host = TestHost::new();
    report(&mut host, &ws, &["--reload", "--detailed"]).await.expect("report command");

    let output = host.output_str();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 4, "unexpected output:\n{output}");

    for header in ["name", "supportedRange", "testedRange", "support%", "test/support%", "test%", "tav", "scripts", "sum"] {
        assert!(lines[0].contains(header), "missing header {header}");
    }

    let express: Vec<&str> = lines[2].split_whitespace().collect();
    assert_eq!(express, vec!["express", "^4.0.0", "^4.17.1", "90.0", "66.7", "60.0", "false", "1", "5,000"]);

    let koa: Vec<&str> = lines[3].split_whitespace().collect();
    assert_eq!(koa, vec!["koa", "^2.0.0", "^2.0.0", "80.0", "100.0", "80.0", "true", "2", "100"]);
}

#[tokio::test]
async fn test_missing_snapshot_fails() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_file = path_str(&dir.path().join("absent.json"));

    let mut host = TestHost::new();
    let result = plugin_stats::run(&mut host, ["plugin-stats", "report", "--data-file", data_file.as_str(), "--log-level", "none"]).await;

    assert!(result.is_err());
    assert!(host.output_str().is_empty());
}

#[tokio::test]
async fn test_missing_plugins_dir_fails() {
    let server = MockServer::start().await;
    let ws = workspace(&server).await;
    fs::remove_dir_all(&ws.plugins_dir).expect("remove plugins");

    let mut host = TestHost::new();
    let result = report(&mut host, &ws, &["--reload"]).await;

    assert!(result.is_err());
    assert!(!Path::new(&ws.data_file).exists());
}

#[tokio::test]
async fn test_unknown_exclusion_capability_fails() {
    let server = MockServer::start().await;
    let ws = workspace(&server).await;
    fs::write(&ws.config, "exclusions:\n  download_everything:\n    - \"@opentelemetry/instrumentation-koa\"\n").expect("write config");

    let mut host = TestHost::new();
    let result = report(&mut host, &ws, &["--reload"]).await;

    assert!(result.is_err());
    assert!(!Path::new(&ws.data_file).exists());
}

#[tokio::test]
async fn test_init_writes_default_config() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = path_str(&dir.path().join("plugin-stats.yml"));

    let mut host = TestHost::new();
    let result = plugin_stats::run(&mut host, ["plugin-stats", "init", output.as_str()]).await;

    assert!(result.is_ok(), "init command failed: {result:?}");
    assert!(host.output_str().contains("Generated default configuration file"));
    assert_eq!(fs::read_to_string(&output).expect("read config"), DEFAULT_CONFIG_YAML);
}
