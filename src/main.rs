//! A tool to reconcile instrumentation plugins' version ranges with real-world usage.
//!
//! # Overview
//!
//! `plugin-stats` walks a directory containing one instrumentation plugin per subdirectory
//! (the layout used by `opentelemetry-js-contrib/plugins/node`). For every plugin it:
//!
//! - extracts the "Supported Versions" range from the plugin's `README.md`
//! - works out which npm package the plugin instruments
//! - reads the range the plugin tests against from its `.tav.yml` or `package.json`
//! - fetches per-version download counts for the instrumented package
//!
//! and then reports what share of real-world downloads falls within the supported range,
//! the tested range, and both.
//!
//! # Quick Start
//!
//! Recompute everything and refresh the snapshot:
//!
//! ```bash
//! plugin-stats report --plugins-dir ../opentelemetry-js-contrib/plugins/node --reload
//! ```
//!
//! Render the last snapshot again without touching the network:
//!
//! ```bash
//! plugin-stats report
//! ```
//!
//! Show the ranges and ratios as well:
//!
//! ```bash
//! plugin-stats report --detailed
//! ```
//!
//! # Configuration
//!
//! The per-package special cases (README overrides, renames, exclusions) are data, not code.
//! Write the defaults out and edit them:
//!
//! ```bash
//! plugin-stats init plugin-stats.yml
//! ```
//!
//! The file is picked up automatically from the current directory, or passed with `--config`.

use plugin_stats::{Host, run};
use std::io::Write;
use std::io::{stderr, stdout};

/// Default host that writes to the real process streams.
#[derive(Debug, Clone, Default)]
pub struct RealHost;

impl Host for RealHost {
    fn output(&mut self) -> impl Write {
        stdout()
    }

    fn error(&mut self) -> impl Write {
        stderr()
    }

    fn exit(&mut self, code: i32) {
        std::process::exit(code);
    }
}

#[tokio::main]
async fn main() -> Result<(), ohno::AppError> {
    run(&mut RealHost, std::env::args()).await
}
