//! Command-line interface and orchestration for plugin-stats
//!
//! This module implements the CLI commands and ties the other modules together into the
//! end-to-end report workflow. It handles argument parsing, configuration loading, and the
//! high-level pipeline.
//!
//! # Commands
//!
//! - **report**: Inventory the plugins directory (or reread the last snapshot), reconcile
//!   download statistics against each plugin's ranges, and print a table
//! - **init**: Write the default configuration file so the override tables can be edited
//!
//! # Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes to the matching
//! command handler. With `--reload`, `report` proceeds as follows:
//!
//! 1. Load configuration
//! 2. Load every plugin directory concurrently, fetching download statistics as it goes
//! 3. Reconcile the statistics against the supported and tested ranges
//! 4. Persist the records as a snapshot
//! 5. Filter, sort and render
//!
//! Without `--reload`, steps 2 to 4 are replaced by reading the snapshot.
//!
//! All output goes through the [`Host`] trait so the whole CLI can be driven in-process.

mod common;
mod host;
mod init;
mod report;
mod run;

pub use host::Host;
pub use init::{InitArgs, init_config};
pub use report::{ReportArgs, process_report};
pub use run::run;
