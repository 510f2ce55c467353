#![doc(hidden)]

//! Core library for plugin-stats
//!
//! This library consolidates all functionality for the plugin-stats tool, which inventories
//! a directory of instrumentation plugins, reconciles the version ranges each plugin claims to
//! support and to have tested against, and weighs those ranges by real-world download counts.
//!
//! # Module Organization
//!
//! - [`commands`]: Command-line interface and orchestration
//! - [`config`]: Policy tables and per-package overrides
//! - [`facts`]: Per-plugin data extraction (ranges, package identity, test matrix)
//! - [`stats`]: Download statistics fetching and reconciliation
//! - [`reports`]: Snapshot persistence and console rendering

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub mod config;
pub mod facts;
pub mod reports;
pub mod stats;

pub use crate::commands::{Host, run};
