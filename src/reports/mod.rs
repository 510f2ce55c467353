//! Snapshot persistence and console rendering of plugin records
//!
//! A full run over the plugins directory is slow and hits the network, so its results are
//! kept in a JSON snapshot (`data.json` by default) that later runs can render again:
//! - [`snapshot`]: reads and writes the snapshot, losslessly
//! - [`generate_console`]: renders the records as an aligned table, either the name and
//!   total downloads or, in detailed mode, the ranges, ratios and test matrix state as well

mod common;
mod console;
pub mod snapshot;

pub use common::{format_large, format_long_range, format_percentage};
pub use console::generate as generate_console;
