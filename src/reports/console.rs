use super::common::{format_large, format_long_range, format_percentage};
use crate::Result;
use crate::facts::PluginRecord;
use core::fmt::Write;
use owo_colors::OwoColorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

struct Column {
    header: &'static str,
    align: Align,
    cells: Vec<String>,
}

impl Column {
    fn new(header: &'static str, align: Align, cells: Vec<String>) -> Self {
        Self { header, align, cells }
    }

    fn width(&self) -> usize {
        self.cells
            .iter()
            .map(|cell| cell.chars().count())
            .chain(core::iter::once(self.header.chars().count()))
            .max()
            .unwrap_or(0)
    }
}

/// Render plugins as a table of package name and total downloads, or with `detailed` also
/// their ranges, ratios, and test matrix state.
pub fn generate<W: Write>(plugins: &[PluginRecord], detailed: bool, use_colors: bool, writer: &mut W) -> Result<()> {
    let columns = if detailed { detailed_columns(plugins) } else { summary_columns(plugins) };
    write_table(&columns, plugins.len(), use_colors, writer)
}

fn summary_columns(plugins: &[PluginRecord]) -> Vec<Column> {
    vec![
        Column::new("name", Align::Left, plugins.iter().map(|p| p.display_name().to_string()).collect()),
        Column::new("sum", Align::Right, plugins.iter().map(|p| format_large(p.stats.as_ref().map(|s| s.sum))).collect()),
    ]
}

fn detailed_columns(plugins: &[PluginRecord]) -> Vec<Column> {
    let text = |f: fn(&PluginRecord) -> String| plugins.iter().map(f).collect::<Vec<_>>();

    vec![
        Column::new("name", Align::Left, text(|p| p.display_name().to_string())),
        Column::new(
            "supportedRange",
            Align::Left,
            text(|p| p.supported_range.as_ref().map(ToString::to_string).unwrap_or_default()),
        ),
        Column::new(
            "testedRange",
            Align::Left,
            text(|p| p.tested_range.as_ref().map(|r| format_long_range(r.as_str())).unwrap_or_default()),
        ),
        Column::new("support%", Align::Right, text(|p| format_percentage(p.stats.as_ref().and_then(|s| s.supported_ratio)))),
        Column::new(
            "test/support%",
            Align::Right,
            text(|p| format_percentage(p.stats.as_ref().and_then(|s| s.tested_supported_ratio))),
        ),
        Column::new("test%", Align::Right, text(|p| format_percentage(p.stats.as_ref().and_then(|s| s.tested_ratio)))),
        Column::new("tav", Align::Left, text(|p| p.tav.as_ref().map(|t| t.valid.to_string()).unwrap_or_default())),
        Column::new("scripts", Align::Right, text(|p| p.scripts.len().to_string())),
        Column::new("sum", Align::Right, text(|p| format_large(p.stats.as_ref().map(|s| s.sum)))),
    ]
}

fn write_table<W: Write>(columns: &[Column], rows: usize, use_colors: bool, writer: &mut W) -> Result<()> {
    let widths: Vec<usize> = columns.iter().map(Column::width).collect();

    let mut header = String::new();
    for (index, (column, &width)) in columns.iter().zip(&widths).enumerate() {
        if index > 0 {
            header.push_str("  ");
        }
        let cell = pad(column.header, width, column.align);
        if use_colors {
            write!(header, "{}", cell.bold())?;
        } else {
            header.push_str(&cell);
        }
    }
    writeln!(writer, "{}", header.trim_end())?;

    let rule: Vec<String> = widths.iter().map(|&width| "─".repeat(width)).collect();
    writeln!(writer, "{}", rule.join("  "))?;

    for row in 0..rows {
        let line: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(column, &width)| pad(&column.cells[row], width, column.align))
            .collect();
        writeln!(writer, "{}", line.join("  ").trim_end())?;
    }

    Ok(())
}

fn pad(text: &str, width: usize, align: Align) -> String {
    match align {
        Align::Left => format!("{text:<width$}"),
        Align::Right => format!("{text:>width$}"),
    }
}
