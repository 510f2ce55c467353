//! Formatting helpers shared by the report tables.

/// Format a download count with `,` thousands separators. Zero and missing counts are blank.
#[must_use]
pub fn format_large(value: Option<u64>) -> String {
    let Some(value) = value.filter(|&v| v > 0) else {
        return String::new();
    };

    let digits = value.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            result.push(',');
        }
        result.push(digit);
    }
    result
}

/// Shorten a long range with many alternatives to its first two plus a count of the rest.
///
/// Ranges of at most 10 characters or at most 3 alternatives are returned unchanged.
#[must_use]
pub fn format_long_range(range: &str) -> String {
    if range.chars().count() <= 10 {
        return range.to_string();
    }

    let alternatives: Vec<&str> = range.split("||").map(str::trim).collect();
    if alternatives.len() <= 3 {
        return range.to_string();
    }

    format!("{} + {} more", alternatives[..2].join(" || "), alternatives.len() - 2)
}

/// Format a percentage with one decimal. Missing ratios are blank.
#[must_use]
pub fn format_percentage(value: Option<f64>) -> String {
    value.map_or_else(String::new, |v| format!("{v:.1}"))
}
