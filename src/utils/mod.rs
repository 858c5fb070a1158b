//! Utility functions for formatting report values
//!
//! Centralizes how amounts and percentages are turned into text so the
//! terminal output and the text document agree.

use rust_decimal::Decimal;

use crate::reports::{round_display, Cell};

/// Core formatting function with full control over output.
///
/// Formats a Decimal with `,` as thousands separator and `.` as decimal
/// separator, rounded half away from zero to `decimals` places.
///
/// # Arguments
/// * `value` - The decimal value to format
/// * `decimals` - Number of decimal places shown
/// * `width` - Minimum width for padding (0 for no padding, right-aligned)
///
/// # Examples
/// ```
/// use priceforecast::utils::format_amount_with_width;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_amount_with_width(dec!(1234.56), 2, 0), "1,234.56");
/// assert_eq!(format_amount_with_width(dec!(1234), 2, 12), "    1,234.00");
/// ```
pub fn format_amount_with_width(value: Decimal, decimals: u32, width: usize) -> String {
    let rounded = round_display(value, decimals);
    let is_negative = rounded < Decimal::ZERO;

    let formatted = format!("{:.*}", decimals as usize, rounded.abs());
    let (integer_part, fraction_part) = match formatted.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (formatted.clone(), None),
    };

    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative { "-" } else { "" };
    let result = match fraction_part {
        Some(f) => format!("{}{}.{}", sign, with_separators, f),
        None => format!("{}{}", sign, with_separators),
    };

    if width > 0 && result.len() < width {
        format!("{:>width$}", result, width = width)
    } else {
        result
    }
}

/// Format an amount with separators: "1,234.56"
///
/// # Examples
/// ```
/// use priceforecast::utils::format_amount;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_amount(dec!(1234.5), 2), "1,234.50");
/// assert_eq!(format_amount(dec!(-0.005), 2), "-0.01");
/// ```
pub fn format_amount(value: Decimal, decimals: u32) -> String {
    format_amount_with_width(value, decimals, 0)
}

/// Format percentage points with sign: "+5.00%", "-1.25%"
pub fn format_percent(value: Decimal, decimals: u32) -> String {
    let rounded = round_display(value, decimals);
    let sign = if rounded > Decimal::ZERO { "+" } else { "" };
    format!("{}{:.*}%", sign, decimals as usize, rounded)
}

/// Human rendering of a report cell
pub fn format_cell(cell: &Cell, decimals: u32) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(s) => s.clone(),
        Cell::Amount(v) => format_amount(*v, decimals),
        Cell::Percent(v) => format_percent(*v, decimals),
    }
}
