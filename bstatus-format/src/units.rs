//! Value formatters shared by the metric grammars.
//!
//! Formatters pad their output with [`WIDTH_PAD`] so a source keeps the same
//! display width from one tick to the next.

use bstatus_common::WIDTH_PAD;

/// Denominator used when a portion token gives none (percent).
pub const DEFAULT_DENOMINATOR: u32 = 100;

const SIZE_UNITS: [&str; 8] = ["kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

const SPEED_UNITS: [&str; 9] = [
    "B/s\0", "kB/s", "MB/s", "GB/s", "TB/s", "PB/s", "EB/s", "ZB/s", "YB/s",
];

/// Append width-pad markers until `value` is `width` characters wide.
pub fn ensure_width(mut value: String, width: usize) -> String {
    let len = value.chars().count();
    value.extend(std::iter::repeat_n(WIDTH_PAD, width.saturating_sub(len)));
    value
}

/// Render `value * denominator` with `accuracy` decimals.
///
/// The result is padded to the width of `denominator` rendered with the same
/// accuracy. Non-finite values (e.g. `0 / 0`) render as zero.
pub fn format_portion(value: f64, denominator: u32, accuracy: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let denominator = f64::from(denominator);
    let result = format!("{:.*}", accuracy, value * denominator);
    let width = format!("{:.*}", accuracy, denominator).len();
    ensure_width(result, width)
}

/// Render a byte count as `<mantissa>.<tenth> <unit>`, starting at kB.
pub fn format_size(bytes: u64) -> String {
    let tenths = bytes.saturating_add(50) / 100;
    scale(tenths, &SIZE_UNITS)
}

/// Render a byte rate as `<mantissa>.<tenth> <unit>/s`, starting at B/s.
pub fn format_speed(bytes_per_sec: f64) -> String {
    let tenths = if bytes_per_sec.is_finite() && bytes_per_sec > 0.0 {
        (bytes_per_sec * 10.0).round() as u64
    } else {
        0
    };
    scale(tenths, &SPEED_UNITS)
}

fn scale(mut tenths: u64, units: &[&str]) -> String {
    let mut prefix = 0;
    while tenths >= 10_000 && prefix + 1 < units.len() {
        tenths = tenths.saturating_add(500) / 1000;
        prefix += 1;
    }
    let value = format!("{}.{}", tenths / 10, tenths % 10);
    format!("{} {}", ensure_width(value, 5), units[prefix])
}
