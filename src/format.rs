//! Human-readable byte sizes and durations.

use serde::Serialize;

use crate::error::StatsError;

const BASE: f64 = 1024.0;
const UNITS: [&str; 9] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Largest precision `format_bytes` accepts.
pub const MAX_DECIMALS: usize = 20;

/// Bytes per gibibyte, the unit storage charts are plotted in.
pub const GIB: f64 = BASE * BASE * BASE;

/// Format a byte count with base-1024 units and a fixed number of decimals.
///
/// Trailing zeros are kept: `1536` with two decimals is `"1.50 KB"`.
/// Negative, NaN or infinite input, or more than [`MAX_DECIMALS`] decimals,
/// is a caller bug and yields `InvalidArgument`.
pub fn format_bytes(bytes: f64, decimals: usize) -> Result<String, StatsError> {
    if decimals > MAX_DECIMALS {
        return Err(StatsError::InvalidArgument(format!(
            "decimals must be at most {MAX_DECIMALS}, got {decimals}"
        )));
    }
    if !bytes.is_finite() || bytes < 0.0 {
        return Err(StatsError::InvalidArgument(format!(
            "byte count must be a non-negative number, got {bytes}"
        )));
    }
    if bytes == 0.0 {
        return Ok("0 Bytes".to_string());
    }

    let mut scaled = bytes;
    let mut unit = 0;
    while scaled >= BASE && unit < UNITS.len() - 1 {
        scaled /= BASE;
        unit += 1;
    }

    Ok(format!("{:.*} {}", decimals, scaled, UNITS[unit]))
}

/// Format milliseconds as `"<h> Std. <m> Min. <s> Sek."`.
///
/// Hours appear only when non-zero; minutes appear when non-zero or when
/// hours are shown; seconds always appear.
pub fn format_duration(ms: u64) -> String {
    let seconds = ms / 1000;
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let remaining = seconds % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours} Std. "));
    }
    if minutes > 0 || hours > 0 {
        out.push_str(&format!("{minutes} Min. "));
    }
    out.push_str(&format!("{remaining} Sek."));
    out
}

/// Convert bytes to gibibytes for plotting.
pub fn to_gibibytes(bytes: u64) -> f64 {
    bytes as f64 / GIB
}

/// A display string together with the number it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedMetric {
    pub display: String,
    pub value: f64,
}

impl FormattedMetric {
    pub fn bytes(bytes: u64) -> Result<Self, StatsError> {
        Ok(Self {
            display: format_bytes(bytes as f64, 2)?,
            value: bytes as f64,
        })
    }

    pub fn duration(ms: u64) -> Self {
        Self {
            display: format_duration(ms),
            value: ms as f64,
        }
    }
}
