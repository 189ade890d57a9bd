//! Human-readable sizes

use byte_unit::{Byte, UnitType};

const BINARY_UNIT: u64 = 1024;

/// Format a byte count using binary units (base 1024) with one decimal.
///
/// Counts below one KiB are printed as a plain integer: `500 B`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < BINARY_UNIT {
        return format!("{} B", bytes);
    }

    let adjusted = Byte::from_u64(bytes).get_appropriate_unit(UnitType::Binary);
    format!("{:.1}", adjusted)
}
