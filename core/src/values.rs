use crate::snmp::SnmpValue;

pub const UNKNOWN_CODE: i32 = -2;

pub const DEFAULT_LOW_THRESHOLD: f64 = 0.1;

/// Reads an integer out of any SNMP value by its textual rendering.
///
/// Never fails: anything that does not render as a plain `i32`
/// (timeticks, empty strings, counters past `i32::MAX`) becomes
/// [`UNKNOWN_CODE`]. Negative results are status codes, not magnitudes.
pub fn lenient_int(value: &SnmpValue) -> i32 {
    value
        .to_string()
        .trim()
        .parse::<i32>()
        .unwrap_or(UNKNOWN_CODE)
}

pub fn level_to_percent(max_capacity: i32, level: i32) -> String {
    match level {
        -1 => return "other".to_string(),
        -2 => return "unknown".to_string(),
        -3 => return "OK".to_string(),
        _ => {}
    }
    if level < 0 {
        return "unknown".to_string();
    }
    if max_capacity <= 0 {
        return level.to_string();
    }
    let percent = (f64::from(level) / f64::from(max_capacity) * 100.0).round();
    format!("{percent}%")
}

pub fn is_low(max_capacity: i32, level: i32, threshold: f64) -> bool {
    if max_capacity <= 0 || level < 0 {
        return false;
    }
    f64::from(level) / f64::from(max_capacity) <= threshold
}
