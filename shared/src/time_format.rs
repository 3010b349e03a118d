use std::fmt::Write;

use chrono::{DateTime, NaiveDateTime};

pub const EMPTY_CELL: &str = "—";

/// Race time in seconds: `12.34s` below a minute, `m:ss.ss` from a minute up.
pub fn format_time(secs: Option<f64>) -> String {
    let Some(secs) = secs else {
        return EMPTY_CELL.to_string();
    };
    if secs >= 60.0 {
        let minutes = (secs / 60.0).floor();
        let rest = secs % 60.0;
        let mut out = String::with_capacity(9);
        let _ = write!(out, "{minutes}:{rest:05.2}");
        out
    } else {
        format!("{secs:.2}s")
    }
}

/// First-finish timestamp as `Nov 14, 2023`. Unparseable input is returned as-is.
pub fn format_first_finish(ts: Option<&str>) -> String {
    let Some(ts) = ts.filter(|ts| !ts.is_empty()) else {
        return EMPTY_CELL.to_string();
    };

    let parsed = DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S%.f"));

    match parsed {
        Ok(dt) => dt.format("%b %-d, %Y").to_string(),
        Err(_) => ts.to_string(),
    }
}

/// Points with thousands separators and at most three decimals.
pub fn format_points(points: f64) -> String {
    if !points.is_finite() {
        return points.to_string();
    }
    let fixed = format!("{:.3}", points.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if points < 0.0 && (int_part != "0" || !frac_part.is_empty()) {
        out.push('-');
    }
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}
