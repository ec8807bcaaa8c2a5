//! Fixed-width time formatting for displays.

use arrayvec::ArrayString;
use core::fmt::Write;

/// Format milliseconds as `HH:MM:SS.mmm` (stopwatch display).
pub fn format_elapsed(ms: f64) -> ArrayString<16> {
    let total_ms = if ms.is_finite() && ms > 0.0 { ms as u64 } else { 0 };
    let total_secs = total_ms / 1000;
    let mut out = ArrayString::new();
    let _ = write!(
        out,
        "{:02}:{:02}:{:02}.{:03}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60,
        total_ms % 1000,
    );
    out
}

/// Format seconds as `MM:SS` (track position display).
pub fn format_track_time(secs: f64) -> ArrayString<12> {
    let total = if secs.is_finite() && secs > 0.0 { secs as u64 } else { 0 };
    let mut out = ArrayString::new();
    let _ = write!(out, "{:02}:{:02}", total / 60, total % 60);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_zero() {
        assert_eq!(&format_elapsed(0.0), "00:00:00.000");
    }

    #[test]
    fn elapsed_full_fields() {
        // 1h 2m 3s 456ms
        let ms = (3600 + 120 + 3) as f64 * 1000.0 + 456.0;
        assert_eq!(&format_elapsed(ms), "01:02:03.456");
    }

    #[test]
    fn elapsed_negative_clamps_to_zero() {
        assert_eq!(&format_elapsed(-5.0), "00:00:00.000");
    }

    #[test]
    fn track_time_formats() {
        assert_eq!(&format_track_time(0.0), "00:00");
        assert_eq!(&format_track_time(75.9), "01:15");
        assert_eq!(&format_track_time(600.0), "10:00");
    }
}
