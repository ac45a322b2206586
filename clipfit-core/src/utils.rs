//! Utility functions for formatting.
//!
//! These helpers are shared by the core library and the CLI: duration and
//! byte formatting for log lines, ffmpeg timestamp parsing for progress, and
//! percentage size reduction for summaries.

/// Bytes in one megabyte as the size limit is expressed (binary megabyte).
pub const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats bytes with appropriate binary units (B, KiB, MiB, GiB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let bytes_f64 = bytes as f64;
    if bytes_f64 >= GIB {
        format!("{:.2} GiB", bytes_f64 / GIB)
    } else if bytes_f64 >= MIB {
        format!("{:.2} MiB", bytes_f64 / MIB)
    } else if bytes_f64 >= KIB {
        format!("{:.2} KiB", bytes_f64 / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// Formats a bitrate in bits per second as kbit/s.
#[must_use]
pub fn format_bitrate(bitrate_bps: u64) -> String {
    format!("{:.1} kbit/s", bitrate_bps as f64 / 1000.0)
}

/// Converts a size limit in megabytes to bytes. Returns None unless the
/// value is finite and strictly positive.
#[must_use]
pub fn megabytes_to_bytes(megabytes: f64) -> Option<u64> {
    if !megabytes.is_finite() || megabytes <= 0.0 {
        return None;
    }
    let bytes = (megabytes * BYTES_PER_MEGABYTE).floor();
    if bytes < 1.0 || bytes > u64::MAX as f64 {
        return None;
    }
    Some(bytes as u64)
}

/// Parses FFmpeg time string (HH:MM:SS.MS) to seconds. Returns None if invalid.
///
/// FFmpeg occasionally reports a slightly negative time at the start of an
/// encode ("-00:00:00.03"); that parses to a negative number and is left to
/// the caller to clamp.
#[must_use]
pub fn parse_ffmpeg_time(time: &str) -> Option<f64> {
    let (negative, time) = match time.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, time),
    };
    let parts: Vec<&str> = time.split(':').collect();
    if parts.len() == 3 {
        let hours = parts[0].parse::<f64>().ok()?;
        let minutes = parts[1].parse::<f64>().ok()?;
        let seconds = parts[2].parse::<f64>().ok()?;
        let total = hours * 3600.0 + minutes * 60.0 + seconds;
        Some(if negative { -total } else { total })
    } else {
        None
    }
}

/// Calculates the percentage size reduction from input to output.
/// Returns 0 if input_size is 0 or the output grew.
#[must_use]
pub fn calculate_size_reduction(input_size: u64, output_size: u64) -> u64 {
    if input_size == 0 || output_size >= input_size {
        0
    } else {
        100 - ((output_size * 100) / input_size)
    }
}
