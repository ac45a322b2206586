//! Human-readable terminal output for command results.

use std::fmt::Display;
use std::path::Path;

use clipfit_core::utils::{calculate_size_reduction, format_bitrate};
use clipfit_core::{CompressionResult, MediaInfo, format_bytes, format_duration};
use owo_colors::OwoColorize;

fn colors() -> bool {
    console::colors_enabled()
}

/// Print a heading with colored styling and clear separation
pub fn print_heading(text: &str) {
    let line = "=".repeat(50);
    if colors() {
        println!("\n{}", line.bright_blue());
        println!("{}", format!(" {text} ").bold());
        println!("{}\n", line.bright_blue());
    } else {
        println!("\n{line}\n {text} \n{line}\n");
    }
}

/// Print an info line with label and value, with the label colored
pub fn print_info<T: Display>(label: &str, value: T) {
    if colors() {
        println!("{}: {}", label.bright_cyan(), value);
    } else {
        println!("{label}: {value}");
    }
}

pub fn print_success(message: &str) {
    if colors() {
        println!("{}", message.bright_green().bold());
    } else {
        println!("{message}");
    }
}

pub fn print_warning(message: &str) {
    if colors() {
        println!("{}", message.yellow().bold());
    } else {
        println!("{message}");
    }
}

/// Prints the summary of a finished compression.
pub fn print_compression_result(input_path: &Path, input_size: Option<u64>, result: &CompressionResult) {
    print_heading("Compression Summary");
    print_info("Input", input_path.display());
    print_info("Output", result.output_path.display());
    if let Some(duration) = result.duration_secs {
        print_info("Duration", format_duration(duration));
    }
    match input_size {
        Some(input_size) => print_info(
            "Size",
            format!(
                "{} -> {} ({}% smaller)",
                format_bytes(input_size),
                format_bytes(result.final_size_bytes),
                calculate_size_reduction(input_size, result.final_size_bytes)
            ),
        ),
        None => print_info("Size", format_bytes(result.final_size_bytes)),
    }
    print_info("Attempts", result.attempts.len());
    if let Some(last) = result.attempts.last() {
        if let Some(bitrate) = last.bitrate_bps {
            print_info("Final bitrate", format_bitrate(bitrate));
        }
        if let Some(quality) = last.quality_factor {
            print_info("Quality factor", quality);
        }
    }
    println!();
    if result.within_budget {
        print_success("Output fits within the size limit");
    } else {
        print_warning("Output is still over the size limit after the last attempt");
    }
}

/// Prints what the prober found for an input.
pub fn print_media_info(input_path: &Path, info: &MediaInfo) {
    print_heading("Media Info");
    print_info("File", input_path.display());
    match info.duration {
        Some(duration) => print_info("Duration", format_duration(duration)),
        None => print_info("Duration", "unknown"),
    }
    if let (Some(width), Some(height)) = (info.width, info.height) {
        print_info("Resolution", format!("{width}x{height}"));
    }
    if let Some(codec) = &info.video_codec {
        print_info("Video codec", codec);
    }
    print_info("Audio streams", info.audio_streams);
}
