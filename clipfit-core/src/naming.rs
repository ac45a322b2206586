// ============================================================================
// clipfit-core/src/naming.rs
// ============================================================================
//
// OUTPUT NAMING: Collision-free output path allocation
//
// Every compressed file is named after its source with a "-compressed"
// marker. Re-compressing an already compressed file does not stack markers:
// "movie-compressed(2).mp4" becomes "movie-compressed.mp4" again, numbered
// on collision.
//
// The allocator only computes paths and checks existence; it never writes.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::COMPRESSED_SUFFIX;
use crate::error::{CoreError, CoreResult};

static COMPRESSED_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-compressed(\(\d+\))?$").expect("compressed marker pattern is valid")
});

/// Removes a trailing `-compressed` or `-compressed(N)` marker from a file stem.
#[must_use]
pub fn strip_compressed_marker(stem: &str) -> &str {
    match COMPRESSED_MARKER.find(stem) {
        Some(found) => &stem[..found.start()],
        None => stem,
    }
}

/// Resolves the output path for compressing `input_path` towards `desired`.
///
/// The directory and extension come from `desired`, the base name from the
/// input's stem. The first candidate is `{stem}-compressed.{ext}`; if that
/// exists, `{stem}-compressed(N).{ext}` is tried for N = 1, 2, ... until a
/// free name is found.
///
/// Calling this twice against an unchanged directory returns the same path.
pub fn allocate_output_path(desired: &Path, input_path: &Path) -> CoreResult<PathBuf> {
    let input_stem = input_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .ok_or_else(|| {
            CoreError::PathError(format!(
                "Failed to get file stem for {}",
                input_path.display()
            ))
        })?;

    let base = format!("{}{COMPRESSED_SUFFIX}", strip_compressed_marker(&input_stem));
    let extension = output_extension(desired, input_path);
    let directory = desired.parent().unwrap_or_else(|| Path::new(""));

    let candidate = |name: String| match extension.as_str() {
        "" => directory.join(name),
        ext => directory.join(format!("{name}.{ext}")),
    };

    // A degenerate extension equal to the base would produce "x.x"; number it instead.
    if extension != base {
        let first = candidate(base.clone());
        if !first.exists() {
            log::debug!("Allocated output path {}", first.display());
            return Ok(first);
        }
    }

    for n in 1..=u32::MAX {
        let numbered = candidate(format!("{base}({n})"));
        if !numbered.exists() {
            log::debug!("Allocated numbered output path {}", numbered.display());
            return Ok(numbered);
        }
    }

    Err(CoreError::PathError(format!(
        "No free output name left for {} in {}",
        base,
        directory.display()
    )))
}

/// Extension for the output: the desired path's extension, or its file name
/// when that looks like a bare extension (".mp4"), or the input's extension.
fn output_extension(desired: &Path, input_path: &Path) -> String {
    if let Some(ext) = desired.extension() {
        return ext.to_string_lossy().to_string();
    }

    if let Some(name) = desired.file_name().map(|n| n.to_string_lossy()) {
        if let Some(bare) = name.strip_prefix('.') {
            if !bare.is_empty() {
                return bare.to_string();
            }
        }
    }

    input_path
        .extension()
        .map(|ext| ext.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_strip_compressed_marker() {
        assert_eq!(strip_compressed_marker("movie"), "movie");
        assert_eq!(strip_compressed_marker("movie-compressed"), "movie");
        assert_eq!(strip_compressed_marker("movie-compressed(2)"), "movie");
        assert_eq!(strip_compressed_marker("movie-compressed(12)"), "movie");
        // Only a trailing marker is stripped.
        assert_eq!(
            strip_compressed_marker("movie-compressed-final"),
            "movie-compressed-final"
        );
        assert_eq!(strip_compressed_marker("movie-compressed(x)"), "movie-compressed(x)");
    }

    #[test]
    fn test_first_candidate_when_directory_is_empty() {
        let dir = tempdir().unwrap();
        let desired = dir.path().join("holiday.mp4");

        let path = allocate_output_path(&desired, Path::new("/src/holiday.mov")).unwrap();
        assert_eq!(path, dir.path().join("holiday-compressed.mp4"));
    }

    #[test]
    fn test_allocation_is_idempotent_without_writes() {
        let dir = tempdir().unwrap();
        let desired = dir.path().join("clip.mkv");
        let input = Path::new("clip.mp4");

        let first = allocate_output_path(&desired, input).unwrap();
        let second = allocate_output_path(&desired, input).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_collisions_are_numbered_in_order() {
        let dir = tempdir().unwrap();
        let desired = dir.path().join("clip.mp4");
        let input = Path::new("clip.mp4");

        let first = allocate_output_path(&desired, input).unwrap();
        File::create(&first).unwrap();

        let second = allocate_output_path(&desired, input).unwrap();
        assert_eq!(second, dir.path().join("clip-compressed(1).mp4"));
        File::create(&second).unwrap();

        let third = allocate_output_path(&desired, input).unwrap();
        assert_eq!(third, dir.path().join("clip-compressed(2).mp4"));
    }

    #[test]
    fn test_recompressing_output_does_not_stack_markers() {
        let dir = tempdir().unwrap();
        let desired = dir.path().join("movie.mp4");

        let path =
            allocate_output_path(&desired, Path::new("/in/movie-compressed(2).mp4")).unwrap();
        assert_eq!(path, dir.path().join("movie-compressed.mp4"));
    }

    #[test]
    fn test_bare_extension_as_desired_name() {
        let dir = tempdir().unwrap();
        let desired = dir.path().join(".webm");

        let path = allocate_output_path(&desired, Path::new("talk.mp4")).unwrap();
        assert_eq!(path, dir.path().join("talk-compressed.webm"));
    }

    #[test]
    fn test_missing_extension_falls_back_to_input() {
        let dir = tempdir().unwrap();
        let desired = dir.path().join("talk");

        let path = allocate_output_path(&desired, Path::new("talk.mov")).unwrap();
        assert_eq!(path, dir.path().join("talk-compressed.mov"));
    }

    #[test]
    fn test_input_without_stem_is_rejected() {
        let dir = tempdir().unwrap();
        let result = allocate_output_path(&dir.path().join("x.mp4"), Path::new("/"));
        assert!(matches!(result, Err(CoreError::PathError(_))));
    }
}
