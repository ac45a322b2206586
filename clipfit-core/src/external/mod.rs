// ============================================================================
// clipfit-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with External CLI Tools and File System
//
// This module encapsulates interactions with ffmpeg and ffprobe, as well as
// the one file system reading the controller depends on (output size). Each
// is hidden behind a trait so the session can be driven by mocks in tests.
//
// KEY COMPONENTS:
// - Traits for external tool interactions (FfmpegSpawner, FfprobeExecutor)
// - Concrete implementations using ffmpeg-sidecar and ffprobe crates
// - Dependency checking functions
// - File metadata access abstraction

use crate::error::{CoreError, CoreResult};

use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Contains ffmpeg argument building and single-attempt execution
pub mod ffmpeg;

/// Contains traits and implementations for executing ffmpeg commands
pub mod ffmpeg_executor;

/// Contains traits and implementations for executing ffprobe commands
pub mod ffprobe_executor;

/// Mock implementations of the traits, behind the `test-mocks` feature
pub mod mocks;

/// Single-frame preview extraction on the ffmpeg spawner
pub mod thumbnail;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg::{AttemptResult, EncodeParams, build_ffmpeg_command, run_encode_attempt};
pub use ffmpeg_executor::{FfmpegProcess, FfmpegSpawner, SidecarProcess, SidecarSpawner};
pub use ffprobe_executor::{CrateFfprobeExecutor, FfprobeExecutor, MediaInfo};
pub use thumbnail::{default_thumbnail_path, extract_thumbnail};

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks if a required external command is available and executable.
///
/// Runs `<cmd> -version` with output discarded. Only a failure to start the
/// process counts as missing; the exit status is not inspected.
///
/// # Returns
///
/// * `Ok(())` - If the command could be started
/// * `Err(CoreError::DependencyNotFound)` - If the command is not found
/// * `Err(CoreError::CommandStart)` - If the command exists but fails to start
pub fn check_dependency(cmd: impl AsRef<OsStr>) -> CoreResult<()> {
    let cmd = cmd.as_ref();
    let cmd_name = cmd.to_string_lossy().to_string();

    let result = Command::new(cmd)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", cmd_name);
            Err(CoreError::DependencyNotFound(cmd_name))
        }
        Err(e) => {
            log::error!(
                "Failed to start dependency check command '{}': {}",
                cmd_name,
                e
            );
            Err(CoreError::CommandStart(cmd_name, e))
        }
    }
}

// ============================================================================
// FILE METADATA ACCESS
// ============================================================================

/// Trait for abstracting file metadata access operations.
///
/// The session measures every finished attempt through this trait, so the
/// size it compares against the budget is always what is on disk.
///
/// # Examples
///
/// ```rust,no_run
/// use clipfit_core::external::FileMetadataProvider;
/// use clipfit_core::CoreResult;
/// use std::path::Path;
///
/// struct FixedSize;
///
/// impl FileMetadataProvider for FixedSize {
///     fn get_size(&self, _path: &Path) -> CoreResult<u64> {
///         Ok(1_000_000)
///     }
/// }
///
/// let size = FixedSize.get_size(Path::new("/fake/path")).unwrap();
/// assert_eq!(size, 1_000_000);
/// ```
pub trait FileMetadataProvider {
    /// Gets the size of the file at the given path in bytes.
    fn get_size(&self, path: &Path) -> CoreResult<u64>;
}

/// Standard implementation of FileMetadataProvider using `std::fs::metadata`.
#[derive(Debug, Clone, Default)]
pub struct StdFsMetadataProvider;

impl FileMetadataProvider for StdFsMetadataProvider {
    fn get_size(&self, path: &Path) -> CoreResult<u64> {
        Ok(std::fs::metadata(path)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dependency_is_reported() {
        let result = check_dependency("clipfit-definitely-not-a-real-binary");
        assert!(matches!(result, Err(CoreError::DependencyNotFound(_))));
    }

    #[test]
    fn test_std_metadata_provider_reads_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");
        std::fs::write(&path, vec![0u8; 4096]).unwrap();

        assert_eq!(StdFsMetadataProvider.get_size(&path).unwrap(), 4096);
        assert!(StdFsMetadataProvider.get_size(&dir.path().join("missing")).is_err());
    }
}
