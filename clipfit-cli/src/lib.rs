// clipfit-cli/src/lib.rs
//
// Library portion of the clipfit CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod output;
pub mod progress;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, CompressArgs, ProbeArgs, ThumbnailArgs};
pub use commands::{CompressStatus, run_compress, run_probe, run_thumbnail};
