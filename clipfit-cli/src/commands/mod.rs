//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Size-constrained compression of one video.
pub mod compress;
pub mod probe;
pub mod thumbnail;

pub use compress::{CompressStatus, run_compress};
pub use probe::run_probe;
pub use thumbnail::run_thumbnail;
