//! Core library that re-encodes a video until it fits under a size limit.
//!
//! A [`Compressor`] accepts one [`CompressionRequest`] at a time. It allocates
//! a `-compressed` output name, probes the source duration with ffprobe,
//! derives a target bitrate from the size budget and runs ffmpeg, lowering
//! the bitrate by 15% and re-encoding while the output is still too large
//! (at most ten attempts). Supplying a quality factor instead runs a single
//! constant-quality encode.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use clipfit_core::{CompressionOutcome, CompressionRequest, ContainerFormat, CoreConfig, DefaultCompressor};
//! use std::path::Path;
//!
//! let compressor = DefaultCompressor::with_config(CoreConfig::default()).unwrap();
//! let request = CompressionRequest::from_megabytes(
//!     "/videos/holiday.mov",
//!     Path::new("/videos/out"),
//!     10.0,
//!     ContainerFormat::Mp4,
//! )
//! .unwrap();
//!
//! match compressor.compress(request, |event| println!("{:.0}%", event.percent())).unwrap() {
//!     CompressionOutcome::Completed(result) => println!("wrote {}", result.output_path.display()),
//!     CompressionOutcome::Cancelled => println!("stopped"),
//! }
//! ```

pub mod bitrate;
pub mod cancel;
pub mod compressor;
pub mod config;
pub mod error;
pub mod external;
pub mod naming;
pub mod notifications;
pub mod progress_reporting;
pub mod request;
pub mod session;
pub mod utils;

// Re-exports for public API
pub use bitrate::EncodeParameters;
pub use cancel::CancellationToken;
pub use compressor::{Compressor, DefaultCompressor, StopStatus};
pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{CoreError, CoreResult};
pub use external::{MediaInfo, check_dependency};
pub use naming::allocate_output_path;
pub use notifications::{NotificationSender, NotificationType, NtfyNotificationSender};
pub use progress_reporting::ProgressEvent;
pub use request::{CompressionRequest, ContainerFormat};
pub use session::{CompressionOutcome, CompressionResult, EncodeAttempt, SessionState, SessionStatus};
pub use utils::{format_bytes, format_duration, parse_ffmpeg_time};
