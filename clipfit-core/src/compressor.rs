//! The entry point for compression jobs.
//!
//! A [`Compressor`] runs at most one job at a time. Its session slot is a
//! mutex-guarded optional entry holding the active job's cancellation token;
//! `compress` reserves it, `stop` signals it, and the slot is released when
//! the job returns however it ends.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use log::{debug, info};

use crate::cancel::CancellationToken;
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::{
    CrateFfprobeExecutor, FfmpegSpawner, FfprobeExecutor, FileMetadataProvider, SidecarSpawner,
    StdFsMetadataProvider,
};
use crate::naming::allocate_output_path;
use crate::progress_reporting::ProgressEvent;
use crate::request::CompressionRequest;
use crate::session::{CompressionOutcome, TranscodeSession};

/// What a call to [`Compressor::stop`] did. Every variant is a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopStatus {
    /// The active job was told to cancel by this call
    Signalled,
    /// The active job had already been told to cancel
    AlreadyStopping,
    /// No job was running
    Idle,
}

struct ActiveJob {
    input_path: PathBuf,
    cancel: CancellationToken,
}

/// Accepts compression requests, one at a time.
pub struct Compressor<S, P, M> {
    spawner: S,
    prober: P,
    metadata: M,
    config: CoreConfig,
    slot: Mutex<Option<ActiveJob>>,
}

/// Compressor wired to the real ffmpeg, ffprobe and file system.
pub type DefaultCompressor = Compressor<SidecarSpawner, CrateFfprobeExecutor, StdFsMetadataProvider>;

impl DefaultCompressor {
    pub fn with_config(config: CoreConfig) -> CoreResult<Self> {
        Self::new(
            SidecarSpawner,
            CrateFfprobeExecutor::new(),
            StdFsMetadataProvider,
            config,
        )
    }
}

impl<S, P, M> Compressor<S, P, M>
where
    S: FfmpegSpawner,
    P: FfprobeExecutor,
    M: FileMetadataProvider,
{
    /// Creates a compressor after validating `config`.
    pub fn new(spawner: S, prober: P, metadata: M, config: CoreConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            spawner,
            prober,
            metadata,
            config,
            slot: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Runs `request` to completion on the calling thread.
    ///
    /// Fails immediately with [`CoreError::Busy`] while another job is
    /// active. Progress is delivered to `on_progress` on this thread.
    pub fn compress<F>(
        &self,
        request: CompressionRequest,
        on_progress: F,
    ) -> CoreResult<CompressionOutcome>
    where
        F: FnMut(ProgressEvent),
    {
        request.validate()?;

        let cancel = CancellationToken::new();
        let _reservation = self.reserve(&request, cancel.clone())?;

        let output_path = allocate_output_path(&request.output_path, &request.input_path)?;
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        info!(
            "Compressing {} -> {}",
            request.input_path.display(),
            output_path.display()
        );

        let mut session = TranscodeSession::new(
            &self.spawner,
            &self.prober,
            &self.metadata,
            &self.config,
            request,
            output_path,
            cancel,
        );
        session.run(on_progress)
    }

    /// Signals the active job to cancel.
    ///
    /// Stopping always succeeds. With no job active it is a no-op that
    /// reports [`StopStatus::Idle`]; repeated calls while the job winds down
    /// report [`StopStatus::AlreadyStopping`].
    pub fn stop(&self) -> StopStatus {
        match self.lock_slot().as_ref() {
            Some(job) => {
                if job.cancel.cancel() {
                    info!("Stop requested for {}", job.input_path.display());
                    StopStatus::Signalled
                } else {
                    StopStatus::AlreadyStopping
                }
            }
            None => {
                debug!("Stop requested with no active job");
                StopStatus::Idle
            }
        }
    }

    /// True while a job occupies the session slot.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.lock_slot().is_some()
    }

    fn reserve(
        &self,
        request: &CompressionRequest,
        cancel: CancellationToken,
    ) -> CoreResult<SlotReservation<'_>> {
        let mut slot = self.lock_slot();
        if let Some(active) = slot.as_ref() {
            debug!(
                "Rejecting {} while {} is running",
                request.input_path.display(),
                active.input_path.display()
            );
            return Err(CoreError::Busy);
        }
        *slot = Some(ActiveJob {
            input_path: request.input_path.clone(),
            cancel,
        });
        Ok(SlotReservation { slot: &self.slot })
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<ActiveJob>> {
        // The slot only holds plain data, so a poisoned lock is still consistent.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Releases the session slot when dropped.
struct SlotReservation<'a> {
    slot: &'a Mutex<Option<ActiveJob>>,
}

impl Drop for SlotReservation<'_> {
    fn drop(&mut self) {
        let mut slot = self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = None;
    }
}
