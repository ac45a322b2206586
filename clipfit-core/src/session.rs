// ============================================================================
// clipfit-core/src/session.rs
// ============================================================================
//
// TRANSCODE SESSION: One compression job from probe to final file
//
// A session walks Idle -> Probing -> Encoding -> {Succeeded|Failed|Cancelled}.
// In bitrate mode it encodes, measures the file on disk, and retries with a
// lower bitrate until the output fits or the attempt budget runs out. Quality
// mode encodes exactly once.
//
// Every attempt writes to the same allocated output path (ffmpeg runs with
// -y), so a finished session leaves exactly one file behind, or none when it
// failed or was cancelled.

use std::fmt;
use std::path::PathBuf;

use log::{debug, info, warn};
use serde::Serialize;

use crate::bitrate::{self, EncodeParameters};
use crate::cancel::CancellationToken;
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::ffmpeg::{
    AttemptResult, EncodeParams, cleanup_partial_output, run_encode_attempt,
};
use crate::external::{FfmpegSpawner, FfprobeExecutor, FileMetadataProvider};
use crate::progress_reporting::ProgressEvent;
use crate::request::CompressionRequest;
use crate::utils::format_bytes;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Probing,
    Encoding,
    Succeeded,
    Failed,
    Cancelled,
}

impl SessionStatus {
    /// True once the session can no longer change state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionStatus::Succeeded | SessionStatus::Failed | SessionStatus::Cancelled
        )
    }

    /// True while the session occupies the compressor.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, SessionStatus::Probing | SessionStatus::Encoding)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, next),
            (Idle, Probing)
                | (Probing, Encoding)
                | (Probing, Failed)
                | (Probing, Cancelled)
                | (Encoding, Succeeded)
                | (Encoding, Failed)
                | (Encoding, Cancelled)
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Probing => "probing",
            SessionStatus::Encoding => "encoding",
            SessionStatus::Succeeded => "succeeded",
            SessionStatus::Failed => "failed",
            SessionStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Observable state of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub status: SessionStatus,
    /// Index of the attempt currently or most recently running.
    pub current_attempt: Option<u32>,
    /// Source duration once probed; `None` while unknown.
    pub total_duration_secs: Option<f64>,
    pub cancel_requested: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            status: SessionStatus::Idle,
            current_attempt: None,
            total_duration_secs: None,
            cancel_requested: false,
        }
    }
}

/// One encoder run and what it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodeAttempt {
    pub attempt_index: u32,
    pub bitrate_bps: Option<u64>,
    pub quality_factor: Option<u8>,
    /// Size of the output on disk after the encoder finished.
    pub result_size_bytes: Option<u64>,
}

impl EncodeAttempt {
    #[must_use]
    pub fn new(attempt_index: u32, parameters: EncodeParameters) -> Self {
        Self {
            attempt_index,
            bitrate_bps: parameters.bitrate_bps(),
            quality_factor: parameters.quality_factor(),
            result_size_bytes: None,
        }
    }
}

/// Summary of a finished job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionResult {
    pub output_path: PathBuf,
    pub final_size_bytes: u64,
    /// False when the attempt budget ran out before the output fit.
    pub within_budget: bool,
    pub attempts: Vec<EncodeAttempt>,
    pub duration_secs: Option<f64>,
}

/// How a job ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompressionOutcome {
    Completed(CompressionResult),
    Cancelled,
}

/// Drives one [`CompressionRequest`] through probing and encoding.
pub struct TranscodeSession<'a, S, P, M> {
    spawner: &'a S,
    prober: &'a P,
    metadata: &'a M,
    config: &'a CoreConfig,
    request: CompressionRequest,
    output_path: PathBuf,
    cancel: CancellationToken,
    state: SessionState,
    attempts: Vec<EncodeAttempt>,
}

impl<'a, S, P, M> TranscodeSession<'a, S, P, M>
where
    S: FfmpegSpawner,
    P: FfprobeExecutor,
    M: FileMetadataProvider,
{
    /// Creates an idle session writing to an already allocated `output_path`.
    pub fn new(
        spawner: &'a S,
        prober: &'a P,
        metadata: &'a M,
        config: &'a CoreConfig,
        request: CompressionRequest,
        output_path: PathBuf,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            spawner,
            prober,
            metadata,
            config,
            request,
            output_path,
            cancel,
            state: SessionState::default(),
            attempts: Vec::new(),
        }
    }

    /// Runs the job to a terminal state.
    ///
    /// Returns `Completed` on success (including an exhausted budget),
    /// `Cancelled` when cancellation was observed, and an error on probe or
    /// encoder failure. `on_progress` is called from this thread.
    pub fn run<F>(&mut self, mut on_progress: F) -> CoreResult<CompressionOutcome>
    where
        F: FnMut(ProgressEvent),
    {
        self.transition(SessionStatus::Probing)?;

        let duration = match self.prober.probe_duration(&self.request.input_path) {
            Ok(duration) => Some(duration),
            Err(err @ CoreError::UnsupportedInput { .. }) => return self.fail(err),
            Err(err) if self.request.is_quality_mode() && err.is_probe_error() => {
                warn!(
                    "Could not probe {} ({err}); encoding without progress",
                    self.request.input_path.display()
                );
                None
            }
            Err(err) => return self.fail(err),
        };
        self.state.total_duration_secs = duration;

        if self.cancel.is_cancelled() {
            return self.finish_cancelled();
        }

        let mut parameters = match bitrate::initial_parameters(&self.request, duration) {
            Ok(parameters) => parameters,
            Err(err) => return self.fail(err),
        };

        self.transition(SessionStatus::Encoding)?;

        let budget = if self.request.is_quality_mode() {
            1
        } else {
            self.config.max_attempts
        };

        for attempt_index in 0..budget {
            if self.cancel.is_cancelled() {
                return self.finish_cancelled();
            }

            self.state.current_attempt = Some(attempt_index);
            let mut attempt = EncodeAttempt::new(attempt_index, parameters);

            let params = EncodeParams {
                input_path: self.request.input_path.clone(),
                output_path: self.output_path.clone(),
                parameters,
                container: self.request.output_container,
                suppress_audio: self.request.suppress_audio,
                preset: self.config.encoder_preset.clone(),
                ffmpeg_path: self.config.ffmpeg_path.clone(),
                attempt_index,
            };

            if duration.is_some() {
                on_progress(ProgressEvent::new(attempt_index, 0.0));
            }
            let result = run_encode_attempt(self.spawner, &params, duration, &self.cancel, |fraction| {
                on_progress(ProgressEvent::new(attempt_index, fraction));
            });

            match result {
                Ok(AttemptResult::Completed) => {}
                Ok(AttemptResult::Cancelled) => {
                    self.attempts.push(attempt);
                    return self.finish_cancelled();
                }
                Err(err) => {
                    self.attempts.push(attempt);
                    return self.fail(err);
                }
            }

            let size = match self.metadata.get_size(&self.output_path) {
                Ok(size) => size,
                Err(err) => {
                    self.attempts.push(attempt);
                    return self.fail(err);
                }
            };
            attempt.result_size_bytes = Some(size);
            self.attempts.push(attempt);

            let within_budget = size <= self.request.max_output_size_bytes;
            info!(
                "Attempt {} produced {} (limit {})",
                attempt_index + 1,
                format_bytes(size),
                format_bytes(self.request.max_output_size_bytes)
            );

            if within_budget || self.request.is_quality_mode() {
                return self.succeed(size, within_budget);
            }

            match next_parameters(
                parameters,
                attempt_index,
                budget,
                self.config.bitrate_backoff_factor,
            ) {
                Some(next) => {
                    debug!("Output over budget; retrying with {next}");
                    parameters = next;
                }
                None => break,
            }
        }

        let final_size = self
            .attempts
            .last()
            .and_then(|attempt| attempt.result_size_bytes)
            .unwrap_or_default();
        warn!(
            "Output still {} after {} attempts; keeping the last attempt",
            format_bytes(final_size),
            self.attempts.len()
        );
        self.succeed(final_size, false)
    }

    fn transition(&mut self, next: SessionStatus) -> CoreResult<()> {
        let current = self.state.status;
        if !current.can_transition_to(next) {
            return Err(CoreError::InvalidRequest(format!(
                "session cannot move from {current} to {next}"
            )));
        }
        debug!("Session {current} -> {next}");
        self.state.status = next;
        Ok(())
    }

    fn succeed(&mut self, final_size_bytes: u64, within_budget: bool) -> CoreResult<CompressionOutcome> {
        self.transition(SessionStatus::Succeeded)?;
        Ok(CompressionOutcome::Completed(CompressionResult {
            output_path: self.output_path.clone(),
            final_size_bytes,
            within_budget,
            attempts: self.attempts.clone(),
            duration_secs: self.state.total_duration_secs,
        }))
    }

    fn fail(&mut self, err: CoreError) -> CoreResult<CompressionOutcome> {
        cleanup_partial_output(&self.output_path);
        self.transition(SessionStatus::Failed)?;
        Err(err)
    }

    fn finish_cancelled(&mut self) -> CoreResult<CompressionOutcome> {
        self.state.cancel_requested = true;
        cleanup_partial_output(&self.output_path);
        self.transition(SessionStatus::Cancelled)?;
        info!("Compression of {} cancelled", self.request.input_path.display());
        Ok(CompressionOutcome::Cancelled)
    }
}

/// Parameters for the attempt after an oversized `current` one, or `None`
/// when `attempt_index` was the last attempt the budget allows.
fn next_parameters(
    current: EncodeParameters,
    attempt_index: u32,
    budget: u32,
    backoff_factor: f64,
) -> Option<EncodeParameters> {
    if attempt_index + 1 >= budget {
        return None;
    }
    match current {
        EncodeParameters::Bitrate { bitrate_bps } => Some(EncodeParameters::Bitrate {
            bitrate_bps: bitrate::next_bitrate_with_factor(bitrate_bps, backoff_factor),
        }),
        EncodeParameters::ConstantQuality { .. } => None,
    }
}
