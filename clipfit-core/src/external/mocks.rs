// clipfit-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---

// This module is only compiled when the "test-mocks" feature is enabled.
#![cfg(feature = "test-mocks")]

use super::*;
use crate::error::{CoreError, CoreResult};
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, FfmpegProgress};
use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::os::unix::process::ExitStatusExt; // For ExitStatus::from_raw
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Raw wait status reported for a killed process (SIGKILL).
const KILLED_WAIT_STATUS: i32 = 9;

/// Builds a progress event reporting `time` (HH:MM:SS.ms) of output written.
pub fn progress_event(time: &str) -> FfmpegEvent {
    FfmpegEvent::Progress(FfmpegProgress {
        frame: 0,
        fps: 0.0,
        q: 0.0,
        size_kb: 0,
        time: time.to_string(),
        bitrate_kbps: 0.0,
        speed: 1.0,
        raw_log_message: String::new(),
    })
}

/// Mock implementation of FfmpegProcess.
#[derive(Clone)]
pub struct MockFfmpegProcess {
    /// Events to emit when handle_events is called.
    pub events_to_emit: Vec<FfmpegEvent>,
    /// Exit status to return when wait is called.
    pub exit_status: ExitStatus,
    killed: Arc<AtomicBool>,
}

impl MockFfmpegProcess {
    pub fn new(events_to_emit: Vec<FfmpegEvent>, exit_code: i32) -> Self {
        Self {
            events_to_emit,
            // Wait statuses encode the exit code in the high byte.
            exit_status: ExitStatus::from_raw(exit_code << 8),
            killed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn was_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }
}

impl FfmpegProcess for MockFfmpegProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        for event in self.events_to_emit.clone() {
            handler(event)?;
        }
        Ok(())
    }

    fn kill(&mut self) -> CoreResult<()> {
        self.killed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        if self.was_killed() {
            Ok(ExitStatus::from_raw(KILLED_WAIT_STATUS))
        } else {
            Ok(self.exit_status)
        }
    }
}

/// One scripted ffmpeg run and its mock result.
pub struct MockFfmpegExpectation {
    pub result: CoreResult<MockFfmpegProcess>,
    /// Size of the output file written when the run is spawned.
    pub output_size: Option<u64>,
}

/// Mock implementation of FfmpegSpawner.
///
/// Runs are consumed in the order they were scripted. Spawning writes a
/// sparse output file of the scripted size to the command's last argument,
/// the way ffmpeg creates its output as soon as it starts.
#[derive(Clone, Default)]
pub struct MockFfmpegSpawner {
    expectations: Arc<Mutex<VecDeque<MockFfmpegExpectation>>>,
    received_calls: Arc<Mutex<Vec<Vec<String>>>>,
    spawned: Arc<Mutex<Vec<MockFfmpegProcess>>>,
}

impl MockFfmpegSpawner {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_expectation(&self, result: CoreResult<MockFfmpegProcess>, output_size: Option<u64>) {
        self.expectations
            .lock()
            .unwrap()
            .push_back(MockFfmpegExpectation {
                result,
                output_size,
            });
    }

    /// Scripts a successful run producing an output of `output_size` bytes.
    pub fn add_success_expectation(&self, events: Vec<FfmpegEvent>, output_size: u64) {
        self.add_expectation(Ok(MockFfmpegProcess::new(events, 0)), Some(output_size));
    }

    pub fn add_spawn_error_expectation(&self, error: CoreError) {
        self.add_expectation(Err(error), None);
    }

    /// Scripts a run that writes a partial output and exits with `exit_code`.
    pub fn add_exit_error_expectation(&self, events: Vec<FfmpegEvent>, exit_code: i32) {
        self.add_expectation(Ok(MockFfmpegProcess::new(events, exit_code)), Some(1024));
    }

    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        self.received_calls.lock().unwrap().clone()
    }

    /// Number of processes that were killed.
    pub fn killed_count(&self) -> usize {
        self.spawned
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.was_killed())
            .count()
    }

    /// Scripted runs that were never spawned.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.lock().unwrap().len()
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        let args: Vec<String> = cmd
            .get_args()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        self.received_calls.lock().unwrap().push(args.clone());

        let expectation = match self.expectations.lock().unwrap().pop_front() {
            Some(expectation) => expectation,
            None => {
                log::error!("MockFfmpegSpawner: No expectation left for command args: {:?}", args);
                panic!("MockFfmpegSpawner: No expectation left for command args: {:?}", args);
            }
        };

        let process = expectation.result?;
        if let (Some(size), Some(output)) = (expectation.output_size, args.last()) {
            let output_path = PathBuf::from(output);
            let file = File::create(&output_path).unwrap_or_else(|e| {
                panic!("MockFfmpegSpawner failed to create {:?}: {}", output_path, e)
            });
            file.set_len(size).unwrap();
            log::info!(
                "MockFfmpegSpawner wrote {} byte output to {:?}",
                size,
                output_path
            );
        }

        self.spawned.lock().unwrap().push(process.clone());
        Ok(process)
    }
}

/// Mock implementation of FfprobeExecutor.
#[derive(Clone, Default)]
pub struct MockFfprobeExecutor {
    /// Map of input path -> duration or error message
    duration_results: Arc<Mutex<HashMap<PathBuf, Result<Option<f64>, String>>>>,
    probe_calls: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockFfprobeExecutor {
    pub fn new() -> Self {
        Default::default()
    }

    /// Add an expected duration for a specific input path.
    pub fn expect_duration(&self, input_path: &Path, duration: Option<f64>) {
        self.duration_results
            .lock()
            .unwrap()
            .insert(input_path.to_path_buf(), Ok(duration));
    }

    /// Make probing `input_path` fail as ffprobe would on a corrupt file.
    pub fn expect_failure(&self, input_path: &Path, message: &str) {
        self.duration_results
            .lock()
            .unwrap()
            .insert(input_path.to_path_buf(), Err(message.to_string()));
    }

    /// Paths ffprobe was actually run against.
    pub fn probe_calls(&self) -> Vec<PathBuf> {
        self.probe_calls.lock().unwrap().clone()
    }
}

impl FfprobeExecutor for MockFfprobeExecutor {
    fn read_duration(&self, input_path: &Path) -> CoreResult<Option<f64>> {
        log::info!("MockFfprobeExecutor::read_duration called for: {}", input_path.display());
        self.probe_calls.lock().unwrap().push(input_path.to_path_buf());
        match self.duration_results.lock().unwrap().get(input_path) {
            Some(Ok(duration)) => Ok(*duration),
            Some(Err(message)) => Err(CoreError::FfprobeParse(format!(
                "Mock ffprobe error for {}: {}",
                input_path.display(),
                message
            ))),
            None => {
                log::error!(
                    "MockFfprobeExecutor: No expectation set for path: {}",
                    input_path.display()
                );
                Err(CoreError::FfprobeParse(format!(
                    "MockFfprobeExecutor: No expectation set for path {}",
                    input_path.display()
                )))
            }
        }
    }

    fn read_media_info(&self, input_path: &Path) -> CoreResult<MediaInfo> {
        Ok(MediaInfo {
            duration: self.read_duration(input_path)?,
            width: Some(1920),
            height: Some(1080),
            video_codec: Some("h264".to_string()),
            audio_streams: 1,
        })
    }
}
