use crate::job::Stage;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;

/// Keep at most this much of the encoder's stderr in errors and logs.
const STDERR_TAIL_BYTES: usize = 2048;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("{stage} failed ({}): {stderr}", exit_label(.code))]
    NonZeroExit {
        stage: Stage,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{stage} timed out after {timeout_secs}s")]
    TimedOut { stage: Stage, timeout_secs: u64 },

    #[error("failed to launch encoder for {stage}: {source}")]
    Spawn {
        stage: Stage,
        #[source]
        source: io::Error,
    },

    #[error("failed waiting on encoder for {stage}: {source}")]
    Wait {
        stage: Stage,
        #[source]
        source: io::Error,
    },

    #[error("{stage} exited cleanly but produced no output at {}", .path.display())]
    MissingOutput { stage: Stage, path: PathBuf },
}

impl TranscodeError {
    pub fn stage(&self) -> Stage {
        match self {
            TranscodeError::NonZeroExit { stage, .. }
            | TranscodeError::TimedOut { stage, .. }
            | TranscodeError::Spawn { stage, .. }
            | TranscodeError::Wait { stage, .. }
            | TranscodeError::MissingOutput { stage, .. } => *stage,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// One encoder invocation: arguments plus the file it must produce.
#[derive(Debug, Clone)]
pub struct EncodeCommand {
    pub stage: Stage,
    pub args: Vec<String>,
    pub output: PathBuf,
}

impl EncodeCommand {
    pub fn new(stage: Stage, args: Vec<String>, output: impl AsRef<Path>) -> Self {
        Self {
            stage,
            args,
            output: output.as_ref().to_path_buf(),
        }
    }
}

/// How the encoder process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExit {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stderr: String,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs one encoder invocation to completion.
///
/// Implementations report how the process ended; judging success is left to the caller.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn run(&self, command: &EncodeCommand) -> Result<ProcessExit, TranscodeError>;
}

/// Transcoder backed by an ffmpeg binary.
///
/// Each invocation gets a wall-clock limit; on expiry the child is killed.
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout,
        }
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.ffmpeg_path
    }
}

fn stderr_tail(raw: &[u8]) -> String {
    let start = raw.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&raw[start..]).trim().to_string()
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    #[tracing::instrument(skip(self, command), fields(stage = %command.stage))]
    async fn run(&self, command: &EncodeCommand) -> Result<ProcessExit, TranscodeError> {
        let stage = command.stage;
        let start = Instant::now();

        tracing::debug!(
            ffmpeg_path = %self.ffmpeg_path,
            args = ?command.args,
            "Launching encoder"
        );

        let child = Command::new(&self.ffmpeg_path)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TranscodeError::Spawn { stage, source })?;

        // On timeout the wait future is dropped together with the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| TranscodeError::Wait { stage, source })?,
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "Encoder exceeded its time limit and was killed"
                );
                return Err(TranscodeError::TimedOut {
                    stage,
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let exit = ProcessExit {
            code: output.status.code(),
            stderr: stderr_tail(&output.stderr),
        };

        tracing::debug!(
            exit_code = ?exit.code,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Encoder exited"
        );

        Ok(exit)
    }
}
