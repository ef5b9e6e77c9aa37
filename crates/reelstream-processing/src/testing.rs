//! Scripted transcoder for tests.

use crate::job::Stage;
use crate::transcoder::{EncodeCommand, ProcessExit, TranscodeError, Transcoder};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// What a scripted stage does when invoked.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// Write `bytes` to the command's output path and exit 0.
    Produce(Vec<u8>),
    /// Exit with `code` without producing output.
    Fail { code: i32, stderr: String },
    /// Exit 0 without producing output.
    NoOutput,
    /// Report a timeout.
    TimeOut,
}

/// Transcoder that writes fixed content instead of running ffmpeg.
///
/// Stages without a script produce a small payload named after the stage.
#[derive(Default)]
pub struct ScriptedTranscoder {
    script: Mutex<HashMap<String, ScriptedOutcome>>,
    invoked: Mutex<Vec<Stage>>,
    delay: Option<Duration>,
}

impl ScriptedTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before every invocation.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn on(self, stage: Stage, outcome: ScriptedOutcome) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.insert(stage.to_string(), outcome);
        }
        self
    }

    /// Stages invoked so far, in order.
    pub fn invoked(&self) -> Vec<Stage> {
        self.invoked
            .lock()
            .map(|stages| stages.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transcoder for ScriptedTranscoder {
    async fn run(&self, command: &EncodeCommand) -> Result<ProcessExit, TranscodeError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Ok(mut invoked) = self.invoked.lock() {
            invoked.push(command.stage);
        }

        let outcome = self
            .script
            .lock()
            .ok()
            .and_then(|script| script.get(&command.stage.to_string()).cloned())
            .unwrap_or_else(|| ScriptedOutcome::Produce(command.stage.to_string().into_bytes()));

        match outcome {
            ScriptedOutcome::Produce(bytes) => {
                tokio::fs::write(&command.output, bytes)
                    .await
                    .map_err(|source| TranscodeError::Wait {
                        stage: command.stage,
                        source,
                    })?;
                Ok(ProcessExit {
                    code: Some(0),
                    stderr: String::new(),
                })
            }
            ScriptedOutcome::Fail { code, stderr } => Ok(ProcessExit {
                code: Some(code),
                stderr,
            }),
            ScriptedOutcome::NoOutput => Ok(ProcessExit {
                code: Some(0),
                stderr: String::new(),
            }),
            ScriptedOutcome::TimeOut => Err(TranscodeError::TimedOut {
                stage: command.stage,
                timeout_secs: 0,
            }),
        }
    }
}
