//! Trainer process launch and output streaming.
//!
//! The trainer runs as a detached child process. A dedicated worker thread
//! drains its output line-by-line and relays it over an mpsc channel; the UI
//! thread polls the receiver from its event loop and never blocks on the
//! process. The worker never touches UI state. There is no cancel: the
//! process lifetime is independent of the UI.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;

use crate::training::TrainingError;
use crate::training::settings::TrainSettings;

/// Events relayed from the trainer process to the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingEvent {
    /// One line of trainer output
    Line(String),
    /// The process exited with the given code (`None` when signal-killed)
    Finished(Option<i32>),
    /// Reading the output or waiting on the process failed
    Failed(String),
}

/// Build the trainer invocation: the fixed detect/train prefix, every
/// settings entry verbatim in file order, and the dataset manifest last.
pub fn build_command(settings: &TrainSettings, data_manifest: &Path) -> String {
    let mut command = String::from("yolo task=detect mode=train");
    for (key, value) in settings {
        command.push_str(&format!(" {}={}", key, value));
    }
    command.push_str(&format!(" data={}", data_manifest.display()));
    command
}

/// The command goes through the platform shell, with stderr folded into
/// stdout so the single reader thread sees everything.
fn shell(command: &str) -> Command {
    #[cfg(unix)]
    {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(format!("{} 2>&1", command));
        cmd
    }
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(format!("{} 2>&1", command));
        cmd
    }
}

/// A running training process, observed through its event channel.
pub struct TrainingTask {
    receiver: mpsc::Receiver<TrainingEvent>,
}

impl TrainingTask {
    /// Launch the trainer and start the output reader thread.
    pub fn spawn(command: &str) -> Result<Self, TrainingError> {
        log::info!("Launching trainer: {}", command);

        let mut child = shell(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| TrainingError::Launch(e.to_string()))?;

        let stdout = child.stdout.take().expect("stdout was piped");
        let (sender, receiver) = mpsc::channel();

        thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        // A closed receiver means the UI is gone; the
                        // process keeps running, we just stop relaying.
                        if sender.send(TrainingEvent::Line(line)).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        let _ = sender.send(TrainingEvent::Failed(e.to_string()));
                        break;
                    }
                }
            }
            match child.wait() {
                Ok(status) => {
                    let _ = sender.send(TrainingEvent::Finished(status.code()));
                }
                Err(e) => {
                    let _ = sender.send(TrainingEvent::Failed(e.to_string()));
                }
            }
        });

        Ok(Self { receiver })
    }

    /// Drain whatever events have arrived, without blocking. Called from
    /// the UI event loop each tick.
    pub fn poll(&self) -> Vec<TrainingEvent> {
        self.receiver.try_iter().collect()
    }

    /// Block for the next event. `None` means the worker is gone and no
    /// more events will come.
    pub fn recv(&self) -> Option<TrainingEvent> {
        self.receiver.recv().ok()
    }
}
