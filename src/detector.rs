use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::runtime::PlankEvent;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("failed to spawn detector `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("detector produced no stdout")]
    NoStdout,
    #[error("unrecognized detection line: {0:?}")]
    Parse(String),
}

/// A detected face in normalized frame coordinates, origin at the bottom-left
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FaceRegion {
    /// Placeholder box used when presence is toggled by hand
    pub fn centered() -> Self {
        Self {
            x: 0.3,
            y: 0.25,
            width: 0.4,
            height: 0.5,
        }
    }
}

/// Result of running face detection on one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(default)]
    pub faces: Vec<FaceRegion>,
}

impl Detection {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn manual(present: bool) -> Self {
        Self {
            faces: if present {
                vec![FaceRegion::centered()]
            } else {
                Vec::new()
            },
        }
    }

    pub fn has_face(&self) -> bool {
        !self.faces.is_empty()
    }

    /// Parse one detector output line: a bare face count or a JSON object with `faces`.
    /// A bare count carries no geometry.
    pub fn parse_line(line: &str) -> Result<Self, DetectorError> {
        let line = line.trim();
        if let Ok(count) = line.parse::<usize>() {
            return Ok(Self {
                faces: vec![FaceRegion::centered(); count],
            });
        }
        serde_json::from_str::<Detection>(line).map_err(|_| DetectorError::Parse(line.to_string()))
    }
}

/// Camera + face detector running as a child process, one stdout line per frame
pub struct CommandDetector {
    child: Child,
    reader: JoinHandle<()>,
}

impl CommandDetector {
    /// Spawn `command` through the shell and forward every parsed frame into `tx`.
    /// Frames are dropped rather than queued when the event queue is full.
    pub fn spawn(command: &str, tx: SyncSender<PlankEvent>) -> Result<Self, DetectorError> {
        let mut child = shell(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| DetectorError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or(DetectorError::NoStdout)?;
        info!(command, "face detector started");

        let reader = thread::spawn(move || {
            let mut dropped: u64 = 0;
            for line in BufReader::new(stdout).lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(error = %e, "detector stream failed");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                let detection = match Detection::parse_line(&line) {
                    Ok(detection) => detection,
                    Err(e) => {
                        debug!(error = %e, "skipping detector line");
                        continue;
                    }
                };
                match tx.try_send(PlankEvent::Presence(detection)) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        dropped += 1;
                        trace!(dropped, "event queue full, frame dropped");
                    }
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }
            warn!(dropped, "face detector stopped producing frames");
        });

        Ok(Self { child, reader })
    }

    /// True once the detector's stdout has closed and no more frames will arrive
    pub fn is_finished(&self) -> bool {
        self.reader.is_finished()
    }
}

impl Drop for CommandDetector {
    // The reader thread is not joined: anything the command forked may still hold
    // stdout open. It exits on EOF or once the queue disconnects.
    fn drop(&mut self) {
        kill_group(&self.child);
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Run through `sh -c` in a fresh process group so the whole pipeline can be killed
#[cfg(unix)]
fn shell(command: &str) -> Command {
    use std::os::unix::process::CommandExt;

    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command).process_group(0);
    cmd
}

#[cfg(unix)]
fn kill_group(child: &Child) {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        return;
    };
    // SAFETY: killpg takes no pointers; the group was created for this child in `shell`
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        debug!(pgid, error = %std::io::Error::last_os_error(), "failed to kill detector process group");
    }
}

#[cfg(windows)]
fn kill_group(_child: &Child) {}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
