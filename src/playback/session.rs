// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! A single playing clip and the thread that feeds it to the output device.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, span, Level};

use super::looping::LoopingReader;
use super::progress::Progress;
use super::registry::PlaybackRegistry;
use super::PlaybackError;
use crate::audio::source::AudioSource;
use crate::audio::{AudioError, Output};
use crate::playsync::CancelHandle;

/// Identifies a session within its registry.
pub type SessionId = u64;

/// Frames read from the source per pump iteration.
const PUMP_CHUNK_FRAMES: usize = 512;

/// How long the pump sleeps when the device buffer is full.
const PUMP_IDLE: Duration = Duration::from_millis(2);

/// Whether a session is still producing audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Playing,
    Stopped,
}

/// Why a session stopped.
#[derive(Debug, Clone)]
pub enum StopReason {
    /// Stopped by the user, either directly or through stop-all.
    Requested,
    /// The clip reached its end with looping disabled.
    Finished,
    /// Reading the clip or writing to the device failed mid-playback.
    Failed(Arc<PlaybackError>),
}

type StopCallback = Box<dyn FnOnce(&StopReason) + Send>;

/// One live playback of one clip.
pub struct PlaybackSession {
    id: SessionId,
    path: PathBuf,
    reader: Mutex<LoopingReader<Box<dyn AudioSource>>>,
    /// The device output. Taken and closed when the session stops.
    output: Mutex<Option<Box<dyn Output>>>,
    /// None while playing.
    stop_reason: Mutex<Option<StopReason>>,
    on_stopped: Mutex<Vec<StopCallback>>,
    cancel_handle: CancelHandle,
    duration: Duration,
}

impl PlaybackSession {
    pub(super) fn new(
        id: SessionId,
        path: PathBuf,
        reader: LoopingReader<Box<dyn AudioSource>>,
        output: Box<dyn Output>,
    ) -> Self {
        Self {
            id,
            path,
            duration: reader.duration(),
            reader: Mutex::new(reader),
            output: Mutex::new(Some(output)),
            stop_reason: Mutex::new(None),
            on_stopped: Mutex::new(Vec::new()),
            cancel_handle: CancelHandle::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The path of the clip being played.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> SessionState {
        if self.stop_reason.lock().is_some() {
            SessionState::Stopped
        } else {
            SessionState::Playing
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state() == SessionState::Playing
    }

    /// Why the session stopped, or None if it's still playing.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason.lock().clone()
    }

    /// The current position within the clip.
    pub fn position(&self) -> Duration {
        self.reader.lock().position_time()
    }

    /// The duration of one pass over the clip.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Samples the session's progress.
    pub fn progress(&self) -> Progress {
        if !self.is_playing() {
            return Progress::NotProgressing;
        }
        Progress::sample(self.position(), self.duration)
    }

    pub fn looping(&self) -> bool {
        self.reader.lock().looping()
    }

    /// Enables or disables looping for the rest of the session.
    pub fn set_looping(&self, looping: bool) {
        self.reader.lock().set_looping(looping);
    }

    /// Registers a callback to run once the session stops. Callbacks run after the session
    /// has left its registry and may call back into it. If the session has already stopped,
    /// the callback runs immediately.
    pub fn on_stopped<F>(&self, callback: F)
    where
        F: FnOnce(&StopReason) + Send + 'static,
    {
        {
            let reason = self.stop_reason.lock();
            if reason.is_none() {
                self.on_stopped.lock().push(Box::new(callback));
                return;
            }
        }
        if let Some(reason) = self.stop_reason() {
            callback(&reason);
        }
    }

    /// The cancel handle raised when the session stops.
    pub(crate) fn cancel_handle(&self) -> &CancelHandle {
        &self.cancel_handle
    }

    /// Records the stop reason. Returns false if the session had already stopped.
    pub(super) fn mark_stopped(&self, reason: StopReason) -> bool {
        let mut current = self.stop_reason.lock();
        if current.is_some() {
            return false;
        }
        *current = Some(reason);
        self.cancel_handle.cancel();
        true
    }

    /// Closes the device output, releasing the device.
    pub(super) fn close_output(&self) {
        if let Some(mut output) = self.output.lock().take() {
            output.close();
        }
    }

    /// Runs the stop callbacks.
    pub(super) fn notify_stopped(&self, reason: &StopReason) {
        let callbacks = std::mem::take(&mut *self.on_stopped.lock());
        for callback in callbacks {
            callback(reason);
        }
    }

    fn write_output(&self, samples: &[f32]) -> Result<usize, AudioError> {
        match self.output.lock().as_mut() {
            Some(output) => output.write(samples),
            None => Err(AudioError::Closed),
        }
    }

    fn queued_output(&self) -> usize {
        self.output
            .lock()
            .as_ref()
            .map(|output| output.queued())
            .unwrap_or(0)
    }

    /// Starts the thread that moves audio from the reader to the device.
    pub(super) fn spawn_pump(self: &Arc<Self>, registry: Arc<PlaybackRegistry>) {
        let session = self.clone();
        thread::spawn(move || {
            let span = span!(Level::INFO, "playback", session = session.id);
            let _enter = span.enter();

            if let Some(reason) = session.pump() {
                registry.release(&session, reason);
            }
            debug!("Pump exited.");
        });
    }

    /// Feeds the device until the session is cancelled or the clip ends. Returns the reason to
    /// stop with if the pump itself ended the session.
    fn pump(&self) -> Option<StopReason> {
        let channels = self.reader.lock().channel_count().max(1) as usize;
        let mut buffer = vec![0.0f32; PUMP_CHUNK_FRAMES * channels];
        let mut start = 0;
        let mut end = 0;

        loop {
            if self.cancel_handle.is_cancelled() {
                return None;
            }

            if start == end {
                let read = self.reader.lock().read(&mut buffer);
                match read {
                    Ok(0) => break,
                    Ok(read) => {
                        start = 0;
                        end = read;
                    }
                    Err(e) => {
                        error!(path = ?self.path, err = %e, "Error reading clip");
                        return Some(StopReason::Failed(Arc::new(PlaybackError::StreamRead(e))));
                    }
                }
            }

            let written = match self.write_output(&buffer[start..end]) {
                Ok(written) => written,
                Err(AudioError::Closed) => return None,
                Err(e) => {
                    error!(path = ?self.path, err = %e, "Error writing to device");
                    return Some(StopReason::Failed(Arc::new(e.into())));
                }
            };
            start += written;

            if written == 0 && self.cancel_handle.wait_timeout(PUMP_IDLE) {
                return None;
            }
        }

        // Let the device play out what it has buffered before releasing it.
        while self.queued_output() > 0 {
            if self.cancel_handle.wait_timeout(PUMP_IDLE) {
                return None;
            }
        }
        info!(path = ?self.path, "Clip finished.");
        Some(StopReason::Finished)
    }
}

impl fmt::Display for PlaybackSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} ({}/{})",
            self.id,
            crate::util::filename_display(&self.path),
            crate::util::duration_minutes_seconds(self.position()),
            crate::util::duration_minutes_seconds(self.duration),
        )
    }
}
