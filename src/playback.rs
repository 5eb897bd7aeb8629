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

//! Clip playback.
//!
//! This module provides:
//! - Seamless looping over finite audio sources
//! - Playback sessions, one per triggered clip, each with its own device output
//! - A registry of live sessions with stop and stop-all
//! - Cancellable progress polling for display

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::audio::source::SourceError;
use crate::audio::{AudioError, Device, StreamFormat};

mod looping;
mod progress;
mod registry;
mod resolver;
mod session;

pub use looping::LoopingReader;
pub use progress::{Progress, ProgressPoller, Subscription, DEFAULT_POLL_INTERVAL};
pub use registry::PlaybackRegistry;
pub use resolver::{FileResolver, MemoryResolver, SourceResolver};
pub use session::{PlaybackSession, SessionId, SessionState, StopReason};

/// Errors raised while starting or running playback.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("audio source not found: {}: {reason}", path.display())]
    SourceNotFound { path: PathBuf, reason: String },

    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(#[from] AudioError),

    #[error("error reading audio stream: {0}")]
    StreamRead(#[from] SourceError),

    #[error("session {0} is already registered")]
    AlreadyRegistered(SessionId),
}

/// Options for starting a clip.
#[derive(Debug, Clone, Copy)]
pub struct StartOptions {
    /// Replay the clip from the start when it ends.
    pub looping: bool,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self { looping: true }
    }
}

/// The playback service: starts clips on a device and tracks them until they stop.
pub struct Playback {
    device: Arc<dyn Device>,
    resolver: Arc<dyn SourceResolver>,
    registry: Arc<PlaybackRegistry>,
    poller: ProgressPoller,
}

impl Playback {
    /// Creates a playback service that plays files from disk on the given device.
    pub fn new(device: Arc<dyn Device>) -> Self {
        Self::with_resolver(device, Arc::new(FileResolver))
    }

    /// Creates a playback service that resolves clips through the given resolver.
    pub fn with_resolver(device: Arc<dyn Device>, resolver: Arc<dyn SourceResolver>) -> Self {
        Self {
            device,
            resolver,
            registry: Arc::new(PlaybackRegistry::new()),
            poller: ProgressPoller::default(),
        }
    }

    /// Sets the interval between progress samples.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poller = ProgressPoller::new(interval);
        self
    }

    /// The registry of live sessions.
    pub fn registry(&self) -> &Arc<PlaybackRegistry> {
        &self.registry
    }

    /// Starts playing the clip at the given path with looping enabled.
    pub fn start(&self, path: &Path) -> Result<Arc<PlaybackSession>, PlaybackError> {
        self.start_with(path, StartOptions::default())
    }

    /// Starts playing the clip at the given path. Nothing is registered if the clip can't be
    /// opened or the device refuses the stream.
    pub fn start_with(
        &self,
        path: &Path,
        options: StartOptions,
    ) -> Result<Arc<PlaybackSession>, PlaybackError> {
        let source = self.resolver.resolve(path)?;
        let format = StreamFormat {
            channels: source.channel_count(),
            sample_rate: source.sample_rate(),
        };
        let output = self.device.open(format)?;

        let mut reader = LoopingReader::new(source);
        reader.set_looping(options.looping);

        let session = Arc::new(PlaybackSession::new(
            self.registry.next_id(),
            path.to_path_buf(),
            reader,
            output,
        ));
        self.launch(&session)?;

        info!(
            session = session.id(),
            path = ?path,
            device = %self.device,
            looping = options.looping,
            "Started clip."
        );
        Ok(session)
    }

    /// Registers the session and starts its pump. A session that can't be registered never
    /// plays and its output is closed.
    fn launch(&self, session: &Arc<PlaybackSession>) -> Result<(), PlaybackError> {
        if !self.registry.register(session.clone()) {
            warn!(session = session.id(), "Session ID already registered.");
            session.mark_stopped(StopReason::Failed(Arc::new(
                PlaybackError::AlreadyRegistered(session.id()),
            )));
            session.close_output();
            return Err(PlaybackError::AlreadyRegistered(session.id()));
        }
        session.spawn_pump(self.registry.clone());
        Ok(())
    }

    /// Stops a session. Stopping an already stopped session does nothing and returns false.
    pub fn stop(&self, session: &PlaybackSession) -> bool {
        self.registry.stop(session)
    }

    /// Stops every live session, returning how many were stopped.
    pub fn stop_all(&self) -> usize {
        self.registry.stop_all()
    }

    /// A snapshot of the live sessions.
    pub fn sessions(&self) -> Vec<Arc<PlaybackSession>> {
        self.registry.sessions()
    }

    /// Delivers progress samples for the session to the listener until the session stops or
    /// the subscription is cancelled.
    pub fn subscribe_progress<F>(&self, session: &Arc<PlaybackSession>, listener: F) -> Subscription
    where
        F: FnMut(Progress) + Send + 'static,
    {
        self.poller.subscribe(session, listener)
    }
}
