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
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::session::{PlaybackSession, SessionId, StopReason};

/// The set of live playback sessions.
///
/// A session is registered before its output starts and leaves the registry in the same
/// critical section that releases its device, so the registry never holds a session whose
/// device is gone.
pub struct PlaybackRegistry {
    sessions: Mutex<HashMap<SessionId, Arc<PlaybackSession>>>,
    next_id: AtomicU64,
}

impl Default for PlaybackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocates an unused session ID.
    pub(super) fn next_id(&self) -> SessionId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Adds a session. Returns false if a session with the same ID is already registered.
    pub(super) fn register(&self, session: Arc<PlaybackSession>) -> bool {
        let mut sessions = self.sessions.lock();
        if sessions.contains_key(&session.id()) {
            return false;
        }
        debug!(session = session.id(), "Registered session.");
        sessions.insert(session.id(), session);
        true
    }

    /// Looks up a live session.
    pub fn get(&self, id: SessionId) -> Option<Arc<PlaybackSession>> {
        self.sessions.lock().get(&id).cloned()
    }

    /// A snapshot of the live sessions, oldest first.
    pub fn sessions(&self) -> Vec<Arc<PlaybackSession>> {
        let mut sessions: Vec<Arc<PlaybackSession>> =
            self.sessions.lock().values().cloned().collect();
        sessions.sort_by_key(|session| session.id());
        sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Stops the given session. Returns false if it had already stopped.
    pub fn stop(&self, session: &PlaybackSession) -> bool {
        self.release(session, StopReason::Requested)
    }

    /// Stops every session registered at the time of the call and returns how many were
    /// stopped. Sessions started while this runs may be left playing.
    pub fn stop_all(&self) -> usize {
        let stopped = self
            .sessions()
            .iter()
            .filter(|session| self.stop(session))
            .count();
        if stopped > 0 {
            info!(stopped, "Stopped all sessions.");
        }
        stopped
    }

    /// Ends a session: records the reason, releases its device and removes it from the
    /// registry, then runs its stop callbacks outside the registry lock.
    pub(super) fn release(&self, session: &PlaybackSession, reason: StopReason) -> bool {
        if !session.mark_stopped(reason.clone()) {
            return false;
        }

        {
            let mut sessions = self.sessions.lock();
            session.close_output();
            sessions.remove(&session.id());
        }
        debug!(session = session.id(), reason = ?reason, "Released session.");

        session.notify_stopped(&reason);
        true
    }
}
