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

//! Periodic progress reporting for playing sessions.

use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, span, Level};

use super::session::PlaybackSession;
use crate::playsync::CancelHandle;

/// The default interval between progress samples.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A progress sample for a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// The clip is playing at `position` of `duration`.
    Playing {
        position: Duration,
        duration: Duration,
    },
    /// There is nothing meaningful to show: the duration is unknown or playback hasn't
    /// advanced yet.
    NotProgressing,
}

impl Progress {
    /// Builds a sample from a position and duration.
    pub fn sample(position: Duration, duration: Duration) -> Progress {
        if duration.is_zero() || position.is_zero() {
            Progress::NotProgressing
        } else {
            Progress::Playing { position, duration }
        }
    }

    /// The position as a fraction of the duration in [0.0, 1.0].
    pub fn ratio(&self) -> Option<f64> {
        match self {
            Progress::Playing { position, duration } => {
                Some((position.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0))
            }
            Progress::NotProgressing => None,
        }
    }
}

type Listener = Box<dyn FnMut(Progress) + Send>;

/// Samples sessions at a fixed interval.
#[derive(Debug, Clone, Copy)]
pub struct ProgressPoller {
    interval: Duration,
}

impl Default for ProgressPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl ProgressPoller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts delivering progress for the session to the listener until the session stops or
    /// the returned subscription is cancelled or dropped.
    pub fn subscribe<F>(&self, session: &Arc<PlaybackSession>, listener: F) -> Subscription
    where
        F: FnMut(Progress) + Send + 'static,
    {
        let cancel_handle = session.cancel_handle().child();
        let listener: Arc<Mutex<Listener>> = Arc::new(Mutex::new(Box::new(listener)));

        let join_handle = {
            let session = session.clone();
            let cancel_handle = cancel_handle.clone();
            let listener = listener.clone();
            let interval = self.interval;
            thread::spawn(move || {
                let span = span!(Level::DEBUG, "progress", session = session.id());
                let _enter = span.enter();

                loop {
                    let progress = session.progress();
                    {
                        // The cancel check happens under the listener lock so that nothing is
                        // delivered once Subscription::cancel has returned.
                        let mut listener = listener.lock();
                        if cancel_handle.is_cancelled() {
                            break;
                        }
                        (*listener)(progress);
                    }
                    if cancel_handle.wait_timeout(interval) {
                        break;
                    }
                }
                debug!("Progress poller exited.");
            })
        };

        Subscription {
            poller_thread: join_handle.thread().id(),
            cancel_handle,
            listener,
            detached: false,
        }
    }
}

/// A live progress subscription. Dropping it cancels the subscription.
pub struct Subscription {
    cancel_handle: CancelHandle,
    listener: Arc<Mutex<Listener>>,
    poller_thread: ThreadId,
    detached: bool,
}

impl Subscription {
    /// Stops delivery. Once this returns, the listener won't be called again.
    pub fn cancel(&self) {
        self.cancel_handle.cancel();

        // Wait out any delivery in flight, unless we're being called from inside the listener.
        if thread::current().id() != self.poller_thread {
            drop(self.listener.lock());
        }
    }

    /// Lets the subscription run until its session stops instead of ending when dropped.
    pub fn detach(mut self) {
        self.detached = true;
    }

    /// Returns true until the subscription is cancelled or its session stops.
    pub fn is_active(&self) -> bool {
        !self.cancel_handle.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.detached {
            self.cancel();
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::Progress;

    #[test]
    fn test_degenerate_progress() {
        assert_eq!(
            Progress::NotProgressing,
            Progress::sample(Duration::ZERO, Duration::from_secs(1))
        );
        assert_eq!(
            Progress::NotProgressing,
            Progress::sample(Duration::from_millis(10), Duration::ZERO)
        );
        assert_eq!(None, Progress::NotProgressing.ratio());
    }

    #[test]
    fn test_ratio() {
        let progress = Progress::sample(Duration::from_millis(250), Duration::from_secs(1));
        assert_eq!(Some(0.25), progress.ratio());

        let progress = Progress::sample(Duration::from_secs(2), Duration::from_secs(1));
        assert_eq!(Some(1.0), progress.ratio());
    }
}
