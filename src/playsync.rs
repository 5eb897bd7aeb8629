// Copyright (C) 2024 Michael Wilson <mike@mdwn.dev>
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
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Represents the current cancel state.
#[derive(PartialEq)]
enum CancelState {
    Untouched,
    Cancelled,
}

struct Inner {
    state: Mutex<CancelState>,
    condvar: Condvar,
    /// Handles cancelled along with this one.
    children: Mutex<Vec<CancelHandle>>,
}

/// A cancel handle is shared between a playback session and the threads working on its behalf
/// (the output pump, progress pollers). Cancelling wakes every waiter immediately.
#[derive(Clone)]
pub struct CancelHandle {
    inner: Arc<Inner>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    /// Creates a new cancel handle.
    pub fn new() -> CancelHandle {
        CancelHandle {
            inner: Arc::new(Inner {
                state: Mutex::new(CancelState::Untouched),
                condvar: Condvar::new(),
                children: Mutex::new(Vec::new()),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, CancelState> {
        // The state is a plain enum, so a poisoned lock still holds a usable value.
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Creates a handle that is cancelled whenever this one is. Cancelling the child does not
    /// affect the parent. A child of an already cancelled handle starts out cancelled.
    pub fn child(&self) -> CancelHandle {
        let child = CancelHandle::new();
        {
            let mut children = self
                .inner
                .children
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if !self.is_cancelled() {
                children.retain(|c| !c.is_cancelled());
                children.push(child.clone());
                return child;
            }
        }
        child.cancel();
        child
    }

    /// Returns true if the handle has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.state() == CancelState::Cancelled
    }

    /// Blocks until the handle is cancelled.
    pub fn wait(&self) {
        let guard = self.state();
        let _unused = self
            .inner
            .condvar
            .wait_while(guard, |state| *state == CancelState::Untouched)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
    }

    /// Blocks until the handle is cancelled or the timeout elapses. Returns true if cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.state();
        while *guard == CancelState::Untouched {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            guard = match self.inner.condvar.wait_timeout(guard, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }

    /// Cancels the handle and all of its children.
    pub fn cancel(&self) {
        {
            let mut state = self.state();
            if *state == CancelState::Cancelled {
                return;
            }
            *state = CancelState::Cancelled;
            self.inner.condvar.notify_all();
        }

        let children = std::mem::take(
            &mut *self
                .inner
                .children
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        for child in children {
            child.cancel();
        }
    }
}

#[cfg(test)]
mod test {
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;

    #[test]
    fn test_cancel_handle_cancelled() {
        let cancel_handle = CancelHandle::new();
        assert!(!cancel_handle.is_cancelled());

        let join = {
            let cancel_handle = cancel_handle.clone();
            thread::spawn(move || cancel_handle.wait())
        };

        cancel_handle.cancel();
        assert!(join.join().is_ok());
        assert!(cancel_handle.is_cancelled());
    }

    #[test]
    fn test_wait_timeout_expires() {
        let cancel_handle = CancelHandle::new();
        assert!(!cancel_handle.wait_timeout(Duration::from_millis(5)));
    }

    #[test]
    fn test_wait_timeout_wakes_on_cancel() {
        let cancel_handle = CancelHandle::new();
        let join = {
            let cancel_handle = cancel_handle.clone();
            thread::spawn(move || {
                let start = Instant::now();
                let cancelled = cancel_handle.wait_timeout(Duration::from_secs(10));
                (cancelled, start.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(20));
        cancel_handle.cancel();
        let (cancelled, elapsed) = join.join().expect("join");
        assert!(cancelled);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_child_follows_parent() {
        let parent = CancelHandle::new();
        let child = parent.child();
        let sibling = parent.child();

        child.cancel();
        assert!(!parent.is_cancelled());
        assert!(!sibling.is_cancelled());

        parent.cancel();
        assert!(sibling.is_cancelled());
        assert!(parent.child().is_cancelled());
    }
}
