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

use std::io;

use parking_lot::RwLock;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tracing::debug;

use super::binding::{Chord, HotkeyBinding, Scope};
use super::conflict::HotkeySlots;
use super::ButtonId;

/// A chord being pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordEvent {
    pub chord: Chord,
    /// Local events come from the application window, global events from a system wide hook.
    pub scope: Scope,
}

impl ChordEvent {
    pub fn local(chord: Chord) -> ChordEvent {
        ChordEvent {
            chord,
            scope: Scope::Local,
        }
    }

    pub fn global(chord: Chord) -> ChordEvent {
        ChordEvent {
            chord,
            scope: Scope::Global,
        }
    }
}

/// Something that reports chords as they're pressed.
pub trait KeyEventSource: Send + Sync + 'static {
    /// Starts sending chord events until the receiver goes away or the source runs dry.
    fn monitor_keys(&self, events_tx: Sender<ChordEvent>) -> JoinHandle<Result<(), io::Error>>;
}

/// Routes chord events to the buttons whose committed bindings match them.
#[derive(Default)]
pub struct HotkeyDispatcher {
    bindings: RwLock<Vec<(ButtonId, HotkeyBinding)>>,
}

impl HotkeyDispatcher {
    pub fn new() -> HotkeyDispatcher {
        HotkeyDispatcher::default()
    }

    /// Replaces the owner's bindings with its committed slots.
    pub fn set(&self, owner: ButtonId, slots: &HotkeySlots) {
        let mut bindings = self.bindings.write();
        bindings.retain(|(id, _)| *id != owner);
        bindings.extend(slots.iter().map(|binding| (owner, *binding)));
    }

    pub fn remove(&self, owner: ButtonId) {
        self.bindings.write().retain(|(id, _)| *id != owner);
    }

    pub fn len(&self) -> usize {
        self.bindings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.read().is_empty()
    }

    /// Returns the buttons the event triggers. Global bindings always fire. Local bindings fire
    /// only for local events while the application has focus.
    pub fn dispatch(&self, event: &ChordEvent, focused: bool) -> Vec<ButtonId> {
        let matched: Vec<ButtonId> = self
            .bindings
            .read()
            .iter()
            .filter(|(_, binding)| binding.chord() == event.chord)
            .filter(|(_, binding)| match binding.scope() {
                Scope::Global => true,
                Scope::Local => focused && event.scope == Scope::Local,
            })
            .map(|(id, _)| *id)
            .collect();
        debug!(chord = %event.chord, scope = %event.scope, focused, ?matched, "Dispatched chord.");
        matched
    }
}
