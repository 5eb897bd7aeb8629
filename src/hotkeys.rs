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

//! Hotkeys: parsing and displaying chords, checking them for conflicts between buttons,
//! committing them to a registrar and routing key events to buttons.

mod binding;
mod conflict;
mod dispatch;
mod key;

pub use binding::{format, parse, Chord, HotkeyBinding, Scope};
pub use conflict::{
    validate, Conflict, ConflictReport, HotkeyRegistrar, HotkeySlots, MemoryRegistrar,
    OtherButton,
};
pub use dispatch::{ChordEvent, HotkeyDispatcher, KeyEventSource};
pub use key::{Key, Modifier, Modifiers};

/// Identifies a button across every page of a board.
pub type ButtonId = usize;

#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("not a hotkey: \"{0}\"")]
    InvalidChord(String),

    #[error("unable to register hotkey {binding}: {reason}")]
    RegistrationFailed { binding: String, reason: String },
}
