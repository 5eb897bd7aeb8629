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

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::key::{Key, Modifier, Modifiers};
use super::HotkeyError;

/// Separates the tokens of a displayed chord.
const SEPARATOR: &str = " + ";

/// Where a hotkey is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Only while the application window has focus.
    Local,
    /// System wide.
    Global,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Local => f.write_str("local"),
            Scope::Global => f.write_str("global"),
        }
    }
}

/// A key pressed together with a set of modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl Chord {
    pub fn new(key: Key, modifiers: Modifiers) -> Chord {
        Chord { key, modifiers }
    }

    /// Parses a displayed chord such as "Ctrl + Shift + A".
    ///
    /// The text is split on "+" and each token is trimmed. Modifier tokens may appear anywhere,
    /// the last token must name a key. Returns None if it doesn't, or if any other token isn't a
    /// modifier.
    pub fn parse(text: &str) -> Option<Chord> {
        let mut tokens: Vec<&str> = text.split('+').map(str::trim).collect();
        let key = Key::from_name(tokens.pop()?)?;

        let mut modifiers = Modifiers::NONE;
        for token in tokens {
            modifiers = modifiers.with(Modifier::from_token(token)?);
        }
        Some(Chord { key, modifiers })
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in self.modifiers.iter() {
            write!(f, "{}{}", modifier.token(), SEPARATOR)?;
        }
        f.write_str(self.key.name())
    }
}

impl FromStr for Chord {
    type Err = HotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chord::parse(s).ok_or_else(|| HotkeyError::InvalidChord(s.to_string()))
    }
}

impl Serialize for Chord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Chord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// A chord bound with a scope.
///
/// Two bindings are equal when their chords are equal. The scope is carried along but plays no
/// part in equality or hashing.
#[derive(Debug, Clone, Copy)]
pub struct HotkeyBinding {
    chord: Chord,
    scope: Scope,
}

impl HotkeyBinding {
    pub fn new(key: Key, modifiers: Modifiers, scope: Scope) -> HotkeyBinding {
        HotkeyBinding {
            chord: Chord::new(key, modifiers),
            scope,
        }
    }

    pub fn from_chord(chord: Chord, scope: Scope) -> HotkeyBinding {
        HotkeyBinding { chord, scope }
    }

    pub fn key(&self) -> Key {
        self.chord.key
    }

    pub fn modifiers(&self) -> Modifiers {
        self.chord.modifiers
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn chord(&self) -> Chord {
        self.chord
    }

    /// Returns a copy of the binding with a different scope.
    pub fn with_scope(&self, scope: Scope) -> HotkeyBinding {
        HotkeyBinding {
            chord: self.chord,
            scope,
        }
    }

    /// True if both bindings are triggered by the same key and modifiers. Scope isn't compared.
    pub fn same_chord(&self, other: &HotkeyBinding) -> bool {
        self.chord == other.chord
    }
}

impl PartialEq for HotkeyBinding {
    fn eq(&self, other: &HotkeyBinding) -> bool {
        self.same_chord(other)
    }
}

impl Eq for HotkeyBinding {}

impl Hash for HotkeyBinding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chord.hash(state);
    }
}

impl fmt::Display for HotkeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.chord, f)
    }
}

impl FromStr for HotkeyBinding {
    type Err = HotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(HotkeyBinding::from_chord(s.parse()?, Scope::Local))
    }
}

/// Formats a binding as its display string, e.g. "Ctrl + Shift + A".
pub fn format(binding: &HotkeyBinding) -> String {
    binding.to_string()
}

/// Parses a display string into a local binding. Returns None if the text isn't a chord.
pub fn parse(text: &str) -> Option<HotkeyBinding> {
    Chord::parse(text).map(|chord| HotkeyBinding::from_chord(chord, Scope::Local))
}
