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

//! Keys and modifiers that make up a chord.

use std::fmt;

macro_rules! keys {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// A logical key that can be bound to a button.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Key {
            $($variant),+
        }

        impl Key {
            /// Every supported key.
            pub const ALL: &'static [Key] = &[$(Key::$variant),+];

            /// The display name of the key.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Key::$variant => $name),+
                }
            }
        }
    };
}

keys! {
    A => "A", B => "B", C => "C", D => "D", E => "E", F => "F", G => "G",
    H => "H", I => "I", J => "J", K => "K", L => "L", M => "M", N => "N",
    O => "O", P => "P", Q => "Q", R => "R", S => "S", T => "T", U => "U",
    V => "V", W => "W", X => "X", Y => "Y", Z => "Z",
    Digit0 => "0", Digit1 => "1", Digit2 => "2", Digit3 => "3", Digit4 => "4",
    Digit5 => "5", Digit6 => "6", Digit7 => "7", Digit8 => "8", Digit9 => "9",
    F1 => "F1", F2 => "F2", F3 => "F3", F4 => "F4", F5 => "F5", F6 => "F6",
    F7 => "F7", F8 => "F8", F9 => "F9", F10 => "F10", F11 => "F11", F12 => "F12",
    F13 => "F13", F14 => "F14", F15 => "F15", F16 => "F16", F17 => "F17", F18 => "F18",
    F19 => "F19", F20 => "F20", F21 => "F21", F22 => "F22", F23 => "F23", F24 => "F24",
    Numpad0 => "Num0", Numpad1 => "Num1", Numpad2 => "Num2", Numpad3 => "Num3",
    Numpad4 => "Num4", Numpad5 => "Num5", Numpad6 => "Num6", Numpad7 => "Num7",
    Numpad8 => "Num8", Numpad9 => "Num9",
    NumpadAdd => "NumAdd", NumpadSubtract => "NumSubtract",
    NumpadMultiply => "NumMultiply", NumpadDivide => "NumDivide",
    NumpadDecimal => "NumDecimal",
    Space => "Space", Enter => "Enter", Tab => "Tab", Escape => "Esc",
    Backspace => "Backspace", Delete => "Delete", Insert => "Insert",
    Home => "Home", End => "End", PageUp => "PageUp", PageDown => "PageDown",
    Up => "Up", Down => "Down", Left => "Left", Right => "Right",
    Minus => "Minus", Plus => "Plus", Comma => "Comma", Period => "Period",
    Slash => "Slash", Backslash => "Backslash", Semicolon => "Semicolon",
    Quote => "Quote", BracketLeft => "[", BracketRight => "]", Backquote => "Backquote",
    PrintScreen => "PrintScreen", ScrollLock => "ScrollLock", Pause => "Pause",
    CapsLock => "CapsLock", NumLock => "NumLock",
    MediaPlayPause => "MediaPlayPause", MediaStop => "MediaStop",
    MediaNext => "MediaNext", MediaPrevious => "MediaPrevious",
    VolumeUp => "VolumeUp", VolumeDown => "VolumeDown", VolumeMute => "VolumeMute",
}

impl Key {
    /// Looks up a key by its display name, ignoring case.
    pub fn from_name(name: &str) -> Option<Key> {
        Key::ALL
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Control,
    Shift,
    Alt,
    Meta,
}

impl Modifier {
    /// Every modifier, in display order.
    pub const ALL: [Modifier; 4] = [
        Modifier::Control,
        Modifier::Shift,
        Modifier::Alt,
        Modifier::Meta,
    ];

    /// The token used when displaying a chord.
    pub fn token(&self) -> &'static str {
        match self {
            Modifier::Control => "Ctrl",
            Modifier::Shift => "Shift",
            Modifier::Alt => "Alt",
            Modifier::Meta => "Meta",
        }
    }

    /// Recognizes a modifier token, including common platform spellings.
    pub fn from_token(token: &str) -> Option<Modifier> {
        match token.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => Some(Modifier::Control),
            "shift" => Some(Modifier::Shift),
            "alt" | "option" => Some(Modifier::Alt),
            "meta" | "cmd" | "command" | "super" | "win" => Some(Modifier::Meta),
            _ => None,
        }
    }

    fn bit(&self) -> u8 {
        match self {
            Modifier::Control => 0b0001,
            Modifier::Shift => 0b0010,
            Modifier::Alt => 0b0100,
            Modifier::Meta => 0b1000,
        }
    }
}

/// A set of modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);

    pub fn new(modifiers: &[Modifier]) -> Modifiers {
        modifiers
            .iter()
            .fold(Modifiers::NONE, |set, modifier| set.with(*modifier))
    }

    /// Returns a copy of the set with the modifier added.
    pub fn with(self, modifier: Modifier) -> Modifiers {
        Modifiers(self.0 | modifier.bit())
    }

    pub fn contains(&self, modifier: Modifier) -> bool {
        self.0 & modifier.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// The modifiers in the set, in display order.
    pub fn iter(&self) -> impl Iterator<Item = Modifier> + '_ {
        Modifier::ALL
            .into_iter()
            .filter(move |modifier| self.contains(*modifier))
    }

    /// Every possible modifier set.
    pub fn all_sets() -> impl Iterator<Item = Modifiers> {
        (0..16u8).map(Modifiers)
    }
}
