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

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::hotkeys::Chord;

/// A YAML representation of a board: pages of buttons.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct Board {
    #[serde(default)]
    pub pages: Vec<Page>,
}

/// A named page of buttons.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Page {
    pub name: String,
    #[serde(default)]
    pub buttons: Vec<Button>,
}

/// A button that plays a clip.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Button {
    pub name: String,
    /// The clip to play. Relative paths are relative to the board file.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_hotkey: Option<Chord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_hotkey: Option<Chord>,
    /// Whether the clip loops (default: true).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub looping: Option<bool>,
}

impl Button {
    pub fn looping(&self) -> bool {
        self.looping.unwrap_or(true)
    }
}

impl Board {
    /// Loads a board from a YAML file.
    pub fn load(path: &Path) -> Result<Board, ConfigError> {
        super::load_yaml(path)
    }

    /// Writes the board to a YAML file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        fs::write(path, serde_yml::to_string(self)?)?;
        Ok(())
    }
}
