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

use std::path::{Path, PathBuf};
use std::time::Duration;

use duration_string::DurationString;
use serde::Deserialize;

use super::ConfigError;
use crate::playback::DEFAULT_POLL_INTERVAL;

/// The configuration for the soundboard player.
#[derive(Deserialize, Clone, Debug)]
pub struct Player {
    /// The audio device to play clips through.
    audio_device: String,
    /// The path to the board file, relative to the player config.
    board: String,
    /// How often progress is sampled, e.g. "10ms".
    poll_interval: Option<String>,
    /// Whether the player starts out focused, so local hotkeys are active.
    focused: Option<bool>,
}

impl Player {
    /// Loads a player config from a YAML file.
    pub fn load(path: &Path) -> Result<Player, ConfigError> {
        let mut player: Player = super::load_yaml(path)?;
        if let Some(dir) = path.parent() {
            let board = dir.join(&player.board);
            player.board = board.to_string_lossy().into_owned();
        }
        Ok(player)
    }

    pub fn audio_device(&self) -> &str {
        &self.audio_device
    }

    pub fn board(&self) -> PathBuf {
        PathBuf::from(&self.board)
    }

    /// The progress poll interval (default: 10ms).
    pub fn poll_interval(&self) -> Result<Duration, ConfigError> {
        match &self.poll_interval {
            Some(interval) => Ok(DurationString::from_string(interval.clone())
                .map_err(|e| ConfigError::InvalidDuration {
                    value: interval.clone(),
                    reason: e.to_string(),
                })?
                .into()),
            None => Ok(DEFAULT_POLL_INTERVAL),
        }
    }

    pub fn focused(&self) -> bool {
        self.focused.unwrap_or(true)
    }
}
