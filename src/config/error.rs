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
use std::path::PathBuf;

/// Errors loading or saving player and board files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("config load/parse error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid duration \"{value}\": {reason}")]
    InvalidDuration { value: String, reason: String },

    #[error("unable to write config: {0}")]
    Write(#[from] io::Error),

    #[error("unable to serialize config: {0}")]
    Serialize(#[from] serde_yml::Error),
}
