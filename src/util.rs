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

use std::path::Path;
use std::time::Duration;

use crate::playback::Progress;

/// Extracts a displayable file name from a path, returning a fallback if the name is unreadable.
pub fn filename_display(path: &Path) -> &str {
    path.file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("unreadable file name")
}

/// Outputs the given duration in a minutes:seconds format.
pub fn duration_minutes_seconds(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Renders progress as a fixed width bar followed by the position and duration, e.g.
/// "[#####     ] 0:05/0:10".
pub fn progress_line(progress: &Progress, width: usize) -> String {
    match progress {
        Progress::Playing { position, duration } => {
            let ratio = progress.ratio().unwrap_or(0.0);
            let filled = ((ratio * width as f64).round() as usize).min(width);
            format!(
                "[{}{}] {}/{}",
                "#".repeat(filled),
                " ".repeat(width - filled),
                duration_minutes_seconds(*position),
                duration_minutes_seconds(*duration),
            )
        }
        Progress::NotProgressing => format!("[{}] --:--", "-".repeat(width)),
    }
}
