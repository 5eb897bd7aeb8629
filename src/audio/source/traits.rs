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
use std::time::Duration;

use super::error::SourceError;

/// A finite, seekable source of decoded audio.
///
/// Samples are interleaved `f32` values in [-1.0, 1.0]. Positions and lengths are counted in
/// frames (one sample per channel).
pub trait AudioSource: Send {
    /// Reads samples into `output`, returning the number of samples written (0 = EOF).
    ///
    /// Only whole frames are written, so the result is always a multiple of
    /// `channel_count()`. Callers should pass a buffer whose length is a whole number of
    /// frames.
    fn read(&mut self, output: &mut [f32]) -> Result<usize, SourceError>;

    /// Moves the read position to the given frame.
    fn seek(&mut self, frame: u64) -> Result<(), SourceError>;

    /// The current read position in frames.
    fn position(&self) -> u64;

    /// The total length of the source in frames.
    fn length(&self) -> u64;

    /// Get the number of channels in this source
    fn channel_count(&self) -> u16;

    /// Get the sample rate of this source
    fn sample_rate(&self) -> u32;

    /// The total duration of the source.
    fn duration(&self) -> Duration {
        frames_to_duration(self.length(), self.sample_rate())
    }
}

/// Blanket implementation so boxed sources can be used wherever `S: AudioSource` is required.
impl AudioSource for Box<dyn AudioSource> {
    fn read(&mut self, output: &mut [f32]) -> Result<usize, SourceError> {
        (**self).read(output)
    }

    fn seek(&mut self, frame: u64) -> Result<(), SourceError> {
        (**self).seek(frame)
    }

    fn position(&self) -> u64 {
        (**self).position()
    }

    fn length(&self) -> u64 {
        (**self).length()
    }

    fn channel_count(&self) -> u16 {
        (**self).channel_count()
    }

    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn duration(&self) -> Duration {
        (**self).duration()
    }
}

/// Converts a frame count at the given sample rate into a duration.
pub fn frames_to_duration(frames: u64, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    let rate = u64::from(sample_rate);
    Duration::from_secs(frames / rate) + Duration::from_nanos(frames % rate * 1_000_000_000 / rate)
}

/// Converts a duration into a frame count at the given sample rate, rounding to the nearest frame.
pub fn duration_to_frames(duration: Duration, sample_rate: u32) -> u64 {
    (duration.as_secs_f64() * f64::from(sample_rate)).round() as u64
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::{duration_to_frames, frames_to_duration};

    #[test]
    fn test_frame_conversions() {
        assert_eq!(Duration::from_millis(1200), frames_to_duration(52920, 44100));
        assert_eq!(52920, duration_to_frames(Duration::from_millis(1200), 44100));
        assert_eq!(Duration::ZERO, frames_to_duration(100, 0));
    }
}
