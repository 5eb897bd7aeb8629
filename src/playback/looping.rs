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

//! Seamless looping over a finite audio source.

use std::time::Duration;

use crate::audio::source::{frames_to_duration, AudioSource, SourceError};

/// Wraps an audio source and replays it from the start whenever it runs out.
///
/// While looping is enabled and the source is non-empty, every read is filled completely, so
/// to the consumer the stream is endless. Position and length are those of the wrapped source.
pub struct LoopingReader<S: AudioSource> {
    source: S,
    looping: bool,
}

impl<S: AudioSource> LoopingReader<S> {
    /// Wraps the source with looping enabled.
    pub fn new(source: S) -> Self {
        Self {
            source,
            looping: true,
        }
    }

    /// Returns true if the reader wraps around at the end of the source.
    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Enables or disables looping. Takes effect at the next end of the source.
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Fills `output` with samples, returning how many were written.
    ///
    /// A short read only happens when looping is disabled and the source is exhausted, or when
    /// the source produces nothing even from its start. Source errors are returned as-is.
    pub fn read(&mut self, output: &mut [f32]) -> Result<usize, SourceError> {
        let channels = self.source.channel_count().max(1) as usize;
        let wanted = output.len() / channels * channels;

        let mut total = 0;
        while total < wanted {
            let read = self.source.read(&mut output[total..wanted])?;
            if read > 0 {
                total += read;
                continue;
            }

            // A source already at its start can't produce anything by seeking there again.
            if !self.looping || self.source.position() == 0 {
                break;
            }
            self.source.seek(0)?;
        }

        Ok(total)
    }

    /// The current position of the source in frames.
    pub fn position(&self) -> u64 {
        self.source.position()
    }

    /// The length of the source in frames.
    pub fn length(&self) -> u64 {
        self.source.length()
    }

    /// The current position of the source as a duration.
    pub fn position_time(&self) -> Duration {
        frames_to_duration(self.source.position(), self.source.sample_rate())
    }

    /// The duration of one pass over the source.
    pub fn duration(&self) -> Duration {
        self.source.duration()
    }

    pub fn channel_count(&self) -> u16 {
        self.source.channel_count()
    }

    pub fn sample_rate(&self) -> u32 {
        self.source.sample_rate()
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;
    use crate::audio::source::{duration_to_frames, MemorySource};

    /// Counts up from zero so every sample identifies its own frame.
    fn ramp(frames: usize) -> MemorySource {
        MemorySource::new((0..frames).map(|i| i as f32).collect(), 1, 1000)
    }

    /// A source that fails after a number of successful reads.
    struct FailingSource {
        inner: MemorySource,
        reads_left: usize,
    }

    impl AudioSource for FailingSource {
        fn read(&mut self, output: &mut [f32]) -> Result<usize, SourceError> {
            if self.reads_left == 0 {
                return Err(SourceError::IoError(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk on fire",
                )));
            }
            self.reads_left -= 1;
            self.inner.read(output)
        }

        fn seek(&mut self, frame: u64) -> Result<(), SourceError> {
            self.inner.seek(frame)
        }

        fn position(&self) -> u64 {
            self.inner.position()
        }

        fn length(&self) -> u64 {
            self.inner.length()
        }

        fn channel_count(&self) -> u16 {
            1
        }

        fn sample_rate(&self) -> u32 {
            1000
        }
    }

    #[test]
    fn test_looping_fills_every_read() -> Result<(), SourceError> {
        let mut reader = LoopingReader::new(ramp(10));
        for size in [1, 3, 7, 10, 11, 25, 64] {
            let mut buf = vec![-1.0; size];
            assert_eq!(size, reader.read(&mut buf)?, "short read of {}", size);
            assert!(reader.position() <= reader.length());
        }
        Ok(())
    }

    #[test]
    fn test_wraps_to_start_without_gap() -> Result<(), SourceError> {
        let mut reader = LoopingReader::new(ramp(4));
        let mut buf = [0.0; 10];
        reader.read(&mut buf)?;
        assert_eq!([0.0, 1.0, 2.0, 3.0, 0.0, 1.0, 2.0, 3.0, 0.0, 1.0], buf);
        assert_eq!(2, reader.position());
        assert_eq!(4, reader.length());
        Ok(())
    }

    #[test]
    fn test_without_looping_returns_short_read() -> Result<(), SourceError> {
        let mut reader = LoopingReader::new(ramp(4));
        reader.set_looping(false);
        assert!(!reader.looping());

        let mut buf = [0.0; 6];
        assert_eq!(4, reader.read(&mut buf)?);
        assert_eq!(0, reader.read(&mut buf)?);
        Ok(())
    }

    #[test]
    fn test_empty_source_terminates() -> Result<(), SourceError> {
        let mut reader = LoopingReader::new(MemorySource::new(Vec::new(), 2, 44100));
        let mut buf = [0.0; 512];
        assert_eq!(0, reader.read(&mut buf)?);
        assert_eq!(0, reader.read(&mut buf)?);
        Ok(())
    }

    #[test]
    fn test_whole_frames_only() -> Result<(), SourceError> {
        let mut reader = LoopingReader::new(MemorySource::new(vec![0.1, 0.2, 0.3, 0.4], 2, 10));
        let mut buf = [0.0; 5];
        assert_eq!(4, reader.read(&mut buf)?);
        Ok(())
    }

    #[test]
    fn test_errors_propagate() {
        let mut reader = LoopingReader::new(FailingSource {
            inner: ramp(4),
            reads_left: 1,
        });
        let mut buf = [0.0; 8];
        assert!(matches!(reader.read(&mut buf), Err(SourceError::IoError(_))));
    }

    #[test]
    fn test_clip_loops_after_full_pass() -> Result<(), SourceError> {
        // 1200ms of audio at 1kHz.
        let frames = duration_to_frames(Duration::from_millis(1200), 1000) as usize;
        let mut reader = LoopingReader::new(ramp(frames));
        assert_eq!(Duration::from_millis(1200), reader.duration());

        let mut pass = vec![0.0; frames];
        assert_eq!(frames, reader.read(&mut pass)?);
        assert_eq!(frames as f32 - 1.0, pass[frames - 1]);
        assert_eq!(Duration::from_millis(1200), reader.position_time());

        // The next sample is frame zero again, with the final frame emitted exactly once.
        let mut next = [0.0; 2];
        reader.read(&mut next)?;
        assert_eq!([0.0, 1.0], next);
        assert_eq!(2, reader.position());
        Ok(())
    }

    #[test]
    fn test_disabling_looping_mid_stream() -> Result<(), SourceError> {
        let mut reader = LoopingReader::new(ramp(4));
        let mut buf = [0.0; 6];
        assert_eq!(6, reader.read(&mut buf)?);

        reader.set_looping(false);
        assert_eq!(2, reader.read(&mut buf)?);
        assert_eq!([2.0, 3.0], buf[..2]);
        Ok(())
    }
}
