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
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use hound::WavReader;

use super::error::SourceError;
use super::traits::AudioSource;

/// An audio source that streams samples from a WAV file on disk.
pub struct WavSource {
    wav_reader: WavReader<BufReader<File>>,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    sample_format: hound::SampleFormat,
    /// Total length in frames.
    length: u64,
    /// Current read position in frames.
    position: u64,
}

impl WavSource {
    /// Opens the WAV file at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let wav_reader = WavReader::open(path)?;
        let spec = wav_reader.spec();
        if spec.channels == 0 {
            return Err(SourceError::UnsupportedLayout(
                "WAV file has no channels".to_string(),
            ));
        }

        Ok(Self {
            length: u64::from(wav_reader.duration()),
            wav_reader,
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: spec.sample_format,
            position: 0,
        })
    }
}

impl AudioSource for WavSource {
    fn read(&mut self, output: &mut [f32]) -> Result<usize, SourceError> {
        let channels = self.channels as usize;
        let wanted = (output.len() / channels) * channels;
        let mut written = 0;

        if self.sample_format == hound::SampleFormat::Float {
            for sample in self.wav_reader.samples::<f32>().take(wanted) {
                output[written] = sample?;
                written += 1;
            }
        } else {
            // Use i64 to avoid overflow for 32-bit samples
            let scale_factor = 1.0 / (1i64 << (self.bits_per_sample - 1)) as f32;
            for sample in self.wav_reader.samples::<i32>().take(wanted) {
                output[written] = sample? as f32 * scale_factor;
                written += 1;
            }
        }

        // A truncated file can end mid-frame; drop the partial frame.
        let frames = written / channels;
        self.position += frames as u64;
        Ok(frames * channels)
    }

    fn seek(&mut self, frame: u64) -> Result<(), SourceError> {
        let frame = frame.min(self.length);
        self.wav_reader.seek(frame as u32)?;
        self.position = frame;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn channel_count(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use tempfile::tempdir;

    use super::*;
    use crate::testutil::write_wav;

    #[test]
    fn test_streams_and_seeks() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("tone.wav");
        write_wav(&path, vec![vec![1_i32, 2, 3, 4], vec![5_i32, 6, 7, 8]], 8)?;

        let mut source = WavSource::open(&path)?;
        assert_eq!(2, source.channel_count());
        assert_eq!(4, source.length());
        assert_eq!(Duration::from_millis(500), source.duration());

        let mut buf = [0.0f32; 6];
        assert_eq!(6, source.read(&mut buf)?);
        assert_eq!(3, source.position());
        assert_eq!(2, source.read(&mut buf)?);
        assert_eq!(0, source.read(&mut buf)?);

        source.seek(0)?;
        assert_eq!(0, source.position());
        assert_eq!(6, source.read(&mut buf)?);
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        assert!(WavSource::open("/definitely/not/here.wav").is_err());
    }
}
