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
use std::sync::Arc;

use super::error::SourceError;
use super::traits::AudioSource;

/// An audio source that plays interleaved samples held in memory.
///
/// The sample data is shared, so cloning a clip for another session does not copy it.
#[derive(Clone)]
pub struct MemorySource {
    samples: Arc<Vec<f32>>,
    /// Current position in frames.
    current_frame: u64,
    channel_count: u16,
    sample_rate: u32,
}

impl MemorySource {
    /// Creates a new memory source from interleaved samples.
    pub fn new(interleaved_samples: Vec<f32>, channel_count: u16, sample_rate: u32) -> Self {
        Self::from_shared(Arc::new(interleaved_samples), channel_count, sample_rate)
    }

    /// Creates a new memory source over already shared sample data, positioned at the start.
    pub fn from_shared(samples: Arc<Vec<f32>>, channel_count: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            current_frame: 0,
            channel_count: channel_count.max(1),
            sample_rate,
        }
    }

    /// Returns the memory size in bytes.
    pub fn memory_size(&self) -> usize {
        self.samples.len() * std::mem::size_of::<f32>()
    }
}

impl AudioSource for MemorySource {
    fn read(&mut self, output: &mut [f32]) -> Result<usize, SourceError> {
        let channels = self.channel_count as usize;
        let wanted_frames = output.len() / channels;
        let available = self.length().saturating_sub(self.current_frame) as usize;
        let frames = wanted_frames.min(available);
        if frames == 0 {
            return Ok(0);
        }

        let start = self.current_frame as usize * channels;
        let count = frames * channels;
        output[..count].copy_from_slice(&self.samples[start..start + count]);
        self.current_frame += frames as u64;
        Ok(count)
    }

    fn seek(&mut self, frame: u64) -> Result<(), SourceError> {
        self.current_frame = frame.min(self.length());
        Ok(())
    }

    fn position(&self) -> u64 {
        self.current_frame
    }

    fn length(&self) -> u64 {
        (self.samples.len() / self.channel_count as usize) as u64
    }

    fn channel_count(&self) -> u16 {
        self.channel_count
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
