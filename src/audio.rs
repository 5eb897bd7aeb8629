// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
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
use std::{any::Any, fmt, sync::Arc};

pub mod cpal;
pub mod mock;
pub mod source;

/// The layout of the audio a clip will write to an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    /// Interleaved channels per frame.
    pub channels: u16,
    /// Frames per second.
    pub sample_rate: u32,
}

/// Errors raised by output devices.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("audio device unavailable: {0}")]
    Unavailable(String),

    #[error("device {device} can't play {channels} channel audio at {sample_rate}Hz")]
    UnsupportedFormat {
        device: String,
        channels: u16,
        sample_rate: u32,
    },

    #[error("output stream has been closed")]
    Closed,
}

/// An audio output device. Each playing clip opens its own output stream on the device.
pub trait Device: Any + fmt::Display + Send + Sync {
    /// Opens an output stream for audio in the given format.
    fn open(&self, format: StreamFormat) -> Result<Box<dyn Output>, AudioError>;
}

/// An open output stream on a device.
pub trait Output: Send {
    /// Queues interleaved samples for playback and returns how many were accepted. Only whole
    /// frames are accepted; zero means the device buffer is currently full.
    fn write(&mut self, samples: &[f32]) -> Result<usize, AudioError>;

    /// The number of accepted samples that have not been played yet.
    fn queued(&self) -> usize;

    /// Releases the device resources held by this output. Further writes fail with
    /// [`AudioError::Closed`]. Closing twice is a no-op.
    fn close(&mut self);
}

/// Lists devices known to cpal.
pub fn list_devices() -> Result<Vec<Box<dyn Device>>, AudioError> {
    cpal::Device::list()
}

/// Gets a device with the given name. Names beginning with "mock" produce a mock device and
/// "default" selects the host's default output.
pub fn get_device(name: &str) -> Result<Arc<dyn Device>, AudioError> {
    if name.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(name)));
    };

    Ok(Arc::new(cpal::Device::get(name)?))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_mock_device() -> Result<(), AudioError> {
        let device = get_device("mock-speakers")?;
        assert_eq!("mock-speakers (Mock)", device.to_string());

        let mut output = device.open(StreamFormat {
            channels: 2,
            sample_rate: 44100,
        })?;
        output.close();
        assert!(matches!(output.write(&[0.0, 0.0]), Err(AudioError::Closed)));
        Ok(())
    }
}
