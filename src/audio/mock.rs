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
use std::{fmt, sync::Arc, time::Instant};

use parking_lot::Mutex;
use tracing::{debug, info};

use super::{AudioError, StreamFormat};

/// How much audio the mock output buffers ahead of its simulated playhead.
const BUFFER_MILLIS: u64 = 20;

#[derive(Default)]
struct Counters {
    open_streams: usize,
    opened: usize,
    released: usize,
    samples_written: u64,
}

/// A mock device. Doesn't actually play anything, but consumes audio at real-time speed so
/// playback positions advance the way they would on hardware.
#[derive(Clone)]
pub struct Device {
    name: String,
    available: bool,
    counters: Arc<Mutex<Counters>>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            available: true,
            counters: Arc::new(Mutex::new(Counters::default())),
        }
    }

    /// Gets a mock device that refuses to open streams, as if it were unplugged or busy.
    pub fn unavailable(name: &str) -> Device {
        Device {
            available: false,
            ..Device::get(name)
        }
    }

    /// The number of output streams currently open.
    pub fn open_streams(&self) -> usize {
        self.counters.lock().open_streams
    }

    /// The number of output streams opened over the device's lifetime.
    pub fn opened(&self) -> usize {
        self.counters.lock().opened
    }

    /// The number of output streams released over the device's lifetime.
    pub fn released(&self) -> usize {
        self.counters.lock().released
    }

    /// The total number of samples accepted across all streams.
    pub fn samples_written(&self) -> u64 {
        self.counters.lock().samples_written
    }
}

impl super::Device for Device {
    fn open(&self, format: StreamFormat) -> Result<Box<dyn super::Output>, AudioError> {
        if !self.available {
            return Err(AudioError::Unavailable(self.name.clone()));
        }

        {
            let mut counters = self.counters.lock();
            counters.open_streams += 1;
            counters.opened += 1;
        }
        info!(
            device = self.name,
            channels = format.channels,
            sample_rate = format.sample_rate,
            "Opened output (mock)."
        );

        Ok(Box::new(Output {
            counters: self.counters.clone(),
            format,
            started: Instant::now(),
            accepted: 0,
            closed: false,
        }))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name,)
    }
}

struct Output {
    counters: Arc<Mutex<Counters>>,
    format: StreamFormat,
    started: Instant,
    /// Samples accepted so far.
    accepted: u64,
    closed: bool,
}

impl Output {
    /// Frames the simulated device has played since the stream opened.
    fn elapsed_frames(&self) -> u64 {
        self.started.elapsed().as_millis() as u64 * u64::from(self.format.sample_rate) / 1000
    }
}

impl super::Output for Output {
    fn write(&mut self, samples: &[f32]) -> Result<usize, AudioError> {
        if self.closed {
            return Err(AudioError::Closed);
        }

        let channels = u64::from(self.format.channels.max(1));
        let rate = u64::from(self.format.sample_rate);
        let elapsed_frames = self.elapsed_frames();
        let buffered_frames = BUFFER_MILLIS * rate / 1000;
        let capacity = (elapsed_frames + buffered_frames) * channels;

        let room = capacity.saturating_sub(self.accepted);
        let accepted = (samples.len() as u64).min(room) / channels * channels;
        self.accepted += accepted;
        self.counters.lock().samples_written += accepted;
        Ok(accepted as usize)
    }

    fn queued(&self) -> usize {
        let channels = u64::from(self.format.channels.max(1));
        let played = self.elapsed_frames() * channels;
        self.accepted.saturating_sub(played) as usize
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let mut counters = self.counters.lock();
        counters.open_streams -= 1;
        counters.released += 1;
        debug!(samples = self.accepted, "Released output (mock).");
    }
}

impl Drop for Output {
    fn drop(&mut self) {
        super::Output::close(self);
    }
}

#[cfg(test)]
mod test {
    use std::{thread, time::Duration};

    use super::*;
    use crate::audio::{Device as _, Output as _};

    #[test]
    fn test_consumes_in_real_time() -> Result<(), AudioError> {
        let device = Device::get("mock");
        let mut output = device.open(StreamFormat {
            channels: 2,
            sample_rate: 1000,
        })?;

        // The buffer holds 20 frames up front, then fills at the sample rate.
        let samples = vec![0.0; 1000];
        let first = output.write(&samples)?;
        assert!(first >= 40 && first < 1000);
        assert_eq!(0, first % 2);

        assert!(output.queued() > 0);

        thread::sleep(Duration::from_millis(50));
        assert!(output.write(&samples)? >= 80);
        assert_eq!(1, device.open_streams());

        output.close();
        output.close();
        assert_eq!(0, device.open_streams());
        assert_eq!(1, device.released());
        Ok(())
    }

    #[test]
    fn test_unavailable() {
        let device = Device::unavailable("mock-unplugged");
        assert!(matches!(
            device.open(StreamFormat {
                channels: 1,
                sample_rate: 44100
            }),
            Err(AudioError::Unavailable(_))
        ));
        assert_eq!(0, device.opened());
    }
}
