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
use std::{fmt, thread};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};
use tracing::{error, info, span, Level};

use super::{AudioError, Output as AudioOutput, StreamFormat};
use crate::playsync::CancelHandle;

/// Milliseconds of audio buffered between the output pump and the device callback.
const RING_BUFFER_MILLIS: usize = 100;

/// The smallest ring buffer, in frames.
const MIN_RING_FRAMES: usize = 64;

/// An output device provided by cpal.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The maximum number of channels the device supports.
    max_channels: u16,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The underlying cpal device.
    device: cpal::Device,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.max_channels,
            self.host_id.name()
        )
    }
}

impl Device {
    /// Lists cpal devices and produces the Device trait.
    pub fn list() -> Result<Vec<Box<dyn super::Device>>, AudioError> {
        Ok(Device::list_cpal_devices()?
            .into_iter()
            .map(|device| {
                let device: Box<dyn super::Device> = Box::new(device);
                device
            })
            .collect())
    }

    /// Lists cpal devices that can output audio.
    fn list_cpal_devices() -> Result<Vec<Device>, AudioError> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout().map_err(|e| AudioError::Unavailable(e.to_string()))?;
        let _shh_stderr = shh::stderr().map_err(|e| AudioError::Unavailable(e.to_string()))?;

        let mut devices: Vec<Device> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)
                .map_err(|e| AudioError::Unavailable(e.to_string()))?
                .devices()
            {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                if let Some(found) = Device::from_cpal(host_id, device) {
                    devices.push(found);
                }
            }
        }

        devices.sort_by_key(|device| device.name.to_string());
        Ok(devices)
    }

    /// Wraps a cpal device, returning None if it has no output channels.
    fn from_cpal(host_id: cpal::HostId, device: cpal::Device) -> Option<Device> {
        let max_channels = device
            .supported_output_configs()
            .ok()?
            .map(|config| config.channels())
            .max()
            .unwrap_or(0);
        if max_channels == 0 {
            return None;
        }

        Some(Device {
            name: device.name().ok()?,
            max_channels,
            host_id,
            device,
        })
    }

    /// Gets the given cpal device. "default" selects the default host's default output.
    pub fn get(name: &str) -> Result<Device, AudioError> {
        if name == "default" {
            let host = cpal::default_host();
            return host
                .default_output_device()
                .and_then(|device| Device::from_cpal(host.id(), device))
                .ok_or_else(|| AudioError::Unavailable("no default output device".to_string()));
        }

        Device::list_cpal_devices()?
            .into_iter()
            .find(|device| device.name.trim() == name)
            .ok_or_else(|| AudioError::Unavailable(format!("no device found with name {}", name)))
    }

    /// Chooses a stream configuration for the given format. The sample rate must be supported
    /// as-is; channel count and sample format are matched as closely as possible.
    fn stream_config(
        &self,
        format: StreamFormat,
    ) -> Result<(cpal::StreamConfig, cpal::SampleFormat), AudioError> {
        let sample_rate = cpal::SampleRate(format.sample_rate);
        let unsupported = || AudioError::UnsupportedFormat {
            device: self.name.clone(),
            channels: format.channels,
            sample_rate: format.sample_rate,
        };

        let chosen = self
            .device
            .supported_output_configs()
            .map_err(|e| AudioError::Unavailable(e.to_string()))?
            .filter(|range| {
                range.min_sample_rate() <= sample_rate && sample_rate <= range.max_sample_rate()
            })
            .min_by_key(|range| {
                (
                    range.channels() != format.channels,
                    range.channels() < format.channels,
                    range.sample_format() != cpal::SampleFormat::F32,
                )
            })
            .ok_or_else(unsupported)?
            .with_sample_rate(sample_rate);

        Ok((chosen.config(), chosen.sample_format()))
    }
}

impl super::Device for Device {
    fn open(&self, format: StreamFormat) -> Result<Box<dyn AudioOutput>, AudioError> {
        let (mut config, sample_format) = self.stream_config(format)?;
        config.buffer_size = cpal::BufferSize::Default;
        let device_channels = config.channels;

        let capacity = ring_capacity(format.sample_rate, device_channels);
        let (producer, consumer) = HeapRb::<f32>::new(capacity).split();

        // cpal streams aren't Send on every platform, so the stream lives on its own thread
        // until the output is closed.
        let close_handle = CancelHandle::new();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), AudioError>>(1);
        let stream_thread = {
            let device = self.device.clone();
            let name = self.name.clone();
            let close_handle = close_handle.clone();
            thread::spawn(move || {
                let span = span!(Level::INFO, "cpal output");
                let _enter = span.enter();

                let stream = match build_stream(&device, &config, sample_format, consumer) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(AudioError::Unavailable(e.to_string())));
                    return;
                }
                info!(device = name, "Output stream started.");
                let _ = ready_tx.send(Ok(()));

                close_handle.wait();
                drop(stream);
                info!(device = name, "Output stream stopped.");
            })
        };

        let ready = ready_rx.recv().unwrap_or_else(|_| {
            Err(AudioError::Unavailable(
                "output thread exited before starting".to_string(),
            ))
        });
        if let Err(e) = ready {
            let _ = stream_thread.join();
            return Err(e);
        }

        Ok(Box::new(Output {
            producer,
            close_handle,
            stream_thread: Some(stream_thread),
            source_channels: format.channels.max(1),
            device_channels,
            scratch: Vec::new(),
        }))
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    consumer: HeapCons<f32>,
) -> Result<cpal::Stream, AudioError> {
    match sample_format {
        cpal::SampleFormat::F32 => build_typed_stream::<f32>(device, config, consumer),
        cpal::SampleFormat::I16 => build_typed_stream::<i16>(device, config, consumer),
        cpal::SampleFormat::I32 => build_typed_stream::<i32>(device, config, consumer),
        cpal::SampleFormat::U16 => build_typed_stream::<u16>(device, config, consumer),
        other => Err(AudioError::Unavailable(format!(
            "unsupported device sample format {:?}",
            other
        ))),
    }
}

fn build_typed_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut consumer: HeapCons<f32>,
) -> Result<cpal::Stream, AudioError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // Underruns are filled with silence.
                for sample in data.iter_mut() {
                    *sample = T::from_sample(consumer.try_pop().unwrap_or(0.0));
                }
            },
            |err| error!("CPAL output stream error: {}", err),
            None,
        )
        .map_err(|e| AudioError::Unavailable(e.to_string()))
}

/// An open cpal output stream.
struct Output {
    producer: HeapProd<f32>,
    close_handle: CancelHandle,
    stream_thread: Option<thread::JoinHandle<()>>,
    source_channels: u16,
    device_channels: u16,
    /// Reused buffer for channel-mapped frames.
    scratch: Vec<f32>,
}

impl AudioOutput for Output {
    fn write(&mut self, samples: &[f32]) -> Result<usize, AudioError> {
        if self.stream_thread.is_none() {
            return Err(AudioError::Closed);
        }

        let source_channels = self.source_channels as usize;
        let device_channels = self.device_channels as usize;
        let frames =
            (samples.len() / source_channels).min(self.producer.vacant_len() / device_channels);
        if frames == 0 {
            return Ok(0);
        }

        if source_channels == device_channels {
            self.producer
                .push_slice(&samples[..frames * source_channels]);
        } else {
            self.scratch.clear();
            for frame in samples[..frames * source_channels].chunks_exact(source_channels) {
                for channel in 0..device_channels {
                    self.scratch.push(map_channel(frame, channel));
                }
            }
            self.producer.push_slice(&self.scratch);
        }

        Ok(frames * source_channels)
    }

    fn queued(&self) -> usize {
        self.producer.occupied_len() / self.device_channels as usize * self.source_channels as usize
    }

    fn close(&mut self) {
        if let Some(stream_thread) = self.stream_thread.take() {
            self.close_handle.cancel();
            if stream_thread.join().is_err() {
                error!("Error while joining output stream thread");
            }
        }
    }
}

impl Drop for Output {
    fn drop(&mut self) {
        self.close();
    }
}

/// The ring buffer size in samples: a whole number of frames covering `RING_BUFFER_MILLIS`,
/// never fewer than `MIN_RING_FRAMES`.
fn ring_capacity(sample_rate: u32, device_channels: u16) -> usize {
    let frames = (sample_rate as usize * RING_BUFFER_MILLIS / 1000).max(MIN_RING_FRAMES);
    frames * usize::from(device_channels.max(1))
}

/// Picks the sample for a device channel from a source frame. Mono is copied to every channel;
/// otherwise channels map one to one and extra device channels are silent.
fn map_channel(frame: &[f32], channel: usize) -> f32 {
    if frame.len() == 1 {
        frame[0]
    } else {
        frame.get(channel).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod test {
    use super::{map_channel, ring_capacity, MIN_RING_FRAMES};

    #[test]
    fn test_map_channel() {
        assert_eq!(0.5, map_channel(&[0.5], 0));
        assert_eq!(0.5, map_channel(&[0.5], 1));
        assert_eq!(0.2, map_channel(&[0.1, 0.2], 1));
        assert_eq!(0.0, map_channel(&[0.1, 0.2], 4));
    }

    #[test]
    fn test_ring_capacity() {
        assert_eq!(4410 * 2, ring_capacity(44100, 2));
        assert_eq!(4800 * 8, ring_capacity(48000, 8));

        // Low rates still hold whole frames for every device channel.
        assert_eq!(MIN_RING_FRAMES * 8, ring_capacity(100, 8));
        assert_eq!(MIN_RING_FRAMES * 2, ring_capacity(0, 2));
        assert_eq!(800, ring_capacity(8000, 0));
    }
}
