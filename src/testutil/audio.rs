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

use std::any::TypeId;
use std::error::Error;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

/// Writes a 32 bit WAV file. Samples are given one vector per channel and are interleaved on
/// write. f32 samples are written as float, i32 samples as integers.
pub fn write_wav<S: hound::Sample + Copy + 'static>(
    path: &Path,
    channels: Vec<Vec<S>>,
    sample_rate: u32,
) -> Result<(), Box<dyn Error>> {
    let sample_format = if TypeId::of::<S>() == TypeId::of::<f32>() {
        SampleFormat::Float
    } else if TypeId::of::<S>() == TypeId::of::<i32>() {
        SampleFormat::Int
    } else {
        return Err("Unsupported sample format".into());
    };

    let num_channels = u16::try_from(channels.len())?;
    let frames = channels.iter().map(Vec::len).max().unwrap_or(0);
    if channels.iter().any(|channel| channel.len() != frames) {
        return Err("Channels have different lengths".into());
    }

    let mut writer = WavWriter::create(
        path,
        WavSpec {
            channels: num_channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format,
        },
    )?;
    for frame in 0..frames {
        for channel in &channels {
            writer.write_sample(channel[frame])?;
        }
    }
    writer.finalize()?;

    Ok(())
}
