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

use tracing::debug;

use super::decoded::decode_file;
use super::error::SourceError;
use super::traits::AudioSource;
use super::wav::WavSource;

/// Opens an audio source for the file at the given path, choosing a reader from the extension.
///
/// WAV files are streamed from disk. Everything else, including WAV encodings hound can't read,
/// is decoded into memory with symphonia.
pub fn open_source_from_file<P: AsRef<Path>>(path: P) -> Result<Box<dyn AudioSource>, SourceError> {
    let path = path.as_ref();
    let is_wav = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));

    if is_wav {
        match WavSource::open(path) {
            Ok(source) => return Ok(Box::new(source)),
            Err(SourceError::IoError(e)) => return Err(SourceError::IoError(e)),
            Err(e) => debug!(path = ?path, err = %e, "Falling back to symphonia for WAV file"),
        }
    }

    Ok(Box::new(decode_file(path)?))
}

#[cfg(test)]
mod test {
    use tempfile::tempdir;

    use super::*;
    use crate::testutil::write_wav;

    #[test]
    fn test_opens_wav() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("CLAP.WAV");
        write_wav(&path, vec![vec![0.5_f32; 100]], 100)?;

        let source = open_source_from_file(&path)?;
        assert_eq!(1, source.channel_count());
        assert_eq!(100, source.length());
        Ok(())
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempdir().expect("tempdir");
        assert!(open_source_from_file(dir.path().join("missing.mp3")).is_err());
        assert!(open_source_from_file(dir.path().join("missing.wav")).is_err());
    }

    #[test]
    fn test_garbage_file_is_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "this is not audio")?;
        assert!(open_source_from_file(&path).is_err());
        Ok(())
    }
}
