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
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use super::PlaybackError;
use crate::audio::source::{open_source_from_file, AudioSource, MemorySource};

/// Turns a clip path into an opened audio source.
pub trait SourceResolver: Send + Sync {
    /// Opens the clip at the given path. Fails with [`PlaybackError::SourceNotFound`] if the
    /// path doesn't lead to a readable audio file.
    fn resolve(&self, path: &Path) -> Result<Box<dyn AudioSource>, PlaybackError>;
}

/// Resolves clips from the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileResolver;

impl SourceResolver for FileResolver {
    fn resolve(&self, path: &Path) -> Result<Box<dyn AudioSource>, PlaybackError> {
        if !path.is_file() {
            return Err(PlaybackError::SourceNotFound {
                path: path.to_path_buf(),
                reason: "no such file".to_string(),
            });
        }

        open_source_from_file(path).map_err(|e| PlaybackError::SourceNotFound {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Resolves clips that have already been loaded into memory.
#[derive(Default)]
pub struct MemoryResolver {
    clips: RwLock<HashMap<PathBuf, MemorySource>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the clip available under the given path, replacing any previous clip.
    pub fn insert<P: Into<PathBuf>>(&self, path: P, clip: MemorySource) {
        self.clips.write().insert(path.into(), clip);
    }

    /// Removes a clip. Returns true if it was present.
    pub fn remove(&self, path: &Path) -> bool {
        self.clips.write().remove(path).is_some()
    }
}

impl SourceResolver for MemoryResolver {
    fn resolve(&self, path: &Path) -> Result<Box<dyn AudioSource>, PlaybackError> {
        match self.clips.read().get(path) {
            Some(clip) => {
                let mut clip = clip.clone();
                clip.seek(0).map_err(PlaybackError::StreamRead)?;
                Ok(Box::new(clip))
            }
            None => Err(PlaybackError::SourceNotFound {
                path: path.to_path_buf(),
                reason: "no clip loaded for path".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use tempfile::tempdir;

    use super::*;
    use crate::testutil::write_wav;

    #[test]
    fn test_file_resolver() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("clap.wav");
        write_wav(&path, vec![vec![0.25_f32; 441]], 44100)?;

        let source = FileResolver.resolve(&path)?;
        assert_eq!(441, source.length());

        assert!(matches!(
            FileResolver.resolve(&dir.path().join("missing.wav")),
            Err(PlaybackError::SourceNotFound { .. })
        ));
        assert!(matches!(
            FileResolver.resolve(dir.path()),
            Err(PlaybackError::SourceNotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_memory_resolver() {
        let resolver = MemoryResolver::new();
        resolver.insert("clap.wav", MemorySource::new(vec![0.0; 10], 1, 10));

        assert!(resolver.resolve(Path::new("clap.wav")).is_ok());
        assert!(resolver.remove(Path::new("clap.wav")));
        assert!(!resolver.remove(Path::new("clap.wav")));
        assert!(matches!(
            resolver.resolve(Path::new("clap.wav")),
            Err(PlaybackError::SourceNotFound { .. })
        ));
    }
}
