/*!
 * Playable audio resources.
 *
 * Decoded speech is installed into a `PlaybackStore`, which hands back a
 * `PlaybackHandle`. The handle is the only way to reach the resource and is
 * consumed by `revoke`, so a resource cannot be released twice.
 */

use std::collections::HashMap;
use std::fmt::Debug;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use log::{debug, warn};
use parking_lot::Mutex;
use tempfile::{NamedTempFile, TempDir};
use uuid::Uuid;

use crate::errors::PipelineError;

/// Owned reference to one installed clip
#[derive(Debug, PartialEq, Eq)]
pub struct PlaybackHandle {
    id: Uuid,
    path: Option<PathBuf>,
    len: usize,
}

impl PlaybackHandle {
    fn new(path: Option<PathBuf>, len: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            path,
            len,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// File backing the clip, for stores that keep clips on disk
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Size of the audio in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Turns decoded audio into a playable, revocable resource
pub trait PlaybackStore: Send + Sync + Debug {
    /// Make `audio` playable
    fn install(&self, audio: Bytes) -> Result<PlaybackHandle, PipelineError>;

    /// Release the resource behind `handle`
    fn revoke(&self, handle: PlaybackHandle);

    /// Number of resources currently held
    fn live_count(&self) -> usize;
}

/// Store writing every clip to its own file in a private temp directory
///
/// Revoking a clip deletes its file; dropping the store deletes the directory.
#[derive(Debug)]
pub struct TempFileStore {
    dir: TempDir,
    files: Mutex<HashMap<Uuid, NamedTempFile>>,
}

impl TempFileStore {
    pub fn new() -> Result<Self, PipelineError> {
        let dir = tempfile::Builder::new()
            .prefix("legaldoc-audio-")
            .tempdir()
            .map_err(|e| PipelineError::SpeechService(format!("Failed to create audio directory: {}", e)))?;
        Ok(Self {
            dir,
            files: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

impl PlaybackStore for TempFileStore {
    fn install(&self, audio: Bytes) -> Result<PlaybackHandle, PipelineError> {
        let mut file = tempfile::Builder::new()
            .prefix("clip-")
            .suffix(".wav")
            .tempfile_in(self.dir.path())
            .and_then(|mut file| file.write_all(&audio).map(|_| file))
            .map_err(|e| PipelineError::SpeechService(format!("Failed to store audio clip: {}", e)))?;
        file.flush()
            .map_err(|e| PipelineError::SpeechService(format!("Failed to store audio clip: {}", e)))?;

        let handle = PlaybackHandle::new(Some(file.path().to_path_buf()), audio.len());
        debug!("Installed audio clip {} at {}", handle.id(), file.path().display());
        self.files.lock().insert(handle.id(), file);
        Ok(handle)
    }

    fn revoke(&self, handle: PlaybackHandle) {
        match self.files.lock().remove(&handle.id()) {
            Some(file) => {
                if let Err(e) = file.close() {
                    warn!("Failed to delete audio clip {}: {}", handle.id(), e);
                }
                debug!("Revoked audio clip {}", handle.id());
            }
            None => warn!("Revoking unknown audio clip {}", handle.id()),
        }
    }

    fn live_count(&self) -> usize {
        self.files.lock().len()
    }
}

/// Store keeping clips in memory and counting acquisitions and releases
#[derive(Debug, Default)]
pub struct MemoryPlaybackStore {
    clips: Mutex<HashMap<Uuid, Bytes>>,
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl MemoryPlaybackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total resources ever installed
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Total resources ever revoked
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Audio behind a live handle
    pub fn audio(&self, handle: &PlaybackHandle) -> Option<Bytes> {
        self.clips.lock().get(&handle.id()).cloned()
    }
}

impl PlaybackStore for MemoryPlaybackStore {
    fn install(&self, audio: Bytes) -> Result<PlaybackHandle, PipelineError> {
        let handle = PlaybackHandle::new(None, audio.len());
        self.clips.lock().insert(handle.id(), audio);
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(handle)
    }

    fn revoke(&self, handle: PlaybackHandle) {
        if self.clips.lock().remove(&handle.id()).is_some() {
            self.released.fetch_add(1, Ordering::SeqCst);
        } else {
            warn!("Revoking unknown audio clip {}", handle.id());
        }
    }

    fn live_count(&self) -> usize {
        self.clips.lock().len()
    }
}
