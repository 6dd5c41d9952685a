/*!
 * Common test utilities for the legaldoc test suite
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;

use legaldoc::pipeline::{PipelineController, PipelineServices};
use legaldoc::playback::MemoryPlaybackStore;
use legaldoc::providers::mock::{MockAnalysis, MockSpeech, MockTranslator};

pub mod fixtures;

/// Route library logs to the test output when RUST_LOG is set
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Writes `bytes` to `filename` inside `dir`
pub fn create_test_file(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, bytes)?;
    Ok(file_path)
}

/// Mock services wired into a pipeline, kept so tests can inspect them
pub struct MockServices {
    pub analysis: MockAnalysis,
    pub translator: MockTranslator,
    pub speech: MockSpeech,
    pub playback: Arc<MemoryPlaybackStore>,
}

impl MockServices {
    pub fn working() -> Self {
        Self::new(MockAnalysis::working(), MockTranslator::working(), MockSpeech::working())
    }

    pub fn new(analysis: MockAnalysis, translator: MockTranslator, speech: MockSpeech) -> Self {
        Self {
            analysis,
            translator,
            speech,
            playback: Arc::new(MemoryPlaybackStore::new()),
        }
    }

    pub fn services(&self) -> PipelineServices {
        PipelineServices {
            analysis: Arc::new(self.analysis.clone()),
            translation: Arc::new(self.translator.clone()),
            speech: Arc::new(self.speech.clone()),
            playback: self.playback.clone(),
        }
    }

    pub fn controller(&self) -> PipelineController {
        init_logging();
        PipelineController::new(self.services())
    }
}
