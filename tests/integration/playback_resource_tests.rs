/*!
 * Acquisition and release of synthesized audio
 */

use std::sync::Arc;

use legaldoc::pipeline::{PipelineController, PipelineServices, SpeechSource};
use legaldoc::playback::{PlaybackStore, TempFileStore};
use legaldoc::providers::mock::{MockAnalysis, MockBehavior, MockSpeech, MockTranslator};

use crate::common::MockServices;
use crate::common::fixtures::pdf_document;

#[tokio::test]
async fn test_speak_twice_shouldReleaseExactlyOnePreviousClip() {
    let mocks = MockServices::working();
    let mut controller = mocks.controller();
    controller.load_document(pdf_document(&["Deed"])).await.unwrap();

    controller.speak(SpeechSource::Content).await.unwrap();
    assert_eq!(mocks.playback.released(), 0);

    controller.speak(SpeechSource::Content).await.unwrap();
    assert_eq!(mocks.playback.acquired(), 2);
    assert_eq!(mocks.playback.released(), 1);
    assert_eq!(mocks.playback.live_count(), 1);
}

#[tokio::test]
async fn test_speak_withFailure_shouldKeepExistingClip() {
    let mocks = MockServices::new(
        MockAnalysis::working(),
        MockTranslator::working(),
        MockSpeech::new(MockBehavior::Intermittent { fail_every: 2 }),
    );
    let mut controller = mocks.controller();
    controller.load_document(pdf_document(&["Deed"])).await.unwrap();

    controller.speak(SpeechSource::Content).await.unwrap();
    let clip_id = controller.speech_clip().unwrap().handle.id();

    assert!(controller.speak(SpeechSource::Content).await.is_err());
    assert_eq!(controller.speech_clip().unwrap().handle.id(), clip_id);
    assert!(controller.speech_error().is_some());
    assert_eq!(mocks.playback.live_count(), 1);
    assert!(controller.formatted_content().is_some());
}

#[tokio::test]
async fn test_translate_afterSpeech_shouldReleaseClip() {
    let mocks = MockServices::working();
    let mut controller = mocks.controller();
    controller.load_document(pdf_document(&["Deed"])).await.unwrap();

    controller.speak(SpeechSource::Content).await.unwrap();
    controller.translate().await.unwrap();

    assert!(controller.speech_clip().is_none());
    assert_eq!(mocks.playback.released(), 1);
}

#[tokio::test]
async fn test_drop_controller_shouldReleaseLiveClip() {
    let mocks = MockServices::working();
    {
        let mut controller = mocks.controller();
        controller.load_document(pdf_document(&["Deed"])).await.unwrap();
        controller.speak(SpeechSource::Content).await.unwrap();
        assert_eq!(mocks.playback.live_count(), 1);
    }

    assert_eq!(mocks.playback.live_count(), 0);
    assert_eq!(mocks.playback.released(), 1);
}

#[tokio::test]
async fn test_tempFileStore_withNewDocument_shouldDeleteClipFile() {
    let store = Arc::new(TempFileStore::new().unwrap());
    let services = PipelineServices {
        analysis: Arc::new(MockAnalysis::working()),
        translation: Arc::new(MockTranslator::working()),
        speech: Arc::new(MockSpeech::working()),
        playback: store.clone(),
    };
    let mut controller = PipelineController::new(services);

    controller.load_document(pdf_document(&["Deed"])).await.unwrap();
    controller.speak(SpeechSource::Content).await.unwrap();

    let clip = controller.speech_clip().unwrap();
    let path = clip.handle.path().unwrap().to_path_buf();
    assert_eq!(std::fs::read(&path).unwrap(), clip.audio.as_ref());

    controller.select_file(pdf_document(&["Another deed"]));
    assert!(!path.exists());
    assert_eq!(store.live_count(), 0);
}
