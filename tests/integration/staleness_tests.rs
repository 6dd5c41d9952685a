/*!
 * Superseded requests and out-of-order completions
 */

use std::time::Duration;

use futures::StreamExt;
use futures::stream::FuturesUnordered;

use legaldoc::language_utils::TargetLanguage;
use legaldoc::pipeline::{CommitStatus, PipelineState, SpeechSource};
use legaldoc::playback::PlaybackStore;
use legaldoc::providers::AnalysisMode;
use legaldoc::providers::mock::{MockAnalysis, MockSpeech, MockTranslator};

use crate::common::MockServices;
use crate::common::fixtures::{docx_document, pdf_document};

#[tokio::test]
async fn test_commit_analysis_withFirstResolvingLast_shouldKeepSecondResult() {
    let mocks = MockServices::new(
        MockAnalysis::working().with_delay(AnalysisMode::Summarize, Duration::from_millis(50)),
        MockTranslator::working(),
        MockSpeech::working(),
    );
    let mut controller = mocks.controller();

    controller.select_file(pdf_document(&["Deed"]));
    let first = controller.run_extraction().unwrap();
    let first_token = first.token;

    let mut in_flight = FuturesUnordered::new();
    in_flight.push(controller.dispatch_analysis(first));

    let second = controller.set_mode(AnalysisMode::Analyze).unwrap();
    let second_token = second.token;
    assert!(second_token > first_token);
    in_flight.push(controller.dispatch_analysis(second));

    let mut arrivals = Vec::new();
    while let Some(completion) = in_flight.next().await {
        let token = completion.token;
        arrivals.push((token, controller.commit_analysis(completion).unwrap()));
    }

    assert_eq!(
        arrivals,
        vec![(second_token, CommitStatus::Applied), (first_token, CommitStatus::Stale)]
    );
    assert_eq!(controller.analysis_result().unwrap().request_token, second_token);
    assert_eq!(controller.mode(), AnalysisMode::Analyze);
}

#[tokio::test]
async fn test_commit_analysis_afterNewDocument_shouldBeStale() {
    let mocks = MockServices::working();
    let mut controller = mocks.controller();

    controller.select_file(pdf_document(&["Old deed"]));
    let ticket = controller.run_extraction().unwrap();
    let pending = controller.dispatch_analysis(ticket);

    controller.select_file(docx_document(&["New deed"]));
    let completion = pending.await;

    assert_eq!(controller.commit_analysis(completion), Ok(CommitStatus::Stale));
    assert_eq!(*controller.state(), PipelineState::Extracting);
    assert!(controller.analysis_result().is_none());
}

#[tokio::test]
async fn test_commit_translation_withSupersededLanguage_shouldKeepLatest() {
    let mocks = MockServices::working();
    let mut controller = mocks.controller().with_language(TargetLanguage::Tamil);
    controller.load_document(pdf_document(&["Deed"])).await.unwrap();

    let tamil = controller.request_translation().unwrap();
    let pending_tamil = controller.dispatch_translation(tamil);

    controller.set_language(TargetLanguage::Hindi);
    let hindi = controller.request_translation().unwrap();
    let hindi_completion = controller.dispatch_translation(hindi).await;

    assert_eq!(controller.commit_translation(hindi_completion), Ok(CommitStatus::Applied));
    assert_eq!(controller.commit_translation(pending_tamil.await), Ok(CommitStatus::Stale));
    assert_eq!(controller.translation().unwrap().target_language, TargetLanguage::Hindi);
}

#[tokio::test]
async fn test_commit_translation_afterModeChange_shouldBeStale() {
    let mocks = MockServices::working();
    let mut controller = mocks.controller();
    controller.load_document(pdf_document(&["Deed"])).await.unwrap();

    let ticket = controller.request_translation().unwrap();
    let pending = controller.dispatch_translation(ticket);

    assert!(controller.set_mode(AnalysisMode::Analyze).is_some());
    assert_eq!(controller.commit_translation(pending.await), Ok(CommitStatus::Stale));
    assert!(controller.translation().is_none());
    assert!(controller.translation_error().is_none());
}

#[tokio::test]
async fn test_commit_speech_withSupersededRequest_shouldNeverInstallStaleAudio() {
    let mocks = MockServices::working();
    let mut controller = mocks.controller();
    controller.load_document(pdf_document(&["Deed"])).await.unwrap();

    let first = controller.request_speech(SpeechSource::Content).unwrap();
    let pending_first = controller.dispatch_speech(first);
    let second = controller.request_speech(SpeechSource::Content).unwrap();
    let second_completion = controller.dispatch_speech(second).await;

    assert_eq!(controller.commit_speech(second_completion), Ok(CommitStatus::Applied));
    assert_eq!(controller.commit_speech(pending_first.await), Ok(CommitStatus::Stale));

    assert_eq!(mocks.playback.acquired(), 1);
    assert_eq!(mocks.playback.released(), 0);
    assert_eq!(mocks.playback.live_count(), 1);
}

#[tokio::test]
async fn test_dispatch_speech_withUncommittedCompletions_shouldHoldAtMostOneClip() {
    let mocks = MockServices::working();
    {
        let mut controller = mocks.controller();
        controller.load_document(pdf_document(&["Deed"])).await.unwrap();
        controller.speak(SpeechSource::Content).await.unwrap();

        let first = controller.request_speech(SpeechSource::Content).unwrap();
        let second = controller.request_speech(SpeechSource::Content).unwrap();
        let first_completion = controller.dispatch_speech(first).await;
        let second_completion = controller.dispatch_speech(second).await;

        assert!(first_completion.result.is_ok());
        assert!(second_completion.result.is_ok());
        assert_eq!(mocks.playback.live_count(), 1);

        drop(first_completion);
        drop(second_completion);
        assert_eq!(mocks.playback.live_count(), 1);
    }

    assert_eq!(mocks.playback.live_count(), 0);
    assert_eq!(mocks.playback.acquired(), 1);
}

#[tokio::test]
async fn test_set_mode_withSameMode_shouldNotMintToken() {
    let mocks = MockServices::working();
    let mut controller = mocks.controller();
    controller.load_document(pdf_document(&["Deed"])).await.unwrap();

    let token = controller.analysis_token();
    assert!(controller.set_mode(AnalysisMode::Summarize).is_none());
    assert_eq!(controller.analysis_token(), token);
    assert!(controller.state().is_ready());
    assert_eq!(mocks.analysis.request_count(), 1);
}
