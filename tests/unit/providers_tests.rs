/*!
 * Tests for the service clients and the payload limit
 */

use std::time::Duration;

use legaldoc::errors::{PipelineError, Stage};
use legaldoc::language_utils::TargetLanguage;
use legaldoc::providers::mock::{MockAnalysis, MockBehavior, MockSpeech, MockTranslator};
use legaldoc::providers::speech::decode_audio;
use legaldoc::providers::{
    AnalysisClient, AnalysisMode, AnalysisService, ChatAnalysisClient, MAX_PAYLOAD_CHARS, SessionContext,
    SpeechService, SpeechSynthesizer, TranslationClient, TranslationService, truncate_chars,
};

#[test]
fn test_truncate_chars_withMultibyteText_shouldCountCharacters() {
    let text = "नमस्ते".repeat(400);
    let truncated = truncate_chars(&text, MAX_PAYLOAD_CHARS);
    assert_eq!(truncated.chars().count(), MAX_PAYLOAD_CHARS);
    assert!(text.starts_with(truncated));

    assert_eq!(truncate_chars("short", MAX_PAYLOAD_CHARS), "short");
}

#[test]
fn test_translation_build_request_withLongContent_shouldSendFirstThousandChars() {
    let content: String = (0..1500).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    let request = TranslationClient::build_request(&content, TargetLanguage::Hindi);

    assert_eq!(request.input, content[..1000]);
    assert_eq!(request.source_language, "en");
    assert_eq!(request.target_language, "hi-IN");

    let json = serde_json::to_value(&request).unwrap();
    assert!(json.get("sourceLanguage").is_some());
    assert!(json.get("targetLanguage").is_some());
}

#[test]
fn test_speech_build_request_withSpeaker_shouldCarryVoice() {
    let synthesizer = SpeechSynthesizer::new("http://localhost:8080/api", Duration::from_secs(5))
        .unwrap()
        .with_speaker("arvind");
    let request = synthesizer.build_request(&"x".repeat(2000), TargetLanguage::Bengali);

    assert_eq!(request.text.len(), MAX_PAYLOAD_CHARS);
    assert_eq!(request.speaker, "arvind");
    assert_eq!(request.target_language, "bn-IN");
}

#[test]
fn test_decode_audio_withPayloads_shouldValidate() {
    assert_eq!(decode_audio("UklGRg==").unwrap().as_ref(), b"RIFF");
    assert!(matches!(decode_audio(""), Err(PipelineError::SpeechService(_))));
    assert!(matches!(decode_audio("not base64!"), Err(PipelineError::SpeechService(_))));
}

#[test]
fn test_analysisMode_fromStr_shouldAcceptAliases() {
    assert_eq!("summary".parse::<AnalysisMode>().unwrap(), AnalysisMode::Summarize);
    assert_eq!("ANALYZE".parse::<AnalysisMode>().unwrap(), AnalysisMode::Analyze);
    assert!("translate".parse::<AnalysisMode>().is_err());
    assert_eq!(AnalysisClient::path_for(AnalysisMode::Analyze), "analysis/analyze");
}

#[test]
fn test_sessionContext_debug_shouldHideToken() {
    let session = SessionContext::with_token("secret-identity");
    let printed = format!("{:?}", session);
    assert!(!printed.contains("secret-identity"));
    assert_eq!(session.identity_token(), Some("secret-identity"));
    assert_eq!(SessionContext::anonymous().identity_token(), None);
}

#[test]
fn test_chat_client_withBlankKey_shouldFail() {
    let result = ChatAnalysisClient::new("https://api.groq.com/openai/v1", "  ", "llama3-8b-8192", Duration::from_secs(5));
    assert!(result.is_err());
}

#[tokio::test]
async fn test_analysis_client_withUnreachableService_shouldReturnNetworkError() {
    let client = AnalysisClient::new("http://127.0.0.1:9/api", Duration::from_secs(2)).unwrap();
    let error = client.analyze("text", AnalysisMode::Summarize).await.unwrap_err();

    assert!(matches!(error, PipelineError::Network { stage: Stage::Analyze, .. }));
}

#[tokio::test]
async fn test_mock_services_withLongContent_shouldTransmitFirstThousandChars() {
    let content = "y".repeat(1500);
    let translator = MockTranslator::working();
    let speech = MockSpeech::working();

    let translated = translator.translate(&content, TargetLanguage::Telugu).await.unwrap();
    speech.synthesize(&content, TargetLanguage::English).await.unwrap();

    assert_eq!(translator.last_payload().unwrap().len(), 1000);
    assert_eq!(translated, MockTranslator::render(&content[..1000], TargetLanguage::Telugu));
    assert_eq!(speech.calls()[0].0.len(), 1000);
}

#[test]
fn test_mock_intermittent_withZeroInterval_shouldNeverFail() {
    let analysis = MockAnalysis::new(MockBehavior::Intermittent { fail_every: 0 });
    let translator = MockTranslator::new(MockBehavior::Intermittent { fail_every: 0 });

    let result = tokio_test::block_on(async {
        for _ in 0..3 {
            analysis.analyze("deed", AnalysisMode::Summarize).await?;
            translator.translate("deed", TargetLanguage::Hindi).await?;
        }
        Ok::<_, PipelineError>(())
    });

    assert!(result.is_ok(), "zero interval should behave like a working mock");
    assert_eq!(analysis.request_count(), 3);
}

#[test]
fn test_mock_intermittent_withIntervalTwo_shouldFailEverySecondCall() {
    let translator = MockTranslator::new(MockBehavior::Intermittent { fail_every: 2 });

    let outcomes: Vec<bool> = tokio_test::block_on(async {
        let mut outcomes = Vec::new();
        for _ in 0..4 {
            outcomes.push(translator.translate("deed", TargetLanguage::Hindi).await.is_ok());
        }
        outcomes
    });

    assert_eq!(outcomes, vec![true, false, true, false]);
}
