mod helpers;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use verbatim::application::ports::{ErrorKind, TranscriptionError};
use verbatim::application::services::{RetryPolicy, RetryingTranscriber};

use helpers::{FakeEngine, Failure};

#[tokio::test(start_paused = true)]
async fn given_two_transient_failures_when_retrying_then_third_attempt_succeeds_after_backoff() {
    let engine = Arc::new(FakeEngine::failing(2, Failure::Transient));
    let transcriber = RetryingTranscriber::new(engine.clone(), RetryPolicy::default());
    let started = Instant::now();

    let text = transcriber
        .transcribe_with_retry(Path::new("talk_chunk_000.mp3"), "it")
        .await
        .unwrap();

    assert_eq!(text, "text0");
    assert_eq!(engine.call_count(), 3);
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn given_persistent_transient_failure_when_retrying_then_exhausted_after_max_attempts() {
    let engine = Arc::new(FakeEngine::always_failing(Failure::Transient));
    let transcriber = RetryingTranscriber::new(engine.clone(), RetryPolicy::default());

    let err = transcriber
        .transcribe_with_retry(Path::new("talk_chunk_000.mp3"), "it")
        .await
        .unwrap_err();

    assert_eq!(engine.call_count(), 3);
    assert!(matches!(
        err,
        TranscriptionError::RetriesExhausted { attempts: 3, .. }
    ));
    assert!(err.to_string().contains("3 attempts"));
    assert_eq!(err.kind(), ErrorKind::TransientService);
}

#[tokio::test(start_paused = true)]
async fn given_authentication_failure_when_retrying_then_fails_on_first_call() {
    let engine = Arc::new(FakeEngine::always_failing(Failure::Authentication));
    let transcriber = RetryingTranscriber::new(engine.clone(), RetryPolicy::default());
    let started = Instant::now();

    let err = transcriber
        .transcribe_with_retry(Path::new("talk.mp3"), "it")
        .await
        .unwrap_err();

    assert_eq!(engine.call_count(), 1);
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn given_single_attempt_budget_when_first_call_fails_then_no_wait() {
    let engine = Arc::new(FakeEngine::failing(1, Failure::Transient));
    let transcriber = RetryingTranscriber::new(engine.clone(), RetryPolicy::default());
    let started = Instant::now();

    let result = transcriber
        .transcribe_with_attempts(Path::new("talk.mp3"), "it", 1)
        .await;

    assert!(result.is_err());
    assert_eq!(engine.call_count(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn given_success_on_first_call_when_retrying_then_language_is_forwarded() {
    let engine = Arc::new(FakeEngine::ok());
    let transcriber = RetryingTranscriber::new(engine.clone(), RetryPolicy::default());

    let text = transcriber
        .transcribe_with_retry(Path::new("riunione.mp3"), "en")
        .await
        .unwrap();

    assert_eq!(text, "whole riunione");
    assert_eq!(engine.languages(), vec!["en".to_string()]);
}

#[test]
fn given_policy_when_computing_delays_then_doubles_each_attempt() {
    let policy = RetryPolicy::new(5, Duration::from_millis(500));

    assert_eq!(policy.delay_for(0), Duration::from_millis(500));
    assert_eq!(policy.delay_for(1), Duration::from_secs(1));
    assert_eq!(policy.delay_for(2), Duration::from_secs(2));
}

#[test]
fn given_zero_attempts_when_building_policy_then_at_least_one_attempt() {
    assert_eq!(RetryPolicy::new(0, Duration::from_secs(1)).max_attempts, 1);
}
