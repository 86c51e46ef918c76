/*!
 * Tests for the track fetcher: cache short-circuit, retry ceiling and
 * artifact finalization
 */

use std::sync::Arc;
use std::time::{Duration, Instant};
use kotonami::errors::FetchError;
use kotonami::track_fetcher::{FileTrackStore, MemoryTrackStore, RetryPolicy, TrackFetcher, TrackStore};
use crate::common::{self, ScriptedDownloader, ScriptedRun};

const TRACK: &str = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\n猫が好き\n";

fn fetcher_with(
    downloader: &Arc<ScriptedDownloader>,
    store: &MemoryTrackStore,
    policy: RetryPolicy,
    work_dir: &std::path::Path,
) -> TrackFetcher {
    TrackFetcher::new(downloader.clone(), Arc::new(store.clone()), policy).with_work_dir(work_dir)
}

#[tokio::test]
async fn test_fetchTrack_withAlwaysRateLimited_shouldStopAtCeiling() {
    let temp = common::create_temp_dir().unwrap();
    let downloader = Arc::new(ScriptedDownloader::always(ScriptedRun::RateLimited));
    let store = MemoryTrackStore::new();
    let policy = RetryPolicy::new(3, Duration::from_millis(10));
    let fetcher = fetcher_with(&downloader, &store, policy, temp.path());

    let started = Instant::now();
    let result = fetcher.fetch_track("abc123", "ja").await;

    match result {
        Err(FetchError::RetriesExhausted { content_id, lang, attempts }) => {
            assert_eq!(content_id, "abc123");
            assert_eq!(lang, "ja");
            assert_eq!(attempts, 3);
        }
        other => panic!("expected RetriesExhausted, got {:?}", other),
    }
    assert_eq!(downloader.call_count(), 3);
    assert!(store.is_empty());

    // Every attempt, the first included, waits base_delay × attempt
    let calls = downloader.call_times();
    assert!(calls[0].duration_since(started) >= policy.delay_for_attempt(1));
    for (index, pair) in calls.windows(2).enumerate() {
        let attempt = index as u32 + 2;
        assert!(pair[1].duration_since(pair[0]) >= policy.delay_for_attempt(attempt));
        assert!(policy.delay_for_attempt(attempt) >= policy.delay_for_attempt(attempt - 1));
    }
}

#[tokio::test]
async fn test_fetchTrack_withRateLimitThenSuccess_shouldStoreTrack() {
    let temp = common::create_temp_dir().unwrap();
    let downloader = Arc::new(ScriptedDownloader::new(vec![
        ScriptedRun::RateLimited,
        ScriptedRun::Track(TRACK.to_string()),
    ]));
    let store = MemoryTrackStore::new();
    let fetcher = fetcher_with(&downloader, &store, common::fast_policy(3), temp.path());

    let content = fetcher.fetch_track("abc123", "ja").await.unwrap();

    assert_eq!(content, TRACK);
    assert_eq!(downloader.call_count(), 2);
    assert_eq!(store.get("abc123", "ja").await.unwrap().as_deref(), Some(TRACK));
}

#[tokio::test]
async fn test_fetchTrack_withUnknownFailure_shouldAbortWithoutRetrying() {
    let temp = common::create_temp_dir().unwrap();
    let downloader = Arc::new(ScriptedDownloader::always(ScriptedRun::Fail(
        "ERROR: [youtube] abc123: Video unavailable".to_string(),
    )));
    let store = MemoryTrackStore::new();
    let fetcher = fetcher_with(&downloader, &store, common::fast_policy(3), temp.path());

    let result = fetcher.fetch_track("abc123", "ja").await;

    match result {
        Err(FetchError::Downloader { message, .. }) => assert!(message.contains("Video unavailable")),
        other => panic!("expected Downloader error, got {:?}", other),
    }
    assert_eq!(downloader.call_count(), 1);
}

#[tokio::test]
async fn test_fetchTrack_withNoSubtitles_shouldCacheEmptyMarker() {
    let temp = common::create_temp_dir().unwrap();
    let downloader = Arc::new(ScriptedDownloader::always(ScriptedRun::NoSubtitles));
    let store = MemoryTrackStore::new();
    let fetcher = fetcher_with(&downloader, &store, common::fast_policy(3), temp.path());

    let first = fetcher.fetch_track("abc123", "ja").await.unwrap();
    let second = fetcher.fetch_track("abc123", "ja").await.unwrap();

    assert_eq!(first, "");
    assert_eq!(second, "");
    assert_eq!(downloader.call_count(), 1);
    assert_eq!(store.get("abc123", "ja").await.unwrap(), Some(String::new()));
}

#[tokio::test]
async fn test_fetchTrack_withCachedTrack_shouldNotInvokeDownloader() {
    let temp = common::create_temp_dir().unwrap();
    let downloader = Arc::new(ScriptedDownloader::always(ScriptedRun::RateLimited));
    let store = MemoryTrackStore::new();
    store.put("abc123", "ja", TRACK).await.unwrap();
    let fetcher = fetcher_with(&downloader, &store, common::fast_policy(3), temp.path());

    assert_eq!(fetcher.fetch_track("abc123", "ja").await.unwrap(), TRACK);
    assert_eq!(downloader.call_count(), 0);
}

#[tokio::test]
async fn test_fetchTrack_withPart2Language_shouldUseNormalizedKey() {
    let temp = common::create_temp_dir().unwrap();
    let downloader = Arc::new(ScriptedDownloader::always(ScriptedRun::Track(TRACK.to_string())));
    let store = MemoryTrackStore::new();
    let fetcher = fetcher_with(&downloader, &store, common::fast_policy(3), temp.path());

    fetcher.fetch_track("abc123", "jpn").await.unwrap();

    assert!(store.get("abc123", "ja").await.unwrap().is_some());
}

#[tokio::test]
async fn test_fetchTrack_withInvalidRequest_shouldFailBeforeDownloading() {
    let temp = common::create_temp_dir().unwrap();
    let downloader = Arc::new(ScriptedDownloader::always(ScriptedRun::Track(TRACK.to_string())));
    let store = MemoryTrackStore::new();
    let fetcher = fetcher_with(&downloader, &store, common::fast_policy(3), temp.path());

    let bad_id = fetcher.fetch_track("abc; rm -rf ~", "ja").await;
    let bad_lang = fetcher.fetch_track("abc123", "ja --exec x").await;

    assert!(matches!(bad_id, Err(FetchError::InvalidRequest(_))));
    assert!(matches!(bad_lang, Err(FetchError::InvalidRequest(_))));
    assert_eq!(downloader.call_count(), 0);
}

#[tokio::test]
async fn test_fetchTrack_withMissingArtifact_shouldFailToFinalize() {
    let temp = common::create_temp_dir().unwrap();
    let downloader = Arc::new(ScriptedDownloader::always(ScriptedRun::SuccessWithoutArtifact));
    let store = MemoryTrackStore::new();
    let fetcher = fetcher_with(&downloader, &store, common::fast_policy(3), temp.path());

    let result = fetcher.fetch_track("abc123", "ja").await;

    assert!(matches!(result, Err(FetchError::Finalize(_))));
    assert_eq!(downloader.call_count(), 1);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_fetchTrack_afterAttempts_shouldLeaveNoScratchFiles() {
    let temp = common::create_temp_dir().unwrap();
    let downloader = Arc::new(ScriptedDownloader::new(vec![
        ScriptedRun::RateLimited,
        ScriptedRun::Track(TRACK.to_string()),
    ]));
    let store = FileTrackStore::new(temp.path());
    let fetcher = TrackFetcher::new(downloader.clone(), Arc::new(store.clone()), common::fast_policy(3))
        .with_work_dir(temp.path());

    fetcher.fetch_track("abc123", "ja").await.unwrap();

    let entries: Vec<String> = std::fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["abc123.ja.vtt".to_string()]);
    for template in downloader.templates() {
        assert!(!template.parent().unwrap().exists());
    }
}

#[tokio::test]
async fn test_fetchTrack_whenCancelled_shouldRemoveScratchDirectory() {
    let temp = common::create_temp_dir().unwrap();
    let downloader = Arc::new(ScriptedDownloader::always(ScriptedRun::RateLimited));
    let store = MemoryTrackStore::new();
    let policy = RetryPolicy::new(3, Duration::from_millis(50));
    let fetcher = fetcher_with(&downloader, &store, policy, temp.path());

    // Abandon the request while it sleeps before the second attempt
    let result = tokio::time::timeout(Duration::from_millis(80), fetcher.fetch_track("abc123", "ja")).await;

    assert!(result.is_err());
    assert_eq!(downloader.call_count(), 1);
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_fetchTrack_whenCancelledMidDownload_shouldRemovePartialArtifact() {
    let temp = common::create_temp_dir().unwrap();
    let downloader = Arc::new(ScriptedDownloader::always(ScriptedRun::Slow(Duration::from_secs(10))));
    let store = MemoryTrackStore::new();
    let fetcher = fetcher_with(&downloader, &store, common::fast_policy(3), temp.path());

    let result = tokio::time::timeout(Duration::from_millis(100), fetcher.fetch_track("abc123", "ja")).await;

    assert!(result.is_err());
    assert_eq!(downloader.call_count(), 1);
    let templates = downloader.templates();
    assert_eq!(templates.len(), 1);
    assert!(!templates[0].parent().unwrap().exists());
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    assert!(store.is_empty());
}
