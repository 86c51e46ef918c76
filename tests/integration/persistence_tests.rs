/*!
 * Caches that outlive a single pipeline instance
 */

use std::sync::Arc;
use std::time::Duration;
use kotonami::cache::{JsonFileWordCache, SqliteWordCache, WordCache};
use kotonami::database::{DatabaseConnection, Repository};
use kotonami::enricher::WordEnricher;
use kotonami::pipeline::Pipeline;
use kotonami::track_fetcher::{FileTrackStore, SqliteTrackStore, TrackFetcher};
use crate::common::{self, ScriptedDownloader, ScriptedRun, StubAnalyzer};

fn enricher_over(cache: Arc<dyn WordCache>, dictionary: &kotonami::dictionary::MockDictionary) -> WordEnricher {
    WordEnricher::new(Arc::new(StubAnalyzer), Arc::new(dictionary.clone()), cache, Duration::ZERO)
}

#[tokio::test]
async fn test_jsonCache_acrossRestarts_shouldAvoidRepeatLookups() {
    common::init_logging();
    let temp = common::create_temp_dir().unwrap();
    let path = temp.path().join("jisho_word_cache.json");
    let dictionary = common::sample_dictionary();

    {
        let cache = Arc::new(JsonFileWordCache::open(&path).unwrap());
        enricher_over(cache, &dictionary).enrich("猫 ぴよ").await.unwrap();
    }
    assert_eq!(dictionary.request_count(), 2);

    let cache = Arc::new(JsonFileWordCache::open(&path).unwrap());
    let words = enricher_over(cache, &dictionary).enrich("猫 ぴよ").await.unwrap();

    assert_eq!(dictionary.request_count(), 2);
    assert_eq!(words[0].meaning, "cat");
    assert_eq!(words[1].meaning, kotonami::dictionary::NOT_FOUND_MEANING);
}

#[tokio::test]
async fn test_sqliteStores_acrossConnections_shouldShareOneDatabase() {
    common::init_logging();
    let temp = common::create_temp_dir().unwrap();
    let db_path = temp.path().join("kotonami.db");
    let track = common::vtt(&[("00:00:01.000", "00:00:02.000", "猫")]);
    let downloader = Arc::new(ScriptedDownloader::always(ScriptedRun::Track(track)));
    let dictionary = common::sample_dictionary();

    for _ in 0..2 {
        let repo = Repository::new(DatabaseConnection::new(&db_path).unwrap());
        let fetcher = TrackFetcher::new(
            downloader.clone(),
            Arc::new(SqliteTrackStore::new(repo.clone())),
            common::fast_policy(3),
        )
        .with_work_dir(temp.path().join("scratch"));
        let enricher = enricher_over(Arc::new(SqliteWordCache::new(repo)), &dictionary);
        let pipeline = Pipeline::new(fetcher, enricher);

        let lines = pipeline.process_track("abc123", "ja").await.unwrap();
        assert_eq!(lines[0].words().unwrap()[0].meaning, "cat");
    }

    assert_eq!(downloader.call_count(), 1);
    assert_eq!(dictionary.request_count(), 1);

    let stats = SqliteWordCache::new(Repository::new(DatabaseConnection::new(&db_path).unwrap()))
        .stats()
        .await
        .unwrap();
    assert_eq!(stats.total_entries, 1);
    assert!(stats.total_hits >= 1);
}

#[tokio::test]
async fn test_fileTrackStore_withExistingFile_shouldSkipDownload() {
    common::init_logging();
    let temp = common::create_temp_dir().unwrap();
    let cache_dir = temp.path().join("vtt_cache");
    std::fs::create_dir_all(&cache_dir).unwrap();
    common::create_test_file(
        &cache_dir,
        "abc123.ja.vtt",
        &common::vtt(&[("00:00:01.000", "00:00:02.000", "猫")]),
    )
    .unwrap();

    let downloader = Arc::new(ScriptedDownloader::always(ScriptedRun::RateLimited));
    let fetcher = TrackFetcher::new(downloader.clone(), Arc::new(FileTrackStore::new(&cache_dir)), common::fast_policy(3));
    let pipeline = Pipeline::new(fetcher, common::stub_enricher(&common::sample_dictionary(), &Default::default()));

    let lines = pipeline.process_track("abc123", "ja").await.unwrap();

    assert_eq!(lines.len(), 1);
    assert_eq!(downloader.call_count(), 0);
}
