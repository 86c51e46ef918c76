/*!
 * Tests for word enrichment: cache reuse, negative caching and degradation
 */

use std::sync::Arc;
use std::time::{Duration, Instant};
use kotonami::cache::{CacheEntry, MemoryWordCache, WordCache};
use kotonami::dictionary::{MockDictionary, NOT_FOUND_MEANING};
use kotonami::dictionary::mock::MockBehavior;
use kotonami::enricher::{LookupOutcome, WordEnricher};
use kotonami::errors::EnrichError;
use crate::common::{self, FAILING_TOKEN, StubAnalyzer};

#[tokio::test]
async fn test_enrich_twice_shouldNotCallDictionaryAgain() {
    let dictionary = common::sample_dictionary();
    let cache = MemoryWordCache::new();
    let enricher = common::stub_enricher(&dictionary, &cache);

    let first = enricher.enrich("猫 が 好き").await.unwrap();
    let requests_after_first = dictionary.request_count();
    let second = enricher.enrich("猫 が 好き").await.unwrap();

    assert_eq!(requests_after_first, 3);
    assert_eq!(dictionary.request_count(), 3);
    assert_eq!(first, second);
    assert_eq!(second[2].meaning, "liked, well-liked, favourite");
    assert_eq!(second[2].jlpt_level, "jlpt-n5");
}

#[tokio::test]
async fn test_enrich_withUnknownWord_shouldCacheNotFound() {
    let dictionary = common::sample_dictionary();
    let cache = MemoryWordCache::new();
    let enricher = common::stub_enricher(&dictionary, &cache);

    let words = enricher.enrich("ぴよ").await.unwrap();
    enricher.enrich("ぴよ").await.unwrap();

    assert_eq!(words[0].meaning, NOT_FOUND_MEANING);
    assert_eq!(words[0].jlpt_level, "");
    assert_eq!(dictionary.request_count(), 1);
    assert_eq!(cache.get("ぴよ").await.unwrap(), Some(CacheEntry::new(NOT_FOUND_MEANING, "")));
}

#[tokio::test]
async fn test_enrich_withWordWithoutJlpt_shouldUseEmptyLevel() {
    let dictionary = common::sample_dictionary();
    let enricher = common::stub_enricher(&dictionary, &MemoryWordCache::new());

    let words = enricher.enrich("が").await.unwrap();

    assert_eq!(words[0].meaning, "but, however");
    assert_eq!(words[0].jlpt_level, "");
}

#[tokio::test]
async fn test_enrich_withServerError_shouldDegradeAndCache() {
    let dictionary = MockDictionary::with_behavior(MockBehavior::ServerError).with_word("猫", &["cat"], None);
    let cache = MemoryWordCache::new();
    let enricher = common::stub_enricher(&dictionary, &cache);

    let words = enricher.enrich("猫 猫").await.unwrap();

    assert_eq!(words.len(), 2);
    assert!(words.iter().all(|w| w.meaning == NOT_FOUND_MEANING));
    assert_eq!(dictionary.request_count(), 1);
    assert_eq!(enricher.stats().failed, 1);
    assert_eq!(enricher.stats().cache_hits, 1);
}

#[tokio::test]
async fn test_enrich_withOfflineDictionary_shouldStillReturnEveryToken() {
    let dictionary = MockDictionary::failing();
    let enricher = common::stub_enricher(&dictionary, &MemoryWordCache::new());

    let words = enricher.enrich("一 二 三").await.unwrap();

    let surfaces: Vec<&str> = words.iter().map(|w| w.surface_form.as_str()).collect();
    assert_eq!(surfaces, vec!["一", "二", "三"]);
    assert_eq!(dictionary.request_count(), 3);
}

#[tokio::test]
async fn test_enrich_withFailingTokenizer_shouldReturnError() {
    let dictionary = common::sample_dictionary();
    let enricher = common::stub_enricher(&dictionary, &MemoryWordCache::new());

    let result = enricher.enrich(&format!("猫 {}", FAILING_TOKEN)).await;

    assert!(matches!(result, Err(EnrichError::Analyzer(_))));
    assert_eq!(dictionary.request_count(), 0);
}

#[tokio::test]
async fn test_enrich_shouldDeriveReadingFromSurface() {
    let enricher = common::stub_enricher(&common::sample_dictionary(), &MemoryWordCache::new());

    let words = enricher.enrich("ネコ").await.unwrap();

    assert_eq!(words[0].surface_form, "ネコ");
    assert_eq!(words[0].reading, "ねこ");
    assert_eq!(words[0].romanized, "neko");
}

#[tokio::test]
async fn test_lookup_withUncachedWords_shouldPauseBeforeEachRequest() {
    let dictionary = common::sample_dictionary();
    let enricher = WordEnricher::new(
        Arc::new(StubAnalyzer),
        Arc::new(dictionary.clone()),
        Arc::new(MemoryWordCache::new()),
        Duration::from_millis(20),
    );

    let started = Instant::now();
    enricher.enrich("猫 犬 猫").await.unwrap();

    // Two uncached words pay the delay, the repeated one does not
    assert!(started.elapsed() >= Duration::from_millis(40));
    assert_eq!(dictionary.requested_words(), vec!["猫".to_string(), "犬".to_string()]);
}

#[tokio::test]
async fn test_lookup_withPrefilledCache_shouldReportCacheHit() {
    let dictionary = common::sample_dictionary();
    let cache = MemoryWordCache::new();
    cache.put("猫", &CacheEntry::new("kitty", "jlpt-n1")).await.unwrap();
    let enricher = common::stub_enricher(&dictionary, &cache);

    let (entry, outcome) = enricher.lookup("猫").await;

    assert_eq!(outcome, LookupOutcome::CacheHit);
    assert_eq!(entry.meaning, "kitty");
    assert_eq!(dictionary.request_count(), 0);
}
