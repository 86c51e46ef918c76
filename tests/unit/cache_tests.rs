/*!
 * Tests for the word cache contract, run against every backend
 */

use std::sync::Arc;
use kotonami::cache::{CacheEntry, JsonFileWordCache, MemoryWordCache, SqliteWordCache, WordCache};
use kotonami::database::Repository;
use kotonami::dictionary::NOT_FOUND_MEANING;
use crate::common;

fn backends(dir: &std::path::Path) -> Vec<Arc<dyn WordCache>> {
    vec![
        Arc::new(MemoryWordCache::new()),
        Arc::new(JsonFileWordCache::open(dir.join("words.json")).unwrap()),
        Arc::new(SqliteWordCache::new(Repository::new_in_memory().unwrap())),
    ]
}

#[tokio::test]
async fn test_get_withUnknownWord_shouldReturnNone() {
    let temp = common::create_temp_dir().unwrap();
    for cache in backends(temp.path()) {
        assert_eq!(cache.get("猫").await.unwrap(), None, "backend {}", cache.backend_name());
    }
}

#[tokio::test]
async fn test_get_withEmptyMeaning_shouldDifferFromAbsent() {
    let temp = common::create_temp_dir().unwrap();
    for cache in backends(temp.path()) {
        cache.put("ー", &CacheEntry::new("", "")).await.unwrap();

        assert_eq!(
            cache.get("ー").await.unwrap(),
            Some(CacheEntry::default()),
            "backend {}",
            cache.backend_name()
        );
    }
}

#[tokio::test]
async fn test_put_twice_shouldMatchSinglePut() {
    let temp = common::create_temp_dir().unwrap();
    for cache in backends(temp.path()) {
        let entry = CacheEntry::new(NOT_FOUND_MEANING, "");
        cache.put("ほげ", &entry).await.unwrap();
        cache.put("ほげ", &entry).await.unwrap();

        assert_eq!(cache.get("ほげ").await.unwrap(), Some(entry), "backend {}", cache.backend_name());
    }
}

#[tokio::test]
async fn test_put_withNewValue_shouldOverwrite() {
    let temp = common::create_temp_dir().unwrap();
    for cache in backends(temp.path()) {
        cache.put("猫", &CacheEntry::new("cat", "")).await.unwrap();
        cache.put("猫", &CacheEntry::new("cat, feline", "jlpt-n5")).await.unwrap();

        let entry = cache.get("猫").await.unwrap().unwrap();
        assert_eq!(entry.meaning, "cat, feline", "backend {}", cache.backend_name());
        assert_eq!(entry.jlpt_level, "jlpt-n5");
    }
}

#[tokio::test]
async fn test_concurrentPuts_acrossKeys_shouldKeepEveryKey() {
    let temp = common::create_temp_dir().unwrap();
    for cache in backends(temp.path()) {
        let mut handles = Vec::new();
        for i in 0..10 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.put(&format!("word{}", i), &CacheEntry::new(format!("meaning {}", i), "")).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for i in 0..10 {
            let entry = cache.get(&format!("word{}", i)).await.unwrap();
            assert_eq!(entry.map(|e| e.meaning), Some(format!("meaning {}", i)));
        }
    }
}

#[tokio::test]
async fn test_jsonCache_shouldWriteLegacyFileFormat() {
    let temp = common::create_temp_dir().unwrap();
    let path = temp.path().join("jisho_word_cache.json");
    let cache = JsonFileWordCache::open(&path).unwrap();

    cache.put("好き", &CacheEntry::new("liked", "jlpt-n5")).await.unwrap();

    let on_disk: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk["好き"]["meaning"], "liked");
    assert_eq!(on_disk["好き"]["jlpt"], "jlpt-n5");
}
