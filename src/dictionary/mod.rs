/*!
 * Dictionary service clients.
 *
 * - `jisho`: HTTP client for a jisho.org-compatible word search API
 * - `mock`: in-process dictionary with call counting, for tests
 *
 * Response shape:
 * `{ "data": [ { "senses": [ { "english_definitions": [..] } ], "jlpt": [..] } ] }`.
 * Only the first result, its first sense and its first JLPT tag are used.
 */

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::cache::CacheEntry;
use crate::errors::DictionaryError;

pub mod jisho;
pub mod mock;

pub use jisho::JishoClient;
pub use mock::MockDictionary;

/// Meaning recorded for words the dictionary has nothing for
pub const NOT_FOUND_MEANING: &str = "Not found";

/// Search response body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<DictionaryEntry>,
}

/// One search result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    #[serde(default)]
    pub senses: Vec<Sense>,

    /// Some API versions send a bare string here instead of a list
    #[serde(default, deserialize_with = "string_or_list")]
    pub jlpt: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sense {
    #[serde(default)]
    pub english_definitions: Vec<String>,
}

impl DictionaryEntry {
    /// Reduce a result to the cached form: first sense's definitions joined
    /// with ", " and the first JLPT tag, each empty when missing.
    pub fn to_cache_entry(&self) -> CacheEntry {
        let meaning = self
            .senses
            .first()
            .map(|sense| sense.english_definitions.join(", "))
            .unwrap_or_default();
        let jlpt_level = self.jlpt.first().cloned().unwrap_or_default();

        CacheEntry::new(meaning, jlpt_level)
    }
}

/// Cache entry for a lookup result; `None` when there were no results
pub fn summarize(entries: &[DictionaryEntry]) -> Option<CacheEntry> {
    entries.first().map(DictionaryEntry::to_cache_entry)
}

/// The entry cached for words without results or whose lookup failed
pub fn not_found_entry() -> CacheEntry {
    CacheEntry::new(NOT_FOUND_MEANING, "")
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(level)) if level.is_empty() => Vec::new(),
        Some(OneOrMany::One(level)) => vec![level],
        Some(OneOrMany::Many(levels)) => levels,
        None => Vec::new(),
    })
}

/// Word lookup against a remote dictionary
#[async_trait]
pub trait DictionaryService: Send + Sync {
    /// Search for a surface form; an empty list means no match
    async fn search(&self, word: &str) -> Result<Vec<DictionaryEntry>, DictionaryError>;
}
