/*!
 * Mock dictionary for testing.
 *
 * - `MockDictionary::new()` answers from a fixed word list, empty otherwise
 * - `MockDictionary::failing()` fails every request
 *
 * Every call is counted so tests can assert how many lookups reached the
 * "network".
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use async_trait::async_trait;
use parking_lot::Mutex;

use super::{DictionaryEntry, DictionaryService, Sense};
use crate::errors::DictionaryError;

/// Behavior mode for the mock dictionary
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Answer from the word list
    Working,
    /// Fail every request with a connection error
    Failing,
    /// Fail with a server error for words in the word list, empty otherwise
    ServerError,
}

#[derive(Debug, Clone)]
pub struct MockDictionary {
    behavior: MockBehavior,
    words: HashMap<String, Vec<DictionaryEntry>>,
    request_count: Arc<AtomicUsize>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl MockDictionary {
    pub fn new() -> Self {
        Self::with_behavior(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::with_behavior(MockBehavior::Failing)
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            words: HashMap::new(),
            request_count: Arc::new(AtomicUsize::new(0)),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a word with one sense and an optional JLPT tag
    pub fn with_word(mut self, word: &str, definitions: &[&str], jlpt: Option<&str>) -> Self {
        let entry = DictionaryEntry {
            senses: vec![Sense {
                english_definitions: definitions.iter().map(|d| d.to_string()).collect(),
            }],
            jlpt: jlpt.map(|level| vec![level.to_string()]).unwrap_or_default(),
        };
        self.words.entry(word.to_string()).or_default().push(entry);
        self
    }

    /// Number of search calls so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Words searched so far, in order
    pub fn requested_words(&self) -> Vec<String> {
        self.requested.lock().clone()
    }
}

impl Default for MockDictionary {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DictionaryService for MockDictionary {
    async fn search(&self, word: &str) -> Result<Vec<DictionaryEntry>, DictionaryError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().push(word.to_string());

        match self.behavior {
            MockBehavior::Working => Ok(self.words.get(word).cloned().unwrap_or_default()),
            MockBehavior::Failing => Err(DictionaryError::ConnectionError(
                "mock dictionary is offline".to_string(),
            )),
            MockBehavior::ServerError if self.words.contains_key(word) => Err(DictionaryError::ApiError {
                status_code: 500,
                message: "mock server error".to_string(),
            }),
            MockBehavior::ServerError => Ok(Vec::new()),
        }
    }
}
