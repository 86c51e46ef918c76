/*!
 * Word-level enrichment of Japanese text.
 *
 * Every token gets a reading and romaji from the analyzer, and a meaning
 * and JLPT level from the word cache or, on a miss, the dictionary. Lookups
 * run one at a time with a fixed pause before each dictionary request.
 * Misses and failed lookups are cached as "Not found" so the same word is
 * never requested twice.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::analyzer::MorphAnalyzer;
use crate::cache::{CacheEntry, WordCache};
use crate::dictionary::{self, DictionaryService};
use crate::errors::EnrichError;

/// One enriched token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRecord {
    /// Token exactly as it appeared in the text
    #[serde(rename = "word")]
    pub surface_form: String,
    /// Hiragana reading
    pub reading: String,
    #[serde(rename = "romaji")]
    pub romanized: String,
    pub meaning: String,
    #[serde(rename = "jlpt")]
    pub jlpt_level: String,
}

/// Where a word's dictionary data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    CacheHit,
    Found,
    NotFound,
    /// The request failed and the word was recorded as not found
    Failed,
}

/// Counters over the lifetime of an enricher
#[derive(Debug, Default)]
pub struct EnrichStats {
    cache_hits: AtomicUsize,
    found: AtomicUsize,
    not_found: AtomicUsize,
    failed: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichStatsSnapshot {
    pub cache_hits: usize,
    pub found: usize,
    pub not_found: usize,
    pub failed: usize,
}

impl EnrichStatsSnapshot {
    /// Requests that reached the dictionary
    pub fn lookups(&self) -> usize {
        self.found + self.not_found + self.failed
    }
}

impl EnrichStats {
    fn record(&self, outcome: LookupOutcome) {
        let counter = match outcome {
            LookupOutcome::CacheHit => &self.cache_hits,
            LookupOutcome::Found => &self.found,
            LookupOutcome::NotFound => &self.not_found,
            LookupOutcome::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> EnrichStatsSnapshot {
        EnrichStatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            found: self.found.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

pub struct WordEnricher {
    analyzer: Arc<dyn MorphAnalyzer>,
    dictionary: Arc<dyn DictionaryService>,
    cache: Arc<dyn WordCache>,
    /// Pause before every dictionary request
    lookup_delay: Duration,
    stats: EnrichStats,
}

impl WordEnricher {
    pub fn new(
        analyzer: Arc<dyn MorphAnalyzer>,
        dictionary: Arc<dyn DictionaryService>,
        cache: Arc<dyn WordCache>,
        lookup_delay: Duration,
    ) -> Self {
        Self {
            analyzer,
            dictionary,
            cache,
            lookup_delay,
            stats: EnrichStats::default(),
        }
    }

    pub fn stats(&self) -> EnrichStatsSnapshot {
        self.stats.snapshot()
    }

    /// Enrich every token of `text`, in token order.
    ///
    /// Only analyzer failures are returned as errors; dictionary and cache
    /// problems degrade to the "Not found" entry.
    pub async fn enrich(&self, text: &str) -> Result<Vec<WordRecord>, EnrichError> {
        let tokens = self.analyzer.tokenize(text).await?;
        let mut words = Vec::with_capacity(tokens.len());

        for surface_form in tokens {
            let (reading, romanized) = self.analyzer.phonetics(&surface_form).await?;
            let (entry, outcome) = self.lookup(&surface_form).await;
            self.stats.record(outcome);

            words.push(WordRecord {
                surface_form,
                reading,
                romanized,
                meaning: entry.meaning,
                jlpt_level: entry.jlpt_level,
            });
        }

        Ok(words)
    }

    /// Dictionary data for one surface form, cached after the first request
    pub async fn lookup(&self, surface_form: &str) -> (CacheEntry, LookupOutcome) {
        match self.cache.get(surface_form).await {
            Ok(Some(entry)) => {
                debug!("Word cache hit: {}", surface_form);
                return (entry, LookupOutcome::CacheHit);
            }
            Ok(None) => debug!("Word cache miss: {}", surface_form),
            Err(e) => warn!(
                "Word cache ({}) read failed for '{}', treating as miss: {}",
                self.cache.backend_name(),
                surface_form,
                e
            ),
        }

        tokio::time::sleep(self.lookup_delay).await;

        let (entry, outcome) = match self.dictionary.search(surface_form).await {
            Ok(results) => match dictionary::summarize(&results) {
                Some(entry) => (entry, LookupOutcome::Found),
                None => {
                    debug!("No dictionary entries for '{}'", surface_form);
                    (dictionary::not_found_entry(), LookupOutcome::NotFound)
                }
            },
            Err(e) => {
                warn!("Dictionary lookup failed for '{}' [{}]: {}", surface_form, e.kind(), e);
                (dictionary::not_found_entry(), LookupOutcome::Failed)
            }
        };

        if let Err(e) = self.cache.put(surface_form, &entry).await {
            warn!(
                "Word cache ({}) write failed for '{}': {}",
                self.cache.backend_name(),
                surface_form,
                e
            );
        }

        (entry, outcome)
    }
}
