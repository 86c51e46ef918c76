/*!
 * Track pipeline: fetch → parse → enrich each cue.
 *
 * This is the single place where pipeline errors are logged. A failing cue
 * becomes an error line and the batch carries on; only a failed fetch
 * aborts a track request.
 */

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::enricher::{WordEnricher, WordRecord};
use crate::errors::PipelineError;
use crate::subtitle_processor::{self, Cue};
use crate::track_fetcher::TrackFetcher;

/// Result for one cue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedLine {
    /// 1-based position among the parsed cues
    pub line_number: usize,
    pub start_time: String,
    pub end_time: String,
    pub original_text: String,
    #[serde(flatten)]
    pub outcome: LineOutcome,
}

/// Exactly one of `words` or `error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineOutcome {
    Words(Vec<WordRecord>),
    Error(String),
}

impl ProcessedLine {
    pub fn words(&self) -> Option<&[WordRecord]> {
        match &self.outcome {
            LineOutcome::Words(words) => Some(words),
            LineOutcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            LineOutcome::Error(message) => Some(message),
            LineOutcome::Words(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error().is_some()
    }
}

pub struct Pipeline {
    fetcher: TrackFetcher,
    enricher: WordEnricher,
}

impl Pipeline {
    pub fn new(fetcher: TrackFetcher, enricher: WordEnricher) -> Self {
        Self { fetcher, enricher }
    }

    pub fn enricher(&self) -> &WordEnricher {
        &self.enricher
    }

    /// Enriched lines for a track; one entry per parsed cue
    pub async fn process_track(&self, content_id: &str, lang: &str) -> Result<Vec<ProcessedLine>, PipelineError> {
        self.process_track_with_progress(content_id, lang, |_, _| {}).await
    }

    /// Like `process_track`, calling `progress(done, total)` after each cue
    pub async fn process_track_with_progress<F>(
        &self,
        content_id: &str,
        lang: &str,
        progress: F,
    ) -> Result<Vec<ProcessedLine>, PipelineError>
    where
        F: FnMut(usize, usize) + Send,
    {
        let raw = self.fetcher.fetch_track(content_id, lang).await.map_err(|e| {
            error!("Track fetch failed for {} ({}) [{}]: {}", content_id, lang, e.kind(), e);
            PipelineError::from(e)
        })?;

        let cues = subtitle_processor::parse_vtt(&raw);
        if cues.is_empty() {
            warn!("Track for {} ({}) has no cues", content_id, lang);
        } else {
            info!("Parsed {} cues for {} ({})", cues.len(), content_id, lang);
        }

        Ok(self.process_cues(&cues, progress).await)
    }

    /// Enrich already-parsed cues, isolating failures per line
    pub async fn process_cues<F>(&self, cues: &[Cue], mut progress: F) -> Vec<ProcessedLine>
    where
        F: FnMut(usize, usize) + Send,
    {
        let total = cues.len();
        let mut lines = Vec::with_capacity(total);

        for (index, cue) in cues.iter().enumerate() {
            let line_number = index + 1;
            let outcome = match self.enricher.enrich(&cue.text).await {
                Ok(words) => LineOutcome::Words(words),
                Err(e) => {
                    error!("Line {} ({}) failed [{}]: {}", line_number, cue.start_time, e.kind(), e);
                    LineOutcome::Error(e.to_string())
                }
            };

            lines.push(ProcessedLine {
                line_number,
                start_time: cue.start_time.clone(),
                end_time: cue.end_time.clone(),
                original_text: cue.text.clone(),
                outcome,
            });
            progress(line_number, total);
        }

        lines
    }

    /// Enrich a free-text sentence; failures are returned, not isolated
    pub async fn enrich_free_text(&self, sentence: &str) -> Result<Vec<WordRecord>, PipelineError> {
        self.enricher.enrich(sentence).await.map_err(|e| {
            error!("Enrichment failed [{}]: {}", e.kind(), e);
            PipelineError::from(e)
        })
    }
}
