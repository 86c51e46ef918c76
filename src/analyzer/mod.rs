/*!
 * Morphological analysis capability.
 *
 * The enricher needs an analyzer to split text into surface forms and to
 * give the hiragana reading and romaji of one surface form. Two
 * implementations are provided:
 *
 * - `MecabAnalyzer`: runs the `mecab` binary and reads the katakana
 *   reading of every morpheme
 * - `ScriptAnalyzer`: splits on script boundaries without a dictionary;
 *   kanji readings are not known, so kanji pass through unchanged
 */

use async_trait::async_trait;

use crate::errors::AnalyzerError;

pub mod kana;
pub mod mecab;
pub mod script;

pub use mecab::MecabAnalyzer;
pub use script::ScriptAnalyzer;

/// Tokenizer and phonetic converter used by the word enricher
#[async_trait]
pub trait MorphAnalyzer: Send + Sync {
    /// Split text into surface forms, in order
    async fn tokenize(&self, text: &str) -> Result<Vec<String>, AnalyzerError>;

    /// Hiragana reading of a surface form
    async fn to_reading(&self, word: &str) -> Result<String, AnalyzerError>;

    /// Hepburn romanization of a surface form
    async fn to_romanized(&self, word: &str) -> Result<String, AnalyzerError>;

    /// Reading and romanization together. Analyzers that pay per call
    /// should override this to analyze the word once.
    async fn phonetics(&self, word: &str) -> Result<(String, String), AnalyzerError> {
        let reading = self.to_reading(word).await?;
        let romanized = self.to_romanized(word).await?;
        Ok((reading, romanized))
    }

    /// Short name used in log lines
    fn name(&self) -> &'static str;
}
