/*!
 * Dictionary-free analyzer.
 *
 * Splits text into runs of the same script (kanji, hiragana, katakana,
 * latin, digits); whitespace is dropped and every other symbol becomes its
 * own token. Readings are only known for kana, so kanji runs keep their
 * surface form in `reading` and `romanized`.
 */

use async_trait::async_trait;

use super::MorphAnalyzer;
use super::kana::{self, Script};
use crate::errors::AnalyzerError;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptAnalyzer;

impl ScriptAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Split into script runs
    pub fn segment(text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut current_script: Option<Script> = None;

        for c in text.chars() {
            let script = kana::classify(c);

            // Prolonged sound mark continues a hiragana run as well
            let script = match (script, current_script) {
                (Script::Katakana, Some(Script::Hiragana)) if c == 'ー' => Script::Hiragana,
                _ => script,
            };

            let joins = current_script == Some(script)
                && !matches!(script, Script::Other | Script::Whitespace);
            if !joins && !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }

            if script == Script::Whitespace {
                current_script = None;
                continue;
            }

            current.push(c);
            current_script = Some(script);
        }

        if !current.is_empty() {
            tokens.push(current);
        }
        tokens
    }
}

#[async_trait]
impl MorphAnalyzer for ScriptAnalyzer {
    async fn tokenize(&self, text: &str) -> Result<Vec<String>, AnalyzerError> {
        Ok(Self::segment(text))
    }

    async fn to_reading(&self, word: &str) -> Result<String, AnalyzerError> {
        Ok(kana::katakana_to_hiragana(word))
    }

    async fn to_romanized(&self, word: &str) -> Result<String, AnalyzerError> {
        Ok(kana::to_romaji(word))
    }

    fn name(&self) -> &'static str {
        "script"
    }
}
