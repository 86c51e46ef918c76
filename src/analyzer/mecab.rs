use std::process::Stdio;
use std::time::Duration;
use async_trait::async_trait;
use log::{debug, error};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{MorphAnalyzer, kana};
use crate::errors::AnalyzerError;

/// Index of the katakana reading in IPADIC feature output
pub const DEFAULT_READING_FIELD: usize = 7;

/// One analyzed morpheme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Morpheme {
    pub surface: String,
    /// Katakana reading; absent for unknown words
    pub reading: Option<String>,
}

/// Analyzer backed by the `mecab` command-line tool
#[derive(Debug, Clone)]
pub struct MecabAnalyzer {
    program: String,
    timeout_secs: u64,
    reading_field: usize,
}

impl MecabAnalyzer {
    pub fn new(program: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            program: program.into(),
            timeout_secs,
            reading_field: DEFAULT_READING_FIELD,
        }
    }

    /// Run mecab over `text` and parse its default output format
    pub async fn analyze(&self, text: &str) -> Result<Vec<Morpheme>, AnalyzerError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AnalyzerError::Spawn(format!("{}: {}", self.program, e)))?;

        // mecab analyzes line by line; newlines inside a cue become separate sentences
        if let Some(mut stdin) = child.stdin.take() {
            let mut input = text.replace('\r', "");
            input.push('\n');
            stdin
                .write_all(input.as_bytes())
                .await
                .map_err(|e| AnalyzerError::Failed(format!("Failed to write to mecab: {}", e)))?;
        }

        let timeout_duration = Duration::from_secs(self.timeout_secs);
        let output = tokio::select! {
            result = child.wait_with_output() => {
                result.map_err(|e| AnalyzerError::Failed(format!("Failed to read mecab output: {}", e)))?
            },
            _ = tokio::time::sleep(timeout_duration) => {
                return Err(AnalyzerError::Timeout(self.timeout_secs));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("mecab exited with {}: {}", output.status, stderr.trim());
            return Err(AnalyzerError::Failed(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| AnalyzerError::Parse(format!("mecab output is not UTF-8: {}", e)))?;
        let morphemes = parse_output(&stdout, self.reading_field)?;
        debug!("mecab produced {} morphemes", morphemes.len());
        Ok(morphemes)
    }
}

/// Parse `surface\tfeature,feature,...` lines terminated by `EOS`
pub fn parse_output(stdout: &str, reading_field: usize) -> Result<Vec<Morpheme>, AnalyzerError> {
    let mut morphemes = Vec::new();

    for line in stdout.lines() {
        if line.is_empty() || line == "EOS" {
            continue;
        }

        let (surface, features) = line
            .split_once('\t')
            .ok_or_else(|| AnalyzerError::Parse(format!("missing feature column in '{}'", line)))?;

        let reading = features
            .split(',')
            .nth(reading_field)
            .filter(|r| !r.is_empty() && *r != "*")
            .map(str::to_string);

        morphemes.push(Morpheme {
            surface: surface.to_string(),
            reading,
        });
    }

    Ok(morphemes)
}

#[async_trait]
impl MorphAnalyzer for MecabAnalyzer {
    async fn tokenize(&self, text: &str) -> Result<Vec<String>, AnalyzerError> {
        Ok(self.analyze(text).await?.into_iter().map(|m| m.surface).collect())
    }

    async fn to_reading(&self, word: &str) -> Result<String, AnalyzerError> {
        let morphemes = self.analyze(word).await?;
        let katakana: String = morphemes
            .iter()
            .map(|m| m.reading.as_deref().unwrap_or(&m.surface))
            .collect();
        Ok(kana::katakana_to_hiragana(&katakana))
    }

    async fn to_romanized(&self, word: &str) -> Result<String, AnalyzerError> {
        let reading = self.to_reading(word).await?;
        Ok(kana::to_romaji(&reading))
    }

    async fn phonetics(&self, word: &str) -> Result<(String, String), AnalyzerError> {
        let reading = self.to_reading(word).await?;
        let romanized = kana::to_romaji(&reading);
        Ok((reading, romanized))
    }

    fn name(&self) -> &'static str {
        "mecab"
    }
}
