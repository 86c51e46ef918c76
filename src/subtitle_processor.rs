use std::collections::HashSet;
use std::fmt;
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context, anyhow};
use serde::{Deserialize, Serialize};
use log::{warn, debug};

// @module: WebVTT cue parsing and normalization

// @const: Cue timestamp, with or without the hour field
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d{2,}):)?([0-5]\d):([0-5]\d)\.(\d{3})$").expect("valid timestamp regex")
});

// @const: Any angle-bracket delimited span (voice, class, italics, inline timestamps)
static MARKUP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[^>]*>").expect("valid markup regex")
});

// @struct: One timed line of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cue {
    // @field: Start timestamp, HH:MM:SS.mmm
    pub start_time: String,

    // @field: End timestamp, HH:MM:SS.mmm
    pub end_time: String,

    // @field: Markup-free text
    pub text: String,
}

impl Cue {
    pub fn new(start_time: impl Into<String>, end_time: impl Into<String>, text: impl Into<String>) -> Self {
        Cue {
            start_time: start_time.into(),
            end_time: end_time.into(),
            text: text.into(),
        }
    }

    /// Parse a cue timestamp to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
        let caps = TIMESTAMP_REGEX
            .captures(timestamp.trim())
            .ok_or_else(|| anyhow!("Invalid timestamp format: {}", timestamp))?;

        let hours: u64 = match caps.get(1) {
            Some(m) => m.as_str().parse().context("Failed to parse hours")?,
            None => 0,
        };
        let minutes: u64 = caps[2].parse().context("Failed to parse minutes")?;
        let seconds: u64 = caps[3].parse().context("Failed to parse seconds")?;
        let millis: u64 = caps[4].parse().context("Failed to parse milliseconds")?;

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Format milliseconds as a cue timestamp (HH:MM:SS.mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{} --> {}", self.start_time, self.end_time)?;
        writeln!(f, "{}", self.text)
    }
}

/// Strip markup, carriage returns and surrounding whitespace from cue text.
///
/// Entities are decoded before tags are removed, so escaped markup such as
/// `&lt;i&gt;` cannot reappear as a tag afterwards.
pub fn normalize_text(raw: &str) -> String {
    let without_cr = raw.replace('\r', "");
    let decoded = decode_entities(&without_cr);
    let without_tags = MARKUP_REGEX.replace_all(&decoded, "");

    without_tags
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    // &amp; last so "&amp;lt;" stays a literal "&lt;"
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Parse raw WebVTT text into ordered, deduplicated cues.
///
/// Never fails: malformed blocks are skipped with a warning and whatever
/// could be recovered is returned. Two cues with the same start time and
/// normalized text are duplicates; the first one wins.
pub fn parse_vtt(raw: &str) -> Vec<Cue> {
    if raw.trim().is_empty() {
        debug!("Empty track content, no cues to parse");
        return Vec::new();
    }

    let content = raw.replace('\r', "");
    let mut cues = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut skipped = 0usize;

    for (block_index, block) in split_blocks(&content).iter().enumerate() {
        if is_metadata_block(block) {
            continue;
        }

        let cue = match parse_block(block) {
            Ok(Some(cue)) => cue,
            Ok(None) => continue,
            Err(e) => {
                warn!("Skipping malformed cue block {}: {}", block_index + 1, e);
                skipped += 1;
                continue;
            }
        };

        if cue.text.is_empty() {
            continue;
        }

        if !seen.insert((cue.start_time.clone(), cue.text.clone())) {
            continue;
        }

        cues.push(cue);
    }

    if skipped > 0 {
        warn!("Skipped {} malformed cue blocks", skipped);
    }
    debug!("Parsed {} cues", cues.len());

    cues
}

/// Group lines into blocks. A whitespace-only line ends a block, and so
/// does a second timing line, so a missing blank line cannot fold the next
/// cue into the previous cue's text.
fn split_blocks(content: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut has_timing = false;

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            has_timing = false;
            continue;
        }

        let is_timing = line.contains("-->");
        if is_timing && has_timing {
            blocks.push(std::mem::take(&mut current));
        }
        has_timing |= is_timing;
        current.push(line);
    }

    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn is_metadata_block(block: &[&str]) -> bool {
    let first = block.first().copied().unwrap_or_default().trim_start();
    first.starts_with("WEBVTT")
        || first.starts_with("NOTE")
        || first.starts_with("STYLE")
        || first.starts_with("REGION")
}

/// Parse one blank-line separated block. `Ok(None)` means the block has no
/// timing line at all (stray text), which is not worth a warning.
fn parse_block(block: &[&str]) -> Result<Option<Cue>> {
    let mut lines = block.iter().copied();

    // An optional identifier line may precede the timing line
    let timing_line = loop {
        match lines.next() {
            Some(line) if line.contains("-->") => break line,
            Some(_) => continue,
            None => return Ok(None),
        }
    };

    let (start, end) = parse_timing_line(timing_line)?;
    let text = normalize_text(&lines.collect::<Vec<_>>().join("\n"));

    Ok(Some(Cue::new(start, end, text)))
}

fn parse_timing_line(line: &str) -> Result<(String, String)> {
    let (start_part, rest) = line
        .split_once("-->")
        .ok_or_else(|| anyhow!("Missing timing separator: {}", line))?;

    // Cue settings ("align:start position:0%") may follow the end time
    let end_part = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| anyhow!("Missing end timestamp: {}", line))?;

    let start_ms = Cue::parse_timestamp(start_part)?;
    let end_ms = Cue::parse_timestamp(end_part)?;

    if end_ms < start_ms {
        return Err(anyhow!(
            "Invalid time range: end time {} < start time {}",
            end_part, start_part.trim()
        ));
    }

    Ok((Cue::format_timestamp(start_ms), Cue::format_timestamp(end_ms)))
}
