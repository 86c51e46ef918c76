use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for track language codes
///
/// Track languages are an ISO 639-1 or ISO 639-2 primary code, optionally
/// followed by region or script subtags ("ja", "jpn", "en-US", "zh-Hans").
/// The primary code is normalized to its 2-letter form where one exists,
/// because that is what subtitle sources key their tracks by.

// ISO 639-2/B codes that differ from their ISO 639-2/T counterparts
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

fn part2b_to_part2t(code: &str) -> &str {
    PART2B_TO_PART2T
        .iter()
        .find(|(b, _)| *b == code)
        .map(|(_, t)| *t)
        .unwrap_or(code)
}

/// Normalize a primary language code to ISO 639-1 (2-letter) format if possible.
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists.
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if Language::from_639_1(&normalized_code).is_some() {
            return Ok(normalized_code);
        }
    } else if normalized_code.len() == 3 {
        let part2t = part2b_to_part2t(&normalized_code);

        if let Some(lang) = Language::from_639_3(part2t) {
            if let Some(code_639_1) = lang.to_639_1() {
                return Ok(code_639_1.to_string());
            }
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Validate and normalize a track language such as "ja", "jpn" or "en-US".
///
/// Subtags are kept as written; only the primary code is normalized.
pub fn normalize_track_language(code: &str) -> Result<String> {
    let code = code.trim();
    let mut parts = code.split('-');
    let primary = parts.next().unwrap_or_default();
    let primary = normalize_to_part1_or_part2t(primary)?;

    let mut normalized = primary;
    for subtag in parts {
        let valid = (2..=8).contains(&subtag.len())
            && subtag.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid {
            return Err(anyhow!("Invalid language subtag '{}' in {}", subtag, code));
        }
        normalized.push('-');
        normalized.push_str(subtag);
    }

    Ok(normalized)
}

/// Get the English language name for a track language
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_track_language(code)?;
    let primary = normalized.split('-').next().unwrap_or_default();

    let lang = if primary.len() == 2 {
        Language::from_639_1(primary)
    } else {
        Language::from_639_3(primary)
    }
    .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;

    Ok(lang.to_name().to_string())
}
