/*!
 * Kana script helpers: katakana to hiragana, Hepburn romanization and
 * character classification.
 *
 * Characters outside the kana blocks pass through unchanged, so kanji in
 * an unanalyzed surface form survive romanization as-is.
 */

const KATAKANA_START: u32 = 0x30A1; // ァ
const KATAKANA_END: u32 = 0x30F6; // ヶ
const KANA_OFFSET: u32 = 0x60;

/// Script class of a single character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Hiragana,
    Katakana,
    Kanji,
    Latin,
    Digit,
    Whitespace,
    Other,
}

pub fn classify(c: char) -> Script {
    match c {
        '\u{3041}'..='\u{3096}' | 'ゝ' | 'ゞ' => Script::Hiragana,
        '\u{30A1}'..='\u{30FA}' | 'ー' | 'ヽ' | 'ヾ' | '\u{FF66}'..='\u{FF9F}' => Script::Katakana,
        '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}' | '々' | '〆' => Script::Kanji,
        c if c.is_whitespace() => Script::Whitespace,
        'a'..='z' | 'A'..='Z' | '\u{FF21}'..='\u{FF3A}' | '\u{FF41}'..='\u{FF5A}' => Script::Latin,
        '0'..='9' | '\u{FF10}'..='\u{FF19}' => Script::Digit,
        _ => Script::Other,
    }
}

/// Convert full-width katakana to hiragana; everything else is unchanged
pub fn katakana_to_hiragana(text: &str) -> String {
    text.chars()
        .map(|c| {
            let code = c as u32;
            if (KATAKANA_START..=KATAKANA_END).contains(&code) {
                char::from_u32(code - KANA_OFFSET).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

fn mora(c: char) -> Option<&'static str> {
    let romaji = match c {
        'あ' => "a", 'い' => "i", 'う' => "u", 'え' => "e", 'お' => "o",
        'か' => "ka", 'き' => "ki", 'く' => "ku", 'け' => "ke", 'こ' => "ko",
        'が' => "ga", 'ぎ' => "gi", 'ぐ' => "gu", 'げ' => "ge", 'ご' => "go",
        'さ' => "sa", 'し' => "shi", 'す' => "su", 'せ' => "se", 'そ' => "so",
        'ざ' => "za", 'じ' => "ji", 'ず' => "zu", 'ぜ' => "ze", 'ぞ' => "zo",
        'た' => "ta", 'ち' => "chi", 'つ' => "tsu", 'て' => "te", 'と' => "to",
        'だ' => "da", 'ぢ' => "ji", 'づ' => "zu", 'で' => "de", 'ど' => "do",
        'な' => "na", 'に' => "ni", 'ぬ' => "nu", 'ね' => "ne", 'の' => "no",
        'は' => "ha", 'ひ' => "hi", 'ふ' => "fu", 'へ' => "he", 'ほ' => "ho",
        'ば' => "ba", 'び' => "bi", 'ぶ' => "bu", 'べ' => "be", 'ぼ' => "bo",
        'ぱ' => "pa", 'ぴ' => "pi", 'ぷ' => "pu", 'ぺ' => "pe", 'ぽ' => "po",
        'ま' => "ma", 'み' => "mi", 'む' => "mu", 'め' => "me", 'も' => "mo",
        'や' => "ya", 'ゆ' => "yu", 'よ' => "yo",
        'ら' => "ra", 'り' => "ri", 'る' => "ru", 'れ' => "re", 'ろ' => "ro",
        'わ' => "wa", 'ゐ' => "i", 'ゑ' => "e", 'を' => "o", 'ん' => "n",
        'ゔ' => "vu", 'ゕ' => "ka", 'ゖ' => "ke",
        'ぁ' => "a", 'ぃ' => "i", 'ぅ' => "u", 'ぇ' => "e", 'ぉ' => "o",
        'ゃ' => "ya", 'ゅ' => "yu", 'ょ' => "yo", 'ゎ' => "wa",
        _ => return None,
    };
    Some(romaji)
}

// Consonant part used before a small ya/yu/yo
fn yoon_prefix(c: char) -> Option<&'static str> {
    let prefix = match c {
        'き' => "ky", 'ぎ' => "gy", 'し' => "sh", 'じ' => "j", 'ち' => "ch", 'ぢ' => "j",
        'に' => "ny", 'ひ' => "hy", 'び' => "by", 'ぴ' => "py", 'み' => "my", 'り' => "ry",
        _ => return None,
    };
    Some(prefix)
}

fn small_y_vowel(c: char) -> Option<&'static str> {
    match c {
        'ゃ' => Some("a"),
        'ゅ' => Some("u"),
        'ょ' => Some("o"),
        _ => None,
    }
}

fn small_vowel(c: char) -> Option<&'static str> {
    match c {
        'ぁ' => Some("a"),
        'ぃ' => Some("i"),
        'ぅ' => Some("u"),
        'ぇ' => Some("e"),
        'ぉ' => Some("o"),
        _ => None,
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'i' | 'u' | 'e' | 'o')
}

/// Romanize kana using modified Hepburn (no macrons; long vowels doubled)
pub fn to_romaji(text: &str) -> String {
    let chars: Vec<char> = katakana_to_hiragana(text).chars().collect();
    let mut out = String::with_capacity(chars.len() * 2);
    let mut sokuon = false;
    let mut after_n = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c == 'っ' {
            sokuon = true;
            i += 1;
            continue;
        }

        if c == 'ー' {
            if let Some(last) = out.chars().last().filter(|l| is_vowel(*l)) {
                out.push(last);
            }
            after_n = false;
            i += 1;
            continue;
        }

        let (syllable, consumed) = match (yoon_prefix(c), next.and_then(small_y_vowel)) {
            (Some(prefix), Some(vowel)) => (format!("{}{}", prefix, vowel), 2),
            _ => match (mora(c), next.and_then(small_vowel)) {
                // Extended katakana sounds: ファ, ティ, ウィ, チェ ...
                (Some(base), Some(vowel)) if !is_vowel_kana(c) || c == 'う' => {
                    let consonant = if c == 'う' {
                        "w"
                    } else {
                        base.trim_end_matches(is_vowel)
                    };
                    (format!("{}{}", consonant, vowel), 2)
                }
                (Some(base), _) => (base.to_string(), 1),
                (None, _) => {
                    sokuon = false;
                    after_n = false;
                    out.push(c);
                    i += 1;
                    continue;
                }
            },
        };

        if after_n && syllable.starts_with(|s: char| is_vowel(s) || s == 'y') {
            out.push('\'');
        }

        if sokuon {
            if syllable.starts_with("ch") {
                out.push('t');
            } else if let Some(first) = syllable.chars().next().filter(|f| !is_vowel(*f)) {
                out.push(first);
            }
            sokuon = false;
        }

        after_n = c == 'ん';
        out.push_str(&syllable);
        i += consumed;
    }

    out
}

fn is_vowel_kana(c: char) -> bool {
    matches!(c, 'あ' | 'い' | 'う' | 'え' | 'お')
}
