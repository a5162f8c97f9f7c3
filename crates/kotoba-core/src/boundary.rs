//! Sentence boundary classification — punctuation scan and locale-aware split.
//!
//! Both strategies share one contract: `(complete sentences, remainder)`,
//! where concatenating the pieces reconstructs the input modulo whitespace
//! trimming at unit boundaries. The regex strategy is language-agnostic and
//! always available; the linguistic strategy detects the locale with lingua
//! and adjusts its splitting rules, falling back to the regex strategy when
//! detection fails.

use lingua::{Language, LanguageDetector, LanguageDetectorBuilder};
use std::sync::LazyLock;
use tracing::debug;

/// Comma-class separators across scripts. Used by the fast-first-response
/// split, never by the boundary classifier itself.
pub const COMMAS: &[char] = &[
    ',', '،', '，', '、', '፣', '၊', ';', '΄', '‛', '।', '﹐', '꓾', '⹁', '︐', '﹑', '､',
];

/// Terminal punctuation marks that can end a sentence.
pub const END_PUNCTUATION: &[char] = &['.', '!', '?', '。', '！', '？'];

/// Suffixes that suppress sentence completeness even when they end in a
/// terminal mark.
pub const ABBREVIATIONS: &[&str] = &[
    "Mr.", "Mrs.", "Dr.", "Prof.", "Inc.", "Ltd.", "Jr.", "Sr.", "e.g.", "i.e.", "vs.", "St.",
    "Rd.",
];

/// Languages the linguistic strategy has splitting rules for.
const SUPPORTED_LANGUAGES: &[Language] = &[
    Language::Arabic,
    Language::Bulgarian,
    Language::Chinese,
    Language::Danish,
    Language::Dutch,
    Language::English,
    Language::French,
    Language::German,
    Language::Greek,
    Language::Hindi,
    Language::Italian,
    Language::Japanese,
    Language::Polish,
    Language::Russian,
    Language::Slovak,
    Language::Spanish,
];

// Built on first use; model loading is not free, so share one detector.
static DETECTOR: LazyLock<LanguageDetector> = LazyLock::new(|| {
    LanguageDetectorBuilder::from_languages(SUPPORTED_LANGUAGES)
        .with_preloaded_language_models()
        .build()
});

// ─── Character predicates ──────────────────────────────────────────────────

pub fn contains_comma(text: &str) -> bool {
    text.chars().any(|c| COMMAS.contains(&c))
}

pub fn contains_end_punctuation(text: &str) -> bool {
    text.chars().any(|c| END_PUNCTUATION.contains(&c))
}

/// A sentence is complete when it ends in terminal punctuation and does not
/// end with a known abbreviation.
pub fn is_complete_sentence(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    if ends_with_abbreviation(text) {
        return false;
    }
    text.ends_with(END_PUNCTUATION)
}

fn ends_with_abbreviation(text: &str) -> bool {
    let text = text.trim_end();
    ABBREVIATIONS.iter().any(|abbrev| text.ends_with(abbrev))
}

/// Split at the first comma-class separator. The prefix keeps the separator;
/// both sides are trimmed. Returns `(text, "")` when no separator exists.
pub fn comma_split(text: &str) -> (String, String) {
    for (i, c) in text.char_indices() {
        if COMMAS.contains(&c) {
            let end = i + c.len_utf8();
            let prefix = format!("{}{}", text[..i].trim(), c);
            return (prefix, text[end..].trim().to_string());
        }
    }
    (text.trim().to_string(), String::new())
}

// ─── Regex strategy ────────────────────────────────────────────────────────

/// Language-agnostic split: a sentence ends after each run of terminal
/// punctuation. An abbreviation suffix suppresses the boundary and the scan
/// keeps going with the prefix attached — nothing is ever dropped.
pub fn segment_by_regex(text: &str) -> (Vec<String>, String) {
    let mut complete = Vec::new();
    let mut rest = text.trim();

    'outer: while !rest.is_empty() {
        let mut iter = rest.char_indices().peekable();
        while let Some((i, c)) = iter.next() {
            if !END_PUNCTUATION.contains(&c) {
                continue;
            }
            // Absorb the whole punctuation run ("...", "?!").
            let mut end = i + c.len_utf8();
            while let Some(&(j, c2)) = iter.peek() {
                if !END_PUNCTUATION.contains(&c2) {
                    break;
                }
                end = j + c2.len_utf8();
                iter.next();
            }
            if ends_with_abbreviation(&rest[..end]) {
                continue;
            }
            complete.push(rest[..end].trim().to_string());
            rest = rest[end..].trim_start();
            continue 'outer;
        }
        break;
    }

    (complete, rest.to_string())
}

// ─── Linguistic strategy ───────────────────────────────────────────────────

/// Detect the dominant language of `text`, or `None` when lingua cannot
/// decide among the supported set.
pub fn detect_language(text: &str) -> Option<Language> {
    DETECTOR.detect_language_of(text)
}

/// Locale-aware split. CJK locales break directly after terminal punctuation;
/// spaced scripts additionally require following whitespace (which also keeps
/// decimals like `3.14` intact) and honor the abbreviation list. The final
/// unit only counts as complete when [`is_complete_sentence`] holds.
pub fn segment_by_language(text: &str) -> (Vec<String>, String) {
    if text.trim().is_empty() {
        return (Vec::new(), String::new());
    }

    let Some(lang) = detect_language(text) else {
        debug!("language detection failed, falling back to regex strategy");
        return segment_by_regex(text);
    };

    let spaced = !matches!(lang, Language::Chinese | Language::Japanese);
    let mut units = split_units(text, spaced);

    let Some(last) = units.pop() else {
        return (Vec::new(), text.trim().to_string());
    };
    if is_complete_sentence(&last) {
        units.push(last);
        (units, String::new())
    } else {
        (units, last)
    }
}

/// Split `text` into trimmed units at terminal punctuation runs. When
/// `spaced` is set a boundary additionally requires whitespace (or end of
/// text) after the run, and abbreviation suffixes suppress it.
fn split_units(text: &str, spaced: bool) -> Vec<String> {
    let mut units = Vec::new();
    let mut rest = text.trim();

    'outer: while !rest.is_empty() {
        let mut iter = rest.char_indices().peekable();
        while let Some((i, c)) = iter.next() {
            if !END_PUNCTUATION.contains(&c) {
                continue;
            }
            let mut end = i + c.len_utf8();
            while let Some(&(j, c2)) = iter.peek() {
                if !END_PUNCTUATION.contains(&c2) {
                    break;
                }
                end = j + c2.len_utf8();
                iter.next();
            }
            if spaced {
                let followed_by_space = match rest[end..].chars().next() {
                    Some(next) => next.is_whitespace(),
                    None => true,
                };
                if !followed_by_space || ends_with_abbreviation(&rest[..end]) {
                    continue;
                }
            }
            units.push(rest[..end].trim().to_string());
            rest = rest[end..].trim_start();
            continue 'outer;
        }
        break;
    }

    if !rest.is_empty() {
        units.push(rest.to_string());
    }
    units
}
