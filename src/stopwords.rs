use std::collections::HashSet;

use anyhow::{bail, Result};

const SPANISH: &str = include_str!("../data/stopwords/spanish.txt");
const ENGLISH: &str = include_str!("../data/stopwords/english.txt");

pub const LANGUAGES: &[&str] = &["spanish", "english"];

/// Built-in stop-word set for a language (one word per line in `data/stopwords`).
pub fn for_language(language: &str) -> Result<HashSet<String>> {
    let raw = match language.trim().to_lowercase().as_str() {
        "spanish" | "es" => SPANISH,
        "english" | "en" => ENGLISH,
        other => bail!(
            "No stop words for language '{}' (available: {})",
            other,
            LANGUAGES.join(", ")
        ),
    };
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect())
}
