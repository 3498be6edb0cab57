use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

/// Split text into word-level tokens the way treebank tokenizers do.
/// Hyphenated compounds and abbreviations stay whole ("covid-19", "EE.UU."),
/// other punctuation becomes its own token, a word's trailing period is split
/// off, and English clitics are separated ("don't" -> "do", "n't";
/// "John's" -> "John", "'s").
pub fn word_tokenize(text: &str) -> Vec<&str> {
    // words joined by inner - . ' with an optional trailing period, or single punctuation marks
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\w+(?:[-.'’]\w+)*\.?|[^\w\s]").unwrap());

    let mut tokens = Vec::new();
    for m in re.find_iter(text) {
        let token = m.as_str();
        match split_period(token) {
            Some((word, period)) => {
                split_clitic(word, &mut tokens);
                tokens.push(period);
            }
            None => split_clitic(token, &mut tokens),
        }
    }
    tokens
}

// "casa." -> ("casa", "."); abbreviations with an inner period keep theirs.
fn split_period(token: &str) -> Option<(&str, &str)> {
    let word = token.strip_suffix('.')?;
    if word.is_empty() || word.contains('.') {
        return None;
    }
    Some(token.split_at(word.len()))
}

fn split_clitic<'a>(token: &'a str, out: &mut Vec<&'a str>) {
    let Some(pos) = token.find(['\'', '’']) else {
        out.push(token);
        return;
    };
    let (stem, clitic) = token.split_at(pos);
    // "n't" belongs to the clitic, not the stem
    if (clitic == "'t" || clitic == "’t") && stem.len() > 1 && stem.ends_with(['n', 'N']) {
        let split = stem.len() - 1;
        out.push(&token[..split]);
        out.push(&token[split..]);
        return;
    }
    out.push(stem);
    out.push(clitic);
}

pub fn is_word(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphabetic)
}

/// Number of alphabetic, lowercased tokens in `text` that are not stop words.
pub fn count_tokens(text: &str, stopwords: &HashSet<String>) -> usize {
    word_tokenize(text)
        .into_iter()
        .filter(|t| is_word(t))
        .map(str::to_lowercase)
        .filter(|t| !stopwords.contains(t))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> HashSet<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn counts_alphabetic_non_stopwords() {
        assert_eq!(count_tokens("The Quick Fox! 2 Jumps", &words(&["the"])), 3);
    }

    #[test]
    fn empty_text() {
        assert_eq!(count_tokens("", &words(&["the"])), 0);
        assert_eq!(count_tokens("   \t ", &HashSet::new()), 0);
    }

    #[test]
    fn punctuation_is_split_off() {
        assert_eq!(word_tokenize("Hola, mundo."), vec!["Hola", ",", "mundo", "."]);
    }

    #[test]
    fn compounds_and_abbreviations_stay_whole() {
        assert_eq!(
            word_tokenize("covid-19 vacuna anti-covid EE.UU."),
            vec!["covid-19", "vacuna", "anti-covid", "EE.UU."]
        );
        assert_eq!(count_tokens("covid-19 vacuna anti-covid", &HashSet::new()), 1);
        assert_eq!(count_tokens("Llegan a EE.UU. las vacunas.", &HashSet::new()), 4);
    }

    #[test]
    fn trailing_period_is_split_off() {
        assert_eq!(word_tokenize("Fin."), vec!["Fin", "."]);
        assert_eq!(word_tokenize("..."), vec![".", ".", "."]);
    }

    #[test]
    fn mixed_tokens_are_dropped() {
        // "covid19" and "a_b" are single tokens that are not purely alphabetic
        assert_eq!(count_tokens("covid19 a_b casos", &HashSet::new()), 1);
    }

    #[test]
    fn stopwords_match_after_lowercasing() {
        let sw = words(&["de", "la"]);
        assert_eq!(count_tokens("La casa DE papel", &sw), 2);
    }

    #[test]
    fn accented_words_are_alphabetic() {
        assert_eq!(count_tokens("él camión año", &words(&["él"])), 2);
    }

    #[test]
    fn clitics() {
        assert_eq!(word_tokenize("don't"), vec!["do", "n't"]);
        assert_eq!(word_tokenize("John's"), vec!["John", "'s"]);
        assert_eq!(count_tokens("They don't know John's dog", &HashSet::new()), 5);
    }
}
