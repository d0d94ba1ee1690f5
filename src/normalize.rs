// src/normalize.rs
//! Canonical token stream for post text: noise stripped, stop words removed,
//! Snowball English stems. Not needed for summarization itself; exposed for
//! similarity/indexing consumers.

use std::collections::HashSet;

use once_cell::sync::OnceCell;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

/// English stop words (NLTK list). Contractions are listed without the
/// apostrophe because punctuation is stripped before lookup.
const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "youre", "youve",
    "youll", "youd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "shes", "her", "hers", "herself", "it", "its", "itself", "they", "them", "their",
    "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "thatll", "these",
    "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "dont", "should", "shouldve", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "arent", "couldn", "couldnt", "didn",
    "didnt", "doesn", "doesnt", "hadn", "hadnt", "hasn", "hasnt", "haven", "havent", "isn",
    "isnt", "ma", "mightn", "mightnt", "mustn", "mustnt", "needn", "neednt", "shan", "shant",
    "shouldn", "shouldnt", "wasn", "wasnt", "weren", "werent", "won", "wont", "wouldn",
    "wouldnt",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceCell<HashSet<&'static str>> = OnceCell::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

fn stemmer() -> &'static Stemmer {
    static STEMMER: OnceCell<Stemmer> = OnceCell::new();
    STEMMER.get_or_init(|| Stemmer::create(Algorithm::English))
}

fn noise_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9\s]").expect("static regex"))
}

/// Stems of the meaningful words in `text`, in order.
pub fn tokens(text: &str) -> Vec<String> {
    let stop = stop_words();
    let stemmer = stemmer();

    let cleaned = noise_re().replace_all(text, "");
    cleaned
        .to_ascii_lowercase()
        .split_whitespace()
        .filter(|w| !stop.contains(w))
        .map(|w| stemmer.stem(w).into_owned())
        // a stem can land on a stop word ("wills" -> "will")
        .filter(|s| !s.is_empty() && !stop.contains(s.as_str()))
        .collect()
}

/// Reduce raw post text to a space-joined stream of stems.
/// Output only ever contains `[a-z0-9 ]` and may be empty.
pub fn normalize(text: &str) -> String {
    tokens(text).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_noise_and_stop_words() {
        let out = normalize("The QUICK brown fox!!! jumps over the lazy dog.");
        assert_eq!(out, "quick brown fox jump lazi dog");
    }

    #[test]
    fn stems_plurals_and_inflections() {
        let toks = tokens("updates updated updating");
        assert_eq!(toks.len(), 3);
        assert!(toks.iter().all(|t| t == &toks[0]));
        assert_eq!(normalize("graphs networks"), "graph network");
    }

    #[test]
    fn only_noise_yields_empty() {
        assert_eq!(normalize("the a an and or ... !!! ???"), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn contractions_collapse_into_stop_words() {
        assert_eq!(normalize("don't you're won't"), "");
    }

    #[test]
    fn non_ascii_letters_are_dropped() {
        let out = normalize("Café naïve 東京 launch 2025");
        assert!(out.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' '));
        assert!(out.contains("launch"));
        assert!(out.contains("2025"));
    }

    #[test]
    fn output_alphabet_and_stop_words_hold_for_mixed_input() {
        let samples = [
            "BIG Announcement: v2.0 is OUT!!! #release @team",
            "  tabs\tand\nnewlines   everywhere  ",
            "Émoji 🚀 rocket-launch; semi;colons, commas.",
            "wills shall ours theirs",
        ];
        for s in samples {
            let out = normalize(s);
            assert!(
                out.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' '),
                "bad char in {out:?}"
            );
            assert!(!out.contains("  "));
            for tok in out.split(' ').filter(|t| !t.is_empty()) {
                assert!(!stop_words().contains(tok), "stop word {tok} in {out:?}");
            }
        }
    }

    #[test]
    fn deterministic() {
        let s = "Quarterly update: revenue grew, margins improved.";
        assert_eq!(normalize(s), normalize(s));
    }
}
