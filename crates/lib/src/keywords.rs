//! # Keyword Extraction
//!
//! Turns a free-text question into a short, ordered list of topical tokens used
//! to score FAQ entries. Raw tokens come first, followed by the canonical tag of
//! every topic whose trigger words appear in the question.

use crate::constants::MAX_KEYWORDS;
use std::collections::HashSet;

/// A topic with its canonical tag and the tokens that trigger it.
struct Topic {
    tag: &'static str,
    triggers: &'static [&'static str],
    /// Every group must contribute at least one token. Used for multi-word
    /// phrases such as "ek gıda".
    all_of: &'static [&'static [&'static str]],
}

const TOPICS: &[Topic] = &[
    Topic {
        tag: "fever",
        triggers: &["ateş", "ates", "ateşi", "atesi", "fever", "feverish", "temperature"],
        all_of: &[],
    },
    Topic {
        tag: "cough",
        triggers: &[
            "öksürük", "oksuruk", "öksürüyor", "oksuruyor", "hırıltı", "hirilti", "balgam",
            "cough", "coughing", "phlegm",
        ],
        all_of: &[],
    },
    Topic {
        tag: "diarrhea",
        triggers: &["ishal", "diare", "sulu", "kaka", "diarrhea", "diarrhoea", "poop"],
        all_of: &[],
    },
    Topic {
        tag: "vomiting",
        triggers: &[
            "kusma", "kustu", "istifra", "kusan", "vomit", "vomiting", "vomited", "spitting",
        ],
        all_of: &[],
    },
    Topic {
        tag: "constipation",
        triggers: &["kabız", "kabizlik", "kabızlık", "kabiz", "constipation", "constipated"],
        all_of: &[],
    },
    Topic {
        tag: "sleep",
        triggers: &["uyku", "uyumuyor", "gece", "sleep", "sleeping", "night", "nap"],
        all_of: &[],
    },
    Topic {
        tag: "solid food",
        triggers: &["solids", "weaning", "puree"],
        all_of: &[&["ek"], &["gıda", "gida"]],
    },
];

impl Topic {
    fn matches(&self, tokens: &HashSet<&str>) -> bool {
        let by_trigger = self.triggers.iter().any(|t| tokens.contains(t));
        let by_phrase = !self.all_of.is_empty()
            && self
                .all_of
                .iter()
                .all(|group| group.iter().any(|t| tokens.contains(t)));
        by_trigger || by_phrase
    }
}

/// Lowercases `text`, replaces anything that is not a letter, digit or
/// whitespace with a space, and joins the remaining tokens with single spaces.
pub fn normalize(text: &str) -> String {
    tokenize(text).join(" ")
}

fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Extracts up to [`MAX_KEYWORDS`] deduplicated keywords from `text`.
pub fn extract(text: &str) -> Vec<String> {
    let tokens = tokenize(text);
    let token_set: HashSet<&str> = tokens.iter().map(String::as_str).collect();

    let tags = TOPICS
        .iter()
        .filter(|topic| topic.matches(&token_set))
        .map(|topic| topic.tag.to_string());

    let mut seen = HashSet::new();
    tokens
        .iter()
        .cloned()
        .chain(tags)
        .filter(|kw| seen.insert(kw.clone()))
        .take(MAX_KEYWORDS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_punctuation_and_case() {
        assert_eq!(normalize("Fever?! 38.5, since   NIGHT"), "fever 38 5 since night");
        assert_eq!(normalize("Öksürük; balgam..."), "öksürük balgam");
    }

    #[test]
    fn raw_tokens_come_before_topic_tags() {
        let keywords = extract("Coughing at night");
        assert_eq!(keywords, vec!["coughing", "at", "night", "cough", "sleep"]);
    }

    #[test]
    fn deduplicates_tags_that_are_also_tokens() {
        let keywords = extract("fever and fever again");
        assert_eq!(keywords, vec!["fever", "and", "again"]);
    }

    #[test]
    fn turkish_solid_food_phrase_needs_both_words() {
        assert!(extract("ek gıda ne zaman").contains(&"solid food".to_string()));
        assert!(!extract("ek olarak sordum").contains(&"solid food".to_string()));
    }

    #[test]
    fn truncates_to_twelve_entries() {
        let keywords = extract("one two three four five six seven eight nine ten eleven twelve thirteen fever");
        assert_eq!(keywords.len(), MAX_KEYWORDS);
        assert_eq!(keywords.last().map(String::as_str), Some("twelve"));
    }

    #[test]
    fn extraction_is_stable_on_normalized_input() {
        for input in [
            "Baby has mild cough at night, otherwise fine and eating well",
            "When can we start solids? She is 5 months.",
            "Vomiting & diarrhea -- what to do??",
        ] {
            assert_eq!(extract(&normalize(input)), extract(input), "{input}");
        }
    }
}
