//! # Risk Classifier
//!
//! Rule-based evaluation of a question for emergency signals. Two signals are
//! produced:
//!
//! - the **emergency gate** ([`assess`]), which short-circuits the pipeline
//!   with a rules-authored warning before any network call, and
//! - the softer **urgent flag** ([`is_urgent`]), which only biases the tone of
//!   the generated answer.
//!
//! Both are pure functions of the child's age and the question text.

use crate::types::{RiskAssessment, RiskLevel, RiskReason};
use regex::Regex;
use std::sync::OnceLock;

/// Body temperatures outside this range are treated as unrelated numbers.
const PLAUSIBLE_TEMP_C: (f64, f64) = (30.0, 45.0);
const HYPERPYREXIA_C: f64 = 40.0;
const INFANT_FEVER_C: f64 = 38.0;
const YOUNG_INFANT_MONTHS: u32 = 3;

/// Terms that indicate breathing trouble, cyanosis, seizures or altered
/// consciousness. Matched as lowercase substrings.
pub const RED_FLAG_TERMS: &[&str] = &[
    // Turkish
    "nefes",
    "solunum",
    "zorluk",
    "morarma",
    "mavi",
    "havale",
    "nöbet",
    "nobet",
    "bilinç",
    "bayıl",
    "tepkisiz",
    "hırıltı",
    "hirilti",
    // English
    "difficulty breathing",
    "trouble breathing",
    "short of breath",
    "shortness of breath",
    "can't breathe",
    "cannot breathe",
    "cyanosis",
    "turning blue",
    "blue lips",
    "seizure",
    "convulsion",
    "unconscious",
    "unresponsive",
    "fainted",
    "passed out",
    "wheezing",
];

/// Whole-word fever mentions, used only by the urgent flag.
const FEVER_WORDS: &[&str] = &["fever", "feverish", "ateş", "ates", "ateşi", "atesi"];

fn number_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)(?:[.,](\d+))?").expect("static pattern is valid"))
}

fn fever_reading_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:3[89]|4\d)(?:[.,]\d)?").expect("static pattern is valid"))
}

/// Extracts a plausible body temperature in °C from free text.
///
/// Every number whose integer part has exactly two digits is a candidate
/// (`38`, `38.5`, `38,5`, `39°C`, `38 derece`). The first candidate inside
/// 30–45°C is returned.
pub fn extract_temperature(text: &str) -> Option<f64> {
    let lowered = text.to_lowercase();
    number_pattern().captures_iter(&lowered).find_map(|caps| {
        let whole = caps.get(1)?.as_str();
        if whole.len() != 2 {
            return None;
        }
        let literal = match caps.get(2) {
            Some(frac) => format!("{whole}.{}", frac.as_str()),
            None => whole.to_string(),
        };
        let value: f64 = literal.parse().ok()?;
        (PLAUSIBLE_TEMP_C.0..=PLAUSIBLE_TEMP_C.1)
            .contains(&value)
            .then_some(value)
    })
}

/// Returns the first red-flag term contained in `text`, if any.
pub fn find_red_flag(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    RED_FLAG_TERMS
        .iter()
        .copied()
        .find(|term| lowered.contains(term))
}

fn has_fever_pattern(text: &str) -> bool {
    let lowered = text.to_lowercase();
    fever_reading_pattern().is_match(&lowered)
        || lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| FEVER_WORDS.contains(&token))
}

/// Evaluates the hard emergency gate.
pub fn assess(age_months: u32, text: &str) -> RiskAssessment {
    let temperature_c = extract_temperature(text);
    let young_infant = age_months < YOUNG_INFANT_MONTHS;

    let reason = match temperature_c {
        Some(t) if t >= HYPERPYREXIA_C => Some(RiskReason::Hyperpyrexia),
        Some(t) if young_infant && t >= INFANT_FEVER_C => Some(RiskReason::YoungInfantFever),
        _ => find_red_flag(text).map(|term| RiskReason::RedFlag(term.to_string())),
    };

    RiskAssessment {
        level: if reason.is_some() {
            RiskLevel::Emergency
        } else {
            RiskLevel::Normal
        },
        temperature_c,
        reason,
    }
}

/// The softer urgency signal used to steer the generated answer.
///
/// True when a red-flag term is present, or when a child under 3 months shows
/// any fever-like pattern, whether or not it parses as a plausible temperature.
pub fn is_urgent(age_months: u32, text: &str) -> bool {
    find_red_flag(text).is_some() || (age_months < YOUNG_INFANT_MONTHS && has_fever_pattern(text))
}
