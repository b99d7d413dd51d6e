//! # Shared Constants
//!
//! Fixed texts and limits used by the pipeline and the server. Limits that
//! operators may want to tune are also exposed through configuration; these
//! are their defaults.

/// The default path for the application SQLite database.
pub const DEFAULT_DB_FILE: &str = "db/kidcare.db";

/// Attached to every answer.
pub const DISCLAIMER: &str = "This content is not medical advice. In emergencies, call your local emergency number or visit the nearest healthcare facility.";

/// Provider label for answers decided purely by rules.
pub const RULES_PROVIDER: &str = "rules";

/// Questions shorter than this (in characters, after trimming) get a request
/// for more detail instead of an answer.
pub const DEFAULT_MIN_QUESTION_CHARS: usize = 12;

/// Upper bound on FAQ rows fetched per query.
pub const DEFAULT_FAQ_FETCH_LIMIT: u32 = 20;

/// Number of ranked FAQ candidates returned to the caller and used as context.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 3;

/// Maximum number of keywords produced by the extractor.
pub const MAX_KEYWORDS: usize = 12;

/// Default model chain, cheapest and fastest first.
pub const DEFAULT_MODELS: &[&str] = &["gemini-2.0-flash-lite", "gemini-2.0-flash", "gemini-2.5-flash"];

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Per-call timeout for provider requests, in seconds.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 15;

pub const TOO_SHORT_ANSWER: &str = "Your question seems too short. Please add:\n\
• Baby age in months\n\
• Highest measured temperature and how you measured it\n\
• Any accompanying symptoms (breathing difficulty, vomiting, etc.)";

pub const FALLBACK_ANSWER: &str = "Initial assessment: no immediate danger detected based on your text. Monitor your child and keep up with fluids. If symptoms worsen or new red flags appear, seek medical care.";

pub const EMERGENCY_HEADER: &str = "🔺 URGENT WARNING";

pub const EMERGENCY_BODY: &str = "• ≥40°C fever or infants <3 months with ≥38°C may require immediate evaluation.\n\
• Seek medical care now or call your local emergency number.\n\
• Dress lightly, keep a cool/ventilated room; offer fluids frequently.\n\
• Do NOT use cold baths or alcohol rubs; no dosing instructions provided.";
