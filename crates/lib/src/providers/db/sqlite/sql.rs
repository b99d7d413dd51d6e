//! # SQLite Specific SQL Queries
//!
//! This module centralizes SQL query strings for the SQLite provider.
//! This makes the core logic cleaner and isolates database-specific syntax.

pub const CREATE_FAQS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS faqs (
        id TEXT PRIMARY KEY,
        age_min INTEGER NOT NULL,
        age_max INTEGER NOT NULL,
        category TEXT,
        question TEXT NOT NULL,
        answer TEXT NOT NULL,
        source TEXT,
        created_at TEXT NOT NULL
    );
";

pub const CREATE_QUESTIONS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS questions (
        id TEXT PRIMARY KEY,
        user_id TEXT,
        child_age_months INTEGER NOT NULL,
        text TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
";

pub const CREATE_FEEDBACK_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS feedback (
        id TEXT PRIMARY KEY,
        question_text TEXT NOT NULL,
        age_months INTEGER NOT NULL,
        was_helpful INTEGER NOT NULL,
        created_at TEXT NOT NULL
    );
";

pub const ALL_TABLE_CREATION_SQL: &[&str] = &[
    CREATE_FAQS_TABLE,
    CREATE_QUESTIONS_TABLE,
    CREATE_FEEDBACK_TABLE,
];

const FAQ_COLUMNS: &str = "id, age_min, age_max, category, question, answer, source, created_at";

/// Selects FAQ rows whose age range contains `?1`, in insertion order.
pub fn faqs_for_age(limit: u32) -> String {
    format!(
        "
        SELECT {FAQ_COLUMNS}
        FROM faqs
        WHERE age_min <= ?1 AND age_max >= ?1
        ORDER BY rowid
        LIMIT {limit};
    "
    )
}

/// Selects FAQ rows matching any of `keyword_count` patterns (`?1..?n`, each
/// `%keyword%`) in the question or answer.
///
/// The query uses `LOWER()` for case-insensitive matching.
pub fn search_faqs(keyword_count: usize, limit: u32) -> String {
    let conditions = (1..=keyword_count)
        .map(|i| format!("LOWER(question) LIKE ?{i} OR LOWER(answer) LIKE ?{i}"))
        .collect::<Vec<_>>()
        .join(" OR ");
    format!(
        "
        SELECT {FAQ_COLUMNS}
        FROM faqs
        WHERE {conditions}
        ORDER BY rowid
        LIMIT {limit};
    "
    )
}

pub const INSERT_FAQ: &str = "INSERT INTO faqs (id, age_min, age_max, category, question, answer, source, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);";

pub const COUNT_FAQS: &str = "SELECT COUNT(*) FROM faqs;";

pub const INSERT_QUESTION: &str = "INSERT INTO questions (id, user_id, child_age_months, text, created_at) VALUES (?1, NULL, ?2, ?3, ?4);";

pub const INSERT_FEEDBACK: &str = "INSERT INTO feedback (id, question_text, age_months, was_helpful, created_at) VALUES (?1, ?2, ?3, ?4, ?5);";
