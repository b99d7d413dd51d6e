use crate::{
    errors::PromptError,
    providers::db::storage::FaqStore,
    types::{FaqEntry, Feedback, NewFaq, Question},
};
use async_trait::async_trait;
use chrono::Utc;
use std::fmt::{self, Debug};
use tracing::info;
use turso::{Database, Row, Value as TursoValue};
use uuid::Uuid;

pub mod sql;

/// A provider for interacting with a local SQLite database using Turso.
///
/// This provider holds a `Database` instance, which manages a connection pool.
/// When cloned, it shares the same underlying database, allowing for concurrent and
/// shared access to the same database file or in-memory instance.
#[derive(Clone)]
pub struct SqliteProvider {
    /// The Turso database instance. It's cloneable and thread-safe.
    pub db: Database,
}

impl SqliteProvider {
    /// Creates a new `SqliteProvider` from a file path or in-memory.
    ///
    /// # Arguments
    ///
    /// * `db_path`: The path to the SQLite database file. Use ":memory:" for a unique,
    ///   isolated in-memory database. To share an in-memory database across multiple
    ///   `SqliteProvider` instances (e.g., in tests), create one provider and
    ///   then `.clone()` it.
    pub async fn new(db_path: &str) -> Result<Self, PromptError> {
        let db = turso::Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        // WAL has no effect on in-memory databases but is safe to run.
        let conn = db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;
        // PRAGMA returns a row, so it must go through `query`.
        conn.query("PRAGMA journal_mode=WAL;", ())
            .await
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        Ok(Self { db })
    }

    fn connect(&self) -> Result<turso::Connection, PromptError> {
        self.db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))
    }

    /// Ensures that all required application tables exist.
    /// This function is idempotent and safe to call on every application startup.
    pub async fn initialize_schema(&self) -> Result<(), PromptError> {
        let conn = self.connect()?;
        for statement in sql::ALL_TABLE_CREATION_SQL {
            conn.execute(statement, ())
                .await
                .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?;
        }
        Ok(())
    }

    /// Loads FAQ entries from a YAML list and inserts them, but only when the
    /// `faqs` table is still empty. Returns the number of inserted entries.
    pub async fn seed_faqs_from_yaml(&self, yaml: &str) -> Result<usize, PromptError> {
        if self.count_faqs().await? > 0 {
            info!("FAQ table already populated. Skipping seed.");
            return Ok(0);
        }
        let faqs: Vec<NewFaq> = serde_yaml::from_str(yaml)?;
        let total = faqs.len();
        for faq in faqs {
            self.insert_faq(faq).await?;
        }
        info!(count = total, "Seeded FAQ table.");
        Ok(total)
    }

    async fn query_faqs(
        &self,
        query: &str,
        params: Vec<TursoValue>,
    ) -> Result<Vec<FaqEntry>, PromptError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(query, params)
            .await
            .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?;

        let mut faqs = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?
        {
            faqs.push(row_to_faq(&row)?);
        }
        Ok(faqs)
    }
}

impl Debug for SqliteProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteProvider").finish_non_exhaustive()
    }
}

fn column(row: &Row, idx: usize) -> Result<TursoValue, PromptError> {
    row.get_value(idx)
        .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))
}

fn text_column(row: &Row, idx: usize) -> Result<Option<String>, PromptError> {
    Ok(match column(row, idx)? {
        TursoValue::Text(s) => Some(s),
        TursoValue::Integer(i) => Some(i.to_string()),
        _ => None,
    })
}

fn int_column(row: &Row, idx: usize) -> Result<i64, PromptError> {
    match column(row, idx)? {
        TursoValue::Integer(i) => Ok(i),
        TursoValue::Real(f) => Ok(f as i64),
        other => Err(PromptError::StorageOperationFailed(format!(
            "Expected integer in column {idx}, got {other:?}"
        ))),
    }
}

/// Maps a row selected with `sql::FAQ_COLUMNS` ordering into a `FaqEntry`.
fn row_to_faq(row: &Row) -> Result<FaqEntry, PromptError> {
    Ok(FaqEntry {
        id: text_column(row, 0)?.unwrap_or_default(),
        age_min: int_column(row, 1)?,
        age_max: int_column(row, 2)?,
        category: text_column(row, 3)?,
        question: text_column(row, 4)?.unwrap_or_default(),
        answer: text_column(row, 5)?.unwrap_or_default(),
        source: text_column(row, 6)?,
        created_at: text_column(row, 7)?,
    })
}

fn optional_text(value: Option<String>) -> TursoValue {
    value.map(TursoValue::Text).unwrap_or(TursoValue::Null)
}

#[async_trait]
impl FaqStore for SqliteProvider {
    fn name(&self) -> &str {
        "SQLite"
    }

    async fn insert_question(&self, question: &Question) -> Result<(), PromptError> {
        let conn = self.connect()?;
        let params: Vec<TursoValue> = vec![
            Uuid::new_v4().to_string().into(),
            TursoValue::Integer(i64::from(question.age_months)),
            question.text.clone().into(),
            Utc::now().to_rfc3339().into(),
        ];
        conn.execute(sql::INSERT_QUESTION, params)
            .await
            .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?;
        Ok(())
    }

    async fn faqs_for_age(&self, age_months: u32, limit: u32) -> Result<Vec<FaqEntry>, PromptError> {
        self.query_faqs(
            &sql::faqs_for_age(limit),
            vec![TursoValue::Integer(i64::from(age_months))],
        )
        .await
    }

    async fn search_faqs(
        &self,
        keywords: &[String],
        limit: u32,
    ) -> Result<Vec<FaqEntry>, PromptError> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }
        let params: Vec<TursoValue> = keywords
            .iter()
            .map(|k| format!("%{}%", k.to_lowercase()).into())
            .collect();
        self.query_faqs(&sql::search_faqs(keywords.len(), limit), params)
            .await
    }

    async fn insert_faq(&self, faq: NewFaq) -> Result<FaqEntry, PromptError> {
        if faq.age_min > faq.age_max {
            return Err(PromptError::InvalidFaq(format!(
                "age_min ({}) is greater than age_max ({}) for '{}'",
                faq.age_min, faq.age_max, faq.question
            )));
        }
        let entry = FaqEntry {
            id: Uuid::new_v4().to_string(),
            age_min: faq.age_min,
            age_max: faq.age_max,
            category: faq.category,
            question: faq.question,
            answer: faq.answer,
            source: faq.source,
            created_at: Some(Utc::now().to_rfc3339()),
        };

        let conn = self.connect()?;
        let params: Vec<TursoValue> = vec![
            entry.id.clone().into(),
            TursoValue::Integer(entry.age_min),
            TursoValue::Integer(entry.age_max),
            optional_text(entry.category.clone()),
            entry.question.clone().into(),
            entry.answer.clone().into(),
            optional_text(entry.source.clone()),
            optional_text(entry.created_at.clone()),
        ];
        conn.execute(sql::INSERT_FAQ, params)
            .await
            .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?;
        Ok(entry)
    }

    async fn count_faqs(&self) -> Result<u64, PromptError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(sql::COUNT_FAQS, ())
            .await
            .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?;
        let count = match rows
            .next()
            .await
            .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?
        {
            Some(row) => int_column(&row, 0)?,
            None => 0,
        };
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), PromptError> {
        let conn = self.connect()?;
        let params: Vec<TursoValue> = vec![
            Uuid::new_v4().to_string().into(),
            feedback.question_text.clone().into(),
            TursoValue::Integer(i64::from(feedback.age_months)),
            TursoValue::Integer(i64::from(feedback.was_helpful)),
            Utc::now().to_rfc3339().into(),
        ];
        conn.execute(sql::INSERT_FEEDBACK, params)
            .await
            .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?;
        Ok(())
    }
}
