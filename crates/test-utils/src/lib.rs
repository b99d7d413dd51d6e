use anyhow::Result;
use async_trait::async_trait;
use kidcare::{
    errors::PromptError,
    providers::{
        ai::{AiProvider, GenerationOptions},
        db::{sqlite::SqliteProvider, storage::FaqStore},
    },
    types::{FaqEntry, Feedback, NewFaq, Question},
};
use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use turso::Value as TursoValue;

// --- Test Setup ---

/// A helper struct to manage database creation for each test.
pub struct TestSetup {
    pub provider: SqliteProvider,
}

impl TestSetup {
    /// Creates a new, isolated in-memory database and initializes the schema.
    pub async fn new() -> Result<Self> {
        let provider = SqliteProvider::new(":memory:").await?;
        provider.initialize_schema().await?;
        Ok(Self { provider })
    }
}

/// Builds an FAQ entry for tests.
pub fn faq(id: &str, age_min: i64, age_max: i64, category: &str, question: &str, answer: &str) -> FaqEntry {
    FaqEntry {
        id: id.to_string(),
        age_min,
        age_max,
        category: Some(category.to_string()),
        question: question.to_string(),
        answer: answer.to_string(),
        source: None,
        created_at: None,
    }
}

// --- Direct Table Access ---

/// A `questions` row as written by `FaqStore::insert_question`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionRow {
    pub user_id: Option<String>,
    pub child_age_months: i64,
    pub text: String,
}

/// A `feedback` row as written by `FaqStore::insert_feedback`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedbackRow {
    pub question_text: String,
    pub age_months: i64,
    pub was_helpful: bool,
}

fn as_text(value: TursoValue) -> Option<String> {
    match value {
        TursoValue::Text(s) => Some(s),
        _ => None,
    }
}

fn as_int(value: TursoValue) -> i64 {
    match value {
        TursoValue::Integer(i) => i,
        _ => 0,
    }
}

/// Runs `sql` and returns the first `columns` values of every row.
async fn fetch_rows(
    provider: &SqliteProvider,
    sql: &str,
    columns: usize,
) -> Result<Vec<Vec<TursoValue>>> {
    let conn = provider.db.connect()?;
    let mut rows = conn.query(sql, ()).await?;
    let mut result = Vec::new();
    while let Some(row) = rows.next().await? {
        let values = (0..columns)
            .map(|i| row.get_value(i))
            .collect::<Result<Vec<_>, _>>()?;
        result.push(values);
    }
    Ok(result)
}

/// Executes a single statement, e.g. to break a table on purpose.
pub async fn execute_sql(provider: &SqliteProvider, sql: &str) -> Result<()> {
    provider.db.connect()?.execute(sql, ()).await?;
    Ok(())
}

pub async fn count_rows(provider: &SqliteProvider, table: &str) -> Result<i64> {
    let rows = fetch_rows(provider, &format!("SELECT COUNT(*) FROM {table}"), 1).await?;
    Ok(rows
        .into_iter()
        .next()
        .and_then(|row| row.into_iter().next())
        .map(as_int)
        .unwrap_or_default())
}

/// Reads the question log in insertion order.
pub async fn question_rows(provider: &SqliteProvider) -> Result<Vec<QuestionRow>> {
    let rows = fetch_rows(
        provider,
        "SELECT user_id, child_age_months, text FROM questions ORDER BY created_at ASC",
        3,
    )
    .await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let mut cols = row.into_iter();
            QuestionRow {
                user_id: cols.next().and_then(as_text),
                child_age_months: cols.next().map(as_int).unwrap_or_default(),
                text: cols.next().and_then(as_text).unwrap_or_default(),
            }
        })
        .collect())
}

/// Reads the feedback table in insertion order.
pub async fn feedback_rows(provider: &SqliteProvider) -> Result<Vec<FeedbackRow>> {
    let rows = fetch_rows(
        provider,
        "SELECT question_text, age_months, was_helpful FROM feedback ORDER BY created_at ASC",
        3,
    )
    .await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let mut cols = row.into_iter();
            FeedbackRow {
                question_text: cols.next().and_then(as_text).unwrap_or_default(),
                age_months: cols.next().map(as_int).unwrap_or_default(),
                was_helpful: cols.next().map(as_int).unwrap_or_default() != 0,
            }
        })
        .collect())
}

// --- Mock AI Provider ---

/// A scripted reply for one generation attempt.
#[derive(Clone, Debug)]
pub enum MockReply {
    Text(String),
    Error { status: u16, message: String },
}

impl MockReply {
    pub fn text(text: &str) -> Self {
        MockReply::Text(text.to_string())
    }

    /// The error Gemini returns for an unknown model.
    pub fn model_not_found(model: &str) -> Self {
        MockReply::Error {
            status: 404,
            message: format!("models/{model} is not found for API version v1beta"),
        }
    }

    /// A provider failure that must not trigger the next model.
    pub fn server_error() -> Self {
        MockReply::Error {
            status: 500,
            message: "Internal error encountered.".to_string(),
        }
    }
}

/// A recorded call to the mock provider.
#[derive(Clone, Debug)]
pub struct MockCall {
    pub model: String,
    pub prompt: String,
    pub options: GenerationOptions,
}

/// An `AiProvider` with per-model reply queues and call recording.
///
/// Each call pops the next reply queued for its model. When the queue is empty
/// the fallback reply is used, and without one the model reports "not found".
#[derive(Clone, Debug, Default)]
pub struct MockAiProvider {
    replies: Arc<Mutex<HashMap<String, VecDeque<MockReply>>>>,
    fallback: Arc<Mutex<Option<MockReply>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockAiProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply for the next call to `model`.
    pub fn add_reply(&self, model: &str, reply: MockReply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Sets the reply used for any model whose queue is empty.
    pub fn set_fallback(&self, reply: MockReply) -> &Self {
        *self.fallback.lock().unwrap() = Some(reply);
        self
    }

    /// Retrieves the recorded calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, PromptError> {
        self.calls.lock().unwrap().push(MockCall {
            model: model.to_string(),
            prompt: prompt.to_string(),
            options: *options,
        });

        let queued = self
            .replies
            .lock()
            .unwrap()
            .get_mut(model)
            .and_then(VecDeque::pop_front);
        let reply = queued
            .or_else(|| self.fallback.lock().unwrap().clone())
            .unwrap_or_else(|| MockReply::model_not_found(model));

        match reply {
            MockReply::Text(text) => Ok(text),
            MockReply::Error { status, message } => Err(PromptError::AiApi { status, message }),
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, PromptError> {
        let mut models: Vec<String> = self.replies.lock().unwrap().keys().cloned().collect();
        models.sort();
        Ok(models)
    }
}

// --- Mock FAQ Store ---

/// Call counters for `MockFaqStore`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub insert_question: usize,
    pub faqs_for_age: usize,
    pub search_faqs: usize,
    pub insert_feedback: usize,
}

impl StoreCalls {
    pub fn total(&self) -> usize {
        self.insert_question + self.faqs_for_age + self.search_faqs + self.insert_feedback
    }
}

/// An in-memory `FaqStore` with canned rows and failure switches.
#[derive(Clone, Debug, Default)]
pub struct MockFaqStore {
    faqs: Arc<Mutex<Vec<FaqEntry>>>,
    questions: Arc<Mutex<Vec<Question>>>,
    feedback: Arc<Mutex<Vec<Feedback>>>,
    calls: Arc<Mutex<StoreCalls>>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MockFaqStore {
    pub fn new(faqs: Vec<FaqEntry>) -> Self {
        Self {
            faqs: Arc::new(Mutex::new(faqs)),
            ..Default::default()
        }
    }

    /// Makes every FAQ query fail.
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Makes every insert fail.
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn calls(&self) -> StoreCalls {
        self.calls.lock().unwrap().clone()
    }

    pub fn questions(&self) -> Vec<Question> {
        self.questions.lock().unwrap().clone()
    }

    pub fn feedback(&self) -> Vec<Feedback> {
        self.feedback.lock().unwrap().clone()
    }

    fn read_guard(&self) -> Result<(), PromptError> {
        if self.fail_reads {
            Err(PromptError::StorageConnection("mock store is down".to_string()))
        } else {
            Ok(())
        }
    }

    fn write_guard(&self) -> Result<(), PromptError> {
        if self.fail_writes {
            Err(PromptError::StorageOperationFailed("mock insert failed".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl FaqStore for MockFaqStore {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn insert_question(&self, question: &Question) -> Result<(), PromptError> {
        self.calls.lock().unwrap().insert_question += 1;
        self.write_guard()?;
        self.questions.lock().unwrap().push(question.clone());
        Ok(())
    }

    async fn faqs_for_age(&self, age_months: u32, limit: u32) -> Result<Vec<FaqEntry>, PromptError> {
        self.calls.lock().unwrap().faqs_for_age += 1;
        self.read_guard()?;
        Ok(self
            .faqs
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.covers_age(age_months))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn search_faqs(
        &self,
        keywords: &[String],
        limit: u32,
    ) -> Result<Vec<FaqEntry>, PromptError> {
        self.calls.lock().unwrap().search_faqs += 1;
        self.read_guard()?;
        Ok(self
            .faqs
            .lock()
            .unwrap()
            .iter()
            .filter(|f| {
                let question = f.question.to_lowercase();
                let answer = f.answer.to_lowercase();
                keywords
                    .iter()
                    .any(|k| question.contains(k.as_str()) || answer.contains(k.as_str()))
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn insert_faq(&self, faq: NewFaq) -> Result<FaqEntry, PromptError> {
        self.write_guard()?;
        let mut faqs = self.faqs.lock().unwrap();
        let entry = FaqEntry {
            id: (faqs.len() + 1).to_string(),
            age_min: faq.age_min,
            age_max: faq.age_max,
            category: faq.category,
            question: faq.question,
            answer: faq.answer,
            source: faq.source,
            created_at: None,
        };
        faqs.push(entry.clone());
        Ok(entry)
    }

    async fn count_faqs(&self) -> Result<u64, PromptError> {
        self.read_guard()?;
        Ok(self.faqs.lock().unwrap().len() as u64)
    }

    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), PromptError> {
        self.calls.lock().unwrap().insert_feedback += 1;
        self.write_guard()?;
        self.feedback.lock().unwrap().push(feedback.clone());
        Ok(())
    }
}
