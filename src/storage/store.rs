use crate::feedback::FeedbackRecord;
use crate::{Error, Result};
use libsql::{Builder, Database, Row, Value};
use tracing::{debug, info};

/// libSQL-backed store for feedback rows. Unlike a cache there is no
/// in-memory fallback: a failed insert is fatal for the request.
pub struct FeedbackStorage {
    db: Database,
}

impl FeedbackStorage {
    pub async fn new(db_path: &str) -> Result<Self> {
        let db = Builder::new_local(db_path).build().await?;

        let conn = db.connect()?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS feedback (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                grammar_analysis TEXT,
                vocabulary_analysis TEXT,
                fluency_analysis TEXT,
                content_relevance_analysis TEXT,
                sentence_structure_analysis TEXT,
                overall_score REAL,
                detailed_feedback TEXT,
                created_at DATETIME NOT NULL
            )
            "#,
            (),
        )
        .await?;

        info!("Feedback database initialized: {}", db_path);

        Ok(Self { db })
    }

    /// Inserts the record and returns the stored row. An insert that yields
    /// no row back is a persistence failure.
    pub async fn insert(&self, record: FeedbackRecord) -> Result<FeedbackRecord> {
        let conn = self.db.connect()?;

        let params: Vec<Value> = vec![
            Value::Text(record.session_id.clone()),
            opt_text(&record.grammar_analysis),
            opt_text(&record.vocabulary_analysis),
            opt_text(&record.fluency_analysis),
            opt_text(&record.content_relevance_analysis),
            opt_text(&record.sentence_structure_analysis),
            record
                .overall_score
                .map(Value::Real)
                .unwrap_or(Value::Null),
            opt_text(&record.detailed_feedback),
            Value::Text(record.created_at.to_rfc3339()),
        ];

        let mut rows = conn
            .query(
                r#"
                INSERT INTO feedback (
                    session_id, grammar_analysis, vocabulary_analysis,
                    fluency_analysis, content_relevance_analysis,
                    sentence_structure_analysis, overall_score,
                    detailed_feedback, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                RETURNING id, session_id, grammar_analysis, vocabulary_analysis,
                    fluency_analysis, content_relevance_analysis,
                    sentence_structure_analysis, overall_score,
                    detailed_feedback, created_at
                "#,
                params,
            )
            .await?;

        let row = rows
            .next()
            .await?
            .ok_or_else(|| Error::persistence("Failed to save feedback to database"))?;

        let stored = record_from_row(&row)?;
        debug!("Feedback saved for session: {}", stored.session_id);

        Ok(stored)
    }

    /// Latest feedback row for a session, if any.
    pub async fn get_for_session(&self, session_id: &str) -> Result<Option<FeedbackRecord>> {
        let conn = self.db.connect()?;

        let mut rows = conn
            .query(
                r#"
                SELECT id, session_id, grammar_analysis, vocabulary_analysis,
                    fluency_analysis, content_relevance_analysis,
                    sentence_structure_analysis, overall_score,
                    detailed_feedback, created_at
                FROM feedback
                WHERE session_id = ?
                ORDER BY id DESC
                LIMIT 1
                "#,
                [session_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(record_from_row(&row)?)),
            None => Ok(None),
        }
    }
}

fn opt_text(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::Text(s.clone()),
        None => Value::Null,
    }
}

fn text_at(row: &Row, idx: i32) -> Result<Option<String>> {
    match row.get_value(idx)? {
        Value::Text(s) => Ok(Some(s)),
        Value::Null => Ok(None),
        other => Err(Error::internal(format!(
            "Unexpected column type at {idx}: {other:?}"
        ))),
    }
}

fn score_at(row: &Row, idx: i32) -> Result<Option<f64>> {
    match row.get_value(idx)? {
        Value::Real(f) => Ok(Some(f)),
        Value::Integer(i) => Ok(Some(i as f64)),
        Value::Null => Ok(None),
        other => Err(Error::internal(format!(
            "Unexpected column type at {idx}: {other:?}"
        ))),
    }
}

fn record_from_row(row: &Row) -> Result<FeedbackRecord> {
    let created_at_str: String = row.get(9)?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| Error::internal(format!("Failed to parse timestamp: {e}")))?
        .with_timezone(&chrono::Utc);

    Ok(FeedbackRecord {
        id: Some(row.get(0)?),
        session_id: row.get(1)?,
        grammar_analysis: text_at(row, 2)?,
        vocabulary_analysis: text_at(row, 3)?,
        fluency_analysis: text_at(row, 4)?,
        content_relevance_analysis: text_at(row, 5)?,
        sentence_structure_analysis: text_at(row, 6)?,
        overall_score: score_at(row, 7)?,
        detailed_feedback: text_at(row, 8)?,
        created_at,
    })
}
