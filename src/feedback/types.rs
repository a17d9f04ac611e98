use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One feedback request as submitted by the practice UI.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequest {
    pub session_id: String,
    pub prompt: PromptInfo,
    pub audio_url: String,
}

/// Speaking-practice prompt metadata embedded in the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptInfo {
    pub id: String,
    pub title: String,
    pub question: String,
    pub difficulty_level: String,
    #[serde(default)]
    pub grammar_focus_areas: Vec<String>,
    #[serde(default)]
    pub vocabulary_focus: Vec<String>,
}

/// Structured assessment tied 1:1 to a session. Fields the model did not
/// provide stay absent rather than zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: Option<i64>,
    pub session_id: String,
    pub grammar_analysis: Option<String>,
    pub vocabulary_analysis: Option<String>,
    pub fluency_analysis: Option<String>,
    pub content_relevance_analysis: Option<String>,
    pub sentence_structure_analysis: Option<String>,
    pub overall_score: Option<f64>,
    pub detailed_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn new(session_id: String) -> Self {
        Self {
            id: None,
            session_id,
            grammar_analysis: None,
            vocabulary_analysis: None,
            fluency_analysis: None,
            content_relevance_analysis: None,
            sentence_structure_analysis: None,
            overall_score: None,
            detailed_feedback: None,
            created_at: Utc::now(),
        }
    }

    /// Fixed degraded record used when the model's reply yields no parseable
    /// JSON object. The caller still gets a complete record back.
    pub fn fallback(session_id: String) -> Self {
        Self {
            id: None,
            session_id,
            grammar_analysis: Some(
                "Unable to analyze grammar at this time. Please try again.".to_string(),
            ),
            vocabulary_analysis: Some(
                "Unable to analyze vocabulary at this time. Please try again.".to_string(),
            ),
            fluency_analysis: Some(
                "Unable to analyze fluency at this time. Please try again.".to_string(),
            ),
            content_relevance_analysis: Some(
                "Unable to analyze content at this time. Please try again.".to_string(),
            ),
            sentence_structure_analysis: Some(
                "Unable to analyze sentence structure at this time. Please try again.".to_string(),
            ),
            overall_score: Some(0.0),
            detailed_feedback: Some(
                "There was an issue processing your audio. Please try again.".to_string(),
            ),
            created_at: Utc::now(),
        }
    }
}
