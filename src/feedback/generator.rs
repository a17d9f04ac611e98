use super::{
    extract::extract_embedded_json,
    prompt::build_instruction,
    types::{FeedbackRecord, FeedbackRequest},
};
use crate::{Result, audio::AudioFetcher, llm::ReasoningClient, storage::FeedbackStorage};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

// Browser recordings arrive as WebM regardless of input method.
const AUDIO_MEDIA_TYPE: &str = "audio/webm";

/// Runs the feedback pipeline: fetch audio, ask the model, extract the
/// assessment, persist it. Stateless across requests; collaborators are
/// created once at startup and injected.
pub struct FeedbackGenerator {
    audio: AudioFetcher,
    model: Arc<dyn ReasoningClient>,
    storage: Arc<FeedbackStorage>,
}

impl FeedbackGenerator {
    pub fn new(
        audio: AudioFetcher,
        model: Arc<dyn ReasoningClient>,
        storage: Arc<FeedbackStorage>,
    ) -> Self {
        Self {
            audio,
            model,
            storage,
        }
    }

    /// Produces and persists the feedback record for one session. Upstream
    /// failures (audio fetch, model call, insert) are fatal with no retry;
    /// an unparseable model reply degrades to the fixed fallback record and
    /// still succeeds.
    pub async fn generate(&self, request: FeedbackRequest) -> Result<FeedbackRecord> {
        let audio_base64 = self.audio.fetch_base64(&request.audio_url).await?;

        let instruction = build_instruction(&request.prompt);
        let reply = self
            .model
            .assess(&instruction, &audio_base64, AUDIO_MEDIA_TYPE)
            .await?;

        let record = match extract_embedded_json(&reply) {
            Some(value) => map_feedback(request.session_id.clone(), &value),
            None => {
                warn!(
                    "No parseable JSON in model reply for session {}; using fallback feedback",
                    request.session_id
                );
                FeedbackRecord::fallback(request.session_id.clone())
            }
        };

        let stored = self.storage.insert(record).await?;

        info!("Stored feedback for session: {}", stored.session_id);

        Ok(stored)
    }
}

/// Copies exactly the seven expected keys out of the parsed object. Unknown
/// keys are ignored; missing or wrongly-typed values stay absent.
fn map_feedback(session_id: String, value: &Value) -> FeedbackRecord {
    let mut record = FeedbackRecord::new(session_id);
    record.grammar_analysis = text_field(value, "grammar_analysis");
    record.vocabulary_analysis = text_field(value, "vocabulary_analysis");
    record.fluency_analysis = text_field(value, "fluency_analysis");
    record.content_relevance_analysis = text_field(value, "content_relevance_analysis");
    record.sentence_structure_analysis = text_field(value, "sentence_structure_analysis");
    record.overall_score = value.get("overall_score").and_then(Value::as_f64);
    record.detailed_feedback = text_field(value, "detailed_feedback");
    record
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}
