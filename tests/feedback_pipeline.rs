use pretty_assertions::assert_eq;
use serde_json::json;
use speakcoach::{
    Error,
    audio::AudioFetcher,
    config::ModelConfig,
    feedback::{FeedbackGenerator, FeedbackRequest, PromptInfo},
    llm::AnthropicClient,
    storage::FeedbackStorage,
};
use std::sync::Arc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, method, path},
};

fn test_prompt() -> PromptInfo {
    PromptInfo {
        id: "p1".to_string(),
        title: "Hometown".to_string(),
        question: "Describe your hometown.".to_string(),
        difficulty_level: "intermediate".to_string(),
        grammar_focus_areas: vec![],
        vocabulary_focus: vec!["idioms".to_string()],
    }
}

fn test_request(session_id: &str, audio_server: &MockServer) -> FeedbackRequest {
    FeedbackRequest {
        session_id: session_id.to_string(),
        prompt: test_prompt(),
        audio_url: format!("{}/audio.webm", audio_server.uri()),
    }
}

async fn create_generator(
    model_server: &MockServer,
) -> (FeedbackGenerator, Arc<FeedbackStorage>) {
    let storage = Arc::new(FeedbackStorage::new(":memory:").await.unwrap());

    let http = reqwest::Client::new();
    let model = Arc::new(AnthropicClient::new(
        http.clone(),
        ModelConfig {
            base_url: model_server.uri(),
            api_key: "test-api-key".to_string(),
            model: "claude-3-5-sonnet-20241022".to_string(),
            api_version: "2023-06-01".to_string(),
            max_tokens: 2000,
            timeout_secs: 5,
        },
    ));

    let generator = FeedbackGenerator::new(AudioFetcher::new(http), model, Arc::clone(&storage));
    (generator, storage)
}

async fn mount_audio(audio_server: &MockServer, bytes: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path("/audio.webm"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes))
        .mount(audio_server)
        .await;
}

fn model_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "msg_1",
        "content": [{ "type": "text", "text": text }]
    }))
}

#[tokio::test]
async fn test_well_formed_reply_is_persisted_verbatim() {
    let audio_server = MockServer::start().await;
    let model_server = MockServer::start().await;

    mount_audio(&audio_server, vec![1, 2, 3]).await;

    let reply = json!({
        "grammar_analysis": "Good use of past tense.",
        "vocabulary_analysis": "Strong idiomatic usage.",
        "fluency_analysis": "Natural pacing.",
        "content_relevance_analysis": "Directly on topic.",
        "sentence_structure_analysis": "Varied structures.",
        "overall_score": 7.5,
        "detailed_feedback": "Solid attempt."
    });

    // The model must receive the base64 of the fetched audio inline.
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_string_contains("AQID"))
        .respond_with(model_reply(&format!(
            "Here is my assessment:\n{reply}"
        )))
        .expect(1)
        .mount(&model_server)
        .await;

    let (generator, storage) = create_generator(&model_server).await;

    let stored = generator
        .generate(test_request("session-1", &audio_server))
        .await
        .unwrap();

    assert!(stored.id.is_some());
    assert_eq!(stored.session_id, "session-1");
    assert_eq!(
        stored.grammar_analysis.as_deref(),
        Some("Good use of past tense.")
    );
    assert_eq!(
        stored.vocabulary_analysis.as_deref(),
        Some("Strong idiomatic usage.")
    );
    assert_eq!(stored.fluency_analysis.as_deref(), Some("Natural pacing."));
    assert_eq!(
        stored.content_relevance_analysis.as_deref(),
        Some("Directly on topic.")
    );
    assert_eq!(
        stored.sentence_structure_analysis.as_deref(),
        Some("Varied structures.")
    );
    assert_eq!(stored.overall_score, Some(7.5));
    assert_eq!(stored.detailed_feedback.as_deref(), Some("Solid attempt."));

    // And it is actually in the store.
    let persisted = storage.get_for_session("session-1").await.unwrap().unwrap();
    assert_eq!(persisted, stored);
}

#[tokio::test]
async fn test_prose_reply_degrades_to_fallback() {
    let audio_server = MockServer::start().await;
    let model_server = MockServer::start().await;

    mount_audio(&audio_server, vec![9, 9, 9]).await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(model_reply(
            "I am sorry, I could not understand the recording at all.",
        ))
        .mount(&model_server)
        .await;

    let (generator, _storage) = create_generator(&model_server).await;

    // Fallback is not a request failure.
    let stored = generator
        .generate(test_request("session-2", &audio_server))
        .await
        .unwrap();

    assert_eq!(stored.overall_score, Some(0.0));
    assert_eq!(
        stored.grammar_analysis.as_deref(),
        Some("Unable to analyze grammar at this time. Please try again.")
    );
    assert_eq!(
        stored.detailed_feedback.as_deref(),
        Some("There was an issue processing your audio. Please try again.")
    );
}

#[tokio::test]
async fn test_unparseable_braces_degrade_to_fallback() {
    let audio_server = MockServer::start().await;
    let model_server = MockServer::start().await;

    mount_audio(&audio_server, vec![4, 5, 6]).await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(model_reply("{not valid json at all}"))
        .mount(&model_server)
        .await;

    let (generator, _storage) = create_generator(&model_server).await;

    let stored = generator
        .generate(test_request("session-3", &audio_server))
        .await
        .unwrap();

    assert_eq!(stored.overall_score, Some(0.0));
    assert_eq!(
        stored.sentence_structure_analysis.as_deref(),
        Some("Unable to analyze sentence structure at this time. Please try again.")
    );
}

#[tokio::test]
async fn test_audio_fetch_failure_skips_model_and_storage() {
    let audio_server = MockServer::start().await;
    let model_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/audio.webm"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&audio_server)
        .await;

    // The model must never be called on this path.
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(model_reply("{}"))
        .expect(0)
        .mount(&model_server)
        .await;

    let (generator, storage) = create_generator(&model_server).await;

    let err = generator
        .generate(test_request("session-4", &audio_server))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::AudioFetch(_)));
    assert!(
        storage
            .get_for_session("session-4")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_model_failure_skips_storage() {
    let audio_server = MockServer::start().await;
    let model_server = MockServer::start().await;

    mount_audio(&audio_server, vec![7, 7]).await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .mount(&model_server)
        .await;

    let (generator, storage) = create_generator(&model_server).await;

    let err = generator
        .generate(test_request("session-5", &audio_server))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Model(_)));
    assert!(
        storage
            .get_for_session("session-5")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_extra_keys_never_leak_into_record() {
    let audio_server = MockServer::start().await;
    let model_server = MockServer::start().await;

    mount_audio(&audio_server, vec![1]).await;

    let reply = json!({
        "grammar_analysis": "Fine.",
        "overall_score": 6,
        "confidence": 0.93,
        "transcript": "should be dropped"
    });

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(model_reply(&reply.to_string()))
        .mount(&model_server)
        .await;

    let (generator, _storage) = create_generator(&model_server).await;

    let stored = generator
        .generate(test_request("session-6", &audio_server))
        .await
        .unwrap();

    assert_eq!(stored.grammar_analysis.as_deref(), Some("Fine."));
    assert_eq!(stored.overall_score, Some(6.0));
    // Keys outside the seven expected ones stay absent.
    assert!(stored.vocabulary_analysis.is_none());
    assert!(stored.fluency_analysis.is_none());
    assert!(stored.detailed_feedback.is_none());
}

#[tokio::test]
async fn test_persistence_failure_discards_computed_feedback() {
    let audio_server = MockServer::start().await;
    let model_server = MockServer::start().await;

    mount_audio(&audio_server, vec![2, 4, 6]).await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(model_reply(r#"{"overall_score": 9}"#))
        .expect(1)
        .mount(&model_server)
        .await;

    let temp_dir = tempfile::TempDir::new().unwrap();
    let db_path = temp_dir.path().join("feedback.db");
    let db_path_str = db_path.to_string_lossy().to_string();

    let storage = Arc::new(FeedbackStorage::new(&db_path_str).await.unwrap());

    let http = reqwest::Client::new();
    let model = Arc::new(AnthropicClient::new(
        http.clone(),
        ModelConfig {
            base_url: model_server.uri(),
            api_key: "test-api-key".to_string(),
            model: "claude-3-5-sonnet-20241022".to_string(),
            api_version: "2023-06-01".to_string(),
            max_tokens: 2000,
            timeout_secs: 5,
        },
    ));
    let generator = FeedbackGenerator::new(AudioFetcher::new(http), model, storage);

    // Break the table out from under the store; the model call still runs
    // and its result is lost.
    let db = libsql::Builder::new_local(&db_path_str).build().await.unwrap();
    let conn = db.connect().unwrap();
    conn.execute("DROP TABLE feedback", ()).await.unwrap();

    let err = generator
        .generate(test_request("session-7", &audio_server))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Database(_) | Error::Persistence(_)));
}
