//! Chat completions client and planner tests against a mock service.

mod common;

use jobreel::collab::{BriefExtractor, ChatMessage, LlmClient, LlmPlanner, PitchWriter, ShotPlanner};
use common::{sample_brief, sample_script};
use jobreel::config::LlmConfig;
use jobreel_common::{Error, Tone};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn llm_config(server: &MockServer) -> LlmConfig {
    LlmConfig {
        base_url: format!("{}/v1/", server.uri()),
        api_key: Some("test-key".to_string()),
        model: "test-model".to_string(),
        timeout_secs: 5,
        ..Default::default()
    }
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    }))
}

fn planner(server: &MockServer) -> LlmPlanner {
    LlmPlanner::new(LlmClient::new(&llm_config(server)).unwrap())
}

#[tokio::test]
async fn test_complete_sends_model_and_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "response_format": { "type": "json_object" }
        })))
        .respond_with(completion(r#"{"ok": true}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = LlmClient::new(&llm_config(&server)).unwrap();
    let content = client
        .complete(&[ChatMessage::system("sys"), ChatMessage::user("hello")])
        .await
        .unwrap();
    assert_eq!(content, r#"{"ok": true}"#);
}

#[tokio::test]
async fn test_http_error_is_external() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let client = LlmClient::new(&llm_config(&server)).unwrap();
    let err = client.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
    match err {
        Error::External { service, message } => {
            assert_eq!(service, "llm");
            assert!(message.contains("503"), "{}", message);
            assert!(message.contains("overloaded"), "{}", message);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_choices_is_validation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = LlmClient::new(&llm_config(&server)).unwrap();
    let err = client.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "{:?}", err);
}

#[tokio::test]
async fn test_brief_extraction_parses_fenced_json() {
    let server = MockServer::start().await;
    let content = "```json\n{\"title\": \" Data Engineer \", \"impact\": \"Build pipelines\", \
                   \"benefits\": [\"Remote\", \"  \"], \"company\": \"\", \"cta_url\": \"https://acme.io/apply\"}\n```";
    Mock::given(method("POST"))
        .respond_with(completion(content))
        .mount(&server)
        .await;

    let brief = planner(&server)
        .extract("We are hiring a data engineer", "en-US")
        .await
        .unwrap();
    assert_eq!(brief.title, "Data Engineer");
    assert_eq!(brief.impact, "Build pipelines");
    assert_eq!(brief.benefits, vec!["Remote".to_string()]);
    assert_eq!(brief.company, None);
    assert_eq!(brief.cta_url.as_deref(), Some("https://acme.io/apply"));
}

#[tokio::test]
async fn test_brief_without_title_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion(r#"{"title": null, "impact": "Something"}"#))
        .mount(&server)
        .await;

    let err = planner(&server).extract("posting", "en-US").await.unwrap_err();
    assert!(err.to_string().contains("missing a title"), "{}", err);
}

#[tokio::test]
async fn test_malformed_json_is_validation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("Sure! Here is the brief: title = Engineer"))
        .mount(&server)
        .await;

    let err = planner(&server).extract("posting", "en-US").await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "{:?}", err);
}

#[tokio::test]
async fn test_shot_plan_fills_default_duration() {
    let server = MockServer::start().await;
    let content = json!({
        "scenes": [
            { "duration_secs": 4.0, "visual": "Team at a whiteboard", "overlay_text": "Build" },
            { "visual": "Laptop close-up" }
        ]
    })
    .to_string();
    Mock::given(method("POST"))
        .respond_with(completion(&content))
        .mount(&server)
        .await;

    let script = sample_script(2);
    let brief = sample_brief();

    let scenes = planner(&server)
        .plan(&script, &brief, 12.0, Tone::Friendly, 2)
        .await
        .unwrap();
    assert_eq!(scenes.len(), 2);
    assert_eq!(scenes[0].duration_secs, 4.0);
    assert_eq!(scenes[0].overlay_text, "Build");
    assert_eq!(scenes[1].duration_secs, 6.0);
    assert_eq!(scenes[1].overlay_text, "");
}

#[tokio::test]
async fn test_pitch_without_segments_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion(r#"{"segments": ["  ", ""]}"#))
        .mount(&server)
        .await;

    let brief = sample_brief();
    let err = planner(&server)
        .pitch(&brief, Tone::Energetic, 3)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no segments"), "{}", err);
}

#[tokio::test]
async fn test_pitch_keeps_blank_slots_in_place() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion(
            r#"{"segments": [" Scene zero line ", "", "Scene two line"]}"#,
        ))
        .mount(&server)
        .await;

    let segments = planner(&server)
        .pitch(&sample_brief(), Tone::Professional, 3)
        .await
        .unwrap();
    assert_eq!(
        segments,
        vec![
            "Scene zero line".to_string(),
            String::new(),
            "Scene two line".to_string()
        ]
    );
}
