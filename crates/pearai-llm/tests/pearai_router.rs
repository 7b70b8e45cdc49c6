//! Mock HTTP server tests for the PearAI router.
//!
//! Coverage:
//! - Catalog fetch for aliases, with routing to generic and Anthropic delegates
//! - Fallback model when the catalog is unavailable
//! - Catalog entries with explicit nulls still routing
//! - Price markup on the reported model
//! - UI-only notices diverted from the stream to the notifier
//! - Delegate errors surfacing under the PearAI name

use std::sync::{Arc, Mutex};

use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pearai_llm::catalog::CATALOG_FALLBACK_MODEL_ID;
use pearai_llm::config::ApiHandlerOptions;
use pearai_llm::notify::{Notice, Notifier, PAY_AS_YOU_GO_URL};
use pearai_llm::pearai::{PRICE_MARKUP, PearAiHandler};
use pearai_llm::provider::ApiHandler;
use pearai_llm::secret::ApiKey;
use pearai_llm::stream::ApiStreamChunk;
use pearai_llm::types::ConversationTurn;

#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }

    fn sign_in_required(&self) {}
}

fn options(server_url: &str, model: &str) -> ApiHandlerOptions {
    ApiHandlerOptions {
        pearai_api_key: Some(ApiKey::new("pearai-token")),
        pearai_base_url: Some(server_url.into()),
        api_model_id: Some(model.into()),
        ..Default::default()
    }
}

fn catalog_response(underlying: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "models": {
            "pearai-model": {
                "underlyingModel": underlying,
                "maxTokens": 4096,
                "contextWindow": 64000,
                "supportsImages": false,
                "supportsPromptCache": true,
                "inputPrice": 1.0,
                "outputPrice": 2.0
            }
        },
        "defaultModelId": "pearai-model"
    }))
}

async fn mount_catalog(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/getPearAIAgentModels"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

fn sse_response(events: &[serde_json::Value]) -> ResponseTemplate {
    let mut body = String::new();
    for event in events {
        body.push_str(&format!("data: {event}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/event-stream")
}

fn turns() -> Vec<ConversationTurn> {
    vec![ConversationTurn::user("Hello!")]
}

// ── Alias resolution ───────────────────────────────────────────────────

#[tokio::test]
async fn alias_routes_to_generic_delegate_from_catalog() {
    let server = MockServer::start().await;
    mount_catalog(&server, catalog_response("deepseek/deepseek-chat")).await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer pearai-token"))
        .and(body_partial_json(serde_json::json!({
            "model": "deepseek/deepseek-chat",
            "max_tokens": 4096,
            "stream_options": {"include_usage": true}
        })))
        .respond_with(sse_response(&[
            serde_json::json!({"choices": [{"delta": {"content": "Hi there"}}]}),
            serde_json::json!({"choices": [], "usage": {"prompt_tokens": 7, "completion_tokens": 3}}),
        ]))
        .expect(1)
        .mount(&server)
        .await;

    let handler = PearAiHandler::connect(
        &options(&server.uri(), "pearai-model"),
        Arc::new(RecordingNotifier::default()),
    )
    .await
    .unwrap();
    assert!(handler.is_ready());
    assert_eq!(handler.requested_model(), "pearai-model");

    let model = handler.model().await;
    assert_eq!(model.id, "deepseek/deepseek-chat");
    assert_eq!(model.info.context_window, 64000);
    assert!((model.info.input_price.unwrap() - PRICE_MARKUP).abs() < 1e-9);
    assert!((model.info.output_price.unwrap() - 2.0 * PRICE_MARKUP).abs() < 1e-9);

    let chunks = handler
        .create_message("Be brief.", &turns())
        .await
        .unwrap()
        .collect_chunks()
        .await
        .unwrap();
    assert_eq!(
        chunks,
        vec![ApiStreamChunk::text("Hi there"), ApiStreamChunk::usage(7, 3)]
    );
}

#[tokio::test]
async fn alias_routes_to_anthropic_delegate_from_catalog() {
    let server = MockServer::start().await;
    mount_catalog(&server, catalog_response("anthropic/claude-3-7-sonnet-20250219")).await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "pearai-token"))
        .and(body_partial_json(serde_json::json!({
            "model": "claude-3-7-sonnet-20250219",
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": [{"type": "text", "text": "Routed"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let handler = PearAiHandler::new(
        &options(&server.uri(), "pearai-model"),
        Arc::new(RecordingNotifier::default()),
    )
    .unwrap();

    // Waits for the background resolution before sending.
    assert_eq!(handler.complete_prompt("Q").await.unwrap(), "Routed");
    assert!(handler.is_ready());
}

#[tokio::test]
async fn unavailable_catalog_falls_back_to_claude() {
    let server = MockServer::start().await;
    mount_catalog(&server, ResponseTemplate::new(500)).await;

    let handler = PearAiHandler::connect(
        &options(&server.uri(), "pearai-model"),
        Arc::new(RecordingNotifier::default()),
    )
    .await
    .unwrap();

    let model = handler.model().await;
    assert_eq!(model.id, CATALOG_FALLBACK_MODEL_ID);
    assert!((model.info.input_price.unwrap() - 3.0 * PRICE_MARKUP).abs() < 1e-9);
}

#[tokio::test]
async fn malformed_catalog_falls_back_to_claude() {
    let server = MockServer::start().await;
    mount_catalog(
        &server,
        ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"),
    )
    .await;

    let handler = PearAiHandler::connect(
        &options(&server.uri(), "pearai-model"),
        Arc::new(RecordingNotifier::default()),
    )
    .await
    .unwrap();
    assert_eq!(handler.model().await.id, CATALOG_FALLBACK_MODEL_ID);
}

#[tokio::test]
async fn catalog_with_null_fields_still_routes() {
    let server = MockServer::start().await;
    mount_catalog(
        &server,
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "models": {
                "pearai-model": {
                    "underlyingModel": "deepseek/deepseek-chat",
                    "contextWindow": null,
                    "supportsImages": null,
                    "supportsComputerUse": null,
                    "inputPrice": 1.0
                }
            },
            "defaultModelId": "pearai-model"
        })),
    )
    .await;

    let handler = PearAiHandler::connect(
        &options(&server.uri(), "pearai-model"),
        Arc::new(RecordingNotifier::default()),
    )
    .await
    .unwrap();
    let model = handler.model().await;
    assert_eq!(model.id, "deepseek/deepseek-chat");
    assert!(!model.info.supports_images);
}

#[tokio::test]
async fn direct_ids_skip_the_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/getPearAIAgentModels"))
        .respond_with(catalog_response("deepseek/deepseek-chat"))
        .expect(0)
        .mount(&server)
        .await;

    let handler = PearAiHandler::new(
        &options(&server.uri(), "gpt-4o-mini"),
        Arc::new(RecordingNotifier::default()),
    )
    .unwrap();
    assert!(handler.is_ready());
    assert_eq!(handler.model().await.id, "gpt-4o-mini");
}

// ── Stream filtering ───────────────────────────────────────────────────

#[tokio::test]
async fn ui_only_chunks_reach_the_notifier() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(sse_response(&[
            serde_json::json!({"choices": [{"delta": {"content": "Answer"}}]}),
            serde_json::json!({"choices": [{"delta": {
                "type": "ui",
                "metadata": {"ui_only": true, "content": "Credits low, switch to pay-as-you-go."}
            }}]}),
            serde_json::json!({"choices": [], "usage": {"prompt_tokens": 4, "completion_tokens": 1}}),
        ]))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = Arc::new(RecordingNotifier::default());
    let handler = PearAiHandler::new(&options(&server.uri(), "deepseek-chat"), notifier.clone())
        .unwrap();

    let chunks = handler
        .create_message("Be brief.", &turns())
        .await
        .unwrap()
        .collect_chunks()
        .await
        .unwrap();
    assert_eq!(
        chunks,
        vec![ApiStreamChunk::text("Answer"), ApiStreamChunk::usage(4, 1)]
    );

    let notices = notifier.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Credits low, switch to pay-as-you-go.");
    assert_eq!(notices[0].action.as_ref().unwrap().url, PAY_AS_YOU_GO_URL);
}

// ── Errors ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn delegate_errors_carry_pearai_name() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let handler = PearAiHandler::new(
        &options(&server.uri(), "deepseek-chat"),
        Arc::new(RecordingNotifier::default()),
    )
    .unwrap();
    let err = handler
        .create_message("Be brief.", &turns())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "PearAI API error: Too Many Requests");
}
