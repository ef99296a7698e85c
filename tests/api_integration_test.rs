use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use concierge::config::Settings;
use concierge::store::ConversationStore;
use concierge::AppContext;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

async fn setup() -> (Router, AppContext) {
    let context = AppContext::new(Settings::default()).unwrap();
    context.registry.initialize().await;
    (concierge::create_app(&context), context)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_list_and_get_agents() {
    let (app, _) = setup().await;

    let (status, body) = send(&app, get("/agents")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body.as_array().unwrap().iter().map(|a| a["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["calculator", "reverseString", "wordCount"]);
    assert!(body[0].get("execute").is_none());

    let (status, body) = send(&app, get("/agents/reverseString")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["parameters"][0]["name"], "text");
    assert_eq!(body["parameters"][0]["type"], "string");

    let (status, _) = send(&app, get("/agents/reverse_string")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_run_agent_directly() {
    let (app, _) = setup().await;

    let (status, body) = send(
        &app,
        json_request("POST", "/agents/reverseString", json!({ "parameters": { "text": "hello" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": "olleh" }));
}

#[tokio::test]
async fn test_run_agent_missing_parameter() {
    let (app, _) = setup().await;

    let (status, body) = send(
        &app,
        json_request("POST", "/agents/reverseString", json!({ "parameters": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], json!(["Parameter 'text' is required."]));
}

#[tokio::test]
async fn test_run_agent_type_mismatch_and_invalid_input() {
    let (app, _) = setup().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/agents/calculator",
            json!({ "parameters": { "operation": "add", "a": "1", "b": 2 } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], json!(["Parameter 'a' must be of type number."]));

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/agents/calculator",
            json!({ "parameters": { "operation": "divide", "a": 1, "b": 0 } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid input:"));
}

#[tokio::test]
async fn test_run_agent_applies_defaults() {
    let (app, _) = setup().await;

    let (status, body) = send(
        &app,
        json_request("POST", "/agents/wordCount", json!({ "parameters": { "text": "a b a" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], 3);
}

#[tokio::test]
async fn test_orchestrate_reverse_persists_turns() {
    let (app, context) = setup().await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/orchestrate", json!({ "query": "reverse hello world" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let user_id = response.headers()["x-user-id"].to_str().unwrap().to_string();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap();

    assert_eq!(body["type"], "success");
    assert_eq!(body["message"], "Reversed text: dlrow olleh");
    let conversation_id = body["conversationId"].as_str().unwrap();

    let conversation = context.store.get_conversation(conversation_id).await.unwrap().unwrap();
    assert_eq!(conversation.user_id, user_id);

    let messages = context.store.list_messages(conversation_id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "reverse hello world");
    assert!(messages[1].content.contains("dlrow olleh"));
}

#[tokio::test]
async fn test_orchestrate_needs_parameters_is_not_persisted() {
    let (app, context) = setup().await;

    let (status, body) = send(
        &app,
        json_request("POST", "/orchestrate", json!({ "query": "reverse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "needs_parameters");
    assert_eq!(body["agentId"], "reverseString");
    assert_eq!(body["parameters"][0]["name"], "text");

    let conversation_id = body["conversationId"].as_str().unwrap();
    let messages = context.store.list_messages(conversation_id).await.unwrap();
    assert_eq!(messages.len(), 1);
}

#[tokio::test]
async fn test_orchestrate_with_agent_and_existing_user() {
    let (app, _) = setup().await;

    let request = Request::builder()
        .uri("/orchestrate")
        .method("POST")
        .header("Content-Type", "application/json")
        .header("x-user-id", "alice")
        .body(Body::from(
            json!({
                "agentId": "calculator",
                "parameters": { "operation": "multiply", "a": 6, "b": 7 }
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-user-id"], "alice");
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(body["type"], "success");
    assert_eq!(body["message"], "Result from Calculator: 42.0");
}

#[tokio::test]
async fn test_orchestrate_invalid_and_unknown_conversation() {
    let (app, _) = setup().await;

    let (status, body) = send(&app, json_request("POST", "/orchestrate", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "error");
    assert_eq!(body["message"], "Invalid input: Missing query or agentId/parameters.");

    let (status, _) = send(
        &app,
        json_request("POST", "/orchestrate", json!({ "query": "hi", "conversationId": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mcp_dispatch() {
    let (app, _) = setup().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/mcp",
            json!({ "task_id": "calculator", "params": { "operation": "divide", "a": 5, "b": 0 } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["code"], "DIVISION_BY_ZERO");

    let (_, body) = send(&app, json_request("POST", "/mcp", json!({ "task_id": "unknown_task" }))).await;
    assert_eq!(body["error"]["code"], "TASK_NOT_FOUND");

    let (_, body) = send(
        &app,
        json_request("POST", "/mcp", json!({ "task_id": "reverse_text", "params": { "text": "abc" } })),
    )
    .await;
    assert_eq!(body, json!({ "status": "success", "data": { "original": "abc", "reversed": "cba" } }));
}

#[tokio::test]
async fn test_mcp_tools_catalogue() {
    let (app, _) = setup().await;

    let (status, body) = send(&app, get("/mcp/tools")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
    assert_eq!(body[2]["input_schema"]["required"], json!(["operation", "a", "b"]));
}

#[tokio::test]
async fn test_sse_first_event_carries_session_id() {
    let (app, context) = setup().await;

    let response = app.clone().oneshot(get("/mcp/sse")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");

    let mut stream = response.into_body();
    let frame = stream.frame().await.unwrap().unwrap();
    let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
    assert!(text.starts_with("event: session\n"));

    let data = text
        .lines()
        .find_map(|line| line.strip_prefix("data: "))
        .unwrap();
    let session_id = serde_json::from_str::<Value>(data).unwrap()["sessionId"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(context.sessions.has_session(&session_id));

    let (status, body) = send(
        &app,
        json_request("POST", "/mcp/messages", json!({ "sessionId": session_id, "message": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "accepted");

    // Client disconnect ends the session
    drop(stream);
    assert!(!context.sessions.has_session(&session_id));
}

#[tokio::test]
async fn test_sse_disconnect_removes_session() {
    let (app, context) = setup().await;

    let response = app.clone().oneshot(get("/mcp/sse")).await.unwrap();
    let mut body = response.into_body();
    body.frame().await.unwrap().unwrap();
    assert_eq!(context.sessions.session_count(), 1);

    drop(body);
    assert_eq!(context.sessions.session_count(), 0);

    let (status, _) = send(
        &app,
        json_request("POST", "/mcp/messages", json!({ "sessionId": "gone", "message": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_ready_after_initialization() {
    let context = AppContext::new(Settings::default()).unwrap();
    let app = concierge::create_app(&context);

    let (status, _) = send(&app, get("/health/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    context.registry.initialize().await;
    let (status, _) = send(&app, get("/health/ready")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get("/health")).await;
    assert_eq!(body["checks"]["agents"], 3);
}
