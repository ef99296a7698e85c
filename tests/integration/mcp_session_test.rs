use super::common;

use common::test_server::TestServer;
use serde_json::{json, Value};
use std::time::Duration;

/// Minimal SSE reader over reqwest chunks
struct EventReader {
    response: reqwest::Response,
    buffer: String,
}

impl EventReader {
    async fn open(server: &TestServer) -> Self {
        let response = reqwest::get(server.url("/mcp/sse")).await.unwrap();
        assert_eq!(response.status(), 200);
        Self {
            response,
            buffer: String::new(),
        }
    }

    /// Returns (event, data) or None once the stream ends
    async fn next_event(&mut self) -> Option<(String, Value)> {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let block: String = self.buffer.drain(..end + 2).collect();
                let mut event = String::from("message");
                let mut data = String::new();
                for line in block.lines() {
                    if let Some(name) = line.strip_prefix("event: ") {
                        event = name.to_string();
                    } else if let Some(payload) = line.strip_prefix("data: ") {
                        data.push_str(payload);
                    }
                }
                if data.is_empty() {
                    continue;
                }
                return Some((event, serde_json::from_str(&data).unwrap()));
            }

            let chunk = tokio::time::timeout(Duration::from_secs(5), self.response.chunk())
                .await
                .expect("timed out waiting for event")
                .unwrap()?;
            self.buffer.push_str(std::str::from_utf8(&chunk).unwrap());
        }
    }
}

#[tokio::test]
async fn test_session_receives_task_result() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let mut events = EventReader::open(&server).await;
    let (event, data) = events.next_event().await.unwrap();
    assert_eq!(event, "session");
    let session_id = data["sessionId"].as_str().unwrap().to_string();

    let response = client
        .post(server.url("/mcp/messages"))
        .json(&json!({
            "sessionId": session_id,
            "message": { "task_id": "calculator", "params": { "operation": "add", "a": 2, "b": 3 } }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 202);
    let ack: Value = response.json().await.unwrap();
    assert_eq!(ack["sessionId"], session_id.as_str());

    let (event, data) = events.next_event().await.unwrap();
    assert_eq!(event, "result");
    assert_eq!(data["status"], "success");
    assert_eq!(data["data"]["result"], 5.0);
}

#[tokio::test]
async fn test_non_task_message_is_only_acknowledged() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let mut events = EventReader::open(&server).await;
    let (_, data) = events.next_event().await.unwrap();
    let session_id = data["sessionId"].as_str().unwrap().to_string();

    let response = client
        .post(server.url("/mcp/messages"))
        .json(&json!({ "sessionId": session_id, "message": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 202);
    assert!(server.context.sessions.has_session(&session_id));
}

#[tokio::test]
async fn test_server_side_close_ends_stream() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let mut events = EventReader::open(&server).await;
    let (_, data) = events.next_event().await.unwrap();
    let session_id = data["sessionId"].as_str().unwrap().to_string();

    let response = client
        .delete(server.url(&format!("/mcp/sessions/{}", session_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);
    assert!(events.next_event().await.is_none());

    // Closed ids are never valid again
    let response = client
        .post(server.url("/mcp/messages"))
        .json(&json!({ "sessionId": session_id, "message": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = client
        .delete(server.url(&format!("/mcp/sessions/{}", session_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let server = TestServer::new().await;

    let mut first = EventReader::open(&server).await;
    let mut second = EventReader::open(&server).await;
    let (_, a) = first.next_event().await.unwrap();
    let (_, b) = second.next_event().await.unwrap();

    assert_ne!(a["sessionId"], b["sessionId"]);
    assert_eq!(server.context.sessions.session_count(), 2);
}
