use super::common;

use common::test_server::TestServer;
use serde_json::{json, Value};
use std::time::Duration;

async fn create_conversation(client: &reqwest::Client, server: &TestServer, user: &str) -> Value {
    let response = client
        .post(server.url("/conversations"))
        .header("x-user-id", user)
        .json(&json!({ "title": "Trip planning" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_conversation_crud() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let conversation = create_conversation(&client, &server, "alice").await;
    let id = conversation["id"].as_str().unwrap().to_string();
    assert_eq!(conversation["title"], "Trip planning");
    assert_eq!(conversation["userId"], "alice");

    // Only the owner's conversations are listed
    create_conversation(&client, &server, "bob").await;
    let listed: Vec<Value> = client
        .get(server.url("/conversations"))
        .header("x-user-id", "alice")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], id.as_str());

    let renamed: Value = client
        .patch(server.url(&format!("/conversations/{}", id)))
        .json(&json!({ "title": "Lisbon" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(renamed["title"], "Lisbon");

    let response = client
        .delete(server.url(&format!("/conversations/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = client
        .get(server.url(&format!("/conversations/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_anonymous_user_is_minted() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/conversations"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let minted = response.headers()["x-user-id"].to_str().unwrap().to_string();
    assert!(uuid_like(&minted));

    let conversation: Value = response.json().await.unwrap();
    assert_eq!(conversation["userId"], minted.as_str());
    assert_eq!(conversation["title"], "New conversation");
}

fn uuid_like(value: &str) -> bool {
    value.len() == 36 && value.chars().filter(|c| *c == '-').count() == 4
}

#[tokio::test]
async fn test_sync_message_returns_both_turns() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();
    let conversation = create_conversation(&client, &server, "carol").await;
    let id = conversation["id"].as_str().unwrap();

    let turn: Value = client
        .post(server.url(&format!("/conversations/{}/messages/sync", id)))
        .header("x-user-id", "carol")
        .json(&json!({ "content": "reverse stressed" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(turn["userMessage"]["role"], "user");
    assert_eq!(turn["assistantMessage"]["role"], "assistant");
    assert_eq!(turn["assistantMessage"]["content"], "Reversed text: desserts");
    assert_eq!(turn["response"]["type"], "success");

    let messages: Vec<Value> = client
        .get(server.url(&format!("/conversations/{}/messages", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(messages.len(), 2);
}

#[tokio::test]
async fn test_fire_and_forget_message() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();
    let conversation = create_conversation(&client, &server, "dave").await;
    let id = conversation["id"].as_str().unwrap();

    let response = client
        .post(server.url(&format!("/conversations/{}/messages", id)))
        .json(&json!({ "content": "reverse abc" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 202);
    let user_message: Value = response.json().await.unwrap();
    assert_eq!(user_message["content"], "reverse abc");

    // Poll for the assistant turn
    let mut messages: Vec<Value> = Vec::new();
    for _ in 0..50 {
        messages = client
            .get(server.url(&format!("/conversations/{}/messages", id)))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if messages.len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1]["content"], "Reversed text: cba");
}

#[tokio::test]
async fn test_delete_message_and_unknown_conversation() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();
    let conversation = create_conversation(&client, &server, "erin").await;
    let id = conversation["id"].as_str().unwrap();

    let turn: Value = client
        .post(server.url(&format!("/conversations/{}/messages/sync", id)))
        .json(&json!({ "content": "hello there" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let message_id = turn["userMessage"]["id"].as_str().unwrap();

    let response = client
        .delete(server.url(&format!("/conversations/{}/messages/{}", id, message_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = client
        .delete(server.url(&format!("/conversations/{}/messages/{}", id, message_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = client
        .post(server.url("/conversations/missing/messages"))
        .json(&json!({ "content": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = client
        .post(server.url(&format!("/conversations/{}/messages", id)))
        .json(&json!({ "content": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_turn_ordering_under_concurrent_load() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let mut ids = Vec::new();
    for i in 0..8 {
        let conversation = create_conversation(&client, &server, &format!("user-{}", i)).await;
        ids.push(conversation["id"].as_str().unwrap().to_string());
    }

    // Turns on one conversation run in order; conversations run concurrently
    let calls = ids.iter().map(|id| {
        let client = &client;
        let url = server.url(&format!("/conversations/{}/messages/sync", id));
        async move {
            let mut statuses = Vec::new();
            for n in 0..3 {
                let response = client
                    .post(&url)
                    .json(&json!({ "content": format!("reverse turn{}", n) }))
                    .send()
                    .await
                    .unwrap();
                statuses.push(response.status());
            }
            statuses
        }
    });
    let statuses = futures::future::join_all(calls).await;
    assert!(statuses.iter().flatten().all(|s| *s == 200));

    for id in &ids {
        let messages: Vec<Value> = client
            .get(server.url(&format!("/conversations/{}/messages", id)))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(messages.len(), 6);
        for pair in messages.chunks(2) {
            assert_eq!(pair[0]["role"], "user");
            assert_eq!(pair[1]["role"], "assistant");
        }
    }
}
