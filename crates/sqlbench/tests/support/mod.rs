#![allow(dead_code)]

use std::net::TcpListener;
use std::thread::JoinHandle;
use std::time::Duration;

use mockito::{Matcher, Mock, ServerGuard};

pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

pub fn completion_body(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

/// OpenAI-compatible base URL for a mock provider.
pub fn base_url(server: &ServerGuard) -> String {
    format!("{}/v1", server.url())
}

/// Registers one chat reply, served once to a request whose body matches.
pub fn mock_chat_reply(
    server: &mut ServerGuard,
    body: Matcher,
    status: usize,
    reply: &str,
) -> Mock {
    server
        .mock("POST", CHAT_COMPLETIONS_PATH)
        .match_body(body)
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(reply)
        .expect(1)
        .create()
}

pub fn model_id_matcher(model_id: &str) -> Matcher {
    Matcher::PartialJson(serde_json::json!({ "model": model_id }))
}

/// Accepts one connection and holds it open without answering.
pub fn spawn_silent_provider(hold: Duration) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("silent provider should bind");
    let address = listener
        .local_addr()
        .expect("silent provider should expose its address");
    let handle = std::thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            std::thread::sleep(hold);
            drop(stream);
        }
    });
    (format!("http://{address}/v1"), handle)
}
