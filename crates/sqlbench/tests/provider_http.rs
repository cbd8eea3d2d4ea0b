mod support;

use std::net::TcpListener;
use std::time::Duration;

use mockito::Matcher;
use serde_json::json;
use sqlbench::providers::{
    HttpChatInvoker, InvocationError, ModelInvoker, ProviderEndpoint, ProviderKey,
    ProviderRegistry,
};
use sqlbench::registry::ModelSpec;
use support::{
    CHAT_COMPLETIONS_PATH, base_url, completion_body, mock_chat_reply, model_id_matcher,
    spawn_silent_provider,
};

fn invoker_with(endpoint: ProviderEndpoint) -> HttpChatInvoker {
    let mut providers = ProviderRegistry::new();
    providers.insert(endpoint);
    HttpChatInvoker::new(providers, Duration::from_secs(2))
}

fn model(id: &str, key: ProviderKey) -> ModelSpec {
    ModelSpec::new("mock-model", id, key, &["small"])
}

#[test]
fn successful_completion_returns_message_content() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", CHAT_COMPLETIONS_PATH)
        .match_header("authorization", "Bearer sk-or-test-secret")
        .match_header("x-title", "LLM SQL Benchmark")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "model": "vendor/mock-model",
            "messages": [
                {"role": "system", "content": "system text"},
                {"role": "user", "content": "User Question: anything?\n\n"}
            ],
            "temperature": 0.0,
            "stream": false
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body("SELECT 1;"))
        .create();
    let invoker = invoker_with(
        ProviderEndpoint::new(ProviderKey::OpenRouter, base_url(&server))
            .with_api_key("sk-or-test-secret")
            .with_header("X-Title", "LLM SQL Benchmark"),
    );

    let text = invoker
        .invoke(
            &model("vendor/mock-model", ProviderKey::OpenRouter),
            "system text",
            "User Question: anything?\n\n",
        )
        .expect("completion should succeed");
    assert_eq!(text, "SELECT 1;");
    mock.assert();
}

#[test]
fn keyless_provider_sends_no_authorization_header() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", CHAT_COMPLETIONS_PATH)
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body("SELECT 2;"))
        .create();
    let invoker = invoker_with(ProviderEndpoint::new(ProviderKey::LmStudio, base_url(&server)));

    let text = invoker
        .invoke(&model("local", ProviderKey::LmStudio), "system", "user")
        .expect("completion should succeed");
    assert_eq!(text, "SELECT 2;");
    mock.assert();
}

#[test]
fn status_codes_map_to_invocation_errors() {
    let mut server = mockito::Server::new();
    let mocks = [
        mock_chat_reply(
            &mut server,
            model_id_matcher("vendor/locked"),
            401,
            r#"{"error": "bad key"}"#,
        ),
        mock_chat_reply(
            &mut server,
            model_id_matcher("vendor/missing"),
            404,
            r#"{"error": "no such model"}"#,
        ),
        mock_chat_reply(
            &mut server,
            model_id_matcher("vendor/broken"),
            500,
            "upstream exploded",
        ),
    ];
    let invoker = invoker_with(
        ProviderEndpoint::new(ProviderKey::OpenAi, base_url(&server)).with_api_key("sk-test"),
    );

    assert_eq!(
        invoker.invoke(&model("vendor/locked", ProviderKey::OpenAi), "s", "u"),
        Err(InvocationError::Authentication {
            provider: ProviderKey::OpenAi
        })
    );
    assert_eq!(
        invoker.invoke(&model("vendor/missing", ProviderKey::OpenAi), "s", "u"),
        Err(InvocationError::ModelNotFound {
            provider: ProviderKey::OpenAi,
            model_id: "vendor/missing".to_string()
        })
    );
    match invoker.invoke(&model("vendor/broken", ProviderKey::OpenAi), "s", "u") {
        Err(InvocationError::Provider { provider, message }) => {
            assert_eq!(provider, ProviderKey::OpenAi);
            assert_eq!(message, "HTTP 500: upstream exploded");
        }
        other => panic!("expected provider error, got {other:?}"),
    }
    for mock in &mocks {
        mock.assert();
    }
}

#[test]
fn empty_choices_are_provider_errors() {
    let mut server = mockito::Server::new();
    let mocks = [
        mock_chat_reply(
            &mut server,
            model_id_matcher("no-choices"),
            200,
            r#"{"choices": []}"#,
        ),
        mock_chat_reply(
            &mut server,
            model_id_matcher("null-content"),
            200,
            r#"{"choices": [{"message": {"content": null}}]}"#,
        ),
    ];
    let invoker = invoker_with(
        ProviderEndpoint::new(ProviderKey::Gemini, base_url(&server)).with_api_key("key"),
    );

    for id in ["no-choices", "null-content"] {
        let error = invoker
            .invoke(&model(id, ProviderKey::Gemini), "s", "u")
            .expect_err("missing content must fail");
        assert!(
            matches!(error, InvocationError::Provider { .. }),
            "unexpected error: {error:?}"
        );
    }
    for mock in &mocks {
        mock.assert();
    }
}

#[test]
fn refused_connection_is_a_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
    let address = listener
        .local_addr()
        .expect("listener should have an address");
    drop(listener);

    let invoker = invoker_with(ProviderEndpoint::new(
        ProviderKey::LmStudio,
        format!("http://{address}/v1"),
    ));
    let error = invoker
        .invoke(&model("local", ProviderKey::LmStudio), "s", "u")
        .expect_err("closed port must fail");
    assert!(
        matches!(error, InvocationError::Connection { .. }),
        "unexpected error: {error:?}"
    );
    assert!(error.to_string().contains("could not connect to LM Studio"));
}

#[test]
fn stalled_provider_times_out() {
    let (url, handle) = spawn_silent_provider(Duration::from_secs(4));
    let mut providers = ProviderRegistry::new();
    providers.insert(ProviderEndpoint::new(ProviderKey::LmStudio, url));
    let invoker = HttpChatInvoker::new(providers, Duration::from_secs(1));

    let error = invoker
        .invoke(&model("slow", ProviderKey::LmStudio), "s", "u")
        .expect_err("stalled call must fail");
    assert_eq!(
        error,
        InvocationError::Timeout {
            provider: ProviderKey::LmStudio,
            timeout_secs: 1
        }
    );
    handle.join().expect("silent provider thread should not panic");
}
