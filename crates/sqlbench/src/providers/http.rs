use std::io;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{InvocationError, ModelInvoker, ProviderEndpoint, ProviderRegistry};
use crate::registry::ModelSpec;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 40;
const MAX_ERROR_BODY_CHARS: usize = 400;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Blocking OpenAI-compatible `/chat/completions` client shared by every
/// registered provider.
pub struct HttpChatInvoker {
    providers: ProviderRegistry,
    agent: ureq::Agent,
    timeout: Duration,
}

impl HttpChatInvoker {
    #[must_use]
    pub fn new(providers: ProviderRegistry, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            providers,
            agent,
            timeout,
        }
    }

    fn send(
        &self,
        endpoint: &ProviderEndpoint,
        model: &ModelSpec,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, InvocationError> {
        let mut request = self
            .agent
            .post(&endpoint.chat_completions_url())
            .set("Content-Type", "application/json");
        if let Some(api_key) = endpoint.api_key.as_deref() {
            request = request.set("Authorization", &format!("Bearer {api_key}"));
        }
        for (name, value) in &endpoint.extra_headers {
            request = request.set(name, value);
        }

        let body = ChatCompletionRequest {
            model: &model.id,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: 0.0,
            stream: false,
        };

        let response = request
            .send_json(&body)
            .map_err(|error| self.classify_error(endpoint, model, error))?;
        let completion: ChatCompletionResponse =
            response
                .into_json()
                .map_err(|error| InvocationError::Provider {
                    provider: endpoint.key,
                    message: format!("failed to decode chat completion response: {error}"),
                })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| InvocationError::Provider {
                provider: endpoint.key,
                message: "chat completion returned no message content".to_string(),
            })
    }

    fn classify_error(
        &self,
        endpoint: &ProviderEndpoint,
        model: &ModelSpec,
        error: ureq::Error,
    ) -> InvocationError {
        match error {
            ureq::Error::Status(401 | 403, _) => InvocationError::Authentication {
                provider: endpoint.key,
            },
            ureq::Error::Status(404, _) => InvocationError::ModelNotFound {
                provider: endpoint.key,
                model_id: model.id.clone(),
            },
            ureq::Error::Status(status, response) => {
                let body = response.into_string().unwrap_or_default();
                InvocationError::Provider {
                    provider: endpoint.key,
                    message: format!("HTTP {status}: {}", truncate_chars(body.trim())),
                }
            }
            ureq::Error::Transport(transport) => {
                if is_timeout(&transport) {
                    InvocationError::Timeout {
                        provider: endpoint.key,
                        timeout_secs: self.timeout.as_secs(),
                    }
                } else {
                    InvocationError::Connection {
                        provider: endpoint.key,
                        detail: transport.to_string(),
                    }
                }
            }
        }
    }
}

impl ModelInvoker for HttpChatInvoker {
    fn invoke(
        &self,
        model: &ModelSpec,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, InvocationError> {
        let endpoint =
            self.providers
                .get(model.provider)
                .ok_or(InvocationError::ProviderUnavailable {
                    provider: model.provider,
                })?;
        self.send(endpoint, model, system_prompt, user_prompt)
    }
}

fn is_timeout(transport: &ureq::Transport) -> bool {
    let mut source = std::error::Error::source(transport);
    while let Some(error) = source {
        if let Some(io_error) = error.downcast_ref::<io::Error>() {
            if matches!(
                io_error.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ) {
                return true;
            }
        }
        source = error.source();
    }
    false
}

fn truncate_chars(value: &str) -> String {
    if value.chars().count() <= MAX_ERROR_BODY_CHARS {
        return value.to_string();
    }
    let prefix = value
        .chars()
        .take(MAX_ERROR_BODY_CHARS - 3)
        .collect::<String>();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{HttpChatInvoker, truncate_chars};
    use crate::registry::ModelSpec;
    use crate::providers::{InvocationError, ModelInvoker, ProviderKey, ProviderRegistry};

    #[test]
    fn unregistered_provider_fails_without_network() {
        let invoker = HttpChatInvoker::new(ProviderRegistry::new(), Duration::from_secs(1));
        let model = ModelSpec::new("gpt-test", "gpt-test", ProviderKey::OpenAi, &["small"]);
        let error = invoker
            .invoke(&model, "system", "user")
            .expect_err("missing provider must fail");
        assert_eq!(
            error,
            InvocationError::ProviderUnavailable {
                provider: ProviderKey::OpenAi
            }
        );
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(1_000);
        let truncated = truncate_chars(&body);
        assert_eq!(truncated.chars().count(), 400);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_chars("short"), "short");
    }
}
