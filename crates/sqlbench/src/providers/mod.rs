use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod http;

pub use http::HttpChatInvoker;

use crate::registry::ModelSpec;

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const GEMINI_API_KEY_ENV: &str = "GOOGLEAI_API_KEY";
pub const OPENROUTER_API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const LM_STUDIO_URL_ENV: &str = "LM_STUDIO_URL";

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const LM_STUDIO_BASE_URL: &str = "http://localhost:1234/v1";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum ProviderKey {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "lm-studio")]
    LmStudio,
}

impl ProviderKey {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::OpenRouter => "openrouter",
            Self::LmStudio => "lm-studio",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Gemini => "Gemini",
            Self::OpenRouter => "OpenRouter",
            Self::LmStudio => "LM Studio",
        }
    }
}

impl Display for ProviderKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Connection details for one OpenAI-compatible chat endpoint. Provider
/// quirks such as extra request headers are carried here as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoint {
    pub key: ProviderKey,
    pub base_url: String,
    pub api_key: Option<String>,
    pub extra_headers: Vec<(String, String)>,
}

impl ProviderEndpoint {
    #[must_use]
    pub fn new(key: ProviderKey, base_url: impl Into<String>) -> Self {
        Self {
            key,
            base_url: base_url.into(),
            api_key: None,
            extra_headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Providers that can be called in this process. A provider without
/// credentials is simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderRegistry {
    endpoints: BTreeMap<ProviderKey, ProviderEndpoint>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secret = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut registry = Self::new();

        if let Some(api_key) = secret(OPENAI_API_KEY_ENV) {
            registry.insert(
                ProviderEndpoint::new(ProviderKey::OpenAi, OPENAI_BASE_URL).with_api_key(api_key),
            );
        }
        if let Some(api_key) = secret(GEMINI_API_KEY_ENV) {
            registry.insert(
                ProviderEndpoint::new(ProviderKey::Gemini, GEMINI_BASE_URL).with_api_key(api_key),
            );
        }
        if let Some(api_key) = secret(OPENROUTER_API_KEY_ENV) {
            registry.insert(
                ProviderEndpoint::new(ProviderKey::OpenRouter, OPENROUTER_BASE_URL)
                    .with_api_key(api_key)
                    .with_header("HTTP-Referer", "http://localhost")
                    .with_header("X-Title", "LLM SQL Benchmark"),
            );
        }

        let lm_studio_url =
            secret(LM_STUDIO_URL_ENV).unwrap_or_else(|| LM_STUDIO_BASE_URL.to_string());
        registry.insert(ProviderEndpoint::new(ProviderKey::LmStudio, lm_studio_url));

        registry
    }

    pub fn insert(&mut self, endpoint: ProviderEndpoint) {
        self.endpoints.insert(endpoint.key, endpoint);
    }

    #[must_use]
    pub fn get(&self, key: ProviderKey) -> Option<&ProviderEndpoint> {
        self.endpoints.get(&key)
    }

    #[must_use]
    pub fn contains(&self, key: ProviderKey) -> bool {
        self.endpoints.contains_key(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = ProviderKey> + '_ {
        self.endpoints.keys().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationError {
    Connection {
        provider: ProviderKey,
        detail: String,
    },
    Authentication {
        provider: ProviderKey,
    },
    ModelNotFound {
        provider: ProviderKey,
        model_id: String,
    },
    Timeout {
        provider: ProviderKey,
        timeout_secs: u64,
    },
    ProviderUnavailable {
        provider: ProviderKey,
    },
    Provider {
        provider: ProviderKey,
        message: String,
    },
}

impl Display for InvocationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection { provider, detail } => write!(
                f,
                "could not connect to {provider}; is the server/service running? {detail}"
            ),
            Self::Authentication { provider } => {
                write!(f, "authentication failed for {provider}; check the API key")
            }
            Self::ModelNotFound { provider, model_id } => write!(
                f,
                "model `{model_id}` not found for {provider} or access is missing"
            ),
            Self::Timeout {
                provider,
                timeout_secs,
            } => write!(f, "request to {provider} timed out after {timeout_secs}s"),
            Self::ProviderUnavailable { provider } => write!(
                f,
                "provider {provider} is not configured or its API key is missing"
            ),
            Self::Provider { provider, message } => {
                write!(f, "unexpected error from {provider}: {message}")
            }
        }
    }
}

impl std::error::Error for InvocationError {}

/// Sends one system/user prompt pair to a model and returns its raw text.
pub trait ModelInvoker {
    fn invoke(
        &self,
        model: &ModelSpec,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, InvocationError>;
}
