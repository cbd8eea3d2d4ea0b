use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::providers::{ProviderKey, ProviderRegistry};

/// A benchmarked model: display name, provider-side identifier and the
/// provider that serves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ModelSpec {
    pub name: String,
    pub id: String,
    pub provider: ProviderKey,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ModelSpec {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        id: impl Into<String>,
        provider: ProviderKey,
        tags: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            provider,
            tags: tags.iter().map(ToString::to_string).collect(),
        }
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ModelGroup {
    All,
    Small,
    Large,
    Opensource,
    Proprietary,
    Local,
    SmallOpensource,
    LargeOpensource,
    SmallProprietary,
    LargeProprietary,
}

impl ModelGroup {
    pub const ALL: [Self; 10] = [
        Self::All,
        Self::Small,
        Self::Large,
        Self::Opensource,
        Self::Proprietary,
        Self::Local,
        Self::SmallOpensource,
        Self::LargeOpensource,
        Self::SmallProprietary,
        Self::LargeProprietary,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Small => "small",
            Self::Large => "large",
            Self::Opensource => "opensource",
            Self::Proprietary => "proprietary",
            Self::Local => "local",
            Self::SmallOpensource => "small-opensource",
            Self::LargeOpensource => "large-opensource",
            Self::SmallProprietary => "small-proprietary",
            Self::LargeProprietary => "large-proprietary",
        }
    }

    /// Tags a model must carry to belong to the group. Composite groups
    /// require every part; `all` requires nothing.
    #[must_use]
    pub const fn required_tags(self) -> &'static [&'static str] {
        match self {
            Self::All => &[],
            Self::Small => &["small"],
            Self::Large => &["large"],
            Self::Opensource => &["opensource"],
            Self::Proprietary => &["proprietary"],
            Self::Local => &["local"],
            Self::SmallOpensource => &["small", "opensource"],
            Self::LargeOpensource => &["large", "opensource"],
            Self::SmallProprietary => &["small", "proprietary"],
            Self::LargeProprietary => &["large", "proprietary"],
        }
    }

    #[must_use]
    pub fn contains(self, model: &ModelSpec) -> bool {
        self.required_tags().iter().all(|tag| model.has_tag(tag))
    }
}

impl std::fmt::Display for ModelGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[must_use]
pub fn default_model_registry() -> Vec<ModelSpec> {
    vec![
        ModelSpec::new(
            "gpt-4o-mini",
            "gpt-4o-mini",
            ProviderKey::OpenAi,
            &["small", "proprietary"],
        ),
        ModelSpec::new("gpt-4o", "gpt-4o", ProviderKey::OpenAi, &["large", "proprietary"]),
        ModelSpec::new(
            "gemini-2.0-flash",
            "gemini-2.0-flash",
            ProviderKey::Gemini,
            &["small", "proprietary"],
        ),
        ModelSpec::new(
            "gemini-2.5-pro",
            "gemini-2.5-pro",
            ProviderKey::Gemini,
            &["large", "proprietary"],
        ),
        ModelSpec::new(
            "llama-3.3-70b",
            "meta-llama/llama-3.3-70b-instruct",
            ProviderKey::OpenRouter,
            &["large", "opensource"],
        ),
        ModelSpec::new(
            "deepseek-chat-v3",
            "deepseek/deepseek-chat-v3-0324",
            ProviderKey::OpenRouter,
            &["large", "opensource"],
        ),
        ModelSpec::new(
            "qwen-2.5-7b",
            "qwen/qwen-2.5-7b-instruct",
            ProviderKey::OpenRouter,
            &["small", "opensource"],
        ),
        ModelSpec::new(
            "qwen3-8b (local)",
            "qwen/qwen3-8b",
            ProviderKey::LmStudio,
            &["small", "opensource", "local"],
        ),
    ]
}

pub fn load_model_registry(path: &Path) -> Result<Vec<ModelSpec>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read model registry: {}", path.display()))?;
    parse_model_registry(&raw)
        .with_context(|| format!("invalid model registry: {}", path.display()))
}

pub fn parse_model_registry(raw: &str) -> Result<Vec<ModelSpec>> {
    let models: Vec<ModelSpec> =
        serde_json::from_str(raw).context("model registry must be a JSON array of models")?;
    validate_model_registry(&models)?;
    Ok(models)
}

pub fn validate_model_registry(models: &[ModelSpec]) -> Result<()> {
    if models.is_empty() {
        bail!("model registry contains no models");
    }

    let mut seen = BTreeSet::new();
    for (index, model) in models.iter().enumerate() {
        if model.name.trim().is_empty() {
            bail!("model at index {index} has an empty name");
        }
        if model.id.trim().is_empty() {
            bail!("model `{}` has an empty id", model.name);
        }
        if !seen.insert(model.name.as_str()) {
            bail!("duplicate model name `{}`", model.name);
        }
    }

    Ok(())
}

/// Models that belong to `group` and whose provider is configured, in
/// registry order.
#[must_use]
pub fn select_active_models(
    registry: &[ModelSpec],
    group: ModelGroup,
    providers: &ProviderRegistry,
) -> Vec<ModelSpec> {
    registry
        .iter()
        .filter(|model| providers.contains(model.provider) && group.contains(model))
        .cloned()
        .collect()
}
