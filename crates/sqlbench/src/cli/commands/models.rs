use anyhow::Result;
use clap::Args;

use crate::config::RuntimePaths;
use crate::providers::ProviderRegistry;
use crate::registry::{ModelGroup, ModelSpec};

#[derive(Debug, Clone, Args)]
pub struct ModelsArgs {
    #[arg(long, value_enum, default_value_t = ModelGroup::All)]
    pub group: ModelGroup,
}

pub fn run(args: &ModelsArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    let registry = load_registry(runtime_paths)?;
    let providers = ProviderRegistry::from_env();
    let configured = providers
        .keys()
        .map(|key| key.as_str())
        .collect::<Vec<_>>()
        .join(",");
    println!(
        "models: registry entries={} group={} providers={}",
        registry.len(),
        args.group,
        configured
    );

    for model in &registry {
        let available = providers.contains(model.provider);
        println!(
            "models: entry name={} id={} provider={} tags={} available={} selected={}",
            model.name,
            model.id,
            model.provider.as_str(),
            model.tags.join(","),
            available,
            available && args.group.contains(model)
        );
    }
    Ok(())
}

pub(crate) fn load_registry(runtime_paths: &RuntimePaths) -> Result<Vec<ModelSpec>> {
    match &runtime_paths.models_file {
        Some(path) => crate::registry::load_model_registry(path),
        None => Ok(crate::registry::default_model_registry()),
    }
}
