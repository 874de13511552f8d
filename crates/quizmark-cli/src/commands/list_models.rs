//! The `quizmark list-models` command.

use std::path::PathBuf;

use anyhow::Result;

use quizmark_core::traits::ModelInfo;
use quizmark_providers::ollama::OllamaProvider;
use quizmark_providers::{create_provider, load_config_from, ProviderConfig};

pub async fn execute(provider_filter: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let mut names: Vec<_> = config.providers.keys().collect();
    names.sort();

    let mut found_any = false;

    for name in names {
        if provider_filter.as_ref().is_some_and(|f| f != name) {
            continue;
        }
        let provider_config = &config.providers[name];

        let models = match provider_config {
            ProviderConfig::Ollama { base_url } => {
                match OllamaProvider::new(base_url).list_models_async().await {
                    Ok(models) => models,
                    Err(e) => {
                        eprintln!("Provider: {name} (unavailable: {e})");
                        continue;
                    }
                }
            }
            _ => create_provider(provider_config).available_models(),
        };

        if !models.is_empty() {
            found_any = true;
            println!("Provider: {name}");
            for model in &models {
                println!("  {}", describe(model));
            }
            println!();
        }
    }

    if !found_any {
        println!("No providers configured. Run `quizmark init` to create a config file.");
    }

    Ok(())
}

fn describe(model: &ModelInfo) -> String {
    if model.max_context == 0 {
        return format!("{} (local)", model.id);
    }
    format!(
        "{} - {} ({}K context, ${:.5}/{:.5} per 1K tokens)",
        model.id,
        model.name,
        model.max_context / 1000,
        model.cost_per_1k_input,
        model.cost_per_1k_output,
    )
}
