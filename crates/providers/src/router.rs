//! Provider selection from configuration.
//!
//! Every backend the advisor talks to speaks the OpenAI wire format, so the
//! router only has to pick a base URL and an API key per provider name.

use std::sync::Arc;

use advisor_config::AppConfig;
use advisor_core::provider::Provider;
use tracing::debug;

use crate::openai_compat::OpenAiCompatProvider;

/// Build the chat provider named by `config.provider`.
pub fn build_from_config(config: &AppConfig) -> Arc<dyn Provider> {
    build_named(config, &config.provider)
}

/// Build a provider by name, using its `[providers.<name>]` table when present.
pub fn build_named(config: &AppConfig, name: &str) -> Arc<dyn Provider> {
    let base_url = config
        .providers
        .get(name)
        .and_then(|p| p.api_url.clone())
        .unwrap_or_else(|| default_base_url(name));

    let api_key = match config.api_key_for(name) {
        Some(key) => key,
        // Local servers accept any bearer token
        None if is_local(name) => name.to_string(),
        None => String::new(),
    };

    debug!(provider = name, base_url = %base_url, "Building provider");

    Arc::new(OpenAiCompatProvider::new(name, base_url, api_key))
}

/// Local servers accept any key.
pub fn is_local(provider_name: &str) -> bool {
    matches!(provider_name, "ollama" | "vllm" | "llamacpp" | "llama.cpp")
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => "https://api.openai.com/v1".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_config::ProviderConfig;

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openrouter").contains("openrouter.ai"));
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
    }

    #[test]
    fn build_from_default_config() {
        let config = AppConfig::default();
        let provider = build_from_config(&config);
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn build_named_uses_configured_provider() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "ollama".into(),
            ProviderConfig {
                api_key: None,
                api_url: Some("http://gpu-box:11434/v1".into()),
            },
        );
        let provider = build_named(&config, "ollama");
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn local_providers_need_no_key() {
        assert!(is_local("ollama"));
        assert!(!is_local("openai"));
    }
}
