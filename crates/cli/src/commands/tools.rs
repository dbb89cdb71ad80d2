//! `advisor tools` — Print the tool descriptors offered to the model.

use advisor_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let provider = advisor_providers::build_from_config(&config);
    let registry = advisor_tools::build_registry(&config, provider);

    let definitions = registry.definitions();
    println!("{}", serde_json::to_string_pretty(&definitions)?);
    Ok(())
}
