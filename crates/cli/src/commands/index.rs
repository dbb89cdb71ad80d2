//! `advisor index` — Build a handbook search index.

use std::path::PathBuf;

use advisor_config::AppConfig;
use advisor_tools::{Handbook, HandbookIndex};

pub async fn run(
    handbook: Handbook,
    out: PathBuf,
    files: Vec<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let provider = advisor_providers::build_from_config(&config);
    let model = &config.tools.handbooks.embedding_model;

    println!("📚 Indexing {} handbook with {model}", handbook.label());

    let mut index = HandbookIndex::new(model);
    for file in &files {
        let text = tokio::fs::read_to_string(file)
            .await
            .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
        let source = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());

        let pages = index.add_document(provider.as_ref(), handbook, &source, &text).await?;
        println!("   ✅ {source}: {pages} pages");
    }

    index.save(&out)?;

    println!();
    println!("   Wrote {} chunks to {}", index.len(), out.display());
    println!();
    println!("   Point the config at it:");
    println!("     [tools.handbooks]");
    println!("     {}_index = \"{}\"", handbook.label(), out.display());

    Ok(())
}
