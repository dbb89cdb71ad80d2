//! `advisor eval` — Grade question/answer pairs with a judge model.

use std::path::{Path, PathBuf};

use advisor_agent::{EvalCase, Evaluator, Relevance};
use advisor_config::AppConfig;

pub async fn run(
    input: PathBuf,
    output: PathBuf,
    model: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(model) = model {
        config.eval.model = model;
    }

    println!("🔍 Loading Q&A pairs from {}", input.display());
    let cases = load_cases(&input)?;

    let provider = advisor_providers::build_named(&config, &config.eval.provider);
    let evaluator = Evaluator::from_config(provider, &config.eval);
    println!(
        "   Judge:     {} ({})",
        evaluator.model(),
        config.eval.provider
    );
    println!("   Pairs:     {}", cases.len());

    let records = evaluator.evaluate_all(&cases).await;

    std::fs::write(&output, serde_json::to_string_pretty(&records)?)
        .map_err(|e| format!("Failed to write {}: {e}", output.display()))?;

    let relevant = records
        .iter()
        .filter(|r| r.judgement.relevant == Relevance::Yes)
        .count();
    let rated: Vec<u8> = records
        .iter()
        .map(|r| r.judgement.clarity)
        .filter(|c| *c > 0)
        .collect();

    println!();
    println!("   ✅ Evaluation complete: {}", output.display());
    println!("   Relevant:  {relevant}/{}", records.len());
    if !rated.is_empty() {
        let mean = rated.iter().map(|c| *c as f32).sum::<f32>() / rated.len() as f32;
        println!("   Clarity:   {mean:.2} average over {} rated", rated.len());
    }

    Ok(())
}

fn load_cases(path: &Path) -> Result<Vec<EvalCase>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let cases: Vec<EvalCase> = serde_json::from_str(&content)
        .map_err(|e| format!("Invalid Q&A file {}: {e}", path.display()))?;
    Ok(cases)
}
