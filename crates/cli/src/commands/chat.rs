//! `advisor chat` — Interactive or single-message chat mode.

use std::io::Write;
use std::sync::Arc;

use advisor_agent::progress;
use advisor_agent::{ChatSession, ProgressReceiver, Reply};
use advisor_config::AppConfig;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for API key early — give a clear error
    if !advisor_providers::is_local(&config.provider) && config.api_key_for(&config.provider).is_none() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export OPENAI_API_KEY='sk-...'");
        eprintln!("    export ADVISOR_API_KEY='sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let provider = advisor_providers::build_from_config(&config);
    let tools = Arc::new(advisor_tools::build_registry(&config, provider.clone()));
    let tool_names: Vec<String> = tools.kinds().iter().map(|k| k.to_string()).collect();
    let session = ChatSession::from_config(provider, tools, &config);

    if let Some(msg) = message {
        // Single message mode
        let reply = ask(&session, &msg).await;
        println!("{}", reply.text);
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        Duke Campus Advisor — Chat Mode        ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", config.provider);
    println!("  Model:     {}", config.model);
    println!("  Tools:     {}", tool_names.join(", "));
    println!();
    println!("  Ask about programs, courses, or events.");
    println!("  Type '/reset' to start over, 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "exit" | "quit" | "/exit" | "/quit" => break,
            "/reset" => {
                session.reset().await;
                println!("  (conversation cleared)");
                println!();
                continue;
            }
            _ => {}
        }

        let reply = ask(&session, line).await;
        println!();
        let prefix = if reply.is_error() { "  [Error] " } else { "  Advisor > " };
        for text_line in reply.text.lines() {
            println!("{prefix}{text_line}");
        }
        println!();
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

/// Run one turn while a status line on stderr tracks progress.
async fn ask(session: &ChatSession, input: &str) -> Reply {
    let (tx, rx) = progress::channel();
    let printer = spawn_status_line(rx);
    let reply = session.ask_with_progress(input, Some(tx)).await;
    // The sender is gone once the turn ends, so the printer finishes
    let _ = printer.await;
    reply
}

fn spawn_status_line(mut rx: ProgressReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut width = 0;
        while let Some(event) = rx.recv().await {
            let status = format!("  {}", event.status());
            eprint!("\r{status:<width$}");
            width = width.max(status.len());
        }
        if width > 0 {
            eprint!("\r{:width$}\r", "");
        }
    })
}
