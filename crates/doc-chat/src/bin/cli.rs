//! Interactive terminal chat over a single PDF
//!
//! Run with: cargo run -p doc-chat --features cli --bin doc-chat -- resume.pdf

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use doc_chat::{config::DocChatConfig, server::state::AppState, types::ChatRequest};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "doc-chat")]
#[command(about = "Ask questions about a PDF from the terminal")]
#[command(version)]
struct Cli {
    /// PDF to load
    pdf: PathBuf,

    /// Session identifier for the conversation
    #[arg(short, long, default_value = "terminal")]
    session: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_chat=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = DocChatConfig::load(cli.config.as_deref())?;
    let state = AppState::new(config)?;

    let filename = cli
        .pdf
        .file_name()
        .and_then(|n| n.to_str())
        .context("PDF path has no file name")?
        .to_string();

    let bytes = tokio::fs::read(&cli.pdf)
        .await
        .with_context(|| format!("failed to read {}", cli.pdf.display()))?;

    let bar = spinner(&format!("Indexing {}...", filename));
    let ingested = state.ingest_bytes(&filename, bytes).await;
    bar.finish_and_clear();
    let document = ingested.with_context(|| format!("failed to index {}", cli.pdf.display()))?;

    println!(
        "{} {} ({} pages, {} chunks)",
        style("Loaded").green().bold(),
        document.filename,
        document.total_pages,
        document.total_chunks
    );
    println!(
        "{}",
        style("Ask a question. Type /clear to forget the conversation, exit to quit.").dim()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style("you>").cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();

        match question {
            "" => continue,
            "exit" | "quit" => break,
            "/clear" => {
                state.sessions().clear_session(&cli.session);
                println!("{}", style("Conversation cleared.").yellow());
                continue;
            }
            _ => {}
        }

        let request = ChatRequest {
            message: question.to_string(),
            session_id: cli.session.clone(),
        };

        let bar = spinner("Thinking...");
        let result = state.chat(&request).await;
        bar.finish_and_clear();

        match result {
            Ok(reply) => println!("{} {}\n", style("ai>").green().bold(), reply),
            Err(e) => {
                eprintln!("{} {}", style("error:").red().bold(), e);
                if e.is_model_call() {
                    let hint = format!(
                        "Check that the model services are reachable \
                         (embeddings: {}, llm: {} / {}).",
                        state.embedder().name(),
                        state.llm().name(),
                        state.llm().model()
                    );
                    eprintln!("{}", style(hint).dim());
                }
                println!();
            }
        }
    }

    Ok(())
}
