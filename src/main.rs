use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use docqa_cli::{ChatApp, ProviderFactory, Session, error_message};
use docqa_core::LLMProvider;
use docqa_groq::{GroqClient, GroqConfig};
use docqa_rag::{EmbeddingConfig, RagConfig, RagPipeline, build_embedder};

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Ask questions about a PDF, answered by a Groq-hosted model", long_about = None)]
struct Cli {
    /// PDF to load at startup
    #[arg(short, long)]
    pdf: Option<PathBuf>,

    /// Groq API key (defaults to GROQ_API_KEY)
    #[arg(short = 'k', long)]
    api_key: Option<String>,

    /// Answer one question and exit (requires --pdf)
    #[arg(short, long, requires = "pdf")]
    question: Option<String>,

    /// Override the chat model
    #[arg(short, long)]
    model: Option<String>,

    /// Number of chunks passed to the model
    #[arg(long)]
    top_k: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut rag_config = RagConfig::from_env()?;
    if let Some(top_k) = cli.top_k {
        rag_config.top_k = top_k;
    }
    let embedder = build_embedder(&EmbeddingConfig::from_env()?)?;
    let pipeline = RagPipeline::new(rag_config, embedder)?;
    debug!(
        embedding_model = pipeline.embedding_model(),
        top_k = pipeline.top_k(),
        "pipeline ready"
    );

    let model = cli.model.clone();
    let make_provider: ProviderFactory = Box::new(move |key: &str| {
        let mut config = GroqConfig::with_env_defaults(key)?;
        if let Some(model) = &model {
            config = config.with_model(model.clone());
        }
        Ok(Box::new(GroqClient::new(config)?) as Box<dyn LLMProvider>)
    });

    let mut app = ChatApp::new(Session::new(pipeline), make_provider);

    let key = cli
        .api_key
        .or_else(|| std::env::var("GROQ_API_KEY").ok())
        .filter(|k| !k.trim().is_empty());

    if let Some(question) = cli.question {
        let pdf = cli.pdf.context("--question needs --pdf")?;
        let key = key.context("no API key: pass --api-key or set GROQ_API_KEY")?;
        match one_shot(&mut app, &key, &pdf, &question).await {
            Ok(answer) => {
                println!("{}", answer);
                return Ok(());
            }
            Err(e) => {
                eprintln!("{} {}", "❌".red(), error_message(&e).red());
                std::process::exit(1);
            }
        }
    }

    if let Some(key) = key {
        if let Err(e) = app.key_command(&key).await {
            eprintln!("{} {}", "⚠️".yellow(), error_message(&e).yellow());
        }
    }
    if let Some(pdf) = &cli.pdf {
        if let Err(e) = app.upload_command(pdf).await {
            eprintln!("{} {}", "❌".red(), error_message(&e).red());
        }
    }

    app.run().await?;
    Ok(())
}

async fn one_shot(
    app: &mut ChatApp,
    key: &str,
    pdf: &std::path::Path,
    question: &str,
) -> docqa_core::Result<String> {
    app.set_key(key).await?;
    app.upload(pdf).await?;
    app.ask_once(question).await
}
