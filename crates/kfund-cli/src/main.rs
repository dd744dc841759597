mod display;
mod ingest;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use kfund_ai::{OpenAiEmbedder, OpenAiReasoner};
use kfund_core::{EngineConfig, LineItem};
use kfund_engine::{ClassificationEngine, EventRequest};
use kfund_store::{ChromaIndex, VectorIndex};
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "kfund", version, about = "K Fund expense classification")]
struct Cli {
    /// Base URL of the Chroma vector index.
    #[arg(
        long,
        global = true,
        env = "KFUND_INDEX_URL",
        default_value = "http://localhost:8000"
    )]
    index_url: String,

    /// Collection holding the ingested regulation chunks.
    #[arg(long, global = true, default_value = "compliance_regulations")]
    collection: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk, embed, and load regulation markdown files into the index.
    Ingest {
        /// Directory containing `*.md` regulation files.
        dir: PathBuf,
        /// Chunk size budget in characters.
        #[arg(long, default_value_t = 1000)]
        chunk_size: usize,
        /// Trailing lines carried into the next chunk.
        #[arg(long, default_value_t = 3)]
        overlap: usize,
    },
    /// Classify a single line item.
    Classify {
        /// Free-text item description, e.g. "Reception catering services".
        item: String,
        #[arg(long)]
        cost: f64,
        #[arg(long, default_value_t = 0)]
        foreign_guests: u32,
        #[arg(long, default_value_t = 0)]
        total_guests: u32,
        /// Emit the raw JSON result instead of the card view.
        #[arg(long)]
        json: bool,
    },
    /// Ask a free-text compliance question against the ingested guidelines.
    Query {
        /// The question, e.g. "Can the K Fund pay for reception flowers?".
        question: String,
        /// Emit the raw JSON answer instead of the card view.
        #[arg(long)]
        json: bool,
    },
    /// Classify every line item of an event described in a JSON file.
    Batch {
        /// Event file: `{event_name, foreign_guests, total_guests, line_items}`.
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Report index connectivity and chunk count.
    Status,
}

/// On-disk shape of a batch event file.
#[derive(Deserialize)]
struct EventFile {
    event_name: String,
    #[serde(default)]
    foreign_guests: u32,
    #[serde(default)]
    total_guests: u32,
    line_items: Vec<LineItem>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let index = ChromaIndex::new(cli.index_url, cli.collection);

    match cli.command {
        Command::Ingest {
            dir,
            chunk_size,
            overlap,
        } => {
            let embedder = OpenAiEmbedder::from_env()?;
            let stats = ingest::run(&dir, &embedder, &index, chunk_size, overlap).await?;
            println!(
                "Ingested {} chunks from {} regulation files",
                stats.chunks, stats.files
            );
        }
        Command::Classify {
            item,
            cost,
            foreign_guests,
            total_guests,
            json,
        } => {
            let engine = build_engine(index)?;
            let line_item = LineItem {
                item,
                cost,
                foreign_guests,
                total_guests,
            };
            let result = engine.classify_item(&line_item).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                display::print_result(&result);
            }
        }
        Command::Query { question, json } => {
            let engine = build_engine(index)?;
            let answer = engine.answer_question(&question).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                display::print_answer(&answer);
            }
        }
        Command::Batch { file, json } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading event file {}", file.display()))?;
            let event: EventFile = serde_json::from_str(&raw)
                .with_context(|| format!("parsing event file {}", file.display()))?;

            let engine = build_engine(index)?;
            let report = engine
                .classify_batch(
                    EventRequest {
                        event_name: event.event_name,
                        foreign_guests: event.foreign_guests,
                        total_guests: event.total_guests,
                        line_items: event.line_items,
                    },
                    None,
                )
                .await;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                display::print_report(&report);
            }
        }
        Command::Status => {
            if index.collection_exists().await? {
                let count = index.count().await?;
                println!("index: ok ({count} chunks)");
            } else {
                println!("index: reachable, collection missing (run `kfund ingest`)");
            }
        }
    }

    Ok(())
}

fn build_engine(index: ChromaIndex) -> anyhow::Result<ClassificationEngine> {
    let embedder = OpenAiEmbedder::from_env()?;
    let reasoner = OpenAiReasoner::from_env()?;
    Ok(ClassificationEngine::new(
        Arc::new(embedder),
        Arc::new(index),
        Arc::new(reasoner),
        EngineConfig::default(),
    ))
}
