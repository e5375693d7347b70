use clap::{Parser, Subcommand};
use rag_chat::Result;
use rag_chat::commands::{AskOptions, ask, clear_store, index_files, list_sources};
use rag_chat::config::{run_interactive_config, show_config};
use rag_chat::retrieval::ResponseMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rag-chat")]
#[command(about = "Chat with your documents using retrieval-augmented generation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama, the language model and web search
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Index text or markdown files into the vector store
    Index {
        /// Files to index
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Ask a question about the indexed documents
    Ask {
        /// The question to answer
        query: String,
        /// Also summarize live web search results
        #[arg(long)]
        web: bool,
        /// Number of chunks to retrieve, overriding the configured value
        #[arg(long)]
        top_k: Option<usize>,
        /// Answer style
        #[arg(long, value_enum, default_value_t = ResponseMode::Concise)]
        mode: ResponseMode,
        /// Sampling temperature, overriding the configured value
        #[arg(long)]
        temperature: Option<f32>,
    },
    /// List indexed sources and their chunk counts
    Sources,
    /// Delete every indexed chunk
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Index { paths } => {
            index_files(&paths).await?;
        }
        Commands::Ask {
            query,
            web,
            top_k,
            mode,
            temperature,
        } => {
            let options = AskOptions {
                use_web: web,
                top_k,
                mode,
                temperature,
            };
            ask(&query, options).await?;
        }
        Commands::Sources => {
            list_sources().await?;
        }
        Commands::Clear { yes } => {
            clear_store(yes).await?;
        }
    }

    Ok(())
}
