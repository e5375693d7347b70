use anyhow::{Context, Result};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::embeddings::{Embedder, OllamaClient};
use crate::indexer::{Document, Indexer, load_document};
use crate::llm::GroqClient;
use crate::retrieval::{AnswerContext, ResponseMode, Retriever};
use crate::store::VectorStore;
use crate::web::SerpApiClient;

/// Options for a single question
#[derive(Debug, Clone, Copy, Default)]
pub struct AskOptions {
    pub use_web: bool,
    /// Overrides `retrieval.top_k`
    pub top_k: Option<usize>,
    pub mode: ResponseMode,
    /// Overrides `llm.temperature`
    pub temperature: Option<f32>,
}

/// Create the Ollama client and detect the dimension its model produces
async fn connect_embedder(config: &Config) -> Result<OllamaClient> {
    let client =
        OllamaClient::new(&config.ollama).context("Failed to initialize Ollama client")?;

    tokio::task::spawn_blocking(move || client.with_detected_dimension())
        .await
        .context("Embedding dimension detection failed")
}

fn open_configured_store(config: &Config) -> Result<VectorStore> {
    let path = config.vector_database_path();
    VectorStore::open_existing(&path, config.ollama.embedding_dimension as usize)
        .with_context(|| format!("Failed to open vector store at {}", path.display()))
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let bar = if console::user_attended_stderr() {
        let bar = ProgressBar::new_spinner().with_style(
            ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
                .context("Invalid progress template")?,
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    } else {
        ProgressBar::hidden()
    };
    bar.set_message(message.to_string());
    Ok(bar)
}

/// Read text files and index them into the configured vector store
#[inline]
pub async fn index_files(paths: &[PathBuf]) -> Result<()> {
    let config = Config::load_default()?;

    let mut documents: Vec<Document> = Vec::with_capacity(paths.len());
    for path in paths {
        match load_document(path).await {
            Ok(document) => documents.push(document),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                println!("Skipping {}: {}", path.display(), e);
            }
        }
    }

    if documents.is_empty() {
        println!("No readable documents to index.");
        return Ok(());
    }

    let embedder = connect_embedder(&config).await?;
    let mut store = VectorStore::open(config.vector_database_path(), embedder.dimension())
        .context("Failed to open vector store")?;
    let indexer = Indexer::new(
        Arc::new(embedder),
        config.chunking,
        config.indexing.clone(),
    );

    info!("Indexing {} documents", documents.len());
    let bar = spinner(&format!("Indexing {} document(s)", documents.len()))?;
    let result = indexer.index_documents(&documents, &mut store).await;
    bar.finish_and_clear();
    let stats = result?;

    println!("Indexed {} document(s).", stats.documents_indexed);
    println!("  Chunks created: {}", stats.chunks_created);
    println!("  Embeddings stored: {}", stats.embeddings_stored);
    if stats.documents_skipped > 0 {
        println!("  Skipped (already indexed): {}", stats.documents_skipped);
    }
    if stats.chunks_failed > 0 {
        println!("  Chunks that failed to embed: {}", stats.chunks_failed);
    }
    println!("  Total chunks in store: {}", store.len());

    Ok(())
}

/// Answer a question from the indexed documents and, optionally, the live web
#[inline]
pub async fn ask(query: &str, options: AskOptions) -> Result<()> {
    let config = Config::load_default()?;

    let llm = GroqClient::new(&config.llm).context("Failed to initialize language model client")?;
    if !llm.is_configured() {
        anyhow::bail!(
            "No language model API key configured. Set GROQ_API_KEY or run 'rag-chat config'."
        );
    }

    let embedder = connect_embedder(&config).await?;
    let store = VectorStore::open(config.vector_database_path(), embedder.dimension())
        .context("Failed to open vector store")?;
    let mut retriever = Retriever::new(Arc::new(embedder), Arc::new(llm))
        .with_answer_max_tokens(config.llm.max_tokens);

    if options.use_web {
        if config.web_search.enabled {
            let search = SerpApiClient::new(&config.web_search)
                .context("Failed to initialize web search client")?;
            if search.is_configured() {
                retriever =
                    retriever.with_web_search(Arc::new(search), config.web_search.max_results);
            } else {
                warn!("SERPAPI_KEY missing, skipping live web search");
            }
        } else {
            println!("Web search is disabled in the configuration.");
        }
    }

    let top_k = options.top_k.unwrap_or(config.retrieval.top_k);
    let temperature = options.temperature.unwrap_or(config.llm.temperature);

    let bar = spinner("Thinking")?;
    let result = async {
        let context = retriever
            .answer_context(query, &store, top_k, options.use_web)
            .await?;
        let answer = retriever
            .answer(query, options.mode, &context, temperature)
            .await?;
        crate::Result::Ok((context, answer))
    }
    .await;
    bar.finish_and_clear();
    let (context, answer) = result?;

    println!("{}", answer);

    let sources = source_lines(&context);
    if !sources.is_empty() {
        println!();
        println!("Sources:");
        for line in sources {
            println!("  {}", line);
        }
    }

    Ok(())
}

fn source_lines(context: &AnswerContext) -> Vec<String> {
    let mut lines: Vec<String> = context
        .retrieved
        .iter()
        .map(|hit| {
            format!(
                "{} (chunk {}, distance {:.4})",
                hit.chunk_metadata.source, hit.chunk_metadata.chunk_index, hit.distance
            )
        })
        .collect();
    if !context.web_summary.is_empty() {
        lines.push("Live web search".to_string());
    }
    lines
}

/// List indexed sources with their chunk counts
#[inline]
pub async fn list_sources() -> Result<()> {
    let config = Config::load_default()?;
    let store = open_configured_store(&config)?;

    let sources = store.list_sources();
    if sources.is_empty() {
        println!("No documents have been indexed yet.");
        println!("Use 'rag-chat index <file>' to add documents.");
        return Ok(());
    }

    println!("Indexed sources ({} total):", sources.len());
    println!();
    for summary in &sources {
        println!("📄 {} ({} chunks)", summary.source, summary.chunk_count);
    }
    println!();
    println!("Total chunks: {}", store.len());
    println!("Stored at: {}", store.path().display());

    Ok(())
}

/// Remove every indexed chunk and the persisted index files
#[inline]
pub async fn clear_store(skip_confirmation: bool) -> Result<()> {
    let config = Config::load_default()?;
    let mut store = open_configured_store(&config)?;

    if store.is_empty() && !store.has_persisted_state() {
        println!("The vector store is already empty.");
        return Ok(());
    }

    if store.is_empty() {
        println!(
            "The index files in {} could not be loaded and will be removed.",
            store.path().display()
        );
    } else {
        println!(
            "This will delete {} chunks from {} source(s).",
            store.len(),
            store.list_sources().len()
        );
    }

    if !skip_confirmation
        && !Confirm::new()
            .with_prompt("Clear the vector store? This action cannot be undone.")
            .default(false)
            .interact()?
    {
        println!("Nothing was deleted.");
        return Ok(());
    }

    store.clear().context("Failed to clear vector store")?;
    println!("✓ Vector store cleared");

    Ok(())
}
