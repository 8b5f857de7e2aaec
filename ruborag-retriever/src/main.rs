use anyhow::Context;
use clap::{Parser, Subcommand};
use ruborag_context::{Chunking, normalize_file, parsed_output_path};
use ruborag_embed::GeminiProvider;
use ruborag_retriever::{
    RetrieverError,
    config::RetrieverConfig,
    retrieval::{
        ingest::{FileOutcome, IngestConfig, Ingestor},
        search::{DEFAULT_TOP_K, SearchOptions, search, with_content},
        traversal::{collect_inputs, has_eligible_extension},
    },
    storage::{EmbeddingStore, SqliteStore, StoreStats},
};
use serde::Serialize;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Build and query a local embedding index over text documents.
#[derive(Parser, Debug)]
#[command(name = "ruborag", author, version, about, long_about = None)]
struct Args {
    /// Base directory containing the ruborag.db database file
    #[arg(short, long, default_value = ".", global = true)]
    base_dir: PathBuf,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract plain text from HTML files
    Parse {
        /// Write each result to <name>-parsed.txt instead of printing it
        #[arg(short, long)]
        write: bool,
        /// HTML files or directories to walk
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Embed text files
    Embed {
        /// Store embeddings in the database; without this, only report dimensions
        #[arg(short, long)]
        write: bool,
        /// Split documents into fixed-size chunks instead of embedding them whole
        #[arg(long)]
        chunk: bool,
        /// Chunk size in characters (defaults to the configured size)
        #[arg(long, requires = "chunk")]
        chunk_size: Option<NonZeroUsize>,
        /// Text files or directories to walk
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Find the stored chunks most similar to a query
    Search {
        /// Number of results to return
        #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
        /// Minimum similarity score
        #[arg(short, long)]
        threshold: Option<f32>,
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
        /// Query text
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Show database statistics
    Stats,
}

#[derive(Debug, Clone, PartialEq)]
enum OutputFormat {
    Summary,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {s}")),
        }
    }
}

#[derive(Serialize)]
struct SearchResultOutput {
    rank: usize,
    source_id: String,
    chunk_index: i64,
    score: f32,
    content: Option<String>,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = RetrieverConfig::load_or_default(args.config.as_deref())?;
    let db_path = config.db_path(&args.base_dir);

    match args.command {
        Commands::Parse { write, paths } => {
            let html = vec!["html".to_string()];
            let files = collect_inputs(&paths, &html)?;
            let mut failed = 0usize;
            for path in &files {
                if !has_eligible_extension(path, &html) {
                    warn!("Skipping {}: not an .html file", path.display());
                    continue;
                }

                let text = match normalize_file(path) {
                    Ok(text) => text,
                    Err(e) => {
                        eprintln!("{}: failed to parse: {e}", path.display());
                        failed += 1;
                        continue;
                    }
                };
                if write {
                    let output = parsed_output_path(path);
                    if let Err(e) = std::fs::write(&output, &text) {
                        eprintln!("{}: failed to write: {e}", output.display());
                        failed += 1;
                        continue;
                    }
                    println!("wrote {}", output.display());
                } else {
                    println!("{text}");
                }
            }

            if failed > 0 {
                anyhow::bail!("{failed} of {} files failed to parse", files.len());
            }
            Ok(())
        }
        Commands::Embed {
            write,
            chunk,
            chunk_size,
            paths,
        } => {
            let chunking = if chunk {
                Chunking::Enabled {
                    size: chunk_size.map_or(config.chunk_size, NonZeroUsize::get),
                }
            } else {
                Chunking::Disabled
            };
            let ingest_config = IngestConfig::default()
                .with_chunking(chunking)
                .with_persist(write)
                .with_embed_timeout(config.embed_timeout());

            let provider = Arc::new(GeminiProvider::from_env(config.gemini.clone())?);
            let mut ingestor = Ingestor::new(provider, ingest_config);
            if write {
                let store = SqliteStore::open(&db_path)
                    .await
                    .with_context(|| format!("failed to open {}", db_path.display()))?;
                ingestor = ingestor.with_store(Arc::new(store));
            }

            let files = collect_inputs(&paths, &config.eligible_extensions)?;
            let report = ingestor.ingest_files(&files).await?;

            for file in &report.files {
                match &file.outcome {
                    FileOutcome::Completed {
                        embedded,
                        skipped,
                        dimension,
                    } => {
                        let dims = dimension
                            .map(|d| format!(", {d} dimensions"))
                            .unwrap_or_default();
                        if write {
                            println!(
                                "{}: {embedded} stored, {skipped} already embedded{dims}",
                                file.source_id
                            );
                        } else {
                            println!("{}: {embedded} embedded{dims}", file.source_id);
                        }
                    }
                    FileOutcome::Skipped => {
                        println!("{}: already embedded, skipped", file.source_id);
                    }
                    FileOutcome::Failed { error } => {
                        println!("{}: failed: {error}", file.source_id);
                    }
                }
            }

            let failed = report.failures().count();
            if failed > 0 {
                anyhow::bail!("{failed} of {} files failed", report.files.len());
            }
            Ok(())
        }
        Commands::Search {
            top_k,
            threshold,
            format,
            query,
        } => {
            let query = query.join(" ");
            let store = SqliteStore::open_existing(&db_path)
                .await
                .with_context(|| format!("failed to open {}", db_path.display()))?
                .ok_or(RetrieverError::NothingToSearch)?;
            // An empty index is reported without needing a credential.
            if store.stats().await?.records == 0 {
                return Err(RetrieverError::NothingToSearch.into());
            }
            let provider = GeminiProvider::from_env(config.gemini.clone())?;

            let hits = search(
                &provider,
                &store,
                &query,
                SearchOptions { top_k, threshold },
            )
            .await?;
            info!("Found {} results for {:?}", hits.len(), query);

            match format {
                OutputFormat::Json => {
                    let results: Vec<SearchResultOutput> = with_content(&store, hits)
                        .await?
                        .into_iter()
                        .enumerate()
                        .map(|(i, (hit, content))| SearchResultOutput {
                            rank: i + 1,
                            source_id: hit.source_id,
                            chunk_index: hit.chunk_index,
                            score: hit.score,
                            content,
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&results)?);
                }
                OutputFormat::Summary => {
                    println!("Top {} results:", hits.len());
                    for (i, hit) in hits.iter().enumerate() {
                        println!(
                            "{}. {} (chunk {}) — score: {:.4}",
                            i + 1,
                            hit.source_id,
                            hit.chunk_index,
                            hit.score
                        );
                    }
                }
            }
            Ok(())
        }
        Commands::Stats => {
            let store = SqliteStore::open_existing(&db_path)
                .await
                .with_context(|| format!("failed to open {}", db_path.display()))?;
            let stats = match &store {
                Some(store) => store.stats().await?,
                None => StoreStats::default(),
            };

            println!("Database Statistics:");
            match store {
                Some(_) => println!("  Location: {}", db_path.display()),
                None => println!("  Location: {} (not created yet)", db_path.display()),
            }
            println!("  Records: {}", stats.records);
            println!("  Sources: {}", stats.sources);
            match stats.dimension {
                Some(dimension) => println!("  Dimensions: {dimension}"),
                None => println!("  Dimensions: n/a (empty)"),
            }
            Ok(())
        }
    }
}
