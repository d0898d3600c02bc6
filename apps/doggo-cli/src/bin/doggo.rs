use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use doggo_core::config::Settings;
use doggo_core::store::ConfigStore;
use doggo_embed::get_default_embedder;
use doggo_search::{format_preview, validate_request, Searcher, DEFAULT_LIMIT};
use doggo_vector::LanceImageIndex;

#[derive(Parser)]
#[command(name = "doggo", version, about = "Semantic search over your indexed images")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the config directory and a default config file
    Init,
    /// Inspect or change the stored configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Find images whose descriptions match a natural-language query
    Search {
        query: String,
        #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the current configuration with the API key masked
    Show,
    /// Store an OpenAI API key
    SetKey { key: String },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load()?;
    let store = settings.config_store();

    match cli.command {
        Command::Init => {
            store.initialize()?;
            println!("✅ Initialized {}", store.get_config_file().display());
        }
        Command::Config { action: ConfigAction::Show } => {
            println!("{}", store.summary()?);
        }
        Command::Config { action: ConfigAction::SetKey { key } } => {
            if !ConfigStore::validate_api_key(&key) {
                anyhow::bail!("Invalid OpenAI API key format.");
            }
            store.create_config_dir()?;
            store.set_api_key(&key)?;
            println!("✅ API key saved to {}", store.get_config_file().display());
        }
        Command::Search { query, limit, json } => run_search(&settings, &store, &query, limit, json)?,
    }
    Ok(())
}

fn run_search(settings: &Settings, store: &ConfigStore, query: &str, limit: usize, json: bool) -> Result<()> {
    validate_request(query, limit)?;
    let db_dir = settings.db_dir();
    debug!(db = %db_dir.display(), collection = %settings.collection, limit, "opening image index");
    let index = LanceImageIndex::open(&db_dir, &settings.collection, settings.embedding_dim)
        .with_context(|| format!("opening image index at {}", db_dir.display()))?;
    let embedder = get_default_embedder(settings)?;
    let searcher = Searcher::new(store, index, embedder).with_model(settings.embedding_model.clone());

    let results = searcher.search_similar_images(query, limit)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }
    if results.is_empty() {
        println!("No matching images for: \"{query}\"");
        return Ok(());
    }
    println!("🔍 Found {} results for: \"{}\"\n", results.len(), query);
    println!("{}", format_preview(&results[0]));
    for (i, result) in results.iter().enumerate().skip(1) {
        let name = result.metadata.get("file_name").and_then(|v| v.as_str()).unwrap_or("Unknown");
        println!("  {}. {}  ({:.1}%)  {}", i + 1, name, f64::from(result.similarity_score) * 100.0, result.description);
    }
    Ok(())
}
