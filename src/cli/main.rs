use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use zset_search::config::{Config, StoreBackend};
use zset_search::error::{AppError, Result};
use zset_search::search::{metrics, Document, MatchMode, Search, SearchQuery};
use zset_search::state::create_store;

#[derive(Parser)]
#[command(name = "zset-search")]
#[command(about = "Full-text and exact-match search on Redis sorted sets", long_about = None)]
#[command(version)]
struct Cli {
    /// Index namespace (overrides search.namespace)
    #[arg(short, long, env = "ZSET_SEARCH_NAMESPACE")]
    namespace: Option<String>,

    /// Store backend (overrides store.backend).
    ///
    /// `memory` lives only as long as this one invocation, so documents indexed by an
    /// earlier run are not visible to a later `query`. Use `redis` to keep an index
    /// across runs.
    #[arg(short, long, value_enum)]
    backend: Option<Backend>,

    /// Redis connection string (overrides store.redis_url)
    #[arg(long, env = "ZSET_SEARCH_REDIS_URL")]
    redis_url: Option<String>,

    /// Print Prometheus metrics to stderr on exit
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    Memory,
    Redis,
}

impl From<Backend> for StoreBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Memory => StoreBackend::Memory,
            Backend::Redis => StoreBackend::Redis,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Index a document
    Index {
        #[arg(short, long, value_name = "DOC_ID")]
        id: String,

        /// Document as a JSON object, e.g. '{"content": "ruby", "uid": 5}'
        #[arg(short, long)]
        doc: String,
    },

    /// Query the index
    Query {
        /// Query as a JSON object, e.g. '{"content": "ruby", "cid": [2, 4]}'
        #[arg(short, long)]
        json: String,

        /// Match any free-text term instead of all of them
        #[arg(short, long)]
        any: bool,

        /// First rank to return
        #[arg(long, allow_hyphen_values = true)]
        start: Option<isize>,

        /// Last rank to return (-1 = last)
        #[arg(long, allow_hyphen_values = true)]
        stop: Option<isize>,
    },

    /// Remove a document from the index
    Remove {
        #[arg(short, long, value_name = "DOC_ID")]
        id: String,
    },

    /// Count ids ever indexed in the namespace
    Count,
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("zset_search={}", config.observability.log_level))
    });

    // Logs go to stderr; stdout carries command output
    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn parse_json(flag: &str, raw: &str) -> Result<serde_json::Value> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::Validation(format!("{} is not valid JSON: {}", flag, e)))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error [{}]: {}", e.error_code(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(namespace) = cli.namespace {
        config.search.namespace = namespace;
    }
    if let Some(backend) = cli.backend {
        config.store.backend = backend.into();
    }
    if let Some(url) = cli.redis_url {
        config.store.redis_url = Some(url);
    }
    config.search.metrics_enabled = config.observability.metrics_enabled;

    init_tracing(&config);
    if config.observability.metrics_enabled {
        metrics::init_search_metrics();
    }

    if config.store.backend == StoreBackend::Memory {
        tracing::warn!("Using the in-memory store; nothing is kept after this command exits");
    }

    let store = create_store(&config.store).await?;
    let search = Search::with_config(config.search.clone(), store)?;

    match cli.command {
        Commands::Index { id, doc } => {
            let document: Document = serde_json::from_value(parse_json("--doc", &doc)?)
                .map_err(|e| {
                    AppError::Validation(format!(
                        "--doc must map field names to strings, numbers, booleans or lists: {}",
                        e
                    ))
                })?;
            search.index(&document, id.as_str()).await?;
            println!("{}", json!({ "indexed": id }));
        }

        Commands::Query {
            json: raw,
            any,
            start,
            stop,
        } => {
            let value = parse_json("--json", &raw)?;
            let mut query = SearchQuery::from_json(&value, &config.search.text_field)?;
            if any {
                query = query.with_match_mode(MatchMode::Any);
            }

            let ids = search
                .query(
                    &query,
                    start.unwrap_or(config.search.default_start),
                    stop.unwrap_or(config.search.default_stop),
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&ids)?);
        }

        Commands::Remove { id } => {
            search.remove(id.as_str()).await?;
            println!("{}", json!({ "removed": id }));
        }

        Commands::Count => {
            let count = search.count().await?;
            println!("{}", json!({ "namespace": search.namespace(), "count": count }));
        }
    }

    if cli.metrics && config.observability.metrics_enabled {
        eprint!("{}", metrics::gather_metrics());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_malformed_json_is_a_validation_error() {
        let err = parse_json("--doc", "{not json").unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(err.to_string().contains("--doc"));

        assert!(parse_json("--json", r#"{"uid": 5}"#).is_ok());
    }

    #[test]
    fn test_backend_help_warns_memory_is_per_invocation() {
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("lives only as long as this one invocation"));

        let cli = Cli::try_parse_from(["zset-search", "--backend", "redis", "count"]).unwrap();
        assert!(matches!(cli.backend, Some(Backend::Redis)));
    }
}
