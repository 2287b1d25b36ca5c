use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use triplesh::config::{self, Config};
use triplesh::core::store::{load_nquads_file, MemStore};
use triplesh::core::QuadStore;
use triplesh::repl::{LineReader, Repl};
use triplesh::session::{self, QueryLanguage};

#[derive(Parser)]
#[command(name = "triplesh")]
#[command(about = "Interactive shell for querying and editing a quad store", long_about = None)]
struct Args {
    /// Configuration file (defaults to the per-user config file if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Query language: gremlin, mql or sexp
    #[arg(short, long)]
    lang: Option<String>,

    /// Per-query timeout in seconds for the gremlin language (0 = none)
    #[arg(short, long)]
    timeout: Option<u64>,

    /// N-Quads file to load before the prompt appears
    #[arg(long)]
    load: Option<PathBuf>,
}

impl Args {
    /// Applies command-line overrides on top of the file configuration
    fn apply(self, mut config: Config) -> Config {
        if let Some(lang) = self.lang {
            config.session.language = lang;
        }
        if let Some(timeout) = self.timeout {
            config.session.timeout_secs = timeout;
        }
        if self.load.is_some() {
            config.store.load = self.load;
        }
        config
    }
}

fn init_logging(level: &str) {
    // Logs go to stderr so they never interleave with REPL output.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();

    let config = match config::resolve_config(args.config.as_deref()) {
        Ok(config) => args.apply(config),
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            process::exit(2);
        }
    };

    init_logging(&config.log.level);
    info!("Starting triplesh...");

    let store = Arc::new(MemStore::new());
    if let Some(path) = &config.store.load {
        if let Err(e) = load_nquads_file(store.as_ref(), path) {
            eprintln!("Failed to load {}: {}", path.display(), e);
            process::exit(2);
        }
    }

    let language = QueryLanguage::from_name(&config.session.language);
    info!("Using query language {}", language);
    let store: Arc<dyn QuadStore> = store;
    let session = session::open(language, store.clone(), &config.session);

    let stdin = io::stdin();
    let mut repl = Repl::new(LineReader::new(stdin.lock()), io::stdout(), session, store);
    if let Err(e) = repl.run() {
        error!("REPL aborted: {}", e);
        eprintln!("Fatal: {}", e);
        process::exit(1);
    }
}
