//! langsync binary entrypoint kept minimal. The store lives in the library crate.

mod args;

use std::fmt;
use std::process::ExitCode;
use std::sync::OnceLock;

use clap::Parser;
use langsync::config::Config;
use langsync::i18n::{FileStorage, HttpDictionarySource, TranslationCache, TranslationStore};

/// Local-time formatter for log lines.
struct LangsyncTimer;

impl tracing_subscriber::fmt::time::FormatTime for LangsyncTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let ts = chrono::Local::now()
            .format("%Y-%m-%d-T %H:%M:%S")
            .to_string();
        w.write_str(&ts)
    }
}

/// Keeps the non-blocking log writer alive until exit.
static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// What: Build the log filter from `RUST_LOG`, falling back to the CLI level.
fn env_filter(level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
}

/// What: Initialize tracing writing to `<config>/logs/langsync.log`.
///
/// Details:
/// - Falls back to stderr when the log file cannot be opened
fn init_logging(level: &str) {
    let log_path = langsync::paths::logs_dir().join("langsync.log");
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(level))
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_timer(LangsyncTimer)
                .init();
            let _ = LOG_GUARD.set(guard);
            tracing::info!(path = %log_path.display(), "logging initialized");
        }
        Err(e) => {
            // Fallback: stderr logger so the command still runs
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(level))
                .with_target(false)
                .with_ansi(true)
                .with_writer(std::io::stderr)
                .with_timer(LangsyncTimer)
                .init();
            tracing::warn!(error = %e, "failed to open log file; using stderr");
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = args::Args::parse();
    init_logging(&args::determine_log_level(&args));

    let mut config = Config::load();
    if let Some(url) = &args.api_url {
        config.api_base_url.clone_from(url);
    }
    tracing::info!(
        api = %config.api_base_url,
        namespace = %config.namespace,
        ttl_secs = config.cache_ttl_secs,
        "langsync starting"
    );

    let storage = FileStorage::open(config.storage_path());
    let cache = TranslationCache::new(storage).with_ttl(config.cache_ttl());
    let source = match HttpDictionarySource::new(
        &config.api_base_url,
        &config.namespace,
        config.connect_timeout(),
        config.request_timeout(),
    ) {
        Ok(source) => source,
        Err(e) => {
            tracing::error!(error = %e, "failed to build HTTP client");
            eprintln!("langsync: {e}");
            return ExitCode::FAILURE;
        }
    };
    let store = TranslationStore::new(cache, source);

    let code = args::process_args(&args, &store, config.default_language).await;
    tracing::info!("langsync exited");
    code
}
