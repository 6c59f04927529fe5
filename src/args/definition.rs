//! Command-line argument definition and processing.

use std::process::ExitCode;

use clap::Parser;
use langsync::i18n::{FileStorage, HttpDictionarySource, Language, TranslationStore};

/// Store type used by the command-line tool.
pub type CliStore = TranslationStore<FileStorage, HttpDictionarySource>;

/// langsync - inspect and refresh the bilingual site's translation cache
#[derive(Parser, Debug)]
#[command(name = "langsync")]
#[command(version)]
#[command(
    about = "Inspect, refresh and invalidate cached vi/en translation dictionaries",
    long_about = None
)]
pub struct Args {
    /// Language to activate (vi or en); the choice is remembered
    #[arg(short = 'l', long, value_parser = parse_language)]
    pub lang: Option<Language>,

    /// Print the translation for one or more dot-notation keys (e.g. footer.address)
    #[arg(short, long, num_args = 1..)]
    pub get: Vec<String>,

    /// Print the active dictionary as pretty JSON
    #[arg(long)]
    pub dump: bool,

    /// Print the active dictionary as flattened `key = value` lines
    #[arg(long)]
    pub flatten: bool,

    /// Clear cached dictionaries (vi, en or all) and exit
    #[arg(long, value_name = "SCOPE", num_args = 0..=1, default_missing_value = "all")]
    pub clear_cache: Option<String>,

    /// Show cache age and size per language and exit
    #[arg(long)]
    pub cache_status: bool,

    /// Drop the cache and refetch (only --lang if given, otherwise every language)
    #[arg(short, long)]
    pub reload: bool,

    /// Never contact the backend; answer from fallback and cache only
    #[arg(long)]
    pub offline: bool,

    /// Override the backend origin from config.yml
    #[arg(long)]
    pub api_url: Option<String>,

    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Enable verbose output (equivalent to --log-level debug)
    #[arg(short, long)]
    pub verbose: bool,
}

/// What: Parse a `--lang` value.
fn parse_language(value: &str) -> Result<Language, String> {
    value.parse()
}

/// What: Run the action selected by the command-line flags.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
/// - `store`: Store wired to the configured backend and storage file.
/// - `default_language`: Configured default language.
///
/// Output:
/// - Process exit code.
///
/// Details:
/// - `--clear-cache`, `--cache-status` and `--reload` are exclusive actions and return early.
/// - Otherwise the language is activated (refreshing unless `--offline`) and the
///   requested lookups are printed.
pub async fn process_args(args: &Args, store: &CliStore, default_language: Language) -> ExitCode {
    use crate::args::{cache, lookup, reload};

    // Messages printed by early-exit actions follow the user's language too.
    store.select_language(args.lang.unwrap_or_else(|| {
        langsync::i18n::resolve_initial_language(store.cache().storage(), default_language)
    }));

    if let Some(scope) = &args.clear_cache {
        return cache::handle_clear_cache(store, scope);
    }

    if args.cache_status {
        return cache::handle_cache_status(store);
    }

    if args.reload {
        return reload::handle_reload(store, args.lang).await;
    }

    activate(args, store, default_language).await;
    lookup::print_requested(store, &args.get, args.dump, args.flatten)
}

/// What: Activate the requested or resolved language.
///
/// Details:
/// - Online: `--lang` switches (and persists) the language, otherwise the store
///   bootstraps; the refresh is awaited so output reflects the backend.
/// - Offline: the language selected by [`process_args`] stays; nothing is persisted.
async fn activate(args: &Args, store: &CliStore, default_language: Language) {
    if args.offline {
        let language = store.active_language();
        tracing::info!(language = %language, "offline mode, serving fallback and cache only");
        return;
    }

    let refresh = match args.lang {
        Some(language) => store.switch_language(language),
        None => store.bootstrap(default_language),
    };
    match refresh.await {
        Ok(outcome) => tracing::info!(outcome = ?outcome, "refresh finished"),
        Err(e) => tracing::warn!(error = %e, "refresh task did not complete"),
    }
}
