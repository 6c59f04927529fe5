//! Command-line cache management functionality.

use std::process::ExitCode;

use langsync::i18n::{CacheScope, Language};

use crate::args::definition::CliStore;

/// What: Parse a `--clear-cache` scope.
///
/// Output:
/// - `Some(CacheScope)` for `all`, `vi` or `en`; `None` otherwise
fn parse_scope(scope: &str) -> Option<CacheScope> {
    if scope.trim().eq_ignore_ascii_case("all") {
        return Some(CacheScope::All);
    }
    Language::from_tag(scope).map(CacheScope::Language)
}

/// What: Handle `--clear-cache` by removing cached dictionaries.
///
/// Inputs:
/// - `store`: Store whose cache is cleared.
/// - `scope`: `all`, `vi` or `en`.
///
/// Output:
/// - `ExitCode::SUCCESS`, or failure for an unknown scope.
///
/// Details:
/// - `all` also forgets the remembered language choice.
/// - Prints the number of cleared storage keys.
pub fn handle_clear_cache(store: &CliStore, scope: &str) -> ExitCode {
    tracing::info!(scope, "Clear cache requested from CLI");
    let Some(parsed) = parse_scope(scope) else {
        eprintln!("unknown cache scope '{scope}'. Expected one of: vi, en, all");
        return ExitCode::FAILURE;
    };

    let cleared = store.clear_cache(parsed);
    if cleared > 0 {
        let count = cleared.to_string();
        println!(
            "{}",
            store.t_with("cli.cache.cleared", &[("count", count.as_str())])
        );
    } else {
        println!("{}", store.t("cli.cache.none_found"));
    }
    ExitCode::SUCCESS
}

/// What: Handle `--cache-status` by describing every language's cache entry.
///
/// Output:
/// - Always `ExitCode::SUCCESS`.
pub fn handle_cache_status(store: &CliStore) -> ExitCode {
    for language in Language::ALL {
        let status = store.cache().status(language);
        let age = status.age_minutes.unwrap_or_default().to_string();
        let keys = status.key_count.unwrap_or_default().to_string();
        let state = if !status.exists {
            store.t("cli.cache.missing")
        } else if let Some(error) = &status.error {
            store.t_with("cli.cache.corrupt", &[("error", error.as_str())])
        } else if status.fresh {
            store.t_with("cli.cache.fresh", &[("age", age.as_str()), ("keys", keys.as_str())])
        } else {
            store.t_with("cli.cache.stale", &[("age", age.as_str()), ("keys", keys.as_str())])
        };
        println!(
            "{}",
            store.t_with(
                "cli.cache.status_line",
                &[("lang", language.code()), ("state", state.as_str())]
            )
        );
        if let Some(saved_at) = &status.saved_at {
            tracing::debug!(language = %language, saved_at = %saved_at, "cache entry timestamp");
        }
    }
    ExitCode::SUCCESS
}
