//! Command-line administrative reload.

use std::process::ExitCode;

use langsync::i18n::{Language, RefreshOutcome};

use crate::args::definition::CliStore;

/// What: Handle `--reload` by dropping cached dictionaries and refetching them.
///
/// Inputs:
/// - `store`: Store wired to the backend.
/// - `language`: Only this language when `Some`, every language otherwise.
///
/// Output:
/// - `ExitCode::SUCCESS` when every reload updated its dictionary, failure otherwise.
///
/// Details:
/// - Meant to be run after back-office edits so visitors stop seeing stale text.
pub async fn handle_reload(store: &CliStore, language: Option<Language>) -> ExitCode {
    tracing::info!(language = ?language, "Reload requested from CLI");
    let outcomes = match language {
        Some(lang) => vec![(lang, store.reload(lang).await)],
        None => store.force_reload_all().await,
    };

    let mut all_ok = true;
    for (lang, outcome) in outcomes {
        let key = if outcome == RefreshOutcome::Updated {
            "cli.reload.done"
        } else {
            all_ok = false;
            "cli.reload.failed"
        };
        println!("{}", store.t_with(key, &[("lang", lang.code())]));
    }

    let stats = store.stats();
    tracing::info!(
        refreshes = stats.refreshes,
        updates = stats.updates,
        fetch_failures = stats.fetch_failures,
        storage_failures = stats.storage_failures,
        "reload finished"
    );
    if all_ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
