//! Command-line translation lookup and dictionary output.

use std::process::ExitCode;

use langsync::i18n::translate;

use crate::args::definition::CliStore;

/// What: Print the lookups requested on the command line.
///
/// Inputs:
/// - `store`: Store with the language already activated.
/// - `keys`: Keys passed to `--get`.
/// - `dump`: Print the whole dictionary as pretty JSON.
/// - `flatten`: Print the whole dictionary as `key = value` lines.
///
/// Output:
/// - `ExitCode::SUCCESS`, or failure when the dictionary cannot be serialized.
///
/// Details:
/// - With nothing requested, prints the active language.
/// - Missing keys print the key itself, exactly as a page would render it.
pub fn print_requested(store: &CliStore, keys: &[String], dump: bool, flatten: bool) -> ExitCode {
    let language = store.active_language();
    let dictionary = store.get_active_dictionary(language);

    for key in keys {
        println!("{key} = {}", translate(&dictionary, key));
    }

    if flatten {
        for (key, value) in dictionary.flatten() {
            println!("{key} = {value}");
        }
    }

    if dump {
        match serde_json::to_string_pretty(&*dictionary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize dictionary");
                return ExitCode::FAILURE;
            }
        }
    }

    if keys.is_empty() && !dump && !flatten {
        println!(
            "{}",
            store.t_with("cli.language.active", &[("lang", language.code())])
        );
    }
    ExitCode::SUCCESS
}
