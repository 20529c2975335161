//! `$NAME` / `${NAME}` / `~` expansion against the session environment.

use crate::env::Environment;

/// Substitute variable references in `line` with values from `env`.
///
/// Runs before tokenization, so substituted values may themselves contain
/// quotes or whitespace. Unset variables expand to the empty string; a
/// leading `~` expands to the session's `HOME` when it is set.
pub fn expand(line: &str, env: &Environment) -> String {
    shellexpand::full_with_context_no_errors(
        line,
        || env.get("HOME"),
        |name| Some(env.get(name).unwrap_or_default()),
    )
    .into_owned()
}
