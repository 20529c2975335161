//! Builtin commands and the optional external process resolver.
//!
//! Builtins are consulted before any resolver hook. The standard table holds
//! `echo` and `exec`.

/// `echo` with `-n`, `-e` and `-E` flag handling.
pub mod echo;
/// `exec`: resolve a command from already-split arguments.
pub mod exec;
/// Resolver hook that spawns programs found on the session `PATH`.
pub mod external;

use std::collections::HashMap;

use crate::dispatch::Dispatcher;
use crate::env::EnvHandle;
use crate::result::CommandResult;

/// What a builtin may reach besides its arguments.
pub struct BuiltinContext<'a> {
    pub env: &'a EnvHandle,
    pub dispatcher: &'a Dispatcher,
}

/// Trait for commands implemented by the engine itself.
pub trait Builtin: Send + Sync {
    /// Run the builtin with its (already expanded and tokenized) arguments.
    fn invoke(&self, args: Vec<String>, ctx: &BuiltinContext<'_>) -> CommandResult;
}

/// Builtins keyed by exact command name.
pub struct BuiltinRegistry {
    builtins: HashMap<String, Box<dyn Builtin>>,
}

impl BuiltinRegistry {
    /// The standard builtin table.
    pub fn standard() -> Self {
        let mut builtins: HashMap<String, Box<dyn Builtin>> = HashMap::new();
        builtins.insert("echo".into(), Box::new(echo::Echo));
        builtins.insert("exec".into(), Box::new(exec::Exec));
        Self { builtins }
    }

    /// Look up a builtin by exact command name.
    pub fn get(&self, name: &str) -> Option<&dyn Builtin> {
        self.builtins.get(name).map(|b| b.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.builtins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
