//! The session environment: a string-to-string variable mapping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Variable holding the prompt string.
pub const PROMPT_VAR: &str = "PS1";
/// Prompt used when none is supplied at session creation.
pub const DEFAULT_PROMPT: &str = "$ ";
/// Variable handed to resolvers as the working directory.
pub const CWD_VAR: &str = "PWD";

/// Variables owned by one session.
///
/// Always carries a `PS1` entry after construction unless the host removes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// An environment holding only the default prompt.
    pub fn new() -> Self {
        Self::from_vars(std::iter::empty::<(String, String)>())
    }

    /// Build from initial variables, filling in `PS1` when absent.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        vars.entry(PROMPT_VAR.to_string())
            .or_insert_with(|| DEFAULT_PROMPT.to_string());
        Self { vars }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    /// The current prompt, empty when `PS1` has been removed.
    pub fn prompt(&self) -> &str {
        self.get(PROMPT_VAR).unwrap_or_default()
    }

    pub fn cwd(&self) -> Option<&str> {
        self.get(CWD_VAR)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to a session's [`Environment`].
///
/// Cloned into resolver contexts so hooks can read and mutate the same
/// mapping the dispatcher expands against. The lock is never held across
/// an await point or a resolver call.
#[derive(Debug, Clone, Default)]
pub struct EnvHandle {
    inner: Arc<Mutex<Environment>>,
}

impl EnvHandle {
    pub fn new(env: Environment) -> Self {
        Self {
            inner: Arc::new(Mutex::new(env)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Environment> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).map(String::from)
    }

    pub fn set(&self, key: impl Into<String>, val: impl Into<String>) {
        self.lock().set(key, val);
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.lock().remove(key)
    }

    pub fn prompt(&self) -> String {
        self.lock().prompt().to_string()
    }

    /// Copy of the current variables.
    pub fn snapshot(&self) -> Environment {
        self.lock().clone()
    }

    /// Run `f` with exclusive access to the environment.
    pub fn with<R>(&self, f: impl FnOnce(&mut Environment) -> R) -> R {
        f(&mut self.lock())
    }
}

impl From<Environment> for EnvHandle {
    fn from(env: Environment) -> Self {
        Self::new(env)
    }
}
