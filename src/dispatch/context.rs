use crate::env::{CWD_VAR, EnvHandle};

/// Context handed to resolver hooks alongside the command name and arguments.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// The session environment, shared with the dispatcher.
    pub env: EnvHandle,
    /// `PWD` at the time of dispatch.
    pub cwd: Option<String>,
}

impl CommandContext {
    pub fn new(env: EnvHandle) -> Self {
        let cwd = env.get(CWD_VAR);
        Self { env, cwd }
    }

    /// Read a session variable.
    pub fn var(&self, key: &str) -> Option<String> {
        self.env.get(key)
    }
}
