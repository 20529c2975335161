//! Sessions: one environment, one dispatcher, one output stream.

pub mod channel;
pub mod engine;

pub use channel::{SessionHandle, ShellStream};
pub use engine::{OutputSink, SessionSettings, SessionState};

use std::time::Duration;

use tokio::io::BufReader;
use tokio::sync::mpsc;

use crate::commands::BuiltinContext;
use crate::commands::external::ProcessResolver;
use crate::config::Config;
use crate::dispatch::{CommandContext, CommandResolver, Dispatcher};
use crate::env::{EnvHandle, Environment, PROMPT_VAR};
use crate::error::ShellError;
use crate::result::CommandResult;

/// An emulated interactive shell.
///
/// Owns the session [`Environment`] and the resolver hooks. Use
/// [`Shell::create_stream`] to drive it over a duplex stream, or
/// [`Shell::dispatch`] to run single lines.
pub struct Shell {
    env: EnvHandle,
    dispatcher: Dispatcher,
    settings: SessionSettings,
}

impl Shell {
    /// A shell with only the default prompt set.
    pub fn new() -> Self {
        Self::with_env(Environment::new())
    }

    pub fn with_env(env: Environment) -> Self {
        Self {
            env: EnvHandle::new(env),
            dispatcher: Dispatcher::new(),
            settings: SessionSettings::default(),
        }
    }

    /// A shell seeded with `vars`; `PS1` defaults to `"$ "`.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::with_env(Environment::from_vars(vars))
    }

    /// Build a shell from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        let mut env = Environment::from_vars(config.env.vars.clone());
        if !config.env.vars.contains_key(PROMPT_VAR) {
            env.set(PROMPT_VAR, config.session.prompt.clone());
        }
        if config.external.enabled
            && config.external.inherit_path
            && env.get("PATH").is_none()
            && let Ok(path) = std::env::var("PATH")
        {
            env.set("PATH", path);
        }

        let mut shell = Self::with_env(env);
        shell.settings = SessionSettings {
            input_buffer: config.session.input_buffer.max(1),
            output_buffer: config.session.output_buffer.max(1),
            drain_timeout: (config.session.drain_timeout_ms > 0)
                .then(|| Duration::from_millis(config.session.drain_timeout_ms)),
        };
        if config.external.enabled {
            shell.add_resolver(ProcessResolver);
        }
        shell
    }

    pub fn env(&self) -> &EnvHandle {
        &self.env
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SessionSettings {
        &mut self.settings
    }

    /// Register a `command` hook. Hooks run in registration order after
    /// builtins; the first to return `Some` handles the command.
    pub fn on_command<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&str, &[String], &CommandContext) -> Option<CommandResult> + Send + Sync + 'static,
    {
        self.dispatcher.register(Box::new(hook));
        self
    }

    /// Register any [`CommandResolver`] as a `command` hook.
    pub fn add_resolver<R>(&mut self, resolver: R) -> &mut Self
    where
        R: CommandResolver + 'static,
    {
        self.dispatcher.register(Box::new(resolver));
        self
    }

    /// Dispatch one line against this shell's environment.
    pub fn dispatch(&self, line: &str) -> Result<CommandResult, ShellError> {
        self.dispatcher.dispatch(line, &self.env)
    }

    /// Invoke a builtin directly by name, bypassing expansion and hooks.
    pub fn builtin(&self, name: &str, args: Vec<String>) -> Option<CommandResult> {
        let builtin = self.dispatcher.builtins().get(name)?;
        let ctx = BuiltinContext {
            env: &self.env,
            dispatcher: &self.dispatcher,
        };
        Some(builtin.invoke(args, &ctx))
    }

    /// Start the session on the current tokio runtime.
    ///
    /// The prompt is queued immediately. Must be called from within a runtime.
    pub fn create_stream(self) -> ShellStream {
        let (host_end, engine_end) = tokio::io::duplex(self.settings.input_buffer.max(1));
        let (tx, rx) = mpsc::channel(self.settings.output_buffer.max(1));
        let task = tokio::spawn(async move {
            let input = BufReader::new(engine_end);
            match engine::run(&self, input, OutputSink::new(tx)).await {
                Err(ShellError::OutputClosed) => {
                    log::debug!("session output dropped by host");
                    Ok(())
                }
                other => other,
            }
        });
        ShellStream::new(host_end, rx, task)
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builtin_direct() {
        let shell = Shell::new();
        let out = shell
            .builtin("echo", vec!["-n".into(), "a".into(), "b".into()])
            .unwrap()
            .collect_string()
            .await;
        assert_eq!(out, "a b");
        assert!(shell.builtin("pwd", Vec::new()).is_none());
    }

    #[test]
    fn from_config_defaults() {
        let shell = Shell::from_config(&Config::default_config());
        assert_eq!(shell.env().prompt(), "$ ");
        assert_eq!(shell.settings(), &SessionSettings::default());
        assert_eq!(shell.dispatcher.resolver_count(), 0);
    }

    #[test]
    fn from_config_prompt_and_vars() {
        let mut config = Config::default_config();
        config.session.prompt = "% ".into();
        config.session.drain_timeout_ms = 250;
        config.env.vars.insert("XYZ".into(), "abc".into());
        let shell = Shell::from_config(&config);
        assert_eq!(shell.env().prompt(), "% ");
        assert_eq!(shell.env().get("XYZ").as_deref(), Some("abc"));
        assert_eq!(shell.settings().drain_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn from_config_vars_prompt_wins() {
        let mut config = Config::default_config();
        config.env.vars.insert("PS1".into(), "# ".into());
        assert_eq!(Shell::from_config(&config).env().prompt(), "# ");
    }

    #[test]
    fn from_config_external() {
        let mut config = Config::default_config();
        config.external.enabled = true;
        let shell = Shell::from_config(&config);
        assert_eq!(shell.dispatcher.resolver_count(), 1);
    }
}
