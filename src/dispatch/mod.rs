pub mod context;
pub mod hook;

pub use context::CommandContext;
pub use hook::CommandResolver;

use crate::commands::{BuiltinContext, BuiltinRegistry, echo};
use crate::env::EnvHandle;
use crate::error::ShellError;
use crate::parse::{self, Invocation};
use crate::result::CommandResult;

/// How a command name was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Blank line, or a line that expanded to no words.
    Blank,
    Builtin,
    /// Resolver hook, by registration index.
    Hook(usize),
    NotFound,
}

impl Resolution {
    pub fn label(self) -> String {
        match self {
            Resolution::Blank => "blank".into(),
            Resolution::Builtin => "builtin".into(),
            Resolution::Hook(i) => format!("hook[{i}]"),
            Resolution::NotFound => "not found".into(),
        }
    }
}

/// Turns a line into a [`CommandResult`]: expand, tokenize, resolve.
///
/// Resolution order is fixed: builtins by exact name, then each resolver hook
/// in registration order (first `Some` wins), then the not-found echo.
pub struct Dispatcher {
    builtins: BuiltinRegistry,
    resolvers: Vec<Box<dyn CommandResolver>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            builtins: BuiltinRegistry::standard(),
            resolvers: Vec::new(),
        }
    }

    /// Append a resolver hook. Earlier registrations are tried first.
    pub fn register(&mut self, resolver: Box<dyn CommandResolver>) {
        self.resolvers.push(resolver);
    }

    pub fn builtins(&self) -> &BuiltinRegistry {
        &self.builtins
    }

    pub fn resolver_count(&self) -> usize {
        self.resolvers.len()
    }

    /// Dispatch one raw input line.
    ///
    /// Only malformed quoting is an error; an unknown command renders as
    /// `No command "<name>" found`.
    pub fn dispatch(&self, line: &str, env: &EnvHandle) -> Result<CommandResult, ShellError> {
        let (result, resolution) = self.dispatch_line(line, env)?;
        let line_truncated: String = line.chars().take(200).collect();
        log::info!(
            target: "shellpipe::dispatch",
            "{line_truncated}\t{}",
            resolution.label()
        );
        Ok(result)
    }

    fn dispatch_line(
        &self,
        line: &str,
        env: &EnvHandle,
    ) -> Result<(CommandResult, Resolution), ShellError> {
        if line.trim().is_empty() {
            return Ok((echo::silent(), Resolution::Blank));
        }

        let expanded = env.with(|vars| parse::expand(line, vars));
        let words = parse::tokenize(&expanded)?;
        let Some(Invocation { name, args }) = Invocation::from_words(words) else {
            return Ok((echo::silent(), Resolution::Blank));
        };

        Ok(self.resolve_with(&name, args, env))
    }

    /// Resolve an already split command through builtins, hooks and the
    /// not-found fallback.
    pub fn resolve(&self, name: &str, args: Vec<String>, env: &EnvHandle) -> CommandResult {
        self.resolve_with(name, args, env).0
    }

    fn resolve_with(
        &self,
        name: &str,
        args: Vec<String>,
        env: &EnvHandle,
    ) -> (CommandResult, Resolution) {
        if let Some(builtin) = self.builtins.get(name) {
            let ctx = BuiltinContext {
                env,
                dispatcher: self,
            };
            return (builtin.invoke(args, &ctx), Resolution::Builtin);
        }

        let ctx = CommandContext::new(env.clone());
        for (i, resolver) in self.resolvers.iter().enumerate() {
            if let Some(result) = resolver.resolve(name, &args, &ctx) {
                return (result, Resolution::Hook(i));
            }
        }

        (echo::not_found(name), Resolution::NotFound)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
