use crate::dispatch::CommandContext;
use crate::result::CommandResult;

/// Host-supplied handler for command names no builtin covers.
///
/// Returning `None` passes the command on to the next registered resolver.
pub trait CommandResolver: Send + Sync {
    fn resolve(&self, name: &str, args: &[String], ctx: &CommandContext) -> Option<CommandResult>;
}

impl<F> CommandResolver for F
where
    F: Fn(&str, &[String], &CommandContext) -> Option<CommandResult> + Send + Sync,
{
    fn resolve(&self, name: &str, args: &[String], ctx: &CommandContext) -> Option<CommandResult> {
        self(name, args, ctx)
    }
}
