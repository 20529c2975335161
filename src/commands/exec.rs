use crate::commands::echo;
use crate::commands::{Builtin, BuiltinContext};
use crate::result::CommandResult;

/// `exec NAME ARGS...`: resolve `NAME` through builtins, hooks and the
/// not-found fallback, reusing the arguments as they were split.
pub struct Exec;

impl Builtin for Exec {
    fn invoke(&self, mut args: Vec<String>, ctx: &BuiltinContext<'_>) -> CommandResult {
        if args.is_empty() {
            return echo::silent();
        }
        let name = args.remove(0);
        ctx.dispatcher.resolve(&name, args, ctx.env)
    }
}
