use std::path::{Path, PathBuf};
use std::process::Stdio;

use futures::StreamExt;
use tokio::process::Command;
use tokio_util::io::ReaderStream;

use crate::dispatch::{CommandContext, CommandResolver};
use crate::result::{CommandResult, DuplexResult, ResultStdin};

/// Resolver hook that runs programs found on the session `PATH`.
///
/// The child gets the session environment (and nothing else) and `PWD` as
/// its working directory. Its stdout and stderr are merged into the output
/// side of a duplex result whose close signal fires when the child exits.
pub struct ProcessResolver;

impl CommandResolver for ProcessResolver {
    fn resolve(&self, name: &str, args: &[String], ctx: &CommandContext) -> Option<CommandResult> {
        let program = find_program(name, ctx.var("PATH").as_deref())?;

        let mut command = Command::new(&program);
        command
            .args(args)
            .env_clear()
            .envs(ctx.env.snapshot().iter())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &ctx.cwd {
            command.current_dir(cwd);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                log::warn!("failed to spawn {}: {e}", program.display());
                return None;
            }
        };

        let stdin = child.stdin.take().map(|s| Box::new(s) as ResultStdin);
        let stdout = child.stdout.take().map(ReaderStream::new);
        let stderr = child.stderr.take().map(ReaderStream::new);
        let output = futures::stream::select(
            futures::stream::iter(stdout).flatten(),
            futures::stream::iter(stderr).flatten(),
        )
        .filter_map(|chunk| async move {
            chunk
                .inspect_err(|e| log::warn!("reading child output: {e}"))
                .ok()
        });

        let closed = async move {
            match child.wait().await {
                Ok(status) => log::debug!("{} exited: {status}", program.display()),
                Err(e) => log::warn!("waiting for {}: {e}", program.display()),
            }
        };

        Some(CommandResult::Duplex(DuplexResult::new(stdin, output, closed)))
    }
}

/// Locate `name` the way a shell would: names containing `/` are used as
/// given, others are searched for in each `PATH` entry.
pub fn find_program(name: &str, path: Option<&str>) -> Option<PathBuf> {
    if name.contains('/') {
        let candidate = PathBuf::from(name);
        return candidate.is_file().then_some(candidate);
    }
    path?
        .split(':')
        .filter(|dir| !dir.is_empty())
        .map(|dir| Path::new(dir).join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::env::{EnvHandle, Environment};

    fn ctx() -> CommandContext {
        let mut env = Environment::new();
        if let Ok(path) = std::env::var("PATH") {
            env.set("PATH", path);
        }
        env.set("GREETING", "hello from env");
        CommandContext::new(EnvHandle::new(env))
    }

    #[test]
    fn find_program_on_path() {
        let found = find_program("sh", Some("/nonexistent:/bin:/usr/bin")).unwrap();
        assert!(found.ends_with("sh"));
    }

    #[test]
    fn find_program_missing() {
        assert_eq!(find_program("definitely-not-a-program-xyz", Some("/bin")), None);
        assert_eq!(find_program("sh", None), None);
    }

    #[test]
    fn find_program_explicit_path() {
        assert!(find_program("/bin/sh", None).is_some());
        assert!(find_program("./no/such/file", None).is_none());
    }

    #[tokio::test]
    async fn runs_child_as_duplex() {
        let result = ProcessResolver
            .resolve("sh", &["-c".into(), "printf '%s' \"$GREETING\"".into()], &ctx())
            .unwrap();
        assert!(matches!(result, CommandResult::Duplex(_)));
        assert_eq!(result.collect_string().await, "hello from env");
    }

    #[tokio::test]
    async fn child_reads_taken_stdin() {
        use tokio::io::AsyncWriteExt;

        let Some(CommandResult::Duplex(mut duplex)) = ProcessResolver.resolve("cat", &[], &ctx())
        else {
            panic!("cat should resolve to a duplex result");
        };
        let mut stdin = duplex.take_stdin().unwrap();
        assert!(duplex.take_stdin().is_none());
        stdin.write_all(b"ping").await.unwrap();
        drop(stdin);
        assert_eq!(CommandResult::Duplex(duplex).collect_string().await, "ping");
    }

    #[tokio::test]
    async fn unknown_program_passes() {
        assert!(
            ProcessResolver
                .resolve("definitely-not-a-program-xyz", &[], &ctx())
                .is_none()
        );
    }
}
