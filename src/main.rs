//! shellpipe: run an emulated shell session over stdin/stdout.
//!
//! Each stdin line is one command. Output, prompts included, goes to stdout.
//!
//! Flags:
//!   --dump-config   print the merged configuration as TOML and exit
//!   --external      resolve unknown commands as host programs on PATH

use shellpipe::Shell;
use shellpipe::config::Config;
use shellpipe::logging;
use tokio::io::{self, AsyncWriteExt};

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = Config::load();

    if args.iter().any(|a| a == "--dump-config") {
        match toml::to_string_pretty(&config) {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("shellpipe: {e}");
                std::process::exit(1);
            }
        }
        return;
    }
    if args.iter().any(|a| a == "--external") {
        config.external.enabled = true;
    }

    logging::init(&config.logging);

    let mut stream = Shell::from_config(&config).create_stream();
    let session = stream.take_handle();
    let (mut output, mut input) = io::split(stream);

    // The session ends when its output ends, not when stdin does.
    tokio::spawn(async move {
        if io::copy(&mut io::stdin(), &mut input).await.is_ok() {
            let _ = input.shutdown().await;
        }
    });

    let mut stdout = io::stdout();
    let shown = match io::copy(&mut output, &mut stdout).await {
        Ok(_) => stdout.flush().await,
        Err(e) => Err(e),
    };
    if let Err(e) = shown {
        eprintln!("shellpipe: {e}");
        std::process::exit(1);
    }
    if let Some(session) = session
        && let Err(e) = session.join().await
    {
        eprintln!("shellpipe: {e}");
        std::process::exit(1);
    }
    // A pending blocking stdin read would otherwise hold up runtime shutdown.
    std::process::exit(0);
}
