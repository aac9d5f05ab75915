//! # Operator Console
//!
//! Reads commands from stdin, one per line, while the pipeline runs.

use crate::commands::{Command, Emitter};
use shared_bus::Shutdown;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

pub const HELP: &str = "commands: block --author A --recipient R | unblock --author A --recipient R | deny --word W | permit --word W";

/// Run the console on the process stdin.
pub async fn run_stdin(emitter: Emitter, shutdown: Shutdown) {
    run_console(BufReader::new(tokio::io::stdin()), emitter, shutdown).await;
}

/// Handle lines from `input` until EOF or shutdown. Returns the number of
/// commands published.
pub async fn run_console<R>(input: R, emitter: Emitter, mut shutdown: Shutdown) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut published = 0;
    info!("{HELP}");

    loop {
        let line = tokio::select! {
            biased;
            () = shutdown.wait() => break,
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Console input failed");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "help" {
            info!("{HELP}");
            continue;
        }

        let outcome = match Command::parse_line(line) {
            Ok(command) => emitter.emit(&command).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(_) => published += 1,
            Err(e) => warn!(input = line, "Command rejected: {e}"),
        }
    }
    published
}
