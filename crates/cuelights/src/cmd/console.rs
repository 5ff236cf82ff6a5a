use std::io::{self, BufRead};
use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use cuelights_frame::{Status, StatusRegistry};
use tracing::debug;

use crate::cmd::session::{install_ctrlc_handler, Session};
use crate::cmd::{channel_index, resolve_status, ConsoleArgs, Context};
use crate::exit::{engine_error, CliError, CliResult, INTERNAL, SUCCESS};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

const HELP: &str = "\
commands:
  <channel> <status>      set one channel (e.g. `2 standby`)
  set <channel> <status>  same as above
  all <status>            set every channel
  show                    print the board
  statuses                list statuses
  help                    this text
  quit                    leave the console";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsoleCommand {
    Set { channel: u8, status: u8 },
    All { status: u8 },
    Show,
    Statuses,
    Help,
    Quit,
}

pub fn run(_args: ConsoleArgs, ctx: &Context) -> CliResult<i32> {
    let running = install_ctrlc_handler()?;
    let session = Session::start(ctx, false)?;
    let registry = ctx.registry();

    let (lines_tx, lines_rx) = mpsc::channel::<String>();
    thread::Builder::new()
        .name("cuelights-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if lines_tx.send(line).is_err() {
                    break;
                }
            }
        })
        .map_err(|err| CliError::new(INTERNAL, format!("cannot read stdin: {err}")))?;

    eprintln!("{HELP}");
    session.print_board(ctx.format);

    while running.load(Ordering::SeqCst) && session.lost().is_none() {
        let line = match lines_rx.recv_timeout(POLL_INTERVAL) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let command = match parse_command(&line, &registry, ctx.num_channels) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };
        debug!(?command, "console command");

        let result = match command {
            ConsoleCommand::Set { channel, status } => {
                session.engine.write_status(channel, status)
            }
            ConsoleCommand::All { status } => session.engine.write_status_all(status),
            ConsoleCommand::Show => {
                session.print_board(ctx.format);
                Ok(())
            }
            ConsoleCommand::Statuses => {
                crate::output::print_statuses(&registry, ctx.format);
                Ok(())
            }
            ConsoleCommand::Help => {
                eprintln!("{HELP}");
                Ok(())
            }
            ConsoleCommand::Quit => break,
        };
        if let Err(err) = result {
            eprintln!("{}", engine_error("write failed", err));
        }
    }

    session.finish()?;
    Ok(SUCCESS)
}

/// Parse one line of operator input. Blank lines yield `None`.
fn parse_command(
    line: &str,
    registry: &StatusRegistry,
    num_channels: usize,
) -> Result<Option<ConsoleCommand>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let command = match words.as_slice() {
        [] => return Ok(None),
        ["quit" | "exit" | "q"] => ConsoleCommand::Quit,
        ["show" | "board"] => ConsoleCommand::Show,
        ["statuses"] => ConsoleCommand::Statuses,
        ["help" | "?"] => ConsoleCommand::Help,
        ["all", status] => {
            let status = settable(registry, status)?;
            ConsoleCommand::All {
                status: status.code(),
            }
        }
        ["set", channel, status] | [channel, status] => {
            let number: u8 = channel
                .parse()
                .map_err(|_| format!("not a channel number: {channel}"))?;
            let channel = channel_index(number, num_channels).map_err(|e| e.message)?;
            let status = settable(registry, status)?;
            ConsoleCommand::Set {
                channel,
                status: status.code(),
            }
        }
        _ => return Err(format!("unrecognised command: {} (try `help`)", line.trim())),
    };
    Ok(Some(command))
}

fn settable<'a>(registry: &'a StatusRegistry, name: &str) -> Result<&'a Status, String> {
    let status = resolve_status(registry, name).map_err(|e| e.message)?;
    if !status.is_settable() {
        return Err(format!("{} is reported by the controller, not sent", status.label()));
    }
    Ok(status)
}
