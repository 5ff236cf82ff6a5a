mod cmd;
mod exit;
mod logging;
mod output;

use std::path::PathBuf;

use clap::Parser;
use cuelights_engine::DEFAULT_NUM_CHANNELS;
use cuelights_link::DEFAULT_BAUD_RATE;

use crate::cmd::{Command, Context};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "cuelights", version, about = "Cue light controller CLI")]
struct Cli {
    /// Serial device the controller is attached to.
    #[arg(long, short = 'd', env = "CUELIGHTS_DEVICE", global = true)]
    device: Option<PathBuf>,

    /// Serial line speed.
    #[arg(long, env = "CUELIGHTS_BAUD", default_value_t = DEFAULT_BAUD_RATE, global = true)]
    baud: u32,

    /// Number of channels on the controller (1-10).
    #[arg(
        long,
        env = "CUELIGHTS_CHANNELS",
        default_value_t = DEFAULT_NUM_CHANNELS as u8,
        value_parser = clap::value_parser!(u8).range(1..=10),
        global = true
    )]
    channels: u8,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let ctx = Context {
        device: cli.device,
        baud: cli.baud,
        num_channels: usize::from(cli.channels),
        format: cli.format.unwrap_or_else(OutputFormat::default_for_stdout),
    };

    match cmd::run(cli.command, &ctx) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
