use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use cuelights_engine::{CueEngine, EngineConfig};
use cuelights_frame::{Status, StatusRegistry};
use cuelights_link::{LinkConfig, SerialLink};

use crate::exit::{engine_error, CliError, CliResult};
use crate::output::OutputFormat;

pub mod all;
pub mod console;
pub mod monitor;
pub mod ports;
pub mod session;
pub mod set;
pub mod statuses;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print status reports from the controller as they arrive.
    Monitor(MonitorArgs),
    /// Interactive operator console: type commands, watch reports.
    Console(ConsoleArgs),
    /// Set one channel's status.
    Set(SetArgs),
    /// Set every channel to the same status.
    All(AllArgs),
    /// List the statuses the controller understands.
    Statuses,
    /// List serial ports on this machine.
    Ports,
    /// Show version information.
    Version(VersionArgs),
}

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Context {
    pub device: Option<PathBuf>,
    pub baud: u32,
    pub num_channels: usize,
    pub format: OutputFormat,
}

impl Context {
    pub fn registry(&self) -> Arc<StatusRegistry> {
        Arc::new(StatusRegistry::default())
    }

    pub fn link_config(&self) -> CliResult<LinkConfig> {
        let device = self.device.as_ref().ok_or_else(|| {
            CliError::usage("no device given (use --device or CUELIGHTS_DEVICE)")
        })?;
        Ok(LinkConfig::new(device).with_baud_rate(self.baud))
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            num_channels: self.num_channels,
            registry: self.registry(),
        }
    }

    /// Open the device; failure here is reported once and ends the command.
    pub fn open_engine(&self) -> CliResult<CueEngine<SerialLink, SerialLink>> {
        let link = self.link_config()?;
        CueEngine::open(&link, self.engine_config())
            .map_err(|err| engine_error("cannot open controller", err))
    }
}

pub fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::Monitor(args) => monitor::run(args, ctx),
        Command::Console(args) => console::run(args, ctx),
        Command::Set(args) => set::run(args, ctx),
        Command::All(args) => all::run(args, ctx),
        Command::Statuses => statuses::run(ctx),
        Command::Ports => ports::run(ctx),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Exit after receiving N status reports.
    #[arg(long)]
    pub count: Option<usize>,
    /// Print the whole board after every report.
    #[arg(long)]
    pub board: bool,
}

#[derive(Args, Debug)]
pub struct ConsoleArgs {}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Channel number as printed on the panel (starting at 1).
    pub channel: u8,
    /// Status label (e.g. standby, go) or code.
    pub status: String,
    /// Send a status the controller normally only reports (e.g. ready).
    #[arg(long)]
    pub force: bool,
    /// Wait for the controller to report the new status.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait when --wait is set (e.g. 2s, 500ms).
    #[arg(long, default_value = "2s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct AllArgs {
    /// Status label or code.
    pub status: String,
    /// Send a status the controller normally only reports (e.g. ready).
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Look up a status by label or code.
pub fn resolve_status<'a>(registry: &'a StatusRegistry, name: &str) -> CliResult<&'a Status> {
    registry.find(name).ok_or_else(|| {
        let known: Vec<&str> = registry.all_statuses().iter().map(Status::label).collect();
        CliError::usage(format!(
            "unknown status {name:?} (expected one of: {})",
            known.join(", ")
        ))
    })
}

/// Refuse statuses the controller only reports, unless forced.
pub fn check_settable(status: &Status, force: bool) -> CliResult<()> {
    if status.is_settable() || force {
        return Ok(());
    }
    Err(CliError::usage(format!(
        "{} is reported by the controller, not sent; use --force to send it anyway",
        status.label()
    )))
}

/// Convert an operator's 1-based channel number to a wire index.
pub fn channel_index(number: u8, num_channels: usize) -> CliResult<u8> {
    if number == 0 || usize::from(number) > num_channels {
        return Err(CliError::usage(format!(
            "channel {number} out of range (1-{num_channels})"
        )));
    }
    Ok(number - 1)
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
