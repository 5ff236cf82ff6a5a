use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use cuelights_engine::{Channel, ChannelBoard};
use cuelights_frame::{Status, StatusRegistry};
use cuelights_link::PortInfo;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct UpdateOutput<'a> {
    event: &'static str,
    channel: u8,
    status_code: u8,
    status: &'a str,
    timestamp: String,
}

#[derive(Serialize)]
struct ChannelOutput<'a> {
    channel: u8,
    status_code: u8,
    status: &'a str,
    colour: &'a str,
}

#[derive(Serialize)]
struct StatusOutput<'a> {
    code: u8,
    label: &'a str,
    colour: &'a str,
    settable: bool,
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    kind: &'a str,
    product: Option<&'a str>,
}

#[derive(Serialize)]
struct LinkLostOutput<'a> {
    event: &'static str,
    reason: &'a str,
    timestamp: String,
}

/// A channel just changed status.
///
/// Table output is a single line per update so a live monitor scrolls
/// cleanly; the full board is printed with [`print_board`].
pub fn print_update(channel: &Channel, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = UpdateOutput {
                event: "status",
                channel: channel.number(),
                status_code: channel.status().code(),
                status: channel.status().label(),
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!(
                "channel {} -> {} ({})",
                channel.number(),
                channel.status().label(),
                channel.status().colour()
            );
        }
    }
}

pub fn print_board(board: &ChannelBoard, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let channels: Vec<ChannelOutput<'_>> = board
                .iter()
                .map(|channel| ChannelOutput {
                    channel: channel.number(),
                    status_code: channel.status().code(),
                    status: channel.status().label(),
                    colour: channel.status().colour(),
                })
                .collect();
            print_json(&channels);
        }
        OutputFormat::Table => {
            let mut table = table(vec!["CHANNEL", "STATUS"]);
            for channel in board.iter() {
                table.add_row(vec![
                    Cell::new(channel.number()),
                    status_cell(channel.status()),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let line: Vec<String> = board
                .iter()
                .map(|channel| format!("{}:{}", channel.number(), channel.status().label()))
                .collect();
            println!("{}", line.join("  "));
        }
    }
}

pub fn print_statuses(registry: &StatusRegistry, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let statuses: Vec<StatusOutput<'_>> = registry
                .all_statuses()
                .iter()
                .map(|status| StatusOutput {
                    code: status.code(),
                    label: status.label(),
                    colour: status.colour(),
                    settable: status.is_settable(),
                })
                .collect();
            print_json(&statuses);
        }
        OutputFormat::Table => {
            let mut table = table(vec!["CODE", "STATUS", "COLOUR", "OPERATOR"]);
            for status in registry.all_statuses() {
                table.add_row(vec![
                    Cell::new(status.code()),
                    status_cell(status),
                    Cell::new(status.colour()),
                    Cell::new(if status.is_settable() { "send" } else { "report only" }),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for status in registry.all_statuses() {
                println!("{} {} ({})", status.code(), status.label(), status.colour());
            }
        }
    }
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<PortOutput<'_>> = ports
                .iter()
                .map(|port| PortOutput {
                    name: &port.name,
                    kind: port.kind,
                    product: port.product.as_deref(),
                })
                .collect();
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = table(vec!["PORT", "TYPE", "PRODUCT"]);
            for port in ports {
                table.add_row(vec![
                    port.name.clone(),
                    port.kind.to_string(),
                    port.product.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for port in ports {
                match &port.product {
                    Some(product) => println!("{} ({}, {product})", port.name, port.kind),
                    None => println!("{} ({})", port.name, port.kind),
                }
            }
        }
    }
}

pub fn print_link_lost(reason: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&LinkLostOutput {
            event: "link_lost",
            reason,
            timestamp: now_unix_seconds(),
        }),
        OutputFormat::Table | OutputFormat::Pretty => println!("link lost: {reason}"),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn status_cell(status: &Status) -> Cell {
    let cell = Cell::new(status.label());
    match colour(status.colour()) {
        Some(colour) => cell.fg(colour),
        None => cell,
    }
}

fn colour(name: &str) -> Option<Color> {
    match name.to_ascii_lowercase().as_str() {
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "amber" | "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "white" => Some(Color::White),
        _ => None,
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
