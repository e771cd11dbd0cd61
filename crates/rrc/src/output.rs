use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use rrc_controller::TelemetryStats;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
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
struct ReplyOutput<'a> {
    command: &'a str,
    type_code: u16,
    reply_size: usize,
    reply: String,
    timestamp: String,
}

/// Print the robot's reply to a command.
pub fn print_reply(command: &str, type_code: u16, reply: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ReplyOutput {
                command,
                type_code,
                reply_size: reply.len(),
                reply: payload_preview(reply),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COMMAND", "CODE", "SIZE", "REPLY"])
                .add_row(vec![
                    command.to_string(),
                    type_code.to_string(),
                    reply.len().to_string(),
                    payload_preview(reply),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "command={} ({}) reply_size={} reply={}",
                command,
                type_code,
                reply.len(),
                payload_preview(reply)
            );
        }
        OutputFormat::Raw => print_raw(reply),
    }
}

/// Print one decoded telemetry value.
pub fn print_value(name: &str, value: &serde_json::Value, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => {
            let out = serde_json::json!({ "type": name, "value": value });
            println!("{out}");
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "VALUE"])
                .add_row(vec![name.to_string(), value.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let body = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            println!("{name}:\n{body}");
        }
    }
}

/// One row of a telemetry snapshot.
#[derive(Debug, Serialize)]
pub struct SnapshotRow {
    pub type_code: u16,
    pub name: String,
    pub buffered: usize,
    pub latest: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct SnapshotOutput<'a> {
    timestamp: String,
    stats: TelemetryStats,
    telemetry: &'a [SnapshotRow],
}

/// Print the latest value of every buffered telemetry type.
pub fn print_snapshot(rows: &[SnapshotRow], stats: TelemetryStats, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => {
            let out = SnapshotOutput {
                timestamp: now_unix_seconds(),
                stats,
                telemetry: rows,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CODE", "TYPE", "BUFFERED", "LATEST"]);
            for row in rows {
                table.add_row(vec![
                    row.type_code.to_string(),
                    row.name.clone(),
                    row.buffered.to_string(),
                    row.latest
                        .as_ref()
                        .map_or_else(|| "-".to_string(), |v| v.to_string()),
                ]);
            }
            println!("{table}");
            println!(
                "buffered={} sensor={} rejected={} ignored={} malformed={} decode_failed={}",
                stats.buffered,
                stats.sensor,
                stats.rejected,
                stats.ignored,
                stats.malformed,
                stats.decode_failed
            );
        }
        OutputFormat::Pretty => {
            for row in rows.iter().filter(|row| row.latest.is_some()) {
                let latest = row
                    .latest
                    .as_ref()
                    .map_or_else(String::new, |v| v.to_string());
                println!("{} ({}) x{}: {}", row.name, row.type_code, row.buffered, latest);
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
