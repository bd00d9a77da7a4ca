use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use stagelink_gcode::{ParsedLine, Value};
use stagelink_wire::Payload;

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

pub fn print_parsed_line(parsed: &ParsedLine, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(parsed).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COMMAND", "SYMBOL", "VALUE"]);
            for (command, assignments) in parsed.iter() {
                if assignments.is_empty() {
                    table.add_row(vec![command.to_string(), String::new(), String::new()]);
                }
                for (symbol, value) in assignments {
                    table.add_row(vec![
                        command.to_string(),
                        symbol.to_string(),
                        value_text(value),
                    ]);
                }
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (command, assignments) in parsed.iter() {
                let rendered: Vec<String> = assignments
                    .iter()
                    .map(|(symbol, value)| format!("{symbol}={}", value_text(value)))
                    .collect();
                println!("{command} {}", rendered.join(" "));
            }
        }
    }
}

#[derive(Serialize)]
struct BatchOutput<'a> {
    payloads: &'a [Payload],
}

pub fn print_batch(batch: &[Payload], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = BatchOutput { payloads: batch };
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
                .set_header(vec!["KIND", "DETAIL"]);
            for payload in batch {
                let (kind, detail) = payload_summary(payload);
                table.add_row(vec![kind.to_string(), detail]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for payload in batch {
                let (kind, detail) = payload_summary(payload);
                println!("{kind}: {detail}");
            }
        }
    }
}

pub fn payload_summary(payload: &Payload) -> (&'static str, String) {
    match payload {
        Payload::Command(line) => {
            let commands: Vec<String> = line.commands().map(|id| id.to_string()).collect();
            ("command", commands.join(" "))
        }
        Payload::Reply(message) => (
            "reply",
            format!(
                "[{}] {}: {}",
                message.exit_code, message.command_id, message.text
            ),
        ),
        Payload::Text(text) => ("text", text.clone()),
        Payload::Sentinel => ("sentinel", "shutdown requested".to_string()),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Bool(flag) => flag.to_string(),
        Value::Int(number) => number.to_string(),
        Value::Float(number) => number.to_string(),
    }
}
