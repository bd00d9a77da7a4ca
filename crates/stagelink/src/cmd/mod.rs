use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod listen;
pub mod parse;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse and validate a command line without sending it.
    Parse(ParseArgs),
    /// Send a command line to a listening device process.
    Send(SendArgs),
    /// Accept one operator connection and print received traffic.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Parse(args) => parse::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// The command line, e.g. "G0 X1.5 Y-2".
    pub line: String,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Socket path to connect to.
    pub path: PathBuf,
    /// The command line to send.
    #[arg(conflicts_with = "sentinel")]
    pub line: Option<String>,
    /// Send the shutdown sentinel instead of a command.
    #[arg(long)]
    pub sentinel: bool,
    /// Wait for one reply batch and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the reply when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Socket path to bind.
    pub path: PathBuf,
    /// Acknowledge every received command with a reply message.
    #[arg(long)]
    pub ack: bool,
    /// Exit after receiving N batches.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub struct VersionArgs {}
