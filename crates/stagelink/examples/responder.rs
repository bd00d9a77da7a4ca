//! Minimal device-side responder — accepts one operator connection and
//! acknowledges every command until the shutdown sentinel arrives.
//!
//! Run with:
//!   cargo run -p stagelink --example responder
//!
//! In another terminal:
//!   cargo run -p stagelink -- send /tmp/stagelink-responder-<pid>/link.sock \
//!     "G0 X1.5 Y-2" --wait

use std::fs;

use stagelink::channel::{Channel, ChannelError, PipeChannel, Role};
use stagelink::transport::PipeListener;
use stagelink::wire::{Message, Payload};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sock_dir = std::env::temp_dir().join(format!("stagelink-responder-{}", std::process::id()));
    fs::create_dir_all(&sock_dir)?;
    let sock_path = sock_dir.join("link.sock");

    let listener = PipeListener::bind(&sock_path)?;
    eprintln!("Listening on {}", sock_path.display());

    let endpoint = listener.accept()?;
    let mut channel = PipeChannel::from_endpoint(endpoint, Role::Responder)?;
    channel.handshake()?;
    eprintln!("Operator connected");

    let poll_interval = channel.config().poll_interval;
    loop {
        let batch = match channel.receive() {
            Ok(Some(batch)) => batch,
            Ok(None) => {
                std::thread::sleep(poll_interval);
                continue;
            }
            Err(ChannelError::TransportClosed) => {
                eprintln!("Operator disconnected");
                break;
            }
            Err(err) => return Err(err.into()),
        };

        // A batch carrying the sentinel already closed this end; only
        // acknowledge batches that keep the channel open.
        if batch.iter().any(Payload::is_sentinel) {
            eprintln!("Shutdown requested");
            break;
        }

        for payload in &batch {
            match payload {
                Payload::Command(line) => {
                    for command in line.commands() {
                        eprintln!("Received {command}");
                        channel.send(&Payload::Reply(Message::ok(command.as_str(), "accepted")))?;
                    }
                }
                other => eprintln!("Received {other:?}"),
            }
        }
    }

    let _ = fs::remove_dir_all(&sock_dir);
    Ok(())
}
