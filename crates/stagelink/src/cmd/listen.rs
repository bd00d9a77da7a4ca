use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use stagelink_channel::{Channel, ChannelError, PipeChannel, Role};
use stagelink_transport::PipeListener;
use stagelink_wire::{Message, Payload};

use crate::cmd::ListenArgs;
use crate::exit::{channel_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_batch, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let listener =
        PipeListener::bind(&args.path).map_err(|err| transport_error("bind failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    let running_in_handler = Arc::clone(&running);
    ctrlc::set_handler(move || running_in_handler.store(false, Ordering::SeqCst))
        .map_err(|err| CliError::new(INTERNAL, format!("failed to install signal handler: {err}")))?;

    let endpoint = listener
        .accept()
        .map_err(|err| transport_error("accept failed", err))?;
    let mut channel = PipeChannel::from_endpoint(endpoint, Role::Responder)
        .map_err(|err| channel_error("channel setup failed", err))?;
    channel
        .handshake()
        .map_err(|err| channel_error("handshake failed", err))?;

    let poll_interval = channel.config().poll_interval;
    let mut received = 0usize;

    while running.load(Ordering::SeqCst) {
        let batch = match channel.receive() {
            Ok(Some(batch)) => batch,
            Ok(None) => {
                std::thread::sleep(poll_interval);
                continue;
            }
            Err(ChannelError::TransportClosed) => {
                info!("operator closed the connection");
                break;
            }
            Err(err) => return Err(channel_error("receive failed", err)),
        };

        let shutdown_requested = batch.iter().any(Payload::is_sentinel);
        print_batch(&batch, format);

        if args.ack && !shutdown_requested {
            acknowledge(&mut channel, &batch)?;
        }

        if shutdown_requested {
            info!("shutdown sentinel received");
            break;
        }

        received += 1;
        if args.count.is_some_and(|count| received >= count) {
            break;
        }
    }

    Ok(SUCCESS)
}

/// Reply with one acknowledgement message per received command id.
fn acknowledge(channel: &mut PipeChannel, batch: &[Payload]) -> CliResult<()> {
    let mut replies = Vec::new();
    for payload in batch {
        if let Payload::Command(line) = payload {
            for command in line.commands() {
                replies.push(Payload::Reply(Message::ok(command.as_str(), "accepted")));
            }
        }
    }
    if replies.is_empty() {
        return Ok(());
    }
    channel
        .send_batch(&replies)
        .map_err(|err| channel_error("acknowledgement failed", err))
}
