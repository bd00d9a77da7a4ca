use std::time::{Duration, Instant};

use stagelink_channel::{Channel, PipeChannel};
use stagelink_gcode::parse_line;
use stagelink_wire::Payload;

use crate::cmd::SendArgs;
use crate::exit::{channel_error, gcode_error, CliError, CliResult, SUCCESS, TIMEOUT, USAGE};
use crate::output::{print_batch, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let payload = resolve_payload(&args)?;

    let mut channel = PipeChannel::connect_path(&args.path)
        .map_err(|err| channel_error("connect failed", err))?;
    channel
        .handshake()
        .map_err(|err| channel_error("handshake failed", err))?;

    channel
        .send(&payload)
        .map_err(|err| channel_error("send failed", err))?;

    if args.wait {
        let batch = wait_for_reply(&mut channel, wait_timeout)?;
        print_batch(&batch, format);
    }

    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Payload> {
    if args.sentinel {
        return Ok(Payload::Sentinel);
    }
    let Some(line) = &args.line else {
        return Err(CliError::new(
            USAGE,
            "either a command line or --sentinel is required",
        ));
    };
    let parsed = parse_line(line).map_err(|err| gcode_error("invalid command line", err))?;
    Ok(Payload::Command(parsed))
}

fn wait_for_reply(channel: &mut PipeChannel, timeout: Duration) -> CliResult<Vec<Payload>> {
    let poll_interval = channel.config().poll_interval;
    let deadline = Instant::now() + timeout;

    loop {
        match channel.receive() {
            Ok(Some(batch)) => return Ok(batch),
            Ok(None) => {}
            Err(err) => return Err(channel_error("receive failed", err)),
        }
        if Instant::now() >= deadline {
            return Err(CliError::new(
                TIMEOUT,
                format!("no reply within {timeout:?}"),
            ));
        }
        std::thread::sleep(poll_interval);
    }
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}
