//! End-to-end behavior of the pipe channel: handshake liveness, ordered
//! delivery, sentinel handling, and disconnection propagation.

use std::thread;
use std::time::Duration;

use stagelink_channel::{Channel, ChannelConfig, ChannelError, PipeChannel};
use stagelink_gcode::parse_line;
use stagelink_wire::{Message, Payload};

fn ready_pair() -> (PipeChannel, PipeChannel) {
    let (mut initiator, mut responder) = PipeChannel::pair().expect("pair should connect");
    let joined = thread::spawn(move || {
        initiator.handshake().expect("initiator handshake");
        initiator
    });
    responder.handshake().expect("responder handshake");
    (joined.join().expect("initiator thread"), responder)
}

fn poll_receive(channel: &mut PipeChannel) -> Vec<Payload> {
    for _ in 0..50 {
        if let Some(batch) = channel.receive().expect("receive should not fail") {
            return batch;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("no batch arrived within the polling budget");
}

#[test]
fn handshake_completes_on_both_ends() {
    let (initiator, responder) = ready_pair();
    assert!(initiator.handshake_complete());
    assert!(responder.handshake_complete());
}

#[test]
fn handshake_fails_when_peer_never_joins() {
    let config = ChannelConfig {
        handshake_attempts: 3,
        retry_interval: Duration::from_millis(10),
        ..ChannelConfig::default()
    };
    let (mut initiator, _responder) =
        PipeChannel::pair_with_config(config).expect("pair should connect");

    let err = initiator.handshake().expect_err("lone handshake must fail");
    assert!(matches!(err, ChannelError::HandshakeFailed(_)));
}

#[test]
fn command_round_trip_preserves_equality() {
    let (mut initiator, mut responder) = ready_pair();

    let command = Payload::Command(parse_line("G0 X1.5 Y-2 M113 S5").expect("line should parse"));
    initiator.send(&command).expect("send");

    let batch = poll_receive(&mut responder);
    assert_eq!(batch, vec![command]);
}

#[test]
fn reply_round_trip_preserves_field_equality() {
    let (mut initiator, mut responder) = ready_pair();

    let reply = Payload::Reply(
        Message::ok("M114", "at position")
            .with_args(vec![serde_json::json!(1.25)])
            .with_kwarg("axis", serde_json::json!("X")),
    );
    responder.send(&reply).expect("send");

    let batch = poll_receive(&mut initiator);
    assert_eq!(batch, vec![reply]);
}

#[test]
fn messages_arrive_in_send_order() {
    let (mut initiator, mut responder) = ready_pair();

    for index in 0..8 {
        initiator
            .send(&Payload::Text(format!("msg-{index}")))
            .expect("send");
    }

    for index in 0..8 {
        let batch = poll_receive(&mut responder);
        assert_eq!(batch, vec![Payload::Text(format!("msg-{index}"))]);
    }
}

#[test]
fn batch_is_one_logical_message() {
    let (mut initiator, mut responder) = ready_pair();

    let payloads = vec![
        Payload::Text("first".into()),
        Payload::Text("second".into()),
        Payload::Text("third".into()),
    ];
    initiator.send_batch(&payloads).expect("send batch");

    let batch = poll_receive(&mut responder);
    assert_eq!(batch, payloads);
}

#[test]
fn message_waiting_tracks_complete_batches() {
    let (mut initiator, mut responder) = ready_pair();

    assert!(!responder.message_waiting().expect("probe"));

    initiator.send(&Payload::Text("queued".into())).expect("send");
    wait_until(|| responder.message_waiting().expect("probe"));

    let _ = responder.receive().expect("receive");
    assert!(!responder.message_waiting().expect("probe"));
}

#[test]
fn sentinel_moves_to_batch_tail_and_closes_receiver() {
    let (mut initiator, mut responder) = ready_pair();

    let reply = Payload::Reply(Message::ok("M112", "stopping"));
    initiator
        .send_batch(&[Payload::Sentinel, reply.clone()])
        .expect("send batch");

    let batch = poll_receive(&mut responder);
    assert_eq!(batch, vec![reply, Payload::Sentinel]);

    // Observing the sentinel closed this end.
    assert!(!responder.is_connected());
    let err = responder.receive().expect_err("closed end must not hang");
    assert!(matches!(err, ChannelError::TransportClosed));
}

#[test]
fn send_sentinel_uses_the_reserved_payload() {
    let (mut initiator, mut responder) = ready_pair();

    initiator.send_sentinel().expect("send sentinel");

    let batch = poll_receive(&mut responder);
    assert_eq!(batch, vec![Payload::Sentinel]);
    assert!(!responder.is_connected());
}

#[test]
fn disconnection_propagates_to_the_peer() {
    let (mut initiator, mut responder) = ready_pair();

    initiator.disconnect().expect("disconnect");

    wait_until(|| !responder.is_connected());
    let err = responder
        .receive()
        .expect_err("receive after peer close must surface an error");
    assert!(matches!(err, ChannelError::TransportClosed));
}

#[test]
fn send_after_peer_close_fails_once_detected() {
    let (mut initiator, mut responder) = ready_pair();

    responder.disconnect().expect("disconnect");

    // The first write may land in the dead socket's buffer; keep sending
    // until the break is detected.
    let mut saw_closed = false;
    for _ in 0..50 {
        match initiator.send(&Payload::Text("into the void".into())) {
            Err(ChannelError::TransportClosed) => {
                saw_closed = true;
                break;
            }
            Ok(()) => thread::sleep(Duration::from_millis(10)),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert!(saw_closed, "broken pipe was never detected");
    assert!(!initiator.is_connected());
}

#[test]
fn buffered_batches_survive_peer_close() {
    let (mut initiator, mut responder) = ready_pair();

    initiator.send(&Payload::Text("parting words".into())).expect("send");
    initiator.disconnect().expect("disconnect");

    let batch = poll_receive(&mut responder);
    assert_eq!(batch, vec![Payload::Text("parting words".into())]);

    let err = responder.receive().expect_err("nothing further buffered");
    assert!(matches!(err, ChannelError::TransportClosed));
}

#[test]
fn feedback_mode_echoes_the_drained_batch() {
    let (mut initiator, mut responder) = ready_pair();

    let payloads = vec![Payload::Text("ack me".into()), Payload::Text("too".into())];
    initiator.send_batch(&payloads).expect("send batch");

    wait_until(|| responder.message_waiting().expect("probe"));
    let received = responder
        .receive_with_feedback()
        .expect("receive")
        .expect("batch should be ready");
    assert_eq!(received, payloads);

    let echoed = poll_receive(&mut initiator);
    assert_eq!(echoed, payloads);
}

fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..50 {
        if condition() {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("condition not reached within the polling budget");
}
