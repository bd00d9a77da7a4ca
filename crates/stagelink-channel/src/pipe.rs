use std::collections::VecDeque;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use stagelink_transport::{PipeEndpoint, PipeListener};
use stagelink_wire::{
    Drained, ItemReader, ItemWriter, Payload, WireError, WireItem, COUNTER_GREETING, GREETING,
};

use crate::channel::{Channel, HandshakeState, Role};
use crate::config::ChannelConfig;
use crate::error::{ChannelError, Result};

/// The pipe transport: framed payload batches over a full-duplex pipe.
///
/// Owns the handshake state machine and the end-of-message framing. The
/// endpoint runs in non-blocking mode; every receive path drains whatever
/// the socket holds into complete batches and returns without waiting.
pub struct PipeChannel {
    io: Option<PipeIo>,
    path: Option<PathBuf>,
    role: Role,
    state: HandshakeState,
    config: ChannelConfig,
    /// Items of the batch whose end-of-message marker has not arrived yet.
    partial: Vec<Payload>,
    /// Complete batches awaiting a `receive` call.
    ready: VecDeque<Vec<Payload>>,
    peer_closed: bool,
}

struct PipeIo {
    reader: ItemReader<PipeEndpoint>,
    writer: ItemWriter<PipeEndpoint>,
}

impl PipeChannel {
    /// Create a connected channel pair within one process.
    ///
    /// The first end is the handshake initiator, the second the
    /// responder. Pair endpoints cannot be re-established once closed.
    pub fn pair() -> Result<(PipeChannel, PipeChannel)> {
        Self::pair_with_config(ChannelConfig::default())
    }

    /// Create a connected channel pair with explicit configuration.
    pub fn pair_with_config(config: ChannelConfig) -> Result<(PipeChannel, PipeChannel)> {
        let (left, right) = PipeEndpoint::pair()?;
        let initiator = Self::from_parts(left, Role::Initiator, None, config.clone())?;
        let responder = Self::from_parts(right, Role::Responder, None, config)?;
        Ok((initiator, responder))
    }

    /// Connect to a listening device socket as the handshake initiator.
    ///
    /// The path is kept so `connect` can re-dial after a disconnect.
    pub fn connect_path(path: impl AsRef<Path>) -> Result<PipeChannel> {
        Self::connect_path_with_config(path, ChannelConfig::default())
    }

    /// Connect to a listening device socket with explicit configuration.
    pub fn connect_path_with_config(
        path: impl AsRef<Path>,
        config: ChannelConfig,
    ) -> Result<PipeChannel> {
        let path = path.as_ref().to_path_buf();
        let endpoint = PipeListener::connect(&path)?;
        Self::from_parts(endpoint, Role::Initiator, Some(path), config)
    }

    /// Wrap an accepted endpoint, usually on the device side.
    pub fn from_endpoint(endpoint: PipeEndpoint, role: Role) -> Result<PipeChannel> {
        Self::from_parts(endpoint, role, None, ChannelConfig::default())
    }

    /// Wrap an accepted endpoint with explicit configuration.
    pub fn from_endpoint_with_config(
        endpoint: PipeEndpoint,
        role: Role,
        config: ChannelConfig,
    ) -> Result<PipeChannel> {
        Self::from_parts(endpoint, role, None, config)
    }

    fn from_parts(
        endpoint: PipeEndpoint,
        role: Role,
        path: Option<PathBuf>,
        config: ChannelConfig,
    ) -> Result<PipeChannel> {
        let io = PipeIo::new(endpoint, &config)?;
        Ok(PipeChannel {
            io: Some(io),
            path,
            role,
            state: HandshakeState::Uninitialized,
            config,
            partial: Vec::new(),
            ready: VecDeque::new(),
            peer_closed: false,
        })
    }

    /// The channel configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Receive, echoing the drained batch back to the sender first.
    ///
    /// Acknowledgement mode for tests and diagnostics: the peer sees the
    /// exact batch this end drained, in arrival order. A peer that closed
    /// before the echo only costs the echo, not the batch.
    pub fn receive_with_feedback(&mut self) -> Result<Option<Vec<Payload>>> {
        self.receive_inner(true)
    }

    fn receive_inner(&mut self, feedback: bool) -> Result<Option<Vec<Payload>>> {
        self.ensure_ready()?;
        self.pump()?;

        let Some(mut batch) = self.ready.pop_front() else {
            if self.io.is_none() {
                return Err(ChannelError::TransportClosed);
            }
            return Ok(None);
        };

        if feedback {
            match self.raw_send_batch(&batch) {
                Ok(()) => {}
                Err(ChannelError::TransportClosed) => {
                    debug!("feedback echo dropped; peer already gone")
                }
                Err(err) => return Err(err),
            }
        }

        if let Some(position) = batch.iter().position(Payload::is_sentinel) {
            let sentinel = batch.remove(position);
            batch.push(sentinel);
            info!("sentinel received; closing pipe end");
            self.close_io();
        }

        Ok(Some(batch))
    }

    /// Drain the socket into complete batches without blocking.
    fn pump(&mut self) -> Result<()> {
        let drained = match self.io.as_mut() {
            None => return Ok(()),
            Some(io) => io.reader.drain_available(),
        };

        match drained {
            Ok(Drained { items, closed }) => {
                for item in items {
                    match item {
                        WireItem::Payload(payload) => self.partial.push(payload),
                        WireItem::EndOfMessage => {
                            self.ready.push_back(std::mem::take(&mut self.partial));
                        }
                    }
                }
                if closed {
                    debug!("peer closed the pipe");
                    self.peer_closed = true;
                    self.close_io();
                }
                Ok(())
            }
            Err(WireError::Io(err)) if is_disconnect(err.kind()) => {
                debug!(error = %err, "pipe broke while draining");
                self.peer_closed = true;
                self.close_io();
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Frame `payloads` as one logical message and push it out, retrying
    /// a stalled stream within the configured budget.
    fn raw_send_batch(&mut self, payloads: &[Payload]) -> Result<()> {
        {
            let io = self.io.as_mut().ok_or(ChannelError::NotConnected)?;
            for payload in payloads {
                io.writer.queue(&WireItem::Payload(payload.clone()))?;
            }
            io.writer.queue(&WireItem::EndOfMessage)?;
        }

        let mut attempts = 0u32;
        let result = loop {
            let Some(io) = self.io.as_mut() else {
                break Err(ChannelError::NotConnected);
            };
            match io.writer.flush_pending() {
                Ok(()) => break Ok(()),
                Err(WireError::Io(err)) if err.kind() == ErrorKind::WouldBlock => {
                    attempts += 1;
                    if attempts >= self.config.send_retry_attempts {
                        warn!(attempts, "send stalled past retry budget");
                        break Err(ChannelError::SendTimeout(
                            self.config.retry_interval * self.config.send_retry_attempts,
                        ));
                    }
                    std::thread::sleep(self.config.retry_interval);
                }
                Err(WireError::ConnectionClosed) => break Err(ChannelError::TransportClosed),
                Err(WireError::Io(err)) if is_disconnect(err.kind()) => {
                    break Err(ChannelError::TransportClosed)
                }
                Err(err) => break Err(err.into()),
            }
        };

        if matches!(result, Err(ChannelError::TransportClosed)) {
            debug!("pipe broke while sending");
            self.peer_closed = true;
            self.close_io();
        }
        result
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            HandshakeState::Ready => Ok(()),
            other => Err(ChannelError::HandshakeIncomplete(other)),
        }
    }

    fn close_io(&mut self) {
        if let Some(io) = self.io.take() {
            let _ = io.reader.get_ref().shutdown();
        }
    }

    fn run_handshake(&mut self) -> Result<()> {
        match self.role {
            Role::Initiator => self.handshake_initiator(),
            Role::Responder => self.handshake_responder(),
        }
    }

    /// Send the greeting, then poll for the counter-greeting.
    fn handshake_initiator(&mut self) -> Result<()> {
        self.raw_send_batch(&[Payload::greeting()])?;

        for attempt in 0..self.config.handshake_attempts {
            self.pump()?;
            if let Some(batch) = self.ready.pop_front() {
                return expect_literal(&batch, COUNTER_GREETING);
            }
            if self.io.is_none() {
                return Err(ChannelError::HandshakeFailed(
                    "pipe closed during handshake".to_string(),
                ));
            }
            debug!(attempt, "no handshake reply yet");
            std::thread::sleep(self.config.retry_interval);
        }

        Err(ChannelError::HandshakeFailed(format!(
            "no reply after {} attempts",
            self.config.handshake_attempts
        )))
    }

    /// Poll for the greeting, then answer with the counter-greeting.
    fn handshake_responder(&mut self) -> Result<()> {
        for attempt in 0..self.config.handshake_attempts {
            self.pump()?;
            if let Some(batch) = self.ready.pop_front() {
                expect_literal(&batch, GREETING)?;
                return self.raw_send_batch(&[Payload::counter_greeting()]);
            }
            if self.io.is_none() {
                return Err(ChannelError::HandshakeFailed(
                    "pipe closed during handshake".to_string(),
                ));
            }
            debug!(attempt, "no greeting yet");
            std::thread::sleep(self.config.retry_interval);
        }

        Err(ChannelError::HandshakeFailed(format!(
            "no greeting after {} attempts",
            self.config.handshake_attempts
        )))
    }

    /// Forget any traffic that arrived around the greeting exchange.
    fn drain_leftovers(&mut self) {
        let _ = self.pump();
        self.partial.clear();
        self.ready.clear();
    }
}

impl Channel for PipeChannel {
    fn connect(&mut self) -> Result<()> {
        if self.io.is_some() {
            return Ok(());
        }
        let Some(path) = self.path.clone() else {
            // Pair endpoints die with their peer; there is nothing to
            // re-dial.
            return Err(ChannelError::NotConnected);
        };
        let endpoint = PipeListener::connect(&path)?;
        self.io = Some(PipeIo::new(endpoint, &self.config)?);
        self.state = HandshakeState::Uninitialized;
        self.peer_closed = false;
        self.partial.clear();
        self.ready.clear();
        info!(?path, "re-established pipe connection");
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.close_io();
        self.state = HandshakeState::Uninitialized;
        self.partial.clear();
        self.ready.clear();
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        if self.io.is_none() {
            return false;
        }
        // Probe the socket rather than trusting a cached flag; EOF and
        // broken pipes are detected here.
        let _ = self.pump();
        self.io.is_some()
    }

    fn handshake(&mut self) -> Result<()> {
        if self.state == HandshakeState::Ready {
            return Ok(());
        }
        if self.io.is_none() {
            return Err(ChannelError::NotConnected);
        }

        debug!(role = ?self.role, "starting handshake");
        self.state = HandshakeState::Handshaking;
        match self.run_handshake() {
            Ok(()) => {
                self.state = HandshakeState::Ready;
                self.drain_leftovers();
                info!(role = ?self.role, "handshake complete");
                Ok(())
            }
            Err(err) => {
                self.state = HandshakeState::Failed;
                Err(err)
            }
        }
    }

    fn handshake_complete(&self) -> bool {
        self.state == HandshakeState::Ready
    }

    fn role(&self) -> Role {
        self.role
    }

    fn send(&mut self, payload: &Payload) -> Result<()> {
        self.ensure_ready()?;
        self.raw_send_batch(std::slice::from_ref(payload))
    }

    fn send_batch(&mut self, payloads: &[Payload]) -> Result<()> {
        self.ensure_ready()?;
        self.raw_send_batch(payloads)
    }

    fn receive(&mut self) -> Result<Option<Vec<Payload>>> {
        self.receive_inner(false)
    }

    fn message_waiting(&mut self) -> Result<bool> {
        self.pump()?;
        Ok(!self.ready.is_empty())
    }
}

impl PipeIo {
    fn new(endpoint: PipeEndpoint, config: &ChannelConfig) -> Result<PipeIo> {
        endpoint.set_nonblocking(true)?;
        let reader_endpoint = endpoint.try_clone()?;
        Ok(PipeIo {
            reader: ItemReader::with_config(reader_endpoint, config.wire.clone()),
            writer: ItemWriter::with_config(endpoint, config.wire.clone()),
        })
    }
}

impl std::fmt::Debug for PipeChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeChannel")
            .field("role", &self.role)
            .field("state", &self.state)
            .field("connected", &self.io.is_some())
            .field("ready_batches", &self.ready.len())
            .finish()
    }
}

fn expect_literal(batch: &[Payload], expected: &str) -> Result<()> {
    match batch.first() {
        Some(Payload::Text(text)) if text == expected => Ok(()),
        Some(other) => Err(ChannelError::HandshakeFailed(format!(
            "unexpected handshake payload: {other:?}"
        ))),
        None => Err(ChannelError::HandshakeFailed(
            "empty handshake batch".to_string(),
        )),
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::UnexpectedEof
            | ErrorKind::NotConnected
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_pair() -> (PipeChannel, PipeChannel) {
        let (mut initiator, mut responder) = PipeChannel::pair().unwrap();
        let joined = std::thread::spawn(move || {
            initiator.handshake().unwrap();
            initiator
        });
        responder.handshake().unwrap();
        (joined.join().unwrap(), responder)
    }

    #[test]
    fn pair_starts_uninitialized() {
        let (initiator, responder) = PipeChannel::pair().unwrap();
        assert_eq!(initiator.role(), Role::Initiator);
        assert_eq!(responder.role(), Role::Responder);
        assert!(!initiator.handshake_complete());
        assert!(!responder.handshake_complete());
    }

    #[test]
    fn traffic_before_handshake_is_protocol_misuse() {
        let (mut initiator, _responder) = PipeChannel::pair().unwrap();

        let err = initiator.send(&Payload::Text("too early".into())).unwrap_err();
        assert!(matches!(
            err,
            ChannelError::HandshakeIncomplete(HandshakeState::Uninitialized)
        ));

        let err = initiator.receive().unwrap_err();
        assert!(matches!(err, ChannelError::HandshakeIncomplete(_)));
    }

    #[test]
    fn handshake_is_idempotent_once_ready() {
        let (mut initiator, _responder) = ready_pair();
        initiator.handshake().unwrap();
        assert!(initiator.handshake_complete());
    }

    #[test]
    fn failed_handshake_reaches_failed_state() {
        let (mut initiator, _responder) = PipeChannel::pair_with_config(quick_config()).unwrap();

        let err = initiator.handshake().unwrap_err();
        assert!(matches!(err, ChannelError::HandshakeFailed(_)));
        assert!(!initiator.handshake_complete());

        let err = initiator.send(&Payload::Sentinel).unwrap_err();
        assert!(matches!(
            err,
            ChannelError::HandshakeIncomplete(HandshakeState::Failed)
        ));
    }

    #[test]
    fn connect_is_idempotent_while_open() {
        let (mut initiator, _responder) = PipeChannel::pair().unwrap();
        initiator.connect().unwrap();
        initiator.connect().unwrap();
    }

    #[test]
    fn pair_endpoint_cannot_reconnect() {
        let (mut initiator, _responder) = PipeChannel::pair().unwrap();
        initiator.disconnect().unwrap();
        let err = initiator.connect().unwrap_err();
        assert!(matches!(err, ChannelError::NotConnected));
    }

    #[test]
    fn disconnect_is_idempotent() {
        let (mut initiator, _responder) = PipeChannel::pair().unwrap();
        initiator.disconnect().unwrap();
        initiator.disconnect().unwrap();
        assert!(!initiator.is_connected());
    }

    fn quick_config() -> ChannelConfig {
        ChannelConfig {
            handshake_attempts: 2,
            retry_interval: std::time::Duration::from_millis(10),
            ..ChannelConfig::default()
        }
    }
}
