use std::sync::{Arc, Mutex, MutexGuard};

use stagelink_wire::Payload;

use crate::channel::{Channel, Role};
use crate::error::Result;

/// One channel end shared between local threads.
///
/// The channel itself is not safe for interleaved use from several
/// threads; this wrapper serializes every operation behind one mutex per
/// end, the usual shape being a UI thread issuing commands while a
/// background thread polls for replies.
pub struct SharedChannel<C> {
    inner: Arc<Mutex<C>>,
}

impl<C> Clone for SharedChannel<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Channel> SharedChannel<C> {
    /// Take ownership of a channel end and make it shareable.
    pub fn new(channel: C) -> Self {
        Self {
            inner: Arc::new(Mutex::new(channel)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, C> {
        // A panicked holder leaves the channel in whatever state its last
        // completed operation produced; that state is still coherent, so
        // recover the guard rather than poisoning every other thread.
        self.inner.lock().unwrap_or_else(|err| err.into_inner())
    }

    /// See [`Channel::connect`].
    pub fn connect(&self) -> Result<()> {
        self.lock().connect()
    }

    /// See [`Channel::disconnect`].
    pub fn disconnect(&self) -> Result<()> {
        self.lock().disconnect()
    }

    /// See [`Channel::is_connected`].
    pub fn is_connected(&self) -> bool {
        self.lock().is_connected()
    }

    /// See [`Channel::handshake`].
    pub fn handshake(&self) -> Result<()> {
        self.lock().handshake()
    }

    /// See [`Channel::handshake_complete`].
    pub fn handshake_complete(&self) -> bool {
        self.lock().handshake_complete()
    }

    /// See [`Channel::role`].
    pub fn role(&self) -> Role {
        self.lock().role()
    }

    /// See [`Channel::send`].
    pub fn send(&self, payload: &Payload) -> Result<()> {
        self.lock().send(payload)
    }

    /// See [`Channel::send_batch`].
    pub fn send_batch(&self, payloads: &[Payload]) -> Result<()> {
        self.lock().send_batch(payloads)
    }

    /// See [`Channel::receive`].
    pub fn receive(&self) -> Result<Option<Vec<Payload>>> {
        self.lock().receive()
    }

    /// See [`Channel::message_waiting`].
    pub fn message_waiting(&self) -> Result<bool> {
        self.lock().message_waiting()
    }

    /// See [`Channel::send_sentinel`].
    pub fn send_sentinel(&self) -> Result<()> {
        self.lock().send_sentinel()
    }
}
