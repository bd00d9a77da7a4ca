use std::time::Duration;

use stagelink_wire::WireConfig;

/// Tuning for channel retries and polling.
///
/// The handshake is the only operation allowed to block, and only for
/// `handshake_attempts * retry_interval` in the worst case.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Polling attempts before a handshake gives up.
    pub handshake_attempts: u32,
    /// Sleep between handshake polls and between send retries.
    pub retry_interval: Duration,
    /// Recommended sleep for caller-side receive polling loops.
    pub poll_interval: Duration,
    /// Flush retries before a stalled send fails.
    pub send_retry_attempts: u32,
    /// Wire codec limits.
    pub wire: WireConfig,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            handshake_attempts: 5,
            retry_interval: Duration::from_millis(100),
            poll_interval: Duration::from_millis(100),
            send_retry_attempts: 5,
            wire: WireConfig::default(),
        }
    }
}

impl ChannelConfig {
    /// Worst-case time a handshake may block before failing.
    pub fn handshake_budget(&self) -> Duration {
        self.retry_interval * self.handshake_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_budget_is_bounded() {
        let config = ChannelConfig::default();
        assert_eq!(config.handshake_budget(), Duration::from_millis(500));
    }
}
