use std::{default::Default, time::Duration};

use crate::constants::{DEFAULT_CHANNEL_COUNT, DEFAULT_PEER_LIMIT};

#[derive(Clone, Debug)]
/// Configuration options to tune host and engine behavior.
pub struct Config {
    /// Max number of simultaneously connected peers. Further connects are refused.
    pub peer_limit: usize,
    /// Number of channels per peer connection (1-255).
    pub channel_count: u8,
    /// How long a single engine poll may block when the host runs its own loop.
    pub polling_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            peer_limit: DEFAULT_PEER_LIMIT,
            channel_count: DEFAULT_CHANNEL_COUNT,
            polling_timeout: Duration::from_millis(1),
        }
    }
}
