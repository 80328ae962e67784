// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Runtime knobs for the WebSocket hub.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_HUB_PORT: u16 = 3001;
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;
pub const DEFAULT_READ_DEADLINE: Duration = Duration::from_secs(300);
pub const DEFAULT_WRITE_DEADLINE: Duration = Duration::from_secs(30);
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(240);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Per-client outbound frames buffered before the client counts as a slow consumer.
    pub queue_capacity: usize,
    /// Idle time without a pong after which a client is dropped.
    pub read_deadline: Duration,
    pub write_deadline: Duration,
    /// Must stay below `read_deadline` so a healthy client always pongs in time.
    pub ping_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_HUB_PORT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            read_deadline: DEFAULT_READ_DEADLINE,
            write_deadline: DEFAULT_WRITE_DEADLINE,
            ping_interval: DEFAULT_PING_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("queue capacity must be at least 1")]
    ZeroQueueCapacity,
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("ping interval ({ping:?}) must be shorter than the read deadline ({read:?})")]
    PingNotBeforeReadDeadline { ping: Duration, read: Duration },
}

impl HubConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        for (name, value) in [
            ("read deadline", self.read_deadline),
            ("write deadline", self.write_deadline),
            ("ping interval", self.ping_interval),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration(name));
            }
        }
        if self.ping_interval >= self.read_deadline {
            return Err(ConfigError::PingNotBeforeReadDeadline {
                ping: self.ping_interval,
                read: self.read_deadline,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = HubConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.addr().to_string(), "127.0.0.1:3001");
    }

    #[test]
    fn ping_must_precede_read_deadline() {
        let config = HubConfig { ping_interval: Duration::from_secs(300), ..HubConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::PingNotBeforeReadDeadline { .. })));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = HubConfig { queue_capacity: 0, ..HubConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroQueueCapacity));
    }
}
