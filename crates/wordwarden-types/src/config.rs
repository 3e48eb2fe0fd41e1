//! Application configuration with sensible defaults.
//!
//! All operational parameters are centralized here. The identity
//! fields (`client_id`, `server_id`, `server_url`, `channel_name`)
//! have no usable default and must be supplied by the daemon's
//! CLI/config/environment resolution before `validate()` passes.

use serde::{Deserialize, Serialize};

use crate::{Result, WordwardenError};

/// Global application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Client identity echoed by the central server during AUTH and
    /// on every correlated response.
    pub client_id: String,

    /// Identity the central server must present on unsolicited
    /// whitelist-update pushes.
    pub server_id: String,

    /// WebSocket URL of the central whitelist server.
    pub server_url: String,

    /// Chat channel this client filters; forwarded with every
    /// whitelist request for reviewer context.
    pub channel_name: String,

    /// Seconds between reconnection attempts while the sync link is
    /// down. Also the poll interval for liveness waits.
    pub reconnect_interval_secs: u64,

    /// Seconds between checks for a correlated response.
    pub response_poll_interval_secs: u64,

    /// Number of response polls before an outbound request times out.
    pub response_poll_attempts: u32,

    /// Liveness polls granted to a username request before it gives
    /// up and is marked failed. Word requests wait without bound.
    pub username_live_attempts: u32,

    /// Messages a new user must send before their username is
    /// forwarded for whitelisting.
    pub request_message_threshold: u32,

    /// Seconds between dataset refresh checks.
    pub refresh_interval_secs: u64,

    /// Capacity of the push-update and announcement channels.
    pub update_queue_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            server_id: String::new(),
            server_url: String::new(),
            channel_name: String::new(),
            reconnect_interval_secs: 5,
            response_poll_interval_secs: 1,
            response_poll_attempts: 10,
            username_live_attempts: 3,
            request_message_threshold: 2,
            refresh_interval_secs: 60,
            update_queue_capacity: 256,
        }
    }
}

impl AppConfig {
    /// Validates all configuration values.
    ///
    /// Returns an error if any identity field is empty or any numeric
    /// value is outside its acceptable range. A failed validation is
    /// fatal at startup.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(WordwardenError::ConfigError {
                reason: "client_id must be set".into(),
            });
        }

        if self.server_id.is_empty() {
            return Err(WordwardenError::ConfigError {
                reason: "server_id must be set".into(),
            });
        }

        if self.server_url.is_empty() {
            return Err(WordwardenError::ConfigError {
                reason: "server_url must be set".into(),
            });
        }

        if self.channel_name.is_empty() {
            return Err(WordwardenError::ConfigError {
                reason: "channel_name must be set".into(),
            });
        }

        if self.reconnect_interval_secs == 0 {
            return Err(WordwardenError::ConfigError {
                reason: "reconnect_interval_secs must be greater than 0".into(),
            });
        }

        if self.response_poll_interval_secs == 0 {
            return Err(WordwardenError::ConfigError {
                reason: "response_poll_interval_secs must be greater than 0".into(),
            });
        }

        if self.response_poll_attempts == 0 {
            return Err(WordwardenError::ConfigError {
                reason: "response_poll_attempts must be greater than 0".into(),
            });
        }

        if self.request_message_threshold == 0 {
            return Err(WordwardenError::ConfigError {
                reason: "request_message_threshold must be greater than 0".into(),
            });
        }

        if self.refresh_interval_secs == 0 {
            return Err(WordwardenError::ConfigError {
                reason: "refresh_interval_secs must be greater than 0".into(),
            });
        }

        if self.update_queue_capacity == 0 {
            return Err(WordwardenError::ConfigError {
                reason: "update_queue_capacity must be greater than 0".into(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> AppConfig {
        AppConfig {
            client_id: "client-1".into(),
            server_id: "server-1".into(),
            server_url: "ws://127.0.0.1:9300".into(),
            channel_name: "somechannel".into(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn populated_config_is_valid() {
        assert!(populated().validate().is_ok());
    }

    #[test]
    fn default_identity_fields_rejected() {
        // Defaults deliberately fail validation: identity must be
        // supplied by the operator.
        assert!(AppConfig::default().validate().is_err());
    }

    #[test]
    fn default_values_match_protocol_budgets() {
        let config = AppConfig::default();
        assert_eq!(config.reconnect_interval_secs, 5);
        assert_eq!(config.response_poll_interval_secs, 1);
        assert_eq!(config.response_poll_attempts, 10);
        assert_eq!(config.username_live_attempts, 3);
        assert_eq!(config.request_message_threshold, 2);
        assert_eq!(config.refresh_interval_secs, 60);
        assert_eq!(config.update_queue_capacity, 256);
    }

    #[test]
    fn empty_client_id_rejected() {
        let config = AppConfig {
            client_id: String::new(),
            ..populated()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_server_url_rejected() {
        let config = AppConfig {
            server_url: String::new(),
            ..populated()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_reconnect_interval_rejected() {
        let config = AppConfig {
            reconnect_interval_secs: 0,
            ..populated()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_message_threshold_rejected() {
        let config = AppConfig {
            request_message_threshold: 0,
            ..populated()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_response_attempts_rejected() {
        let config = AppConfig {
            response_poll_attempts: 0,
            ..populated()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_username_live_attempts_allowed() {
        // Zero means "wait without bound", mirroring word requests.
        let config = AppConfig {
            username_live_attempts: 0,
            ..populated()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_serde_roundtrip() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let config = populated();
        let json = serde_json::to_string(&config)?;
        let parsed: AppConfig = serde_json::from_str(&json)?;
        assert_eq!(config.client_id, parsed.client_id);
        assert_eq!(config.server_id, parsed.server_id);
        assert_eq!(config.server_url, parsed.server_url);
        assert_eq!(config.channel_name, parsed.channel_name);
        assert_eq!(config.reconnect_interval_secs, parsed.reconnect_interval_secs);
        assert_eq!(config.response_poll_attempts, parsed.response_poll_attempts);
        assert_eq!(
            config.request_message_threshold,
            parsed.request_message_threshold
        );
        Ok(())
    }
}
