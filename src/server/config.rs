use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::logging::LogLevel;
use crate::session::DEFAULT_WINDOW_SIZE;
use crate::{Error, Result};

/// Process configuration (§4.11): where to bind, how to log, and the two
/// session-controller defaults (`window_size`, `idle_timeout`) a transport
/// adapter needs before it can construct a `Session`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub log_level: LogLevel,
    pub log_file: Option<PathBuf>,
    pub log_max_size_mb: u64,
    pub log_max_backups: usize,
    pub log_max_age_days: u64,
    pub window_size: u32,
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "0.0.0.0:1935".parse().unwrap(),
            log_level: LogLevel::default(),
            log_file: None,
            log_max_size_mb: 100,
            log_max_backups: 7,
            log_max_age_days: 28,
            window_size: DEFAULT_WINDOW_SIZE,
            idle_timeout: Duration::from_secs(60),
        }
    }
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::new()
    }

    fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(Error::config("window_size must be nonzero"));
        }
        if self.log_file.is_some() && (self.log_max_size_mb == 0 || self.log_max_backups == 0 || self.log_max_age_days == 0) {
            return Err(Error::config("log rotation fields must be nonzero when log_file is set"));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn new() -> Self {
        ServerConfigBuilder { config: ServerConfig::default() }
    }

    pub fn bind_addr(mut self, addr: impl Into<String>) -> Result<Self> {
        self.config.bind_addr = addr
            .into()
            .parse()
            .map_err(|e| Error::config(format!("invalid bind_addr: {}", e)))?;
        Ok(self)
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.log_level = level;
        self
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_file = Some(path.into());
        self
    }

    pub fn log_max_size_mb(mut self, mb: u64) -> Self {
        self.config.log_max_size_mb = mb;
        self
    }

    pub fn log_max_backups(mut self, n: usize) -> Self {
        self.config.log_max_backups = n;
        self
    }

    pub fn log_max_age_days(mut self, days: u64) -> Self {
        self.config.log_max_age_days = days;
        self
    }

    pub fn window_size(mut self, window_size: u32) -> Self {
        self.config.window_size = window_size;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ServerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_log_rotation_with_zero_size_when_log_file_set() {
        let result = ServerConfig::builder().log_file("/tmp/rtmp.log").log_max_size_mb(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn rejects_invalid_bind_addr() {
        assert!(ServerConfig::builder().bind_addr("not-an-address").is_err());
    }
}
