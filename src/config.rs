//! Server configuration.
//!
//! The configuration surface is intentionally tiny: bind host, port and a
//! debug flag. Everything is env-var driven with sensible defaults.

use std::env;

/// Runtime configuration for the HTTP listener.
///
/// # Example
///
/// ```
/// use vitals::ServerConfig;
///
/// let config = ServerConfig::default().with_port(8080);
/// assert_eq!(config.bind_addr(), "0.0.0.0:8080");
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind (default: all interfaces)
    pub host: String,
    /// TCP port (default: 5000)
    pub port: u16,
    /// Debug mode: verbose pretty logs (default: false)
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            debug: false,
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `HOST`: bind interface (default: "0.0.0.0")
    /// - `PORT`: TCP port (default: 5000)
    /// - `DEBUG`: "true"/"1" enables debug mode (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = env::var("HOST").unwrap_or(defaults.host);

        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let debug = env::var("DEBUG")
            .map(|s| {
                let s = s.to_lowercase();
                s == "true" || s == "1"
            })
            .unwrap_or(defaults.debug);

        Self { host, port, debug }
    }

    /// Set the bind host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the TCP port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set debug mode.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// The address string passed to the TCP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
