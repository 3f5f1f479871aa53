//! Server configuration loaded from environment variables.

use std::env;

/// Academic year used when the environment does not override it.
pub const DEFAULT_ACADEMIC_YEAR: &str = "2024-2025";

/// Runtime configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Academic year partitioning preferences and allocations. Constant per
    /// process; there is no calendar-derived fallback.
    pub academic_year: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `HOST` (optional, default: 0.0.0.0): bind host
    /// - `PORT` (optional, default: 5001): bind port
    /// - `ACADEMIC_YEAR` (optional, default: 2024-2025): academic year key
    ///
    /// # Errors
    /// Returns an error if `PORT` is set but not a valid port number.
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| format!("PORT must be a valid port number, got '{raw}'"))?,
            Err(_) => 5001,
        };
        let academic_year =
            env::var("ACADEMIC_YEAR").unwrap_or_else(|_| DEFAULT_ACADEMIC_YEAR.to_string());

        Ok(Self {
            host,
            port,
            academic_year,
        })
    }

    /// Bind address string for the TCP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            academic_year: DEFAULT_ACADEMIC_YEAR.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 5001);
        assert_eq!(config.academic_year, DEFAULT_ACADEMIC_YEAR);
        assert_eq!(config.bind_addr(), "0.0.0.0:5001");
    }
}
