//! Application configuration loaded from environment variables.
//!
//! Only the process around the endpoints is configurable. What an image looks
//! like is decided by the query string alone.

use serde::Deserialize;
use strum::{Display, EnumString};

/// How generation errors are reported at the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ErrorStatusPolicy {
    /// Every error is a JSON body at HTTP 200.
    #[default]
    AlwaysOk,
    /// 400 for bad parameters, 500 for encoder failures. Body is unchanged.
    Conventional,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    // === Response Shape ===
    /// Status code policy for error bodies.
    #[serde(default)]
    pub error_status_policy: ErrorStatusPolicy,

    /// Value of the `X-Developed-By` header and `developed_by` fields.
    #[serde(default = "default_developed_by")]
    pub developed_by: String,

    /// Link advertised by the status endpoint.
    #[serde(default = "default_documentation_url")]
    pub documentation_url: String,

    /// Support link advertised by the status endpoint.
    #[serde(default = "default_support_url")]
    pub support_url: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_developed_by() -> String {
    "zerodev".to_string()
}

fn default_documentation_url() -> String {
    "https://link-to-qr-api.vercel.app/docs".to_string()
}

fn default_support_url() -> String {
    "https://github.com/zerodev".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            rust_log: default_log_level(),
            error_status_policy: ErrorStatusPolicy::default(),
            developed_by: default_developed_by(),
            documentation_url: default_documentation_url(),
            support_url: default_support_url(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("PORT must be non-zero".to_string());
        }

        if self.host.trim().is_empty() {
            return Err("HOST must not be empty".to_string());
        }

        if self.developed_by.trim().is_empty() {
            return Err("DEVELOPED_BY must not be empty".to_string());
        }

        // The marker is sent verbatim as a header value.
        if !self
            .developed_by
            .bytes()
            .all(|b| b == b'\t' || (0x20..0x7f).contains(&b))
        {
            return Err("DEVELOPED_BY must be printable ASCII".to_string());
        }

        Ok(())
    }

    /// Address string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
