//! Error types for the Redfish CSR client.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdracError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS: {0}")]
    Tls(#[from] rustls::Error),

    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("request failed, status code {code}: {detail}")]
    Status { code: u16, detail: String },

    #[error("malformed response body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("iDRAC firmware version or credentials do not support the GenerateCSR action")]
    Unsupported,

    #[error("cannot write CSR to {}: {source}", path.display())]
    CsrWrite {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("Config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, IdracError>;
