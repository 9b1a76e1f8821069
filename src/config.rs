//! Connection configuration for the Redfish CSR client.
//!
//! Values come from an optional flat `key = value` file and are then
//! overridden by command-line flags in `main.rs`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{IdracError, Result};

/// Manager resource that owns the HTTPS certificate collection.
pub const DEFAULT_MANAGER_ID: &str = "iDRAC.Embedded.1";

/// File the generated CSR is written to, relative to the working directory.
pub const DEFAULT_CSR_FILE: &str = "idrac_generated_csr.txt";

/// Full client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    // ── Target ────────────────────────────────────────────────────────────────
    /// BMC address: `host`, `host:port` or a full `https://` URL.
    pub host: String,
    /// Manager id used to build the certificate collection URI.
    pub manager_id: String,
    // ── Authentication ────────────────────────────────────────────────────────
    pub username: Option<String>,
    pub password: Option<String>,
    /// `X-Auth-Token` session token; wins over username/password.
    pub token: Option<String>,
    // ── TLS ───────────────────────────────────────────────────────────────────
    /// Accept any server certificate. Security-relevant; off by default.
    pub insecure: bool,
    /// PEM bundle of CA certificates to trust instead of the built-in roots.
    pub ca_file: Option<PathBuf>,
    // ── Requests ──────────────────────────────────────────────────────────────
    /// Per-request timeout. `None` leaves the HTTP client default in place.
    pub timeout: Option<Duration>,
    // ── Output ────────────────────────────────────────────────────────────────
    pub csr_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host:       String::new(),
            manager_id: DEFAULT_MANAGER_ID.to_string(),
            username:   None,
            password:   None,
            token:      None,
            insecure:   false,
            ca_file:    None,
            timeout:    None,
            csr_file:   PathBuf::from(DEFAULT_CSR_FILE),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("manager_id", &self.manager_id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("insecure", &self.insecure)
            .field("ca_file", &self.ca_file)
            .field("timeout", &self.timeout)
            .field("csr_file", &self.csr_file)
            .finish()
    }
}

/// Parse `path` as a `key = value` configuration file.
pub fn load_config(path: &Path) -> Result<ClientConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| IdracError::Config(format!("cannot read {}: {e}", path.display())))?;
    parse_config(&content)
}

fn parse_config(content: &str) -> Result<ClientConfig> {
    let mut cfg = ClientConfig::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(2, '=');
        let key = match parts.next() {
            Some(k) => k.trim().to_ascii_lowercase(),
            None => continue,
        };
        let val = match parts.next() {
            Some(v) => v.trim().to_string(),
            None => continue,
        };
        if val.is_empty() {
            continue;
        }

        match key.as_str() {
            "host"       => cfg.host       = val,
            "manager_id" => cfg.manager_id = val,
            "username"   => cfg.username   = Some(val),
            "password"   => cfg.password   = Some(val),
            "token"      => cfg.token      = Some(val),
            "insecure"   => cfg.insecure   = val == "true" || val == "1" || val == "yes",
            "ca_file"    => cfg.ca_file    = Some(PathBuf::from(&val)),
            "csr_file"   => cfg.csr_file   = PathBuf::from(&val),
            "timeout" => {
                let secs: u64 = val.parse().map_err(|_| {
                    IdracError::Config(format!("timeout must be a number of seconds, got '{val}'"))
                })?;
                cfg.timeout = Some(Duration::from_secs(secs));
            }
            _ => {} // ignore unknown keys
        }
    }

    Ok(cfg)
}

/// Validate that required fields are populated and options are consistent.
pub fn validate_config(cfg: &ClientConfig) -> Result<()> {
    if cfg.host.trim().is_empty() {
        return Err(IdracError::Config("host (--ip) is required".into()));
    }
    if cfg.manager_id.trim().is_empty() {
        return Err(IdracError::Config("manager_id cannot be empty".into()));
    }
    if cfg.insecure && cfg.ca_file.is_some() {
        return Err(IdracError::Config(
            "insecure and ca_file are mutually exclusive".into(),
        ));
    }
    if cfg.timeout == Some(Duration::ZERO) {
        return Err(IdracError::Config("timeout must be greater than zero".into()));
    }
    Ok(())
}
