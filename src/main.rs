//! Redfish CSR client for Dell iDRAC.
//!
//! Lists the certificates installed on the iDRAC HTTPS service, or asks the
//! iDRAC to generate a Certificate Signing Request and saves the result.
//!
//! Usage:
//!   idrac-csr --ip 192.168.0.120 -u root -p calvin --get
//!   idrac-csr --ip 192.168.0.120 -x <token> --generate --city Austin --state Texas \
//!       --country US --commonname idrac.example.com --org "Test group" --orgunit lab

mod command;
mod config;
mod credentials;
mod csr;
mod error;
mod redfish;
mod tls;

#[cfg(test)]
mod testutil;

use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::{error, warn};

use crate::command::Action;
use crate::config::ClientConfig;
use crate::credentials::TerminalPrompt;
use crate::csr::CsrSubject;
use crate::error::IdracError;
use crate::redfish::RedfishClient;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "idrac-csr",
    version,
    about = "Get iDRAC HTTPS certificates or generate a CSR over Redfish",
    after_help = "Examples:\n  \
        idrac-csr --ip 192.168.0.120 -u root -p calvin --get\n  \
        idrac-csr --ip 192.168.0.120 -u root --generate --city Austin --state Texas \
        --country US --commonname test --org \"Test group\" --orgunit lab --email tester@email.com"
)]
struct Cli {
    /// Optional key = value configuration file; flags override its values.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// iDRAC address: host, host:port or full URL.
    #[arg(long = "ip", env = "IDRAC_HOST")]
    host: Option<String>,

    /// iDRAC username.
    #[arg(short = 'u', long, env = "IDRAC_USERNAME")]
    username: Option<String>,

    /// iDRAC password. Prompted for when a username is known but this is not.
    #[arg(short = 'p', long, env = "IDRAC_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// X-Auth-Token session token; takes precedence over username/password.
    #[arg(short = 'x', long, env = "IDRAC_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Skip TLS certificate verification. Exposes credentials to anyone able
    /// to intercept the connection.
    #[arg(long)]
    insecure: bool,

    /// PEM bundle of CA certificates to trust for the iDRAC connection.
    #[arg(long, conflicts_with = "insecure")]
    ca_file: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Manager resource id owning the HTTPS certificate collection.
    #[arg(long)]
    manager_id: Option<String>,

    /// File the generated CSR is written to.
    #[arg(short = 'o', long = "output")]
    csr_file: Option<PathBuf>,

    /// Get the current iDRAC certificates.
    #[arg(long, conflicts_with = "generate")]
    get: bool,

    /// Generate a CSR.
    #[arg(
        long,
        requires_all = ["city", "state", "country", "commonname", "org", "orgunit"]
    )]
    generate: bool,

    /// City (L) for the CSR subject.
    #[arg(long)]
    city: Option<String>,

    /// State or province (ST) for the CSR subject.
    #[arg(long)]
    state: Option<String>,

    /// Two-letter country code (C) for the CSR subject.
    #[arg(long)]
    country: Option<String>,

    /// Common name (CN) for the CSR subject.
    #[arg(long)]
    commonname: Option<String>,

    /// Organization (O) for the CSR subject.
    #[arg(long)]
    org: Option<String>,

    /// Organizational unit (OU) for the CSR subject.
    #[arg(long)]
    orgunit: Option<String>,

    /// Email address for the CSR subject (optional).
    #[arg(long)]
    email: Option<String>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log to syslog instead of stderr.
    #[arg(long)]
    syslog: bool,
}

impl Cli {
    /// Layer the command-line flags over the file configuration.
    fn merge_into(&self, mut cfg: ClientConfig) -> ClientConfig {
        if let Some(v) = &self.host       { cfg.host       = v.clone(); }
        if let Some(v) = &self.manager_id { cfg.manager_id = v.clone(); }
        if let Some(v) = &self.username   { cfg.username   = Some(v.clone()); }
        if let Some(v) = &self.password   { cfg.password   = Some(v.clone()); }
        if let Some(v) = &self.token      { cfg.token      = Some(v.clone()); }
        if let Some(v) = &self.ca_file    { cfg.ca_file    = Some(v.clone()); cfg.insecure = false; }
        if let Some(v) = self.timeout     { cfg.timeout    = Some(Duration::from_secs(v)); }
        if let Some(v) = &self.csr_file   { cfg.csr_file   = v.clone(); }
        if self.insecure {
            cfg.insecure = true;
            cfg.ca_file = None;
        }
        cfg
    }

    fn action(&self) -> Action {
        if self.get {
            return Action::GetCertificates;
        }
        if !self.generate {
            return Action::Probe;
        }
        let field = |v: &Option<String>| v.clone().unwrap_or_default();
        Action::GenerateCsr(CsrSubject::new(
            field(&self.city),
            field(&self.state),
            field(&self.country),
            field(&self.commonname),
            field(&self.org),
            field(&self.orgunit),
            self.email.clone(),
        ))
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(cli.syslog, cli.verbose) {
        eprintln!("idrac-csr: logging: {e}");
        process::exit(1);
    }

    if let Err(e) = run(&cli).await {
        let unsupported = matches!(e.downcast_ref::<IdracError>(), Some(IdracError::Unsupported));
        if cli.syslog {
            if unsupported { warn!("{e}"); } else { error!("{e:#}"); }
        }
        let kind = if unsupported { "warning" } else { "error" };
        eprintln!("idrac-csr: {kind}: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let file_cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ClientConfig::default(),
    };
    let cfg = cli.merge_into(file_cfg);
    config::validate_config(&cfg)?;

    let creds = credentials::resolve(
        cfg.token.as_deref(),
        cfg.username.as_deref(),
        cfg.password.as_deref(),
        &mut TerminalPrompt,
    )
    .context("reading credentials")?;

    let client = RedfishClient::new(&cfg, creds).context("building HTTP client")?;
    let action = cli.action();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    command::execute(&client, &action, &cfg.csr_file, &mut out).await?;
    Ok(())
}

// ── Logging setup ─────────────────────────────────────────────────────────────

fn setup_logging(use_syslog: bool, verbose: u8) -> anyhow::Result<()> {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    if use_syslog {
        let formatter = syslog::Formatter3164 {
            facility: syslog::Facility::LOG_USER,
            hostname: None,
            process:  "idrac-csr".into(),
            pid:      process::id(),
        };
        let logger = syslog::unix(formatter)
            .map_err(|e| anyhow::anyhow!("syslog connect failed: {e}"))?;
        log::set_boxed_logger(Box::new(syslog::BasicLogger::new(logger)))
            .map(|()| log::set_max_level(level))
            .map_err(|e| anyhow::anyhow!("set_logger: {e}"))?;
    } else {
        env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .init();
    }
    Ok(())
}
