//! Probe-then-act flow for one invocation.
//!
//! The capability probe always runs first.  At most one of the two actions
//! follows it, and only when the probe succeeded.

use std::io::Write;
use std::path::Path;

use log::info;

use crate::csr::{self, CsrSubject};
use crate::error::Result;
use crate::redfish::RedfishClient;

/// What the operator asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No action flag given: only check GenerateCSR support.
    Probe,
    GetCertificates,
    GenerateCsr(CsrSubject),
}

/// Run the probe and the selected action, writing results to `out`.
///
/// `csr_file` is written only after a successful GenerateCSR, and only after
/// the CSR text has been written to `out`.
pub async fn execute(
    client:   &RedfishClient,
    action:   &Action,
    csr_file: &Path,
    out:      &mut dyn Write,
) -> Result<()> {
    client.check_csr_support().await?;

    match action {
        Action::Probe => {
            info!("GenerateCSR is supported; pass --get or --generate to act");
            writeln!(out, "GenerateCSR is supported on this iDRAC")?;
        }
        Action::GetCertificates => {
            let certs = client.get_certificates().await?;
            writeln!(out, "{} certificate(s) installed for the iDRAC HTTPS service", certs.len())?;
            for (i, cert) in certs.iter().enumerate() {
                writeln!(out, "\n- Certificate {} -\n{}", i + 1, serde_json::to_string_pretty(cert)?)?;
            }
        }
        Action::GenerateCsr(subject) => {
            let csr = client.generate_csr(subject).await?;
            writeln!(out, "Generated CSR:\n\n{csr}")?;
            out.flush()?;
            csr::save_csr(csr_file, &csr).await?;
            writeln!(out, "\nCSR written to {}", csr_file.display())?;
        }
    }
    Ok(())
}
