//! CSR subject, GenerateCSR wire types and persistence of the returned CSR.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{IdracError, Result};

/// Certificate subject fields sent with a GenerateCSR request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsrSubject {
    pub city:                String,
    pub common_name:         String,
    pub country:             String,
    pub organization:        String,
    pub organizational_unit: String,
    pub state:               String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email:               Option<String>,
}

impl CsrSubject {
    /// An empty email is treated as not supplied.
    pub fn new(
        city:                impl Into<String>,
        state:               impl Into<String>,
        country:             impl Into<String>,
        common_name:         impl Into<String>,
        organization:        impl Into<String>,
        organizational_unit: impl Into<String>,
        email:               Option<String>,
    ) -> Self {
        Self {
            city:                city.into(),
            common_name:         common_name.into(),
            country:             country.into(),
            organization:        organization.into(),
            organizational_unit: organizational_unit.into(),
            state:               state.into(),
            email:               email.filter(|e| !e.is_empty()),
        }
    }
}

/// Redfish resource reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OdataId {
    #[serde(rename = "@odata.id")]
    pub odata_id: String,
}

/// Body of `POST .../CertificateService.GenerateCSR`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GenerateCsrRequest<'a> {
    pub certificate_collection: OdataId,
    #[serde(flatten)]
    pub subject: &'a CsrSubject,
}

impl<'a> GenerateCsrRequest<'a> {
    pub fn new(collection_uri: &str, subject: &'a CsrSubject) -> Self {
        Self {
            certificate_collection: OdataId { odata_id: collection_uri.to_string() },
            subject,
        }
    }
}

/// Successful GenerateCSR response.  Only the CSR text is used.
#[derive(Debug, Deserialize)]
pub struct GenerateCsrResponse {
    #[serde(rename = "CSRString")]
    pub csr_string: String,
}

/// Write the CSR text verbatim to `path`, replacing any existing file.
pub async fn save_csr(path: &Path, csr: &str) -> Result<()> {
    tokio::fs::write(path, csr.as_bytes())
        .await
        .map_err(|source| IdracError::CsrWrite { path: path.to_path_buf(), source })?;
    info!("CSR saved to {} ({} bytes)", path.display(), csr.len());
    Ok(())
}
