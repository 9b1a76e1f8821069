//! Redfish client for the iDRAC certificate service.
//!
//! Every request carries `Accept: application/json` and exactly one form of
//! authentication: the `X-Auth-Token` header or HTTP basic.  Requests are
//! issued one at a time and never retried.

use log::{debug, info, warn};
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::ClientConfig;
use crate::credentials::Credentials;
use crate::csr::{CsrSubject, GenerateCsrRequest, GenerateCsrResponse};
use crate::error::{IdracError, Result};
use crate::tls;

pub const CERTIFICATE_SERVICE_URI: &str = "/redfish/v1/CertificateService";
pub const GENERATE_CSR_URI: &str =
    "/redfish/v1/CertificateService/Actions/CertificateService.GenerateCSR";
/// Key under `Actions` that advertises CSR generation support.
pub const GENERATE_CSR_ACTION: &str = "#CertificateService.GenerateCSR";
const EXPAND_ONE_LEVEL: &str = "$expand=*($levels=1)";
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Collection of certificates installed on the manager's HTTPS service.
pub fn https_certificates_uri(manager_id: &str) -> String {
    format!("/redfish/v1/Managers/{manager_id}/NetworkProtocol/HTTPS/Certificates")
}

/// Turn `host`, `host:port` or a full URL into the service base URL.
/// A bare host defaults to `https`.
pub fn base_url(host: &str) -> Result<Url> {
    let host = host.trim().trim_end_matches('/');
    let url = if host.contains("://") {
        Url::parse(host)?
    } else {
        Url::parse(&format!("https://{host}"))?
    };
    match url.scheme() {
        "https" | "http" => Ok(url),
        other => Err(IdracError::Config(format!("unsupported URL scheme '{other}'"))),
    }
}

#[derive(Debug, Deserialize)]
struct CertificateService {
    #[serde(rename = "Actions", default)]
    actions: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct CertificateCollection {
    #[serde(rename = "Members", default)]
    members: Vec<Value>,
}

/// Authenticated client bound to one BMC.
pub struct RedfishClient {
    http:        Client,
    base:        Url,
    credentials: Credentials,
    manager_id:  String,
}

impl RedfishClient {
    /// Build the HTTP client from the connection settings.
    pub fn new(cfg: &ClientConfig, credentials: Credentials) -> Result<Self> {
        let mut builder = Client::builder();
        if cfg.insecure {
            warn!("TLS certificate verification is DISABLED for {}", cfg.host);
            builder = builder.use_preconfigured_tls(tls::build_insecure_config()?);
        } else if let Some(ca_file) = &cfg.ca_file {
            debug!("trusting CA bundle {}", ca_file.display());
            builder = builder.use_preconfigured_tls(tls::build_ca_config(ca_file)?);
        }
        if let Some(timeout) = cfg.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http:        builder.build()?,
            base:        base_url(&cfg.host)?,
            credentials,
            manager_id:  cfg.manager_id.clone(),
        })
    }

    pub fn certificates_uri(&self) -> String {
        https_certificates_uri(&self.manager_id)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req.header(ACCEPT, "application/json");
        match &self.credentials {
            Credentials::Token(token) => req.header(AUTH_TOKEN_HEADER, token),
            Credentials::Basic { username, password } => req.basic_auth(username, Some(password)),
        }
    }

    async fn get(&self, url: Url) -> Result<Response> {
        debug!("GET {url}");
        let resp = self.authorize(self.http.get(url)).send().await?;
        debug!("→ {}", resp.status());
        Ok(resp)
    }

    /// Probe the certificate service and require the GenerateCSR action.
    pub async fn check_csr_support(&self) -> Result<()> {
        let resp = self.get(self.base.join(CERTIFICATE_SERVICE_URI)?).await?;
        let body = read_body(resp, &[StatusCode::OK, StatusCode::ACCEPTED]).await?;
        let service: CertificateService = serde_json::from_str(&body)?;

        if service.actions.contains_key(GENERATE_CSR_ACTION) {
            debug!("{GENERATE_CSR_ACTION} is supported");
            Ok(())
        } else {
            Err(IdracError::Unsupported)
        }
    }

    /// Fetch the installed HTTPS certificates, one level expanded.
    ///
    /// Members are returned as opaque JSON in the order the BMC sent them.
    pub async fn get_certificates(&self) -> Result<Vec<Value>> {
        let mut url = self.base.join(&self.certificates_uri())?;
        url.set_query(Some(EXPAND_ONE_LEVEL));
        let resp = self.get(url).await?;
        let body = read_body(resp, &[StatusCode::OK, StatusCode::ACCEPTED]).await?;
        let collection: CertificateCollection = serde_json::from_str(&body)?;
        info!("{} certificate(s) installed", collection.members.len());
        Ok(collection.members)
    }

    /// Ask the BMC to generate a CSR and return its PEM text.
    pub async fn generate_csr(&self, subject: &CsrSubject) -> Result<String> {
        let collection = self.certificates_uri();
        let payload = GenerateCsrRequest::new(&collection, subject);
        let url = self.base.join(GENERATE_CSR_URI)?;

        info!("requesting CSR for CN={}", subject.common_name);
        debug!("POST {url}");
        let resp = self
            .authorize(self.http.post(url))
            .json(&payload)
            .send()
            .await?;
        debug!("→ {}", resp.status());

        let body = read_body(resp, &[StatusCode::OK]).await?;
        let parsed: GenerateCsrResponse = serde_json::from_str(&body)?;
        Ok(parsed.csr_string)
    }
}

/// Read the body, turning any status outside `accepted` into a status error.
async fn read_body(resp: Response, accepted: &[StatusCode]) -> Result<String> {
    let status = resp.status();
    let body = resp.text().await?;
    if accepted.contains(&status) {
        Ok(body)
    } else {
        Err(IdracError::Status {
            code:   status.as_u16(),
            detail: error_detail(&body),
        })
    }
}

/// Extract a readable message from a Redfish error body.
///
/// Prefers the `@Message.ExtendedInfo` messages, then `error.message`, then
/// the raw body.
pub fn error_detail(body: &str) -> String {
    let raw = || {
        let trimmed = body.trim();
        if trimmed.is_empty() { "no response body".to_string() } else { trimmed.to_string() }
    };
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return raw(),
    };
    let error = &value["error"];

    let extended: Vec<&str> = error["@Message.ExtendedInfo"]
        .as_array()
        .map(|infos| infos.iter().filter_map(|i| i["Message"].as_str()).collect())
        .unwrap_or_default();
    if !extended.is_empty() {
        return extended.join("; ");
    }
    match error["message"].as_str() {
        Some(msg) => msg.to_string(),
        None => raw(),
    }
}
