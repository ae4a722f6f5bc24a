//! SOAP transport: posts an envelope, returns the decoded method response.
//!
//! `HttpTransport` is the production implementation over `reqwest`. The
//! session code is generic over [`SoapTransport`] so tests can answer calls
//! from canned XML without a server.

use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;

use super::soap::{self, SOAP_ACTION};
use super::xml::{self, Element};
use crate::application::ports::ConnectionParams;

/// Error carrying the `faultstring` of a SOAP fault.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct SoapFault(pub String);

/// Sends one vim25 method call.
#[allow(async_fn_in_trait)]
pub trait SoapTransport {
    /// Send `body` (a method element) and return the response element inside
    /// `<Body>`. A SOAP fault is returned as a [`SoapFault`] error.
    async fn call(&self, body: String) -> Result<Element>;
}

/// `reqwest`-backed transport with a cookie store holding the session cookie.
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Build a client for `params.host`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(params: &ConnectionParams) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(!params.verify_tls);
        if let Some(timeout) = params.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build().context("cannot build HTTP client")?,
            endpoint: endpoint_url(&params.host),
        })
    }
}

impl SoapTransport for HttpTransport {
    async fn call(&self, body: String) -> Result<Element> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", SOAP_ACTION)
            .body(soap::envelope(&body))
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.endpoint))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .context("cannot read SOAP response")?;
        let doc = xml::parse(&text)
            .with_context(|| format!("malformed SOAP response (HTTP {status})"))?;

        if let Some(fault) = soap::fault_string(&doc) {
            return Err(SoapFault(fault).into());
        }
        if !status.is_success() {
            anyhow::bail!("HTTP {status} from {}", self.endpoint);
        }
        soap::body_payload(doc)
    }
}

/// The SDK endpoint for a host given as a bare name, `host:port`, or URL.
#[must_use]
pub fn endpoint_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    let base = if host.starts_with("https://") || host.starts_with("http://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };
    if base.ends_with("/sdk") {
        base
    } else {
        format!("{base}/sdk")
    }
}
