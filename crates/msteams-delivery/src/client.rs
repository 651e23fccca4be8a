//! HTTP seam between the transport and the network.

use crate::error::{DeliveryError, Result, TransportError};
use msteams_core::MessageCard;
use std::time::Duration;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// One outbound POST.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub content_type: &'static str,
    pub body: String,
    /// Summary fields computed for this alert, kept with the request even
    /// when a JSON document replaces them as the body.
    pub summary: MessageCard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs HTTP requests for the transport.
///
/// `Err` means no complete response was received. Retries, TLS and proxies
/// are the implementor's business.
pub trait DeliveryClient {
    fn post(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError>;
}

impl<C: DeliveryClient + ?Sized> DeliveryClient for &C {
    fn post(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        (**self).post(request)
    }
}

/// Blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::blocking::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let inner = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("msteams-transport/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DeliveryError::Client(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl DeliveryClient for HttpClient {
    fn post(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let resp = self
            .inner
            .post(&request.url)
            .header(reqwest::header::CONTENT_TYPE, request.content_type)
            .body(request.body.clone())
            .send()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp.text().map_err(|e| TransportError::Body {
            status,
            message: e.to_string(),
        })?;
        Ok(HttpResponse { status, body })
    }
}
