#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Delivery of alerts to Microsoft Teams.
//!
//! [`TeamsTransport`] validates the configuration, builds the payload with
//! `msteams-core`, issues a single POST through a [`DeliveryClient`] and maps
//! the response to `Ok(())` or a [`DeliveryError`]. Each call is independent;
//! retries belong to the caller.

pub mod client;
pub mod error;

pub use client::{DeliveryClient, HttpClient, HttpRequest, HttpResponse, JSON_CONTENT_TYPE};
pub use error::{DeliveryError, DeliveryFailure, PayloadFailure, Result, TransportError};

use msteams_core::{
    payload, AlertEvent, CardMode, DefaultStateColors, MessageCard, PayloadError, StateColors,
    TransportConfig,
};
use tracing::{debug, info, warn};

/// A pluggable alert transport of the alerting pipeline.
pub trait Transport {
    /// Human-readable transport name.
    fn name(&self) -> &str;
    fn deliver(&self, alert: &AlertEvent, config: &TransportConfig) -> Result<()>;
}

/// Teams transport over an HTTP client and a state palette.
#[derive(Debug, Clone)]
pub struct TeamsTransport<C, P = DefaultStateColors> {
    client: C,
    colors: P,
}

impl<C: DeliveryClient> TeamsTransport<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            colors: DefaultStateColors,
        }
    }
}

impl<C: DeliveryClient, P: StateColors> TeamsTransport<C, P> {
    pub fn with_colors(client: C, colors: P) -> Self {
        Self { client, colors }
    }

    /// Builds the request `deliver` would send, without sending it.
    pub fn preview(&self, alert: &AlertEvent, config: &TransportConfig) -> Result<HttpRequest> {
        config.validate()?;

        let card = MessageCard::from_event(alert, &self.colors);
        let mode = CardMode::select(alert, config);
        let body = payload::build(alert, config, &self.colors)
            .and_then(|wire| wire.body_json().map_err(PayloadError::from));
        let body = match body {
            Ok(body) => body,
            Err(source) => {
                warn!(
                    mode = mode.as_str(),
                    uid = %alert.uid,
                    error = %source,
                    "Teams payload rejected"
                );
                return Err(PayloadFailure {
                    source,
                    alert: alert.clone(),
                    text: card.text.clone(),
                    payload: card,
                }
                .into());
            }
        };
        debug!(
            mode = mode.as_str(),
            method = %config.connection_method,
            json_body = mode != CardMode::Markdown,
            "built Teams payload"
        );

        Ok(HttpRequest {
            url: config.webhook_url.trim().to_string(),
            content_type: JSON_CONTENT_TYPE,
            body,
            summary: card,
        })
    }
}

impl<C: DeliveryClient, P: StateColors> Transport for TeamsTransport<C, P> {
    fn name(&self) -> &str {
        "Microsoft Teams"
    }

    fn deliver(&self, alert: &AlertEvent, config: &TransportConfig) -> Result<()> {
        let request = self.preview(alert, config)?;

        let (status, body, detail) = match self.client.post(&request) {
            Ok(resp) if resp.is_success() => {
                info!(status = resp.status, uid = %alert.uid, "delivered alert to Teams");
                return Ok(());
            }
            Ok(resp) => (Some(resp.status), resp.body, None),
            Err(e) => (e.status(), String::new(), Some(e)),
        };

        warn!(
            status = ?status,
            uid = %alert.uid,
            detail = ?detail,
            "Teams delivery failed"
        );

        Err(DeliveryFailure {
            alert: alert.clone(),
            status,
            body,
            text: request.summary.text.clone(),
            request_body: request.body,
            payload: request.summary,
            detail,
        }
        .into())
    }
}
