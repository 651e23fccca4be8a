use msteams_core::{AlertEvent, MessageCard, PayloadError, ValidationError};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Invalid transport configuration: {0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Payload(Box<PayloadFailure>),
    #[error("{0}")]
    Delivery(Box<DeliveryFailure>),
    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl From<DeliveryFailure> for DeliveryError {
    fn from(failure: DeliveryFailure) -> Self {
        Self::Delivery(Box::new(failure))
    }
}

impl From<PayloadFailure> for DeliveryError {
    fn from(failure: PayloadFailure) -> Self {
        Self::Payload(Box::new(failure))
    }
}

impl DeliveryError {
    /// Failure details when the request was attempted.
    #[must_use]
    pub fn failure(&self) -> Option<&DeliveryFailure> {
        match self {
            Self::Delivery(failure) => Some(&**failure),
            _ => None,
        }
    }

    /// Failure details when the payload could not be built.
    #[must_use]
    pub fn payload_failure(&self) -> Option<&PayloadFailure> {
        match self {
            Self::Payload(failure) => Some(&**failure),
            _ => None,
        }
    }
}

/// Why no complete HTTP response came back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("reading response body failed (HTTP {status}): {message}")]
    Body { status: u16, message: String },
}

impl TransportError {
    /// Status line received before the failure, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request(_) => None,
            Self::Body { status, .. } => Some(*status),
        }
    }
}

/// The alert message could not be turned into a request body. Nothing was
/// sent.
#[derive(Debug, Error)]
#[error("Payload construction failed: {source}")]
pub struct PayloadFailure {
    pub source: PayloadError,
    pub alert: AlertEvent,
    /// Sanitized card text.
    pub text: String,
    /// Summary fields computed for the alert.
    pub payload: MessageCard,
}

/// Context of a failed request, enough to show the operator what was sent
/// and what came back.
#[derive(Debug, Clone)]
pub struct DeliveryFailure {
    pub alert: AlertEvent,
    /// HTTP status, `None` when no response was received.
    pub status: Option<u16>,
    pub body: String,
    /// Sanitized card text.
    pub text: String,
    /// Summary fields sent with the request.
    pub payload: MessageCard,
    /// Serialized request body.
    pub request_body: String,
    /// Transport error when no complete response was received.
    pub detail: Option<TransportError>,
}

impl DeliveryFailure {
    #[must_use]
    pub fn is_transport_failure(&self) -> bool {
        self.detail.is_some()
    }
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, &self.detail) {
            (_, Some(detail)) => write!(f, "Teams delivery failed: {detail}"),
            (Some(code), None) => {
                write!(f, "Teams delivery failed (HTTP {code}): {}", self.body)
            }
            (None, None) => f.write_str("Teams delivery failed (no response)"),
        }
    }
}

impl std::error::Error for DeliveryFailure {}

pub type Result<T> = std::result::Result<T, DeliveryError>;
