//! Payload construction for the Microsoft Teams alert transport.
//!
//! Turns an [`AlertEvent`] and a [`TransportConfig`] into the request body a
//! Teams webhook or workflow endpoint expects. Delivery lives in
//! `msteams-delivery`.

pub mod color;
pub mod config;
pub mod event;
pub mod payload;
pub mod sanitize;

pub use color::{DefaultStateColors, StateColors};
pub use config::{ConfigSchema, ConnectionMethod, TransportConfig, ValidationError};
pub use event::{AlertEvent, AlertState, SELF_TEST_UID};
pub use payload::{build, Body, CardMode, MessageCard, PayloadError, WirePayload};
pub use sanitize::sanitize;
