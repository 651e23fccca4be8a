//! Alert events handed to the transport by the alerting pipeline.
//!
//! An [`AlertEvent`] is produced upstream (rule evaluation and templating
//! happen there) and is read-only for everything in this crate.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Alert uid that marks a self-test invocation rather than a real alert.
pub const SELF_TEST_UID: &str = "000";

/// Alert state as reported by the alerting pipeline.
///
/// Deserializes from either the lowercase name or the numeric state code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    Clear,
    Active,
    Acknowledged,
    Worse,
    Better,
    Changed,
}

impl AlertState {
    /// Maps the numeric state code used by the pipeline.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Clear),
            1 => Some(Self::Active),
            2 => Some(Self::Acknowledged),
            3 => Some(Self::Worse),
            4 => Some(Self::Better),
            5 => Some(Self::Changed),
            _ => None,
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "clear" | "ok" | "recovered" => Some(Self::Clear),
            "active" | "alert" => Some(Self::Active),
            "acknowledged" | "ack" => Some(Self::Acknowledged),
            "worse" => Some(Self::Worse),
            "better" => Some(Self::Better),
            "changed" => Some(Self::Changed),
            other => other.parse::<i64>().ok().and_then(Self::from_code),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Active => "active",
            Self::Acknowledged => "acknowledged",
            Self::Worse => "worse",
            Self::Better => "better",
            Self::Changed => "changed",
        }
    }
}

impl fmt::Display for AlertState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AlertState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Code(i64),
            Name(String),
        }

        let state = match Raw::deserialize(deserializer)? {
            Raw::Code(code) => {
                Self::from_code(code).ok_or_else(|| format!("unknown alert state code {code}"))
            }
            Raw::Name(name) => {
                Self::from_name(&name).ok_or_else(|| format!("unknown alert state '{name}'"))
            }
        };
        state.map_err(serde::de::Error::custom)
    }
}

/// A generated alert, ready for delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertEvent {
    /// Short headline, also used as the card summary.
    pub title: String,
    /// Rendered alert body. Rich text in markdown mode, a JSON document in
    /// JSON mode.
    #[serde(alias = "msg")]
    pub message: String,
    pub state: AlertState,
    /// Alert instance identifier. [`SELF_TEST_UID`] marks a self-test.
    pub uid: String,
}

impl AlertEvent {
    /// Builds the event used to test a transport configuration.
    #[must_use]
    pub fn self_test() -> Self {
        Self {
            title: "Test MessageCard".to_string(),
            message: "You have successfully sent a test alert to teams.".to_string(),
            state: AlertState::Active,
            uid: SELF_TEST_UID.to_string(),
        }
    }

    #[must_use]
    pub fn is_self_test(&self) -> bool {
        self.uid == SELF_TEST_UID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn alert_event_from_pipeline_json() {
        let event: AlertEvent = serde_json::from_value(json!({
            "title": "Device down",
            "msg": "<p>core-sw1 is unreachable</p>",
            "state": 1,
            "uid": "4711"
        }))
        .expect("Deserialization failed");

        assert_eq!(event.title, "Device down");
        assert_eq!(event.message, "<p>core-sw1 is unreachable</p>");
        assert_eq!(event.state, AlertState::Active);
        assert!(!event.is_self_test());
    }

    #[test]
    fn alert_state_accepts_names_and_codes() {
        let named: AlertState = serde_json::from_value(json!("acknowledged")).expect("name");
        let coded: AlertState = serde_json::from_value(json!(2)).expect("code");
        let quoted: AlertState = serde_json::from_value(json!("2")).expect("quoted code");
        assert_eq!(named, AlertState::Acknowledged);
        assert_eq!(coded, named);
        assert_eq!(quoted, named);

        assert!(serde_json::from_value::<AlertState>(json!(42)).is_err());
        assert!(serde_json::from_value::<AlertState>(json!("sideways")).is_err());
    }

    #[test]
    fn alert_state_serializes_lowercase() {
        let serialized = serde_json::to_string(&AlertState::Worse).expect("Serialization failed");
        assert_eq!(serialized, "\"worse\"");
        assert_eq!(AlertState::Worse.to_string(), "worse");
    }

    #[test]
    fn self_test_event_uses_sentinel_uid() {
        let event = AlertEvent::self_test();
        assert_eq!(event.uid, SELF_TEST_UID);
        assert!(event.is_self_test());
    }
}
