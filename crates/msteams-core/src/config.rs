//! Transport configuration and the schema the settings UI renders from.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// Settings key of the webhook URL.
pub const URL_KEY: &str = "msteam-url";
/// Settings key of the connection method.
pub const METHOD_KEY: &str = "connection-method";
/// Settings key of the JSON checkbox.
pub const JSON_KEY: &str = "use-json";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("msteam-url is required")]
    MissingUrl,
    #[error("msteam-url is not a valid URL: {0}")]
    InvalidUrl(String),
    #[error("msteam-url must use http or https, found '{0}'")]
    UnsupportedScheme(String),
    #[error("unknown connection method '{0}' (expected Webhook or Workflow)")]
    UnknownMethod(String),
}

/// Outer envelope expected by the destination endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionMethod {
    /// Incoming webhook connector, takes MessageCard bodies.
    #[default]
    Webhook,
    /// Workflow (Power Automate) endpoint, takes AdaptiveCard attachments.
    Workflow,
}

impl ConnectionMethod {
    pub const ALL: [ConnectionMethod; 2] = [ConnectionMethod::Webhook, ConnectionMethod::Workflow];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Webhook => "Webhook",
            Self::Workflow => "Workflow",
        }
    }
}

impl fmt::Display for ConnectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownMethod(s.to_string()))
    }
}

/// Teams transport settings, as stored by the alerting pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(rename = "msteam-url", alias = "webhookUrl", default)]
    pub webhook_url: String,
    #[serde(rename = "connection-method", alias = "connectionMethod", default)]
    pub connection_method: ConnectionMethod,
    #[serde(
        rename = "use-json",
        alias = "useJson",
        default,
        deserialize_with = "deserialize_checkbox"
    )]
    pub use_json: bool,
}

impl TransportConfig {
    #[must_use]
    pub fn new(
        webhook_url: impl Into<String>,
        connection_method: ConnectionMethod,
        use_json: bool,
    ) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            connection_method,
            use_json,
        }
    }

    /// Reads the flat key/value form submitted by the settings UI.
    pub fn from_settings(settings: &BTreeMap<String, String>) -> Result<Self, ValidationError> {
        let webhook_url = settings.get(URL_KEY).cloned().unwrap_or_default();
        let connection_method = match settings.get(METHOD_KEY) {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => ConnectionMethod::default(),
        };
        let use_json = settings
            .get(JSON_KEY)
            .is_some_and(|raw| checkbox_checked(raw));

        Ok(Self {
            webhook_url,
            connection_method,
            use_json,
        })
    }

    /// Shorthand for [`ConfigSchema::validate`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        ConfigSchema::validate(self)
    }
}

fn checkbox_checked(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "on" | "true" | "1" | "yes"
    )
}

fn deserialize_checkbox<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Flag(bool),
        Text(String),
        Missing(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Flag(flag) => flag,
        Raw::Text(text) => checkbox_checked(&text),
        Raw::Missing(()) => false,
    })
}

/// One field of the settings form.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldSpec {
    pub title: &'static str,
    pub name: &'static str,
    pub descr: &'static str,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<&'static str, &'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Select,
    Checkbox,
}

/// Form fields plus per-field validation rules.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConfigTemplate {
    pub config: Vec<FieldSpec>,
    pub validation: BTreeMap<&'static str, &'static str>,
}

/// Describes and validates the Teams transport settings.
pub struct ConfigSchema;

impl ConfigSchema {
    #[must_use]
    pub fn template() -> ConfigTemplate {
        let methods = ConnectionMethod::ALL
            .into_iter()
            .map(|m| (m.as_str(), m.as_str()))
            .collect();

        ConfigTemplate {
            config: vec![
                FieldSpec {
                    title: "Teams URL",
                    name: URL_KEY,
                    descr: "Microsoft Teams Webhook URL",
                    kind: FieldKind::Text,
                    options: None,
                    default: None,
                },
                FieldSpec {
                    title: "Connection Method",
                    name: METHOD_KEY,
                    descr: "Webhook or Workflow",
                    kind: FieldKind::Select,
                    options: Some(methods),
                    default: None,
                },
                FieldSpec {
                    title: "Use JSON?",
                    name: JSON_KEY,
                    descr: "Compose MessageCard with JSON rather than Markdown. Your template must be valid MessageCard JSON",
                    kind: FieldKind::Checkbox,
                    options: None,
                    default: Some(false),
                },
            ],
            validation: BTreeMap::from([(URL_KEY, "required|url")]),
        }
    }

    /// Applies the `required|url` rule to the webhook URL.
    pub fn validate(config: &TransportConfig) -> Result<(), ValidationError> {
        let raw = config.webhook_url.trim();
        if raw.is_empty() {
            return Err(ValidationError::MissingUrl);
        }

        let url = Url::parse(raw).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(ValidationError::UnsupportedScheme(other.to_string())),
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(ValidationError::InvalidUrl("missing host".to_string()));
        }
        Ok(())
    }
}
