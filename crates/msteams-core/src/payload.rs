//! Wire payloads for Teams webhooks and workflows.
//!
//! [`CardMode::select`] decides which of the payload shapes a delivery uses;
//! [`build`] turns the selection into a [`WirePayload`]. Nothing here
//! performs I/O.

use crate::color::StateColors;
use crate::config::{ConnectionMethod, TransportConfig};
use crate::event::AlertEvent;
use crate::sanitize::sanitize;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::LazyLock;
use thiserror::Error;

/// Attachment content type of AdaptiveCards in workflow messages.
pub const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";

const CARD_REFERENCE_URL: &str =
    "https://learn.microsoft.com/en-us/outlook/actionable-messages/message-card-reference";
const PROJECT_HOMEPAGE_URL: &str = "https://www.librenms.org/";
const TEST_SUCCESS_TEXT: &str =
    "You have successfully sent a pre-formatted MessageCard message to teams.";

/// MessageCard sent for webhook self-tests.
pub static WEBHOOK_TEST_CARD: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "@context": "https://schema.org/extensions",
        "@type": "MessageCard",
        "potentialAction": [
            {
                "@type": "OpenUri",
                "name": "View MessageCard Reference",
                "targets": [{ "os": "default", "uri": CARD_REFERENCE_URL }]
            },
            {
                "@type": "OpenUri",
                "name": "View LibreNMS Website",
                "targets": [{ "os": "default", "uri": PROJECT_HOMEPAGE_URL }]
            }
        ],
        "sections": [
            {
                "facts": [
                    {
                        "name": "Next Action:",
                        "value": "Make your alert template emit valid MessageCard Json"
                    }
                ],
                "text": TEST_SUCCESS_TEXT
            }
        ],
        "summary": "Test Successful",
        "themeColor": "0072C6",
        "title": "Test MessageCard"
    })
});

/// AdaptiveCard content sent for workflow self-tests.
pub static WORKFLOW_TEST_CARD: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
        "type": "AdaptiveCard",
        "version": "1.6",
        "body": [
            {
                "type": "TextBlock",
                "text": "Test MessageCard",
                "size": "Medium",
                "weight": "Bolder",
                "wrap": true
            },
            {
                "type": "TextBlock",
                "text": TEST_SUCCESS_TEXT,
                "wrap": true
            }
        ],
        "actions": [
            {
                "type": "Action.OpenUrl",
                "title": "View MessageCard Reference",
                "url": CARD_REFERENCE_URL
            },
            {
                "type": "Action.OpenUrl",
                "title": "View LibreNMS Website",
                "url": PROJECT_HOMEPAGE_URL
            }
        ],
        "themeColor": "0072C6",
        "summary": "Test Successful"
    })
});

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("alert message is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Summary card fields. Sent as the body in markdown mode and always
/// reported alongside JSON bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCard {
    pub title: String,
    pub theme_color: String,
    pub text: String,
    pub summary: String,
}

impl MessageCard {
    pub fn from_event(event: &AlertEvent, colors: &impl StateColors) -> Self {
        Self {
            title: event.title.clone(),
            theme_color: colors.color_for_state(event.state),
            text: sanitize(&event.message),
            summary: event.title.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowAttachment {
    #[serde(rename = "contentType")]
    pub content_type: String,
    pub content: Value,
}

/// `{"type": "message", "attachments": [...]}` wrapper used by workflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub attachments: Vec<WorkflowAttachment>,
}

impl WorkflowEnvelope {
    #[must_use]
    pub fn adaptive_card(content: Value) -> Self {
        Self {
            kind: "message".to_string(),
            attachments: vec![WorkflowAttachment {
                content_type: ADAPTIVE_CARD_CONTENT_TYPE.to_string(),
                content,
            }],
        }
    }

    /// Content of the first attachment.
    #[must_use]
    pub fn card(&self) -> Option<&Value> {
        self.attachments.first().map(|a| &a.content)
    }
}

/// Request body selected for a delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// The summary card itself is the body.
    Card,
    /// AdaptiveCard wrapped for a workflow endpoint.
    Workflow(WorkflowEnvelope),
    /// A MessageCard document, forwarded as-is.
    Raw(String),
}

/// Everything needed to issue the request.
#[derive(Debug, Clone, PartialEq)]
pub struct WirePayload {
    pub card: MessageCard,
    pub body: Body,
}

impl WirePayload {
    /// Serialized request body. JSON bodies use `application/json`.
    pub fn body_json(&self) -> serde_json::Result<String> {
        match &self.body {
            Body::Card => serde_json::to_string(&self.card),
            Body::Workflow(envelope) => serde_json::to_string(envelope),
            Body::Raw(raw) => Ok(raw.clone()),
        }
    }

    #[must_use]
    pub fn is_json_body(&self) -> bool {
        !matches!(self.body, Body::Card)
    }
}

/// Payload shape chosen from `(use_json, connection_method, self-test)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardMode {
    Markdown,
    WorkflowTest,
    WorkflowJson,
    WebhookTest,
    WebhookJson,
}

impl CardMode {
    #[must_use]
    pub fn select(event: &AlertEvent, config: &TransportConfig) -> Self {
        match (config.use_json, config.connection_method, event.is_self_test()) {
            (false, _, _) => Self::Markdown,
            (true, ConnectionMethod::Workflow, true) => Self::WorkflowTest,
            (true, ConnectionMethod::Workflow, false) => Self::WorkflowJson,
            (true, ConnectionMethod::Webhook, true) => Self::WebhookTest,
            (true, ConnectionMethod::Webhook, false) => Self::WebhookJson,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::WorkflowTest => "workflow-test",
            Self::WorkflowJson => "workflow-json",
            Self::WebhookTest => "webhook-test",
            Self::WebhookJson => "webhook-json",
        }
    }
}

/// Builds the payload for one delivery.
pub fn build(
    event: &AlertEvent,
    config: &TransportConfig,
    colors: &impl StateColors,
) -> Result<WirePayload, PayloadError> {
    let card = MessageCard::from_event(event, colors);

    let body = match CardMode::select(event, config) {
        CardMode::Markdown => Body::Card,
        CardMode::WorkflowTest => {
            Body::Workflow(WorkflowEnvelope::adaptive_card(WORKFLOW_TEST_CARD.clone()))
        }
        CardMode::WorkflowJson => {
            let content: Value = serde_json::from_str(&event.message)?;
            Body::Workflow(WorkflowEnvelope::adaptive_card(content))
        }
        CardMode::WebhookTest => Body::Raw(WEBHOOK_TEST_CARD.to_string()),
        CardMode::WebhookJson => {
            serde_json::from_str::<serde::de::IgnoredAny>(&event.message)?;
            Body::Raw(event.message.clone())
        }
    };

    Ok(WirePayload { card, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::DefaultStateColors;
    use crate::event::{AlertState, SELF_TEST_UID};

    const URL: &str = "https://hooks.example/teams";

    fn event(uid: &str, message: &str) -> AlertEvent {
        AlertEvent {
            title: "Device down".to_string(),
            message: message.to_string(),
            state: AlertState::Active,
            uid: uid.to_string(),
        }
    }

    #[test]
    fn markdown_mode_ignores_connection_method() {
        let alert = event("17", "<p>down</p><script>x()</script>");
        for method in ConnectionMethod::ALL {
            let config = TransportConfig::new(URL, method, false);
            let payload = build(&alert, &config, &DefaultStateColors).expect("markdown build");
            assert_eq!(payload.body, Body::Card);
            assert_eq!(payload.card.text, "<p>down</p>x()");
            assert!(!payload.is_json_body());
        }
    }

    #[test]
    fn markdown_mode_sends_summary_card() {
        let alert = event("17", "**down**");
        let config = TransportConfig::new(URL, ConnectionMethod::Webhook, false);
        let payload = build(&alert, &config, &DefaultStateColors).expect("build");
        let sent = payload.body_json().expect("serialize");
        let body: Value = serde_json::from_str(&sent).expect("json");
        assert_eq!(
            body,
            json!({
                "title": "Device down",
                "themeColor": "#FF0000",
                "text": "**down**",
                "summary": "Device down"
            })
        );
    }

    #[test]
    fn self_test_uid_selects_canned_cards() {
        let workflow = TransportConfig::new(URL, ConnectionMethod::Workflow, true);
        let webhook = TransportConfig::new(URL, ConnectionMethod::Webhook, true);

        for message in ["", "not json", r#"{"type":"AdaptiveCard"}"#] {
            let alert = event(SELF_TEST_UID, message);

            let payload = build(&alert, &workflow, &DefaultStateColors).expect("workflow test");
            match &payload.body {
                Body::Workflow(envelope) => {
                    assert_eq!(envelope.card(), Some(&*WORKFLOW_TEST_CARD));
                }
                other => panic!("expected workflow body, got {other:?}"),
            }

            let payload = build(&alert, &webhook, &DefaultStateColors).expect("webhook test");
            match &payload.body {
                Body::Raw(raw) => {
                    let sent: Value = serde_json::from_str(raw).expect("canned card is json");
                    assert_eq!(sent, *WEBHOOK_TEST_CARD);
                }
                other => panic!("expected raw body, got {other:?}"),
            }
        }
    }

    #[test]
    fn canned_cards_link_reference_and_homepage() {
        let actions = WORKFLOW_TEST_CARD["actions"].as_array().expect("actions");
        let urls: Vec<_> = actions.iter().filter_map(|a| a["url"].as_str()).collect();
        assert_eq!(urls, vec![CARD_REFERENCE_URL, PROJECT_HOMEPAGE_URL]);

        let potential = WEBHOOK_TEST_CARD["potentialAction"].as_array().expect("actions");
        let uris: Vec<_> = potential
            .iter()
            .filter_map(|a| a["targets"][0]["uri"].as_str())
            .collect();
        assert_eq!(uris, vec![CARD_REFERENCE_URL, PROJECT_HOMEPAGE_URL]);
        assert_eq!(WEBHOOK_TEST_CARD["title"], "Test MessageCard");
    }

    #[test]
    fn workflow_json_embeds_message_verbatim() {
        let card = json!({
            "type": "AdaptiveCard",
            "version": "1.4",
            "body": [{"type": "TextBlock", "text": "core-sw1 down"}]
        });
        let alert = event("4711", &card.to_string());
        let config = TransportConfig::new(URL, ConnectionMethod::Workflow, true);

        let payload = build(&alert, &config, &DefaultStateColors).expect("build");
        let sent = payload.body_json().expect("serialize");
        let body: Value = serde_json::from_str(&sent).expect("json");
        assert_eq!(body["type"], "message");
        assert_eq!(body["attachments"][0]["contentType"], ADAPTIVE_CARD_CONTENT_TYPE);
        assert_eq!(body["attachments"][0]["content"], card);
        assert_eq!(payload.card.title, "Device down");
    }

    #[test]
    fn workflow_json_rejects_invalid_message() {
        let alert = event("4711", "<p>not json</p>");
        let config = TransportConfig::new(URL, ConnectionMethod::Workflow, true);
        assert!(matches!(
            build(&alert, &config, &DefaultStateColors),
            Err(PayloadError::InvalidJson(_))
        ));
    }

    #[test]
    fn webhook_json_forwards_raw_string() {
        let raw = "{ \"@type\": \"MessageCard\",\n  \"text\": \"spacing kept\" }";
        let alert = event("4711", raw);
        let config = TransportConfig::new(URL, ConnectionMethod::Webhook, true);

        let payload = build(&alert, &config, &DefaultStateColors).expect("build");
        assert_eq!(payload.body, Body::Raw(raw.to_string()));
        assert_eq!(payload.body_json().expect("raw"), raw);
        assert!(payload.is_json_body());
    }

    #[test]
    fn webhook_json_rejects_malformed_message() {
        let alert = event("4711", "{\"@type\": ");
        let config = TransportConfig::new(URL, ConnectionMethod::Webhook, true);
        assert!(matches!(
            build(&alert, &config, &DefaultStateColors),
            Err(PayloadError::InvalidJson(_))
        ));
    }

    #[test]
    fn summary_fields_present_in_every_mode() {
        let alert = event("4711", r#"{"type":"AdaptiveCard"}"#);
        for (method, use_json) in [
            (ConnectionMethod::Webhook, false),
            (ConnectionMethod::Webhook, true),
            (ConnectionMethod::Workflow, false),
            (ConnectionMethod::Workflow, true),
        ] {
            let config = TransportConfig::new(URL, method, use_json);
            let payload = build(&alert, &config, &DefaultStateColors).expect("build");
            assert_eq!(payload.card.title, "Device down");
            assert_eq!(payload.card.summary, "Device down");
            assert_eq!(payload.card.theme_color, "#FF0000");
        }
    }

    #[test]
    fn card_mode_dispatch_table() {
        let real = event("1", "");
        let test = event(SELF_TEST_UID, "");
        let cfg = |method, use_json| TransportConfig::new(URL, method, use_json);

        let cases = [
            (&test, ConnectionMethod::Workflow, false, CardMode::Markdown),
            (&real, ConnectionMethod::Webhook, false, CardMode::Markdown),
            (&test, ConnectionMethod::Workflow, true, CardMode::WorkflowTest),
            (&real, ConnectionMethod::Workflow, true, CardMode::WorkflowJson),
            (&test, ConnectionMethod::Webhook, true, CardMode::WebhookTest),
            (&real, ConnectionMethod::Webhook, true, CardMode::WebhookJson),
        ];
        for (alert, method, use_json, expected) in cases {
            assert_eq!(CardMode::select(alert, &cfg(method, use_json)), expected);
        }
    }
}
