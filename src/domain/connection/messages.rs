//! Wire protocol for the live event stream.
//!
//! Every frame, in both directions, is a JSON envelope:
//!
//! ```text
//! { "type": "<tag>", "data": { ... }, "timestamp": "2025-01-10T00:00:00.000Z" }
//! ```
//!
//! Inbound frames are decoded into the closed [`InboundMessage`] sum type.
//! Tags this client does not know become [`InboundMessage::Unknown`] so new
//! server-side event types reach a fallback handler instead of vanishing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use thiserror::Error;

use crate::domain::foundation::Timestamp;
use crate::domain::notification::AlertSeverity;

/// Inbound tags with a dedicated payload type.
pub mod tags {
    pub const CONNECTED: &str = "connected";
    pub const PONG: &str = "pong";
    pub const CALL_STARTED: &str = "call-started";
    pub const CALL_ENDED: &str = "call-ended";
    pub const SPEECH_UPDATE: &str = "speech-update";
    pub const HANDOFF_TRIGGERED: &str = "handoff-triggered";
    pub const ALERT: &str = "alert";
    /// Suffix of `<domain>-event` passthrough tags.
    pub const DOMAIN_EVENT_SUFFIX: &str = "-event";

    pub const SUBSCRIBE: &str = "subscribe";
    pub const PING: &str = "ping";
}

// ============================================
// Envelope
// ============================================

/// Raw wire envelope shared by both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Why an inbound frame could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageParseError {
    #[error("Frame is not a valid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Payload for '{kind}' is malformed: {reason}")]
    InvalidPayload { kind: String, reason: String },
}

// ============================================
// Server → Client
// ============================================

/// Payload of the `connected` greeting.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    pub client_id: Option<String>,
    pub message: Option<String>,
}

/// Payload of `call-started` / `call-ended`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallInfo {
    #[serde(alias = "id")]
    pub call_id: String,
    pub agent_id: Option<String>,
    pub client_id: Option<String>,
    #[serde(alias = "duration")]
    pub duration_secs: Option<u64>,
}

/// Streaming partial transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechUpdatePayload {
    pub call_id: String,
    pub speaker: Option<String>,
    #[serde(alias = "transcript")]
    pub text: String,
    #[serde(default)]
    pub is_final: bool,
}

/// Escalation of a call to a human.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffPayload {
    pub call_id: String,
    pub reason: Option<String>,
    pub target: Option<String>,
}

/// Operational alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPayload {
    #[serde(default)]
    pub severity: AlertSeverity,
    pub message: String,
    pub title: Option<String>,
}

/// Decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Connected(ConnectedPayload),
    /// Keepalive acknowledgement.
    Pong,
    /// `<domain>-event` passthrough; `event_type` is the embedded sub-type.
    DomainEvent {
        domain: String,
        event_type: Option<String>,
        payload: Value,
    },
    CallStarted(CallInfo),
    CallEnded(CallInfo),
    SpeechUpdate(SpeechUpdatePayload),
    HandoffTriggered(HandoffPayload),
    Alert(AlertPayload),
    /// Any tag this client has no payload type for.
    Unknown { kind: String, data: Value },
}

impl InboundMessage {
    /// Decodes a message from its envelope.
    pub fn from_envelope(envelope: Envelope) -> Result<Self, MessageParseError> {
        let Envelope { kind, data, .. } = envelope;

        let message = match kind.as_str() {
            tags::CONNECTED => InboundMessage::Connected(payload(&kind, data)?),
            tags::PONG => InboundMessage::Pong,
            tags::CALL_STARTED => InboundMessage::CallStarted(payload(&kind, data)?),
            tags::CALL_ENDED => InboundMessage::CallEnded(payload(&kind, data)?),
            tags::SPEECH_UPDATE => InboundMessage::SpeechUpdate(payload(&kind, data)?),
            tags::HANDOFF_TRIGGERED => InboundMessage::HandoffTriggered(payload(&kind, data)?),
            tags::ALERT => InboundMessage::Alert(payload(&kind, data)?),
            other => match domain_of(other) {
                Some(domain) => {
                    let payload = data.unwrap_or(Value::Null);
                    let event_type = ["type", "event", "subType"]
                        .iter()
                        .find_map(|field| payload.get(*field).and_then(Value::as_str))
                        .map(str::to_string);
                    InboundMessage::DomainEvent {
                        domain: domain.to_string(),
                        event_type,
                        payload,
                    }
                }
                None => InboundMessage::Unknown {
                    kind,
                    data: data.unwrap_or(Value::Null),
                },
            },
        };

        Ok(message)
    }

    /// The wire tag handlers are registered under.
    pub fn tag(&self) -> Cow<'_, str> {
        match self {
            InboundMessage::Connected(_) => Cow::Borrowed(tags::CONNECTED),
            InboundMessage::Pong => Cow::Borrowed(tags::PONG),
            InboundMessage::DomainEvent { domain, .. } => {
                Cow::Owned(format!("{domain}{}", tags::DOMAIN_EVENT_SUFFIX))
            }
            InboundMessage::CallStarted(_) => Cow::Borrowed(tags::CALL_STARTED),
            InboundMessage::CallEnded(_) => Cow::Borrowed(tags::CALL_ENDED),
            InboundMessage::SpeechUpdate(_) => Cow::Borrowed(tags::SPEECH_UPDATE),
            InboundMessage::HandoffTriggered(_) => Cow::Borrowed(tags::HANDOFF_TRIGGERED),
            InboundMessage::Alert(_) => Cow::Borrowed(tags::ALERT),
            InboundMessage::Unknown { kind, .. } => Cow::Borrowed(kind.as_str()),
        }
    }
}

/// An inbound message together with its delivery metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEnvelope {
    pub message: InboundMessage,
    /// Server-side timestamp, when present and well-formed.
    pub sent_at: Option<Timestamp>,
    pub received_at: Timestamp,
}

impl InboundEnvelope {
    /// Parses one text frame.
    pub fn parse(frame: &str) -> Result<Self, MessageParseError> {
        let envelope: Envelope = serde_json::from_str(frame)
            .map_err(|e| MessageParseError::InvalidEnvelope(e.to_string()))?;
        let sent_at = envelope
            .timestamp
            .as_deref()
            .and_then(Timestamp::parse_rfc3339);

        Ok(Self {
            message: InboundMessage::from_envelope(envelope)?,
            sent_at,
            received_at: Timestamp::now(),
        })
    }

    pub fn tag(&self) -> Cow<'_, str> {
        self.message.tag()
    }
}

fn domain_of(kind: &str) -> Option<&str> {
    kind.strip_suffix(tags::DOMAIN_EVENT_SUFFIX)
        .filter(|domain| !domain.is_empty())
}

fn payload<T: DeserializeOwned>(kind: &str, data: Option<Value>) -> Result<T, MessageParseError> {
    let data = data.unwrap_or_else(|| Value::Object(Map::new()));
    serde_json::from_value(data).map_err(|e| MessageParseError::InvalidPayload {
        kind: kind.to_string(),
        reason: e.to_string(),
    })
}

// ============================================
// Client → Server
// ============================================

/// Messages this client sends.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// Register interest in a logical channel; sent after every open.
    Subscribe { channel: String },
    /// Liveness probe.
    Ping,
    /// Application-defined message.
    Custom { kind: String, data: Option<Value> },
}

impl OutboundMessage {
    pub fn subscribe(channel: impl Into<String>) -> Self {
        OutboundMessage::Subscribe {
            channel: channel.into(),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            OutboundMessage::Subscribe { .. } => tags::SUBSCRIBE,
            OutboundMessage::Ping => tags::PING,
            OutboundMessage::Custom { kind, .. } => kind,
        }
    }

    /// Builds the envelope stamped with `at`.
    pub fn to_envelope(&self, at: Timestamp) -> Envelope {
        let data = match self {
            OutboundMessage::Subscribe { channel } => Some(serde_json::json!({ "channel": channel })),
            OutboundMessage::Ping => None,
            OutboundMessage::Custom { data, .. } => data.clone(),
        };

        Envelope {
            kind: self.kind().to_string(),
            data,
            timestamp: Some(at.to_rfc3339()),
        }
    }

    /// Serializes to a text frame stamped with the current time.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_envelope(Timestamp::now()))
    }
}
