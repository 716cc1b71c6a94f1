//! Connection lifecycle and wire protocol types.

mod messages;
mod state;

pub use messages::{
    AlertPayload, CallInfo, ConnectedPayload, Envelope, HandoffPayload, InboundEnvelope,
    InboundMessage, MessageParseError, OutboundMessage, SpeechUpdatePayload,
};
pub use messages::tags;
pub use state::{ConnectionSnapshot, ConnectionState};
