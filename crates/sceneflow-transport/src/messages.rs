//! Wire envelopes and service request plumbing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One envelope per line on the wire, JSON encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Envelope {
    /// Service call. Sent by this node for outgoing requests; received for
    /// requests addressed to a service this node advertised.
    #[serde(rename = "request")]
    Request {
        /// Correlation id, unique per direction
        id: u64,
        /// Service name
        service: String,
        /// Request payload
        #[serde(default)]
        payload: Value,
    },
    /// Answer to a request with the same id.
    #[serde(rename = "response")]
    Response {
        /// Correlation id of the request being answered
        id: u64,
        /// Whether the service succeeded
        ok: bool,
        /// Response payload
        #[serde(default)]
        payload: Value,
    },
    /// Register interest in a topic.
    #[serde(rename = "subscribe")]
    Subscribe {
        /// Topic name
        topic: String,
    },
    /// Message published on a topic this node subscribed to.
    #[serde(rename = "publication")]
    Publication {
        /// Topic name
        topic: String,
        /// Published payload
        payload: Value,
    },
    /// Register a service this node answers.
    #[serde(rename = "advertise")]
    Advertise {
        /// Service name
        service: String,
    },
}

/// An incoming call to a service this node advertised.
///
/// Dropping the request without calling [`ServiceRequest::respond`] leaves
/// the caller waiting until its own timeout; handlers should always respond.
#[derive(Debug)]
pub struct ServiceRequest {
    /// Request payload as sent by the caller
    pub payload: Value,
    pub(crate) id: u64,
    pub(crate) reply: tokio::sync::mpsc::UnboundedSender<Envelope>,
}

impl ServiceRequest {
    /// Send the service result back to the caller.
    pub fn respond(self, ok: bool) {
        let envelope = Envelope::Response {
            id: self.id,
            ok,
            payload: Value::Null,
        };
        if self.reply.send(envelope).is_err() {
            tracing::warn!("Service response dropped: connection closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_roundtrip() {
        let envelope = Envelope::Request {
            id: 7,
            service: "/scene".to_string(),
            payload: Value::Null,
        };
        let json = serde_json::to_string(&envelope).expect("serialize");
        assert!(json.contains("\"type\":\"request\""));

        match serde_json::from_str(&json).expect("deserialize") {
            Envelope::Request { id, service, .. } => {
                assert_eq!(id, 7);
                assert_eq!(service, "/scene");
            }
            other => panic!("unexpected envelope: {:?}", other),
        }
    }

    #[test]
    fn test_request_payload_defaults_to_null() {
        let json = r#"{"type":"request","id":1,"service":"/scene"}"#;
        match serde_json::from_str(json).expect("deserialize") {
            Envelope::Request { payload, .. } => assert!(payload.is_null()),
            other => panic!("unexpected envelope: {:?}", other),
        }
    }
}
