use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::MercuryError;

/// A frame received from Mercury.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Envelope {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub frame_type: Option<String>,
    pub data: Option<Value>,
    pub timestamp: Option<i64>,
    pub tracking_id: Option<String>,
    pub sequence_number: Option<u64>,
}

impl Envelope {
    pub fn parse(text: &str) -> Result<Self, MercuryError> {
        serde_json::from_str(text).map_err(|e| MercuryError::Decode(e.to_string()))
    }

    pub fn is_pong(&self) -> bool {
        self.frame_type.as_deref() == Some("pong")
    }

    pub fn event_type(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|data| data.get("eventType"))
            .and_then(Value::as_str)
    }
}

/// A frame sent to Mercury.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum OutboundFrame {
    Authorization { id: String, data: AuthorizationData },
    Ack {
        #[serde(rename = "messageId")]
        message_id: String,
    },
    Ping { id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct AuthorizationData {
    pub token: String,
}

impl OutboundFrame {
    pub fn authorization(access_token: &str) -> Self {
        Self::Authorization {
            id: new_id(),
            data: AuthorizationData {
                token: format!("Bearer {}", access_token),
            },
        }
    }

    pub fn ack(message_id: impl Into<String>) -> Self {
        Self::Ack {
            message_id: message_id.into(),
        }
    }

    pub fn ping() -> Self {
        Self::Ping { id: new_id() }
    }

    pub fn to_json(&self) -> Result<String, MercuryError> {
        serde_json::to_string(self).map_err(|e| MercuryError::Encode(e.to_string()))
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_event_envelope() {
        let envelope = Envelope::parse(
            r#"{
                "id": "msg-1",
                "data": {"eventType": "conversation.activity", "activity": {"verb": "post"}},
                "timestamp": 1480000000000,
                "trackingId": "suffix_abc",
                "sequenceNumber": 7
            }"#,
        )
        .unwrap();

        assert_eq!(envelope.id.as_deref(), Some("msg-1"));
        assert_eq!(envelope.event_type(), Some("conversation.activity"));
        assert_eq!(envelope.sequence_number, Some(7));
        assert!(!envelope.is_pong());
    }

    #[test]
    fn recognises_pong_frames() {
        let envelope = Envelope::parse(r#"{"id": "p-1", "type": "pong"}"#).unwrap();

        assert!(envelope.is_pong());
        assert_eq!(envelope.event_type(), None);
    }

    #[test]
    fn rejects_non_json_frames() {
        assert!(matches!(
            Envelope::parse("hello"),
            Err(MercuryError::Decode(_))
        ));
    }

    #[test]
    fn outbound_frames_use_mercury_shapes() {
        let ack: Value = serde_json::from_str(&OutboundFrame::ack("msg-1").to_json().unwrap()).unwrap();
        assert_eq!(ack, json!({"type": "ack", "messageId": "msg-1"}));

        let auth: Value =
            serde_json::from_str(&OutboundFrame::authorization("abc").to_json().unwrap()).unwrap();
        assert_eq!(auth["type"], "authorization");
        assert_eq!(auth["data"]["token"], "Bearer abc");
        assert!(auth["id"].is_string());

        let ping: Value = serde_json::from_str(&OutboundFrame::ping().to_json().unwrap()).unwrap();
        assert_eq!(ping["type"], "ping");
    }
}
