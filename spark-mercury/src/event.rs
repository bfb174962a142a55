use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::{envelope::Envelope, MercuryError};

/// Emitted once the socket is open and authorized.
pub const ONLINE: &str = "online";
/// Emitted when the socket goes away, whether requested or not.
pub const OFFLINE: &str = "offline";
/// Prefix of every event name derived from a Mercury `eventType`.
pub const EVENT_PREFIX: &str = "event:";

/// An event delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct MercuryEvent {
    /// Name the event was routed under, e.g. `event:conversation.activity`.
    pub name: String,
    pub id: Option<String>,
    pub event_type: Option<String>,
    pub data: Value,
    pub timestamp: Option<i64>,
    pub tracking_id: Option<String>,
    pub sequence_number: Option<u64>,
}

impl MercuryEvent {
    pub(crate) fn lifecycle(name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: None,
            event_type: None,
            data: Value::Null,
            timestamp: None,
            tracking_id: None,
            sequence_number: None,
        }
    }

    /// Builds one event per name the envelope is routed under: the namespace
    /// (`event:conversation`) and the full type (`event:conversation.activity`).
    pub(crate) fn from_envelope(envelope: &Envelope) -> Vec<Self> {
        let Some(event_type) = envelope.event_type() else {
            return Vec::new();
        };

        event_names(event_type)
            .into_iter()
            .map(|name| Self {
                name,
                id: envelope.id.clone(),
                event_type: Some(event_type.to_string()),
                data: envelope.data.clone().unwrap_or(Value::Null),
                timestamp: envelope.timestamp,
                tracking_id: envelope.tracking_id.clone(),
                sequence_number: envelope.sequence_number,
            })
            .collect()
    }

    /// The conversation activity carried by this event, if any.
    ///
    /// Encrypted fields are returned as received.
    pub fn activity(&self) -> Result<Option<Activity>, MercuryError> {
        match self.data.get("activity") {
            Some(activity) => serde_json::from_value(activity.clone())
                .map(Some)
                .map_err(|e| MercuryError::Decode(e.to_string())),
            None => Ok(None),
        }
    }
}

pub fn event_names(event_type: &str) -> Vec<String> {
    let full = format!("{EVENT_PREFIX}{event_type}");
    match event_type.split_once('.') {
        Some((namespace, _)) => vec![format!("{EVENT_PREFIX}{namespace}"), full],
        None => vec![full],
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub verb: String,
    pub actor: Option<ActivityActor>,
    pub object: Option<ActivityObject>,
    pub target: Option<ActivityTarget>,
    pub client_temp_id: Option<String>,
    pub encryption_key_url: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub published: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityActor {
    pub id: Option<String>,
    pub object_type: Option<String>,
    pub display_name: Option<String>,
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityObject {
    pub object_type: Option<String>,
    pub display_name: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityTarget {
    pub id: Option<String>,
    pub object_type: Option<String>,
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity_envelope() -> Envelope {
        Envelope::parse(
            r#"{
                "id": "msg-1",
                "data": {
                    "eventType": "conversation.activity",
                    "activity": {
                        "id": "act-1",
                        "verb": "post",
                        "actor": {"id": "user-1", "objectType": "person", "displayName": "Kirk"},
                        "object": {"objectType": "comment", "displayName": "Dammit Jim"},
                        "target": {"id": "conv-1", "objectType": "conversation"},
                        "clientTempId": "tmp-1",
                        "encryptionKeyUrl": "kms://kms.example.com/keys/1",
                        "published": "2016-11-01T10:00:00.000Z"
                    }
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn event_names_include_namespace_and_full_type() {
        assert_eq!(
            event_names("conversation.activity"),
            vec!["event:conversation", "event:conversation.activity"]
        );
        assert_eq!(event_names("status"), vec!["event:status"]);
    }

    #[test]
    fn envelope_fans_out_to_both_names() {
        let events = MercuryEvent::from_envelope(&activity_envelope());

        let names = events.iter().map(|e| e.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["event:conversation", "event:conversation.activity"]);
        assert!(events.iter().all(|e| e.id.as_deref() == Some("msg-1")));
    }

    #[test]
    fn envelope_without_event_type_produces_no_events() {
        let envelope = Envelope::parse(r#"{"id": "x", "data": {}}"#).unwrap();

        assert!(MercuryEvent::from_envelope(&envelope).is_empty());
    }

    #[test]
    fn activity_is_normalized() {
        let events = MercuryEvent::from_envelope(&activity_envelope());
        let activity = events[0].activity().unwrap().unwrap();

        assert_eq!(activity.verb, "post");
        assert_eq!(activity.client_temp_id.as_deref(), Some("tmp-1"));
        assert_eq!(
            activity.object.and_then(|o| o.display_name).as_deref(),
            Some("Dammit Jim")
        );
        assert_eq!(
            activity.encryption_key_url.as_deref(),
            Some("kms://kms.example.com/keys/1")
        );
        assert!(activity.published.is_some());
    }

    #[test]
    fn lifecycle_events_carry_no_activity() {
        assert_eq!(MercuryEvent::lifecycle(ONLINE).activity().unwrap(), None);
    }
}
