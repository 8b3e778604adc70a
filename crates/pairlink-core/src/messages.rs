//! Wire message models
//!
//! Messages travel as JSON objects carrying an `action` discriminant.
//! Clients identify themselves with a `helo` handshake; everything else the
//! server sends is addressed by the device identity bound at that handshake.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Client-supplied key identifying one logical device across reconnects
pub type DeviceId = String;

/// A named server-side output configuration advertised to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputProfile {
    pub name: String,
}

impl OutputProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Inbound message from a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    /// Liveness probe, no payload
    Ping,

    /// Identification handshake binding the connection to a device identity
    #[serde(rename_all = "camelCase")]
    Helo {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        device_id: Option<DeviceId>,
        /// Client's last completed sync, consumed by the sync collaborator
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_sync: Option<i64>,
    },

    /// Any action this server does not recognize
    #[serde(other)]
    Unknown,
}

/// Outbound message to a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Response {
    /// Liveness acknowledgment
    Pong,

    /// Handshake acknowledgment carrying server capability metadata
    #[serde(rename_all = "camelCase")]
    Helo {
        version: String,
        output_profiles: Vec<OutputProfile>,
        /// Legacy flag kept for older clients; always false
        quantity_enabled: bool,
    },

    /// Settings-change fan-out to every connected device
    #[serde(rename_all = "camelCase")]
    UpdateOutputProfiles { output_profiles: Vec<OutputProfile> },

    /// Server-initiated eviction notice; the transport closes the connection
    Kick,
}

/// Encode an outbound message as JSON
pub fn encode(msg: &Response) -> Result<Bytes> {
    let data = serde_json::to_vec(msg).map_err(|e| Error::Encode(e.to_string()))?;
    Ok(Bytes::from(data))
}

/// Decode an inbound message from JSON
pub fn decode(raw: &[u8]) -> Result<Request> {
    serde_json::from_slice(raw).map_err(|e| Error::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_ping() {
        let req = decode(br#"{"action":"ping"}"#).unwrap();
        assert_eq!(req, Request::Ping);
    }

    #[test]
    fn decode_helo_with_identity() {
        let req = decode(br#"{"action":"helo","deviceId":"42","lastSync":1700000000}"#).unwrap();
        assert_eq!(
            req,
            Request::Helo {
                device_id: Some("42".to_string()),
                last_sync: Some(1_700_000_000),
            }
        );
    }

    #[test]
    fn decode_helo_without_identity() {
        let req = decode(br#"{"action":"helo"}"#).unwrap();
        assert_eq!(
            req,
            Request::Helo {
                device_id: None,
                last_sync: None,
            }
        );
    }

    #[test]
    fn unknown_action_is_tolerated() {
        let req = decode(br#"{"action":"putInCloud","payload":[1,2,3]}"#).unwrap();
        assert_eq!(req, Request::Unknown);
    }

    #[test]
    fn decode_rejects_non_json() {
        assert!(decode(b"not json at all").is_err());
    }

    #[test]
    fn encode_pong_carries_action_tag() {
        let data = encode(&Response::Pong).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&data).unwrap();
        assert_eq!(value["action"], "pong");
    }

    #[test]
    fn encode_helo_ack_field_names() {
        let data = encode(&Response::Helo {
            version: "0.5.0".to_string(),
            output_profiles: vec![OutputProfile::new("Profile 1")],
            quantity_enabled: false,
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&data).unwrap();
        assert_eq!(value["action"], "helo");
        assert_eq!(value["version"], "0.5.0");
        assert_eq!(value["outputProfiles"][0]["name"], "Profile 1");
        assert_eq!(value["quantityEnabled"], false);
    }

    #[test]
    fn encode_update_output_profiles_tag() {
        let data = encode(&Response::UpdateOutputProfiles {
            output_profiles: vec![],
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&data).unwrap();
        assert_eq!(value["action"], "updateOutputProfiles");
    }
}
