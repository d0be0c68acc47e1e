//! Azure Functions custom handler payloads
//!
//! The host POSTs one invocation per dequeued message to `/{function}`:
//! `{"Data": {"azqueue": ...}, "Metadata": {...}}`. The queue message arrives
//! either as a JSON string holding the document or as the document itself.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, WorkerError};

/// Queue trigger binding name declared in every `function.json`
pub const QUEUE_BINDING: &str = "azqueue";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvokeRequest {
    #[serde(rename = "Data", default)]
    pub data: Map<String, Value>,
    #[serde(rename = "Metadata", default)]
    pub metadata: Map<String, Value>,
}

impl InvokeRequest {
    /// Queue message id, or a fresh one when the host did not send it
    pub fn message_id(&self) -> String {
        self.metadata
            .get("Id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }

    pub fn dequeue_count(&self) -> Option<u64> {
        match self.metadata.get("DequeueCount") {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        }
    }

    /// The decoded queue message document
    pub fn queue_message(&self) -> Result<Value> {
        let raw = self.data.get(QUEUE_BINDING).ok_or_else(|| {
            WorkerError::InvalidMessage(format!("missing Data.{}", QUEUE_BINDING))
        })?;
        decode_queue_payload(raw)
    }
}

/// Accept the message inline or as JSON text.
pub fn decode_queue_payload(raw: &Value) -> Result<Value> {
    let value = match raw {
        Value::String(text) => serde_json::from_str(text.trim())?,
        other => other.clone(),
    };
    if !value.is_object() {
        return Err(WorkerError::InvalidMessage(
            "queue message is not a JSON object".to_string(),
        ));
    }
    Ok(value)
}

pub fn parse_message<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(WorkerError::from)
}

/// Response body expected by the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeResponse {
    #[serde(rename = "Outputs")]
    pub outputs: Map<String, Value>,
    #[serde(rename = "Logs")]
    pub logs: Vec<String>,
    #[serde(rename = "ReturnValue")]
    pub return_value: Value,
}

impl InvokeResponse {
    pub fn with_log(log: impl Into<String>) -> Self {
        Self {
            outputs: Map::new(),
            logs: vec![log.into()],
            return_value: Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_payload_decoded() {
        let request: InvokeRequest = serde_json::from_value(json!({
            "Data": { "azqueue": "{\"missionName\": \"St-Mary-2024\"}" },
            "Metadata": { "Id": "msg-1", "DequeueCount": 2 }
        }))
        .unwrap();

        assert_eq!(request.message_id(), "msg-1");
        assert_eq!(request.dequeue_count(), Some(2));
        assert_eq!(request.queue_message().unwrap()["missionName"], "St-Mary-2024");
    }

    #[test]
    fn test_inline_payload() {
        let raw = json!({ "missionName": "St-Mary-2024" });
        assert_eq!(decode_queue_payload(&raw).unwrap(), raw);
    }

    #[test]
    fn test_bad_payloads() {
        assert!(decode_queue_payload(&json!("not json")).is_err());
        assert!(decode_queue_payload(&json!("[1, 2]")).is_err());
        assert!(InvokeRequest::default().queue_message().is_err());
    }

    #[test]
    fn test_response_shape() {
        let body = serde_json::to_value(InvokeResponse::with_log("done")).unwrap();
        assert_eq!(body, json!({ "Outputs": {}, "Logs": ["done"], "ReturnValue": null }));
    }
}
