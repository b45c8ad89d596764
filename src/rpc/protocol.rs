// src/rpc/protocol.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC 2.0 request envelope, used both for node calls and wallet requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

fn default_jsonrpc() -> String {
    "2.0".to_string()
}

impl Request {
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            id: id.into(),
            method: method.into(),
            params: Some(params),
        }
    }
}

impl Response {
    /// Splits the envelope into its result or its error object.
    /// A response carrying neither is reported as `Ok(None)`.
    pub fn into_result(self) -> Result<Option<Value>, ErrorObject> {
        match (self.error, self.result) {
            (Some(error), _) => Err(error),
            (None, result) => Ok(result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_envelope() {
        let req = Request::new(7, "auth_getAuthAccount", json!({ "address": "lsk" }));
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 7);
        assert_eq!(value["method"], "auth_getAuthAccount");
        assert_eq!(value["params"]["address"], "lsk");
    }

    #[test]
    fn error_takes_precedence_over_result() {
        let resp: Response = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": null,
            "error": { "code": -32602, "message": "bad" }
        }))
        .unwrap();
        assert_eq!(resp.into_result().unwrap_err().code, -32602);

        let ok: Response = serde_json::from_value(json!({ "id": 1, "result": { "nonce": "3" } })).unwrap();
        assert_eq!(ok.into_result().unwrap(), Some(json!({ "nonce": "3" })));
    }

    #[test]
    fn empty_response_has_no_result() {
        let resp: Response = serde_json::from_value(json!({ "jsonrpc": "2.0", "id": 2 })).unwrap();
        assert_eq!(resp.into_result().unwrap(), None);
    }
}
