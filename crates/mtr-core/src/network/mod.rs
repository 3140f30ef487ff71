//! Captured network traffic and the token URL scanner.
//!
//! A [`NetworkEvent`] is one DevTools network-domain record: the method name and
//! its raw parameters. Events are kept as loosely-typed JSON so a malformed or
//! partial record can be skipped during the scan instead of failing the capture.

mod har;
pub mod import;
mod scan;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use scan::{scan, MatchRule};

/// DevTools method name for a received HTTP response.
pub const RESPONSE_RECEIVED: &str = "Network.responseReceived";
/// DevTools method name for an outgoing request.
pub const REQUEST_WILL_BE_SENT: &str = "Network.requestWillBeSent";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEvent {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl NetworkEvent {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// True if the method names a received response (also matches `...ExtraInfo`,
    /// which carries no URL and is skipped by [`Self::response_url`]).
    pub fn is_response(&self) -> bool {
        self.method.contains(RESPONSE_RECEIVED)
    }

    /// `params.response.url`, if present and a string.
    pub fn response_url(&self) -> Option<&str> {
        self.params.pointer("/response/url").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_url_reads_nested_field() {
        let ev = NetworkEvent::new(
            RESPONSE_RECEIVED,
            json!({ "requestId": "1", "response": { "url": "https://a.example/x.m3u8", "status": 200 } }),
        );
        assert!(ev.is_response());
        assert_eq!(ev.response_url(), Some("https://a.example/x.m3u8"));
    }

    #[test]
    fn response_url_missing_or_wrong_type() {
        let no_response = NetworkEvent::new(RESPONSE_RECEIVED, json!({ "requestId": "1" }));
        assert_eq!(no_response.response_url(), None);

        let numeric = NetworkEvent::new(RESPONSE_RECEIVED, json!({ "response": { "url": 7 } }));
        assert_eq!(numeric.response_url(), None);

        let null_params = NetworkEvent::new(RESPONSE_RECEIVED, Value::Null);
        assert_eq!(null_params.response_url(), None);
    }

    #[test]
    fn extra_info_counts_as_response_method() {
        let ev = NetworkEvent::new("Network.responseReceivedExtraInfo", json!({}));
        assert!(ev.is_response());
        let req = NetworkEvent::new(REQUEST_WILL_BE_SENT, json!({}));
        assert!(!req.is_response());
    }

    #[test]
    fn missing_params_deserializes_as_null() {
        let ev: NetworkEvent = serde_json::from_str(r#"{"method":"Network.loadingFinished"}"#).unwrap();
        assert_eq!(ev.params, Value::Null);
    }
}
