//! Minimal HAR 1.2 structures for turning an archived session into network events.

use serde::Deserialize;
use serde_json::{json, Value};

use super::{NetworkEvent, RESPONSE_RECEIVED};

/// Root HAR log (top-level wrapper).
#[derive(Debug, Deserialize)]
pub struct HarLog {
    pub log: HarRoot,
}

/// Entries stay as raw JSON so one broken entry doesn't reject the whole archive.
#[derive(Debug, Deserialize)]
pub struct HarRoot {
    pub entries: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct HarEntry {
    request: HarRequest,
    #[serde(default)]
    response: Option<HarResponse>,
}

#[derive(Debug, Deserialize)]
struct HarRequest {
    url: String,
}

#[derive(Debug, Deserialize)]
struct HarResponse {
    #[serde(default)]
    status: u16,
    #[serde(default, rename = "mimeType")]
    mime_type: Option<String>,
}

impl HarLog {
    /// One synthetic `Network.responseReceived` per well-formed entry, in archive order.
    pub fn into_events(self) -> Vec<NetworkEvent> {
        self.log
            .entries
            .into_iter()
            .filter_map(|raw| serde_json::from_value::<HarEntry>(raw).ok())
            .map(|entry| {
                let (status, mime) = entry
                    .response
                    .map(|r| (r.status, r.mime_type))
                    .unwrap_or((0, None));
                NetworkEvent::new(
                    RESPONSE_RECEIVED,
                    json!({
                        "response": {
                            "url": entry.request.url,
                            "status": status,
                            "mimeType": mime,
                        }
                    }),
                )
            })
            .collect()
    }
}
