//! Load a network log captured outside this process (offline scanning).
//!
//! Accepted documents:
//! - Chrome performance-log dumps: `[{"message": "<json>", ...}]` where the inner
//!   JSON is `{"message": {"method": ..., "params": ...}}`.
//! - Raw event arrays: `[{"method": ..., "params": ...}]`.
//! - HAR 1.2 archives: `{"log": {"entries": [...]}}`.
//!
//! Individual entries that don't fit the detected shape are skipped.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

use super::har::HarLog;
use super::NetworkEvent;

/// Reads and converts the log at `path`.
pub fn load_events(path: &Path) -> Result<Vec<NetworkEvent>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read network log: {}", path.display()))?;
    let doc: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse network log JSON: {}", path.display()))?;
    let events = events_from_value(doc)
        .with_context(|| format!("unrecognized network log: {}", path.display()))?;
    tracing::debug!(path = %path.display(), events = events.len(), "network log imported");
    Ok(events)
}

/// Converts an already-parsed log document.
pub fn events_from_value(doc: Value) -> Result<Vec<NetworkEvent>> {
    match doc {
        Value::Array(entries) => Ok(entries.into_iter().filter_map(entry_to_event).collect()),
        Value::Object(map) if map.contains_key("log") => {
            let har: HarLog =
                serde_json::from_value(Value::Object(map)).context("parse HAR log")?;
            Ok(har.into_events())
        }
        _ => anyhow::bail!("expected an event array or a HAR object"),
    }
}

/// Performance-log entry (`message` is a JSON string) or a bare event object.
fn entry_to_event(entry: Value) -> Option<NetworkEvent> {
    if let Some(message) = entry.get("message").and_then(Value::as_str) {
        let inner: Value = serde_json::from_str(message).ok()?;
        let event = inner.get("message")?;
        return serde_json::from_value(event.clone()).ok();
    }
    if entry.get("method").is_some() {
        return serde_json::from_value(entry).ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{scan, MatchRule};
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn perf_entry(method: &str, params: Value) -> Value {
        let inner = json!({ "message": { "method": method, "params": params }, "webview": "ABC" });
        json!({ "level": "INFO", "timestamp": 1, "message": inner.to_string() })
    }

    fn write_temp(body: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn performance_log_entries_are_unwrapped() {
        let doc = json!([
            perf_entry("Network.requestWillBeSent", json!({ "request": { "url": "https://example.com/embed/42" } })),
            perf_entry("Network.responseReceived", json!({ "response": { "url": "https://cdn.example.com/stream.m3u8?token=abc123" } })),
        ]);
        let events = events_from_value(doc).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].method, "Network.requestWillBeSent");
        assert_eq!(
            events[1].response_url(),
            Some("https://cdn.example.com/stream.m3u8?token=abc123")
        );
    }

    #[test]
    fn broken_performance_entries_are_skipped() {
        let doc = json!([
            { "message": "{not json" },
            { "message": "{\"other\":1}" },
            { "level": "INFO" },
            42,
            perf_entry("Network.responseReceived", json!({ "response": { "url": "https://cdn.example.com/v.mp4?expires=1" } })),
        ]);
        let events = events_from_value(doc).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(
            scan(&events, &MatchRule::default()),
            Some("https://cdn.example.com/v.mp4?expires=1")
        );
    }

    #[test]
    fn raw_event_array_is_accepted() {
        let doc = json!([
            { "method": "Network.responseReceived", "params": { "response": { "url": "https://a.example/x" } } },
            { "method": "Network.loadingFinished" },
        ]);
        let events = events_from_value(doc).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].params, Value::Null);
    }

    #[test]
    fn har_entries_become_responses_in_order() {
        let har = r#"{
            "log": {
                "version": "1.2",
                "entries": [
                    {
                        "request": { "url": "https://example.com/embed/42", "headers": [] },
                        "response": { "status": 200, "headers": [] }
                    },
                    { "broken": true },
                    {
                        "request": { "url": "https://cdn.example.com/master.m3u8?token=abc", "headers": [] },
                        "response": { "status": 200, "mimeType": "application/vnd.apple.mpegurl", "headers": [] }
                    },
                    {
                        "request": { "url": "https://cdn.example.com/720p.m3u8?token=def", "headers": [] },
                        "response": { "status": 200, "headers": [] }
                    }
                ]
            }
        }"#;
        let f = write_temp(har);
        let events = load_events(f.path()).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(
            scan(&events, &MatchRule::default()),
            Some("https://cdn.example.com/master.m3u8?token=abc")
        );
    }

    #[test]
    fn har_without_matching_entry() {
        let har = r#"{"log":{"version":"1.2","entries":[
            { "request": { "url": "https://direct.example.com/f.bin" }, "response": { "status": 200 } }
        ]}}"#;
        let f = write_temp(har);
        let events = load_events(f.path()).unwrap();
        assert_eq!(scan(&events, &MatchRule::default()), None);
    }

    #[test]
    fn unrecognized_document_is_an_error() {
        let f = write_temp(r#"{"entries": []}"#);
        assert!(load_events(f.path()).is_err());
        let f = write_temp("not json at all");
        assert!(load_events(f.path()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_events(&dir.path().join("absent.json")).is_err());
    }
}
