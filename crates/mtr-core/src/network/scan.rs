//! First-match scan of a captured network log for a token-bearing media URL.

use super::NetworkEvent;

/// Predicate deciding whether a response URL is the tokenized media resource.
///
/// A URL matches when it contains at least one media marker AND at least one
/// token marker. Plain substring tests; the URL is never parsed or rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRule {
    pub media_markers: Vec<String>,
    pub token_markers: Vec<String>,
}

impl Default for MatchRule {
    fn default() -> Self {
        Self {
            media_markers: vec![".m3u8".to_string(), ".mp4".to_string()],
            token_markers: vec!["token=".to_string(), "expires=".to_string()],
        }
    }
}

impl MatchRule {
    pub fn matches(&self, url: &str) -> bool {
        self.media_markers.iter().any(|m| url.contains(m.as_str()))
            && self.token_markers.iter().any(|m| url.contains(m.as_str()))
    }
}

/// Returns the first response URL (in capture order) accepted by `rule`.
///
/// Events that are not responses, or whose params lack a string
/// `response.url`, are skipped.
pub fn scan<'a>(events: &'a [NetworkEvent], rule: &MatchRule) -> Option<&'a str> {
    let mut skipped = 0usize;
    let found = events
        .iter()
        .filter(|ev| ev.is_response())
        .filter_map(|ev| match ev.response_url() {
            Some(url) => Some(url),
            None => {
                skipped += 1;
                None
            }
        })
        .find(|url| rule.matches(url));
    tracing::debug!(
        events = events.len(),
        skipped,
        matched = found.is_some(),
        "network log scanned"
    );
    found
}
