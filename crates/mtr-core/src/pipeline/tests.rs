//! Pipeline tests against a scripted fake browser that counts lifecycle calls.

use super::*;
use crate::network::{NetworkEvent, RESPONSE_RECEIVED};
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    navigations: AtomicUsize,
    live_peak: AtomicUsize,
    live: AtomicUsize,
}

#[derive(Clone)]
enum Behavior {
    /// Element appears; log holds these response URLs.
    Plays(Vec<&'static str>),
    /// Element never appears.
    NoMediaElement,
    /// Element appears, then reading the log panics.
    PanicsOnLog,
    /// The browser cannot be started.
    LaunchFails,
}

struct FakeFactory {
    behavior: Behavior,
    counters: Arc<Counters>,
}

struct FakeSession {
    behavior: Behavior,
    counters: Arc<Counters>,
}

fn response(url: &str) -> NetworkEvent {
    NetworkEvent::new(RESPONSE_RECEIVED, json!({ "response": { "url": url } }))
}

#[async_trait]
impl SessionFactory for FakeFactory {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, ResolveError> {
        if matches!(self.behavior, Behavior::LaunchFails) {
            return Err(ResolveError::Launch("no chrome binary".into()));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.live_peak.fetch_max(live, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            behavior: self.behavior.clone(),
            counters: Arc::clone(&self.counters),
        }))
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, _url: &str) -> Result<(), ResolveError> {
        self.counters.navigations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn has_element(&mut self, _selector: &str) -> Result<bool, ResolveError> {
        Ok(!matches!(self.behavior, Behavior::NoMediaElement))
    }

    async fn run_script(&mut self, _script: &str) -> Result<(), ResolveError> {
        Err(ResolveError::Browser("autoplay blocked".into()))
    }

    async fn network_log(&mut self) -> Result<Vec<NetworkEvent>, ResolveError> {
        match &self.behavior {
            Behavior::Plays(urls) => Ok(urls.iter().map(|u| response(u)).collect()),
            Behavior::PanicsOnLog => panic!("devtools connection dropped"),
            _ => Ok(Vec::new()),
        }
    }

    async fn close(&mut self) {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        self.counters.live.fetch_sub(1, Ordering::SeqCst);
    }
}

fn pipeline(behavior: Behavior, max_sessions: usize) -> (ResolutionPipeline<FakeFactory>, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let factory = FakeFactory {
        behavior,
        counters: Arc::clone(&counters),
    };
    let pipeline = ResolutionPipeline::new(
        factory,
        PlaybackSynchronizer::default(),
        MatchRule::default(),
        SessionLimiter::new(max_sessions),
    );
    (pipeline, counters)
}

#[tokio::test(start_paused = true)]
async fn success_returns_first_match_and_closes_once() {
    let (p, counters) = pipeline(
        Behavior::Plays(vec![
            "https://example.com/embed/42",
            "https://cdn.example.com/stream.m3u8?token=abc123",
            "https://cdn.example.com/720p.m3u8?token=later",
        ]),
        1,
    );
    assert_eq!(
        p.resolve("https://example.com/embed/42").await.as_deref(),
        Some("https://cdn.example.com/stream.m3u8?token=abc123")
    );
    assert_eq!(counters.opened.load(Ordering::SeqCst), 1);
    assert_eq!(counters.navigations.load(Ordering::SeqCst), 1);
    assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    assert_eq!(p.limiter().in_use(), 0);
}

#[tokio::test(start_paused = true)]
async fn timeout_is_not_found_and_closes_once() {
    let (p, counters) = pipeline(Behavior::NoMediaElement, 1);
    let err = p.try_resolve("https://example.com/embed/42").await.unwrap_err();
    assert!(matches!(err, ResolveError::Timeout { .. }));
    assert_eq!(counters.closed.load(Ordering::SeqCst), 1);

    assert_eq!(p.resolve("https://example.com/embed/42").await, None);
    assert_eq!(counters.closed.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn scan_miss_is_not_found_and_closes_once() {
    let (p, counters) = pipeline(
        Behavior::Plays(vec!["https://cdn.example.com/stream.m3u8", "https://example.com/a.js"]),
        1,
    );
    let err = p.try_resolve("https://example.com/embed/42").await.unwrap_err();
    assert!(matches!(err, ResolveError::NotFound));
    assert_eq!(counters.opened.load(Ordering::SeqCst), 1);
    assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn panic_inside_attempt_still_closes() {
    let (p, counters) = pipeline(Behavior::PanicsOnLog, 1);
    let err = p.try_resolve("https://example.com/embed/42").await.unwrap_err();
    match err {
        ResolveError::Aborted(msg) => assert!(msg.contains("devtools connection dropped")),
        other => panic!("expected Aborted, got {other:?}"),
    }
    assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    assert_eq!(p.limiter().in_use(), 0);
}

#[tokio::test]
async fn launch_failure_is_not_found_without_session() {
    let (p, counters) = pipeline(Behavior::LaunchFails, 1);
    assert_eq!(p.resolve("https://example.com/embed/42").await, None);
    assert_eq!(counters.opened.load(Ordering::SeqCst), 0);
    assert_eq!(counters.closed.load(Ordering::SeqCst), 0);
    assert_eq!(p.limiter().in_use(), 0);
}

#[tokio::test(start_paused = true)]
async fn concurrent_sessions_are_bounded() {
    let (p, counters) = pipeline(
        Behavior::Plays(vec!["https://cdn.example.com/v.mp4?expires=1"]),
        2,
    );
    let p = Arc::new(p);
    let mut tasks = Vec::new();
    for i in 0..6 {
        let p = Arc::clone(&p);
        tasks.push(tokio::spawn(async move {
            p.resolve(&format!("https://example.com/embed/{i}")).await
        }));
    }
    for t in tasks {
        assert!(t.await.unwrap().is_some());
    }
    assert_eq!(counters.opened.load(Ordering::SeqCst), 6);
    assert_eq!(counters.closed.load(Ordering::SeqCst), 6);
    assert!(counters.live_peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(counters.live.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn settle_window_is_part_of_the_attempt() {
    let (p, _) = pipeline(
        Behavior::Plays(vec!["https://cdn.example.com/v.mp4?token=1"]),
        1,
    );
    let start = tokio::time::Instant::now();
    assert!(p.resolve("https://example.com/embed/1").await.is_some());
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}
