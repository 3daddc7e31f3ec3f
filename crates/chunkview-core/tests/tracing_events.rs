#![cfg(feature = "tracing")]

//! Structured log events emitted by the orchestrator and the materializer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chunkview_core::{
    BoundingAreaConfig, ChunkOrchestrator, ChunkStore, ViewportConfig, ViewportState,
    calculate_bounding_area, materialize,
};
use tracing_subscriber::layer::SubscriberExt;

#[derive(Debug, Clone)]
struct Captured {
    level: tracing::Level,
    target: String,
    fields: HashMap<String, String>,
}

struct Capture(Arc<Mutex<Vec<Captured>>>);

struct Fields(Vec<(String, String)>);

impl tracing::field::Visit for Fields {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }
    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Capture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut fields = Fields(Vec::new());
        event.record(&mut fields);
        self.0.lock().unwrap().push(Captured {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            fields: fields.0.into_iter().collect(),
        });
    }
}

fn capture(f: impl FnOnce()) -> Vec<Captured> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(Capture(events.clone()));
    tracing::subscriber::with_default(subscriber, f);
    let out = events.lock().unwrap().clone();
    out
}

fn setup(max_loaded_chunks: usize) -> (ViewportConfig, ViewportState, ChunkOrchestrator) {
    let viewport = ViewportConfig::new(10).with_chunk_size(20).normalized();
    let bounding = BoundingAreaConfig::default()
        .with_chunk_size(20)
        .with_radius(1, 1)
        .with_max_loaded_chunks(max_loaded_chunks);
    let state = ViewportState::initial(&viewport, 1_000);
    (viewport, state, ChunkOrchestrator::new(bounding))
}

#[test]
fn reconcile_logs_counts() {
    let events = capture(|| {
        let (viewport, state, mut orchestrator) = setup(16);
        let area = calculate_bounding_area(&state, viewport.height, 1_000, orchestrator.config());
        let ops = orchestrator.reconcile(&area, 1_000);
        assert_eq!(ops.loads.len(), 3);
    });
    let event = events
        .iter()
        .find(|e| e.level == tracing::Level::DEBUG && e.target == "chunkview.chunks")
        .expect("reconcile event");
    assert_eq!(event.fields.get("loads").map(String::as_str), Some("3"));
    assert_eq!(event.fields.get("unloads").map(String::as_str), Some("0"));
    assert!(!events.iter().any(|e| e.level == tracing::Level::WARN));
}

#[test]
fn soft_cap_overrun_warns() {
    let events = capture(|| {
        let (viewport, state, mut orchestrator) = setup(2);
        let area = calculate_bounding_area(&state, viewport.height, 1_000, orchestrator.config());
        let _ = orchestrator.reconcile(&area, 1_000);
        assert!(orchestrator.over_budget());
    });
    let warning = events
        .iter()
        .find(|e| e.level == tracing::Level::WARN)
        .expect("soft cap warning");
    assert_eq!(warning.fields.get("resident").map(String::as_str), Some("3"));
    assert_eq!(
        warning.fields.get("max_loaded_chunks").map(String::as_str),
        Some("2")
    );
}

#[test]
fn idle_reconcile_is_quiet() {
    let events = capture(|| {
        let (viewport, state, mut orchestrator) = setup(16);
        let area = calculate_bounding_area(&state, viewport.height, 1_000, orchestrator.config());
        let _ = orchestrator.reconcile(&area, 1_000);
        let _ = orchestrator.reconcile(&area, 1_000);
    });
    let reconciles = events
        .iter()
        .filter(|e| e.target == "chunkview.chunks" && e.level == tracing::Level::DEBUG)
        .count();
    assert_eq!(reconciles, 1);
}

#[test]
fn materialize_traces_window() {
    let events = capture(|| {
        let viewport = ViewportConfig::new(4).with_chunk_size(4).normalized();
        let state = ViewportState::initial(&viewport, 10);
        let mut store: ChunkStore<u8> = ChunkStore::new(4);
        let frame = materialize(&state, &viewport, 10, &mut store, |_| None);
        assert_eq!(frame.placeholder_count, 4);
    });
    assert!(events.iter().any(|e| e.level == tracing::Level::TRACE));
}
