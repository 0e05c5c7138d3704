//! Mock sensor implementations for testing and development
//!
//! The position mock replays a script of samples and errors at fixed offsets
//! from the moment a watch is opened, on the tokio clock. Under a paused
//! runtime the script runs instantly and deterministically.

use crate::core::{GeoPoint, PositionSample};
use crate::hardware::{
    LocateError, LocateResult, OrientationEvent, OrientationSensor, OrientationStream,
    PermissionGate, PermissionState, PositionSource, PositionWatch, WatchOptions,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

/// One scripted stream event
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedFix {
    Sample(PositionSample),
    Error(LocateError),
}

/// Counters shared between a mock source and the watches it opened
#[derive(Debug, Default)]
pub struct WatchStats {
    opened: AtomicUsize,
    stopped: AtomicUsize,
    delivered: AtomicUsize,
    last_options: Mutex<Option<WatchOptions>>,
}

impl WatchStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Watches opened and not yet stopped
    pub fn active(&self) -> usize {
        self.opened().saturating_sub(self.stopped())
    }

    /// Samples handed out across all watches
    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<WatchOptions> {
        self.last_options.lock().ok().and_then(|options| *options)
    }
}

/// Mock geolocation source replaying a fixed script
#[derive(Debug, Clone)]
pub struct MockPositionSource {
    available: bool,
    script: Vec<(Duration, ScriptedFix)>,
    stats: Arc<WatchStats>,
}

impl MockPositionSource {
    /// Create a source with an empty script
    pub fn new() -> Self {
        Self {
            available: true,
            script: Vec::new(),
            stats: Arc::new(WatchStats::default()),
        }
    }

    /// A platform without geolocation
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Deliver `sample` `offset_ms` after the watch opens
    pub fn push_sample(&mut self, offset_ms: u64, sample: PositionSample) -> &mut Self {
        self.push(offset_ms, ScriptedFix::Sample(sample))
    }

    /// Convenience for a sample at `lat`/`lon` captured at `captured_at_ms`
    pub fn push_fix(
        &mut self,
        offset_ms: u64,
        lat: f64,
        lon: f64,
        accuracy_m: Option<f64>,
        captured_at_ms: u64,
    ) -> &mut Self {
        let sample = PositionSample::new(GeoPoint::new(lat, lon), accuracy_m, captured_at_ms);
        self.push_sample(offset_ms, sample)
    }

    /// Report `error` `offset_ms` after the watch opens
    pub fn push_error(&mut self, offset_ms: u64, error: LocateError) -> &mut Self {
        self.push(offset_ms, ScriptedFix::Error(error))
    }

    fn push(&mut self, offset_ms: u64, fix: ScriptedFix) -> &mut Self {
        self.script.push((Duration::from_millis(offset_ms), fix));
        self.script.sort_by_key(|(offset, _)| *offset);
        self
    }

    pub fn stats(&self) -> Arc<WatchStats> {
        Arc::clone(&self.stats)
    }
}

impl Default for MockPositionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionSource for MockPositionSource {
    fn is_available(&self) -> bool {
        self.available
    }

    fn watch(&mut self, options: &WatchOptions) -> LocateResult<Box<dyn PositionWatch>> {
        if !self.available {
            return Err(LocateError::Unsupported);
        }

        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.stats.last_options.lock() {
            *last = Some(*options);
        }

        let now = Instant::now();
        Ok(Box::new(MockWatch {
            opened_at: now,
            last_delivery: now,
            per_sample_timeout: Duration::from_millis(options.per_sample_timeout_ms),
            events: self.script.iter().cloned().collect(),
            active: true,
            stats: Arc::clone(&self.stats),
        }))
    }
}

struct MockWatch {
    opened_at: Instant,
    last_delivery: Instant,
    per_sample_timeout: Duration,
    events: VecDeque<(Duration, ScriptedFix)>,
    active: bool,
    stats: Arc<WatchStats>,
}

#[async_trait]
impl PositionWatch for MockWatch {
    async fn next_sample(&mut self) -> LocateResult<PositionSample> {
        if !self.active {
            return Err(LocateError::sensor(0, "watch stopped"));
        }

        let timeout_at = self.last_delivery + self.per_sample_timeout;
        let due = self.events.front().map(|(offset, _)| self.opened_at + *offset);

        match due {
            Some(due) if due <= timeout_at => {
                sleep_until(due).await;
                self.last_delivery = due;
                match self.events.pop_front() {
                    Some((_, ScriptedFix::Sample(sample))) => {
                        self.stats.delivered.fetch_add(1, Ordering::SeqCst);
                        Ok(sample)
                    }
                    Some((_, ScriptedFix::Error(error))) => Err(error),
                    None => Err(LocateError::sensor(0, "script exhausted")),
                }
            }
            _ => {
                // Same as the platform's per-sample timeout firing
                sleep_until(timeout_at).await;
                self.last_delivery = timeout_at;
                Err(LocateError::Timeout {
                    waited_ms: self.per_sample_timeout.as_millis() as u64,
                })
            }
        }
    }

    fn stop(&mut self) {
        if self.active {
            self.active = false;
            self.stats.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Mock orientation sensor fed through a channel
pub struct MockOrientationSensor {
    gate: MockPermissionGate,
    stream: MockOrientationStream,
}

impl MockOrientationSensor {
    /// Sensor without a permission gate plus the sender that drives it
    ///
    /// Dropping the sender ends the event stream.
    pub fn channel() -> (Self, mpsc::UnboundedSender<OrientationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sensor = Self {
            gate: MockPermissionGate {
                requires_permission: false,
                outcome: Ok(PermissionState::Granted),
                requests: Arc::new(AtomicUsize::new(0)),
            },
            stream: MockOrientationStream { events: rx },
        };
        (sensor, tx)
    }

    /// Gate events behind a permission prompt answering with `outcome`
    pub fn with_permission_gate(mut self, outcome: LocateResult<PermissionState>) -> Self {
        self.gate.requires_permission = true;
        self.gate.outcome = outcome;
        self
    }

    /// Shared counter of permission prompts shown
    pub fn permission_requests(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.gate.requests)
    }
}

impl OrientationSensor for MockOrientationSensor {
    type Gate = MockPermissionGate;
    type Stream = MockOrientationStream;

    fn split(self) -> (MockPermissionGate, MockOrientationStream) {
        (self.gate, self.stream)
    }
}

/// Permission prompt half of [`MockOrientationSensor`]
pub struct MockPermissionGate {
    requires_permission: bool,
    outcome: LocateResult<PermissionState>,
    requests: Arc<AtomicUsize>,
}

#[async_trait]
impl PermissionGate for MockPermissionGate {
    fn requires_permission(&self) -> bool {
        self.requires_permission
    }

    async fn request_permission(&mut self) -> LocateResult<PermissionState> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Event half of [`MockOrientationSensor`]
pub struct MockOrientationStream {
    events: mpsc::UnboundedReceiver<OrientationEvent>,
}

#[async_trait]
impl OrientationStream for MockOrientationStream {
    async fn next_event(&mut self) -> Option<OrientationEvent> {
        self.events.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_elapsed(start: Instant, expected_ms: u64) {
        let elapsed = start.elapsed().as_millis() as u64;
        assert!(elapsed >= expected_ms && elapsed <= expected_ms + 1, "elapsed {}ms", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_script_replays_in_order() {
        let mut source = MockPositionSource::new();
        source
            .push_fix(300, 1.0, 1.0, Some(30.0), 10)
            .push_fix(100, 2.0, 2.0, Some(20.0), 20);

        let start = Instant::now();
        let mut watch = source.watch(&WatchOptions::default()).unwrap();

        let first = watch.next_sample().await.unwrap();
        assert_eq!(first.captured_at_ms, 20);
        assert_elapsed(start, 100);

        let second = watch.next_sample().await.unwrap();
        assert_eq!(second.captured_at_ms, 10);
        assert_elapsed(start, 300);
        assert_eq!(source.stats().delivered(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_sample_timeout_fires_when_script_is_slow() {
        let mut source = MockPositionSource::new();
        source.push_fix(5_000, 1.0, 1.0, Some(5.0), 10);

        let options = WatchOptions {
            per_sample_timeout_ms: 1_000,
            ..WatchOptions::default()
        };
        let mut watch = source.watch(&options).unwrap();
        let result = watch.next_sample().await;
        assert_eq!(result, Err(LocateError::Timeout { waited_ms: 1_000 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let mut source = MockPositionSource::new();
        let stats = source.stats();
        let mut watch = source.watch(&WatchOptions::default()).unwrap();
        assert_eq!(stats.active(), 1);

        watch.stop();
        watch.stop();
        assert!(!watch.is_active());
        assert_eq!(stats.stopped(), 1);
        assert_eq!(stats.active(), 0);
        assert!(watch.next_sample().await.is_err());
    }

    #[test]
    fn test_unavailable_source_refuses_watch() {
        let mut source = MockPositionSource::unavailable();
        assert!(!source.is_available());
        assert!(matches!(
            source.watch(&WatchOptions::default()),
            Err(LocateError::Unsupported)
        ));
    }

    #[tokio::test]
    async fn test_orientation_channel_ends_when_sender_dropped() {
        let (sensor, tx) = MockOrientationSensor::channel();
        let (_gate, mut stream) = sensor.split();
        tx.send(OrientationEvent::compass(12.0)).unwrap();
        drop(tx);

        assert_eq!(stream.next_event().await, Some(OrientationEvent::compass(12.0)));
        assert_eq!(stream.next_event().await, None);
    }

    #[tokio::test]
    async fn test_permission_gate_counts_requests() {
        let (sensor, _tx) = MockOrientationSensor::channel();
        let sensor = sensor.with_permission_gate(Ok(PermissionState::Denied));
        let requests = sensor.permission_requests();
        let (mut gate, _stream) = sensor.split();

        assert!(gate.requires_permission());
        assert_eq!(gate.request_permission().await, Ok(PermissionState::Denied));
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }
}
