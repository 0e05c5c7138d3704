//! Compass heading from device orientation events
//!
//! Platforms report orientation in one of two conventions. Each event runs
//! through an ordered chain of probes and the first one that finds a finite
//! value decides how it is turned into a clockwise-from-North heading.

use crate::algorithms::geo::wrap_360;
use crate::core::HeadingReading;
use crate::hardware::{
    LocateError, OrientationEvent, OrientationSensor, OrientationStream, PermissionGate,
    PermissionState,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Which convention an orientation event was read with
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeadingProbe {
    /// Compass heading already clockwise from North
    DirectHeading(f64),
    /// Rotation around the vertical axis, counter-clockwise from a device zero
    RawRotation(f64),
    None,
}

type Probe = fn(&OrientationEvent) -> Option<HeadingProbe>;

const PROBES: [Probe; 2] = [probe_direct_heading, probe_raw_rotation];

fn probe_direct_heading(event: &OrientationEvent) -> Option<HeadingProbe> {
    event
        .compass_heading
        .filter(|degrees| degrees.is_finite())
        .map(HeadingProbe::DirectHeading)
}

fn probe_raw_rotation(event: &OrientationEvent) -> Option<HeadingProbe> {
    event
        .alpha
        .filter(|alpha| alpha.is_finite())
        .map(HeadingProbe::RawRotation)
}

/// Classify an event by the first convention that yields a finite value
pub fn probe(event: &OrientationEvent) -> HeadingProbe {
    PROBES
        .iter()
        .find_map(|probe| probe(event))
        .unwrap_or(HeadingProbe::None)
}

impl HeadingProbe {
    /// Heading in [0, 360) for this probe result
    pub fn degrees(&self) -> Option<f64> {
        match *self {
            HeadingProbe::DirectHeading(degrees) => Some(wrap_360(degrees)),
            HeadingProbe::RawRotation(alpha) => Some(rotation_to_heading(alpha)),
            HeadingProbe::None => None,
        }
    }
}

/// Approximate compass heading from a raw `alpha` rotation
///
/// `alpha` grows counter-clockwise from a zero the device picks, so
/// `360 - alpha` only approximates clockwise-from-North. Some devices are off
/// by a fixed offset; correcting that needs a calibration step this crate
/// does not provide.
pub fn rotation_to_heading(alpha: f64) -> f64 {
    wrap_360(360.0 - alpha)
}

/// Turn one orientation event into a heading reading
pub fn normalize(event: &OrientationEvent) -> HeadingReading {
    match probe(event).degrees() {
        Some(degrees) => HeadingReading::heading(degrees),
        None => HeadingReading::unavailable(LocateError::NoReading.to_string()),
    }
}

/// Listens to an orientation sensor and emits compass headings
///
/// Only one listener runs at a time. Must be started from within a
/// current-thread tokio runtime: the guarantee that no reading is delivered
/// after [`HeadingSubscription::stop`] relies on the listener task never
/// running concurrently with the caller.
pub struct HeadingSource<O: OrientationSensor> {
    gate: Arc<Mutex<O::Gate>>,
    stream: Arc<Mutex<O::Stream>>,
    requires_permission: bool,
    listening: Arc<AtomicBool>,
    permission_granted: Arc<AtomicBool>,
}

impl<O: OrientationSensor> HeadingSource<O> {
    pub fn new(sensor: O) -> Self {
        let (gate, stream) = sensor.split();
        let requires_permission = gate.requires_permission();
        Self {
            gate: Arc::new(Mutex::new(gate)),
            stream: Arc::new(Mutex::new(stream)),
            requires_permission,
            listening: Arc::new(AtomicBool::new(false)),
            permission_granted: Arc::new(AtomicBool::new(!requires_permission)),
        }
    }

    /// Negotiate access to orientation events
    ///
    /// Resolves to `true` straight away on platforms without a permission
    /// gate. A denial or any error during the request resolves to `false`.
    /// May be called before or while a listener runs; a running listener
    /// stops flagging `permission_needed` once access is granted.
    pub async fn request_permission(&self) -> bool {
        if !self.requires_permission {
            return true;
        }

        let granted = match self.gate.lock().await.request_permission().await {
            Ok(PermissionState::Granted) => true,
            Ok(PermissionState::Denied) => {
                info!(error = %LocateError::PermissionDenied, "orientation permission denied");
                false
            }
            Err(error) => {
                warn!(%error, "orientation permission request failed");
                false
            }
        };
        self.permission_granted.store(granted, Ordering::SeqCst);
        granted
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Start delivering a reading to `on_update` for every orientation event
    ///
    /// Returns `None` and changes nothing if a listener is already running.
    pub fn start<F>(&self, on_update: F) -> Option<HeadingSubscription>
    where
        F: FnMut(HeadingReading) + Send + 'static,
    {
        if self.listening.swap(true, Ordering::SeqCst) {
            debug!("heading listener already running, ignoring start");
            return None;
        }

        let active = Arc::new(AtomicBool::new(true));
        let task = tokio::spawn(listen(
            Arc::clone(&self.stream),
            Arc::clone(&active),
            Arc::clone(&self.listening),
            Arc::clone(&self.permission_granted),
            on_update,
        ));
        debug!("heading listener started");

        Some(HeadingSubscription {
            active,
            listening: Arc::clone(&self.listening),
            task,
        })
    }
}

async fn listen<S, F>(
    stream: Arc<Mutex<S>>,
    active: Arc<AtomicBool>,
    listening: Arc<AtomicBool>,
    permission_granted: Arc<AtomicBool>,
    mut on_update: F,
) where
    S: OrientationStream,
    F: FnMut(HeadingReading) + Send,
{
    let mut stream = stream.lock().await;
    while let Some(event) = stream.next_event().await {
        if !active.load(Ordering::SeqCst) {
            return;
        }
        let permission_needed = !permission_granted.load(Ordering::SeqCst);
        on_update(normalize(&event).with_permission_needed(permission_needed));
    }

    debug!("orientation stream ended");
    if active.swap(false, Ordering::SeqCst) {
        listening.store(false, Ordering::SeqCst);
    }
}

/// Handle to a running heading listener
///
/// [`HeadingSubscription::stop`] is the release path; dropping the handle
/// calls it.
#[derive(Debug)]
pub struct HeadingSubscription {
    active: Arc<AtomicBool>,
    listening: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl HeadingSubscription {
    /// Stop the listener; no reading is delivered once this returns
    ///
    /// Safe to call repeatedly and after the stream has ended on its own.
    /// The delivery guarantee holds on a current-thread runtime only; on a
    /// multi-thread runtime a reading already past the active check may
    /// still reach the callback.
    pub fn stop(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            self.listening.store(false, Ordering::SeqCst);
            self.task.abort();
            debug!("heading listener stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for HeadingSubscription {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::MockOrientationSensor;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    fn collector() -> (
        impl FnMut(HeadingReading) + Send + 'static,
        mpsc::UnboundedReceiver<HeadingReading>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let callback = move |reading: HeadingReading| {
            let _ = tx.send(reading);
        };
        (callback, rx)
    }

    #[test]
    fn test_direct_heading_used_verbatim() {
        let reading = normalize(&OrientationEvent::compass(37.0));
        assert_eq!(reading.degrees, Some(37.0));
        assert_eq!(reading.error, None);
    }

    #[test]
    fn test_raw_rotation_is_inverted() {
        assert_eq!(normalize(&OrientationEvent::rotation(37.0)).degrees, Some(323.0));
        assert_eq!(normalize(&OrientationEvent::rotation(0.0)).degrees, Some(0.0));
        assert_eq!(normalize(&OrientationEvent::rotation(360.0)).degrees, Some(0.0));
        assert_eq!(normalize(&OrientationEvent::rotation(270.0)).degrees, Some(90.0));
    }

    #[test]
    fn test_no_usable_field() {
        let empty = normalize(&OrientationEvent::default());
        assert_eq!(empty.degrees, None);
        assert_eq!(empty.error.as_deref(), Some("No heading data"));
        assert_eq!(empty.error, Some(LocateError::NoReading.to_string()));

        let nan = normalize(&OrientationEvent {
            compass_heading: Some(f64::NAN),
            alpha: Some(f64::INFINITY),
        });
        assert_eq!(nan.degrees, None);
        assert_eq!(nan.error.as_deref(), Some("No heading data"));
    }

    #[test]
    fn test_probe_order() {
        let both = OrientationEvent {
            compass_heading: Some(10.0),
            alpha: Some(10.0),
        };
        assert_eq!(probe(&both), HeadingProbe::DirectHeading(10.0));

        let bad_direct = OrientationEvent {
            compass_heading: Some(f64::NAN),
            alpha: Some(90.0),
        };
        assert_eq!(probe(&bad_direct), HeadingProbe::RawRotation(90.0));
        assert_eq!(normalize(&bad_direct).degrees, Some(270.0));

        assert_eq!(probe(&OrientationEvent::default()), HeadingProbe::None);
    }

    #[test]
    fn test_direct_heading_wrapped_into_range() {
        assert_eq!(normalize(&OrientationEvent::compass(360.0)).degrees, Some(0.0));
        assert_eq!(normalize(&OrientationEvent::compass(-90.0)).degrees, Some(270.0));
    }

    #[tokio::test]
    async fn test_permission_implicit_without_gate() {
        let (sensor, _tx) = MockOrientationSensor::channel();
        let requests = sensor.permission_requests();
        let source = HeadingSource::new(sensor);

        assert!(source.request_permission().await);
        assert_eq!(requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_permission_outcomes() {
        let (sensor, _tx) = MockOrientationSensor::channel();
        let granted = HeadingSource::new(sensor.with_permission_gate(Ok(PermissionState::Granted)));
        assert!(granted.request_permission().await);

        let (sensor, _tx) = MockOrientationSensor::channel();
        let denied = HeadingSource::new(sensor.with_permission_gate(Ok(PermissionState::Denied)));
        assert!(!denied.request_permission().await);

        let (sensor, _tx) = MockOrientationSensor::channel();
        let failing = HeadingSource::new(
            sensor.with_permission_gate(Err(LocateError::sensor(0, "not triggered by a gesture"))),
        );
        assert!(!failing.request_permission().await);
    }

    #[tokio::test]
    async fn test_readings_flow_until_stopped() {
        let (sensor, tx) = MockOrientationSensor::channel();
        let source = HeadingSource::new(sensor);
        let (callback, mut rx) = collector();

        let subscription = source.start(callback).unwrap();
        assert!(source.is_listening());

        tx.send(OrientationEvent::compass(37.0)).unwrap();
        tx.send(OrientationEvent::rotation(37.0)).unwrap();
        tx.send(OrientationEvent::default()).unwrap();

        assert_eq!(rx.recv().await.unwrap().degrees, Some(37.0));
        assert_eq!(rx.recv().await.unwrap().degrees, Some(323.0));
        let empty = rx.recv().await.unwrap();
        assert_eq!(empty.degrees, None);
        assert!(!empty.permission_needed);

        // An event already queued when stop is called is never delivered
        tx.send(OrientationEvent::compass(90.0)).unwrap();
        subscription.stop();
        subscription.stop();
        assert!(!subscription.is_active());
        assert!(!source.is_listening());

        tx.send(OrientationEvent::compass(180.0)).unwrap();
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_second_start_ignored_while_active() {
        let (sensor, _tx) = MockOrientationSensor::channel();
        let source = HeadingSource::new(sensor);
        let (first, _rx1) = collector();
        let (second, _rx2) = collector();

        let subscription = source.start(first).unwrap();
        assert!(source.start(second).is_none());

        subscription.stop();
        let (third, _rx3) = collector();
        assert!(source.start(third).is_some());
    }

    #[tokio::test]
    async fn test_stop_after_natural_end() {
        let (sensor, tx) = MockOrientationSensor::channel();
        let source = HeadingSource::new(sensor);
        let (callback, _rx) = collector();

        let subscription = source.start(callback).unwrap();
        drop(tx);
        settle().await;

        assert!(!subscription.is_active());
        assert!(!source.is_listening());
        subscription.stop();

        // The ended listener's handle must not stop a newer one
        let (callback, _rx) = collector();
        let newer = source.start(callback).unwrap();
        subscription.stop();
        drop(subscription);
        assert!(newer.is_active());
        assert!(source.is_listening());
    }

    #[tokio::test]
    async fn test_drop_stops_listener() {
        let (sensor, tx) = MockOrientationSensor::channel();
        let source = HeadingSource::new(sensor);
        let (callback, mut rx) = collector();

        let subscription = source.start(callback).unwrap();
        drop(subscription);
        assert!(!source.is_listening());

        tx.send(OrientationEvent::compass(5.0)).unwrap();
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_granted_while_listening() {
        let (sensor, tx) = MockOrientationSensor::channel();
        let sensor = sensor.with_permission_gate(Ok(PermissionState::Granted));
        let requests = sensor.permission_requests();
        let source = HeadingSource::new(sensor);
        let (callback, mut rx) = collector();

        let subscription = source.start(callback).unwrap();
        tx.send(OrientationEvent::compass(10.0)).unwrap();
        tx.send(OrientationEvent::compass(20.0)).unwrap();
        assert!(rx.recv().await.unwrap().permission_needed);
        assert!(rx.recv().await.unwrap().permission_needed);

        let granted = timeout(Duration::from_secs(60), source.request_permission()).await;
        assert_eq!(granted, Ok(true));
        assert_eq!(requests.load(Ordering::SeqCst), 1);

        tx.send(OrientationEvent::compass(30.0)).unwrap();
        let reading = rx.recv().await.unwrap();
        assert_eq!(reading.degrees, Some(30.0));
        assert!(!reading.permission_needed);
        assert!(subscription.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ungated_permission_resolves_while_listening() {
        let (sensor, tx) = MockOrientationSensor::channel();
        let requests = sensor.permission_requests();
        let source = HeadingSource::new(sensor);
        let (callback, mut rx) = collector();

        let _subscription = source.start(callback).unwrap();
        tx.send(OrientationEvent::compass(10.0)).unwrap();
        assert!(!rx.recv().await.unwrap().permission_needed);

        let granted = timeout(Duration::from_secs(60), source.request_permission()).await;
        assert_eq!(granted, Ok(true));
        assert_eq!(requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_denial_while_listening_keeps_flag() {
        let (sensor, tx) = MockOrientationSensor::channel();
        let source = HeadingSource::new(sensor.with_permission_gate(Ok(PermissionState::Denied)));
        let (callback, mut rx) = collector();

        let _subscription = source.start(callback).unwrap();
        let granted = timeout(Duration::from_secs(60), source.request_permission()).await;
        assert_eq!(granted, Ok(false));

        tx.send(OrientationEvent::compass(10.0)).unwrap();
        assert!(rx.recv().await.unwrap().permission_needed);
    }

    #[tokio::test]
    async fn test_readings_flag_missing_permission() {
        let (sensor, tx) = MockOrientationSensor::channel();
        let source = HeadingSource::new(sensor.with_permission_gate(Ok(PermissionState::Granted)));
        let (callback, mut rx) = collector();

        let subscription = source.start(callback).unwrap();
        tx.send(OrientationEvent::compass(1.0)).unwrap();
        assert!(rx.recv().await.unwrap().permission_needed);
        subscription.stop();

        assert!(source.request_permission().await);
        let (callback, mut rx) = collector();
        let _subscription = source.start(callback).unwrap();
        tx.send(OrientationEvent::compass(2.0)).unwrap();
        assert!(!rx.recv().await.unwrap().permission_needed);
    }
}
