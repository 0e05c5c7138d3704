//! Best-of position acquisition
//!
//! A cold receiver's first fixes are usually coarse. Rather than retrying
//! single-shot reads, the acquirer keeps one continuous stream open, remembers
//! the most accurate sample seen and stops as soon as a sample is good enough
//! or the wait bound runs out.

use crate::core::{Clock, PositionSample};
use crate::hardware::{LocateError, LocateResult, PositionSource, PositionWatch, WatchOptions};
use crate::utils::config::AcquisitionConfig;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Acquires a single "best available" fix from a streaming source
pub struct PositionAcquirer<S, C> {
    source: S,
    clock: C,
    config: AcquisitionConfig,
}

impl<S: PositionSource, C: Clock> PositionAcquirer<S, C> {
    pub fn new(source: S, clock: C) -> Self {
        Self::with_config(source, clock, AcquisitionConfig::default())
    }

    pub fn with_config(source: S, clock: C, config: AcquisitionConfig) -> Self {
        Self {
            source,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Stream options used for every acquisition
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            high_accuracy: true,
            max_sample_age_ms: 0,
            per_sample_timeout_ms: self.config.per_sample_timeout_ms,
        }
    }

    /// Acquire with the configured wait bound and accuracy target
    pub async fn acquire(&mut self) -> LocateResult<PositionSample> {
        let max_wait = Duration::from_millis(self.config.max_wait_ms);
        let desired_accuracy_m = self.config.desired_accuracy_m;
        self.acquire_best(max_wait, desired_accuracy_m).await
    }

    /// Return the best sample seen within `max_wait`
    ///
    /// Resolves early with the first sample at or below `desired_accuracy_m`.
    /// Falling short of the target is not an error: at `max_wait` the most
    /// accurate sample so far wins, or the next one to arrive if none has yet.
    /// Samples captured before the call started are discarded. The stream is
    /// stopped before this returns on every path.
    pub async fn acquire_best(
        &mut self,
        max_wait: Duration,
        desired_accuracy_m: f64,
    ) -> LocateResult<PositionSample> {
        if !self.source.is_available() {
            warn!("geolocation capability missing");
            return Err(LocateError::Unsupported);
        }

        let session_start_ms = self.clock.now_ms();
        let deadline = Instant::now() + max_wait;
        let options = self.watch_options();

        let mut watch = self.source.watch(&options)?;
        debug!(
            max_wait_ms = max_wait.as_millis() as u64,
            desired_accuracy_m,
            per_sample_timeout_ms = options.per_sample_timeout_ms,
            "position stream opened"
        );

        let outcome =
            collect_best(watch.as_mut(), deadline, session_start_ms, desired_accuracy_m).await;
        watch.stop();

        match &outcome {
            Ok(sample) => info!(
                lat = sample.point.lat,
                lon = sample.point.lon,
                accuracy_m = ?sample.accuracy_m,
                "position acquired"
            ),
            Err(error) => warn!(%error, "position acquisition failed"),
        }
        outcome
    }
}

async fn collect_best(
    watch: &mut dyn PositionWatch,
    deadline: Instant,
    session_start_ms: u64,
    desired_accuracy_m: f64,
) -> LocateResult<PositionSample> {
    let mut best: Option<PositionSample> = None;
    let mut deadline_passed = false;

    loop {
        tokio::select! {
            biased;

            result = watch.next_sample() => {
                let sample = result?;

                if sample.captured_at_ms < session_start_ms {
                    debug!(
                        captured_at_ms = sample.captured_at_ms,
                        session_start_ms,
                        "dropping sample from before the session"
                    );
                    continue;
                }

                if sample.effective_accuracy_m() <= desired_accuracy_m {
                    debug!(accuracy_m = ?sample.accuracy_m, "accuracy target reached");
                    return Ok(sample);
                }

                // Ties keep the earlier sample
                let leader = match best.take() {
                    Some(current) if !sample.is_better_than(&current) => current,
                    _ => sample,
                };

                if deadline_passed || Instant::now() >= deadline {
                    return Ok(leader);
                }
                best = Some(leader);
            }

            _ = sleep_until(deadline), if !deadline_passed => {
                if let Some(sample) = best.take() {
                    debug!(accuracy_m = ?sample.accuracy_m, "wait bound reached, using best sample");
                    return Ok(sample);
                }
                debug!("wait bound reached without any sample, waiting for the next one");
                deadline_passed = true;
            }
        }
    }
}
