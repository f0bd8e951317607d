//! Polling pipeline feeding the flow chart
//!
//! A [`SampleStream`] owns the rolling [`SampleBuffer`] and the last
//! successfully fetched sample. While started, a tokio task ticks at a fixed
//! interval and spawns one [`SampleStream::poll`] per tick:
//!
//! 1. skip the tick if the previous fetch has not settled
//! 2. fetch one sample from the [`SampleSource`]
//! 3. success: cache it, append it, render
//! 4. throttled: append the cached sample and render
//! 5. network/parse failure: render the cached sample without appending
//!
//! Errors never reach the caller; the render callback simply gets a stale
//! value or nothing at all for that tick.

use crate::source::{FetchError, SampleSource};
use crate::stats::buffer::{FlowStats, SampleBuffer, DEFAULT_CAPACITY};
use crate::stream::gate::PollGate;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Default time between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Callback receiving every rendered summary
pub type UpdateCallback = Arc<dyn Fn(&FlowSummary) + Send + Sync>;

/// Errors returned by [`SampleStream::start`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("poll interval must be greater than zero")]
    ZeroInterval,

    #[error("buffer capacity must be greater than zero")]
    ZeroCapacity,

    #[error("no tokio runtime available to schedule polls")]
    NoRuntime,
}

/// Snapshot handed to the render callback
#[derive(Debug, Clone, Serialize)]
pub struct FlowSummary {
    /// Rolling history, oldest first
    pub buffer: Vec<f64>,
    pub min: f64,
    pub max: f64,
    pub average: f64,
    /// Value to show on the gauge (may be a cached sample)
    pub current: f64,
    /// When this summary was produced
    pub updated_at: DateTime<Utc>,
}

/// What a single poll did
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Another poll was still in flight; nothing was fetched
    Skipped,
    /// A fresh sample was cached and appended
    Recorded(f64),
    /// Throttled; the cached sample was appended
    CachedAppended(f64),
    /// Hard failure; the cached sample was rendered but not appended
    CachedShown(f64),
    /// The fetch failed and there is no cached sample to fall back on
    NoUpdate(FetchError),
}

#[derive(Debug)]
struct StreamState {
    buffer: SampleBuffer,
    last_known: Option<f64>,
    current: f64,
    /// Bumped for every summary headed to the callback
    seq: u64,
}

/// Summary tagged with the order it was produced in
struct Snapshot {
    seq: u64,
    summary: FlowSummary,
}

impl StreamState {
    fn snapshot(&mut self) -> Snapshot {
        self.seq += 1;
        Snapshot {
            seq: self.seq,
            summary: self.summary(),
        }
    }

    fn summary(&self) -> FlowSummary {
        let stats = self.buffer.stats(self.current);
        FlowSummary {
            buffer: self.buffer.to_vec(),
            min: stats.min,
            max: stats.max,
            average: stats.average,
            current: stats.current,
            updated_at: Utc::now(),
        }
    }
}

struct StreamInner<S> {
    source: S,
    state: Mutex<StreamState>,
    gate: PollGate,
    on_update: Option<UpdateCallback>,
    /// Sequence number of the last summary handed to `on_update`
    rendered: Mutex<u64>,
    fetch_timeout: Option<Duration>,
}

impl<S: SampleSource> StreamInner<S> {
    fn state(&self) -> MutexGuard<'_, StreamState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand a snapshot to the callback unless a newer one already went out
    fn render(&self, snapshot: Snapshot) {
        let Some(callback) = &self.on_update else {
            return;
        };
        let mut rendered = self.rendered.lock().unwrap_or_else(PoisonError::into_inner);
        if snapshot.seq <= *rendered {
            debug!(seq = snapshot.seq, "Dropping stale summary");
            return;
        }
        *rendered = snapshot.seq;
        callback(&snapshot.summary);
    }

    async fn poll(&self) -> PollOutcome {
        let Some(_permit) = self.gate.try_acquire() else {
            debug!("Previous poll still in flight, skipping tick");
            return PollOutcome::Skipped;
        };

        let result = self.fetch().await;
        let (outcome, snapshot) = self.apply(result);
        if let Some(snapshot) = snapshot {
            self.render(snapshot);
        }
        outcome
    }

    async fn fetch(&self) -> Result<f64, FetchError> {
        match self.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, self.source.fetch_sample())
                .await
                .unwrap_or_else(|_| {
                    Err(FetchError::Network(format!(
                        "timed out after {} ms",
                        limit.as_millis()
                    )))
                }),
            None => self.source.fetch_sample().await,
        }
    }

    fn apply(&self, result: Result<f64, FetchError>) -> (PollOutcome, Option<Snapshot>) {
        let mut state = self.state();
        let last_known = state.last_known;

        match result {
            Ok(value) => {
                debug!(value, "Flow sample received");
                state.last_known = Some(value);
                state.buffer.push(value);
                state.current = value;
                (PollOutcome::Recorded(value), Some(state.snapshot()))
            }
            Err(FetchError::Throttled) => match last_known {
                Some(cached) => {
                    warn!(cached, "Flow endpoint throttled, repeating cached sample");
                    state.buffer.push(cached);
                    state.current = cached;
                    (PollOutcome::CachedAppended(cached), Some(state.snapshot()))
                }
                None => {
                    warn!("Flow endpoint throttled and no cached sample yet");
                    (PollOutcome::NoUpdate(FetchError::Throttled), None)
                }
            },
            Err(e) => match last_known {
                Some(cached) => {
                    warn!(error = %e, cached, "Flow fetch failed, showing cached sample");
                    state.current = cached;
                    (PollOutcome::CachedShown(cached), Some(state.snapshot()))
                }
                None => {
                    warn!(error = %e, "Flow fetch failed and no cached sample yet");
                    (PollOutcome::NoUpdate(e), None)
                }
            },
        }
    }
}

/// Builder for [`SampleStream`]
pub struct SampleStreamBuilder<S> {
    source: S,
    on_update: Option<UpdateCallback>,
    fetch_timeout: Option<Duration>,
    capacity: usize,
}

impl<S: SampleSource + 'static> SampleStreamBuilder<S> {
    /// Callback invoked with every rendered summary
    ///
    /// Calls never overlap and arrive in the order the summaries were
    /// produced; a summary overtaken by a newer one is dropped. The callback
    /// runs on a runtime worker and must not start or poll the stream.
    pub fn on_update<F>(mut self, callback: F) -> Self
    where
        F: Fn(&FlowSummary) + Send + Sync + 'static,
    {
        self.on_update = Some(Arc::new(callback));
        self
    }

    /// Give up on a fetch after `timeout`; an elapsed timeout counts as a network error
    pub fn fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Capacity of the zero baseline visible before the first `start`
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn build(self) -> SampleStream<S> {
        SampleStream {
            inner: Arc::new(StreamInner {
                source: self.source,
                state: Mutex::new(StreamState {
                    buffer: SampleBuffer::new(self.capacity),
                    last_known: None,
                    current: 0.0,
                    seq: 0,
                }),
                gate: PollGate::new(),
                on_update: self.on_update,
                rendered: Mutex::new(0),
                fetch_timeout: self.fetch_timeout,
            }),
            timer: Mutex::new(None),
        }
    }
}

/// Rolling flow history fed by a periodic poll
pub struct SampleStream<S> {
    inner: Arc<StreamInner<S>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl<S: SampleSource + 'static> SampleStream<S> {
    /// Stream with no render callback and no fetch timeout
    pub fn new(source: S) -> Self {
        Self::builder(source).build()
    }

    pub fn builder(source: S) -> SampleStreamBuilder<S> {
        SampleStreamBuilder {
            source,
            on_update: None,
            fetch_timeout: None,
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Reset the buffer to `capacity` zeros, render the baseline and poll every `poll_interval`
    ///
    /// Any previous schedule is cancelled first. The cached sample survives
    /// and is shown as the baseline's current value.
    pub fn start(&self, poll_interval: Duration, capacity: usize) -> Result<(), StreamError> {
        if poll_interval.is_zero() {
            return Err(StreamError::ZeroInterval);
        }
        if capacity == 0 {
            return Err(StreamError::ZeroCapacity);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| StreamError::NoRuntime)?;

        self.cancel_timer();

        let snapshot = {
            let mut state = self.inner.state();
            let baseline = state.last_known.unwrap_or(0.0);
            state.buffer.reset(capacity);
            state.current = baseline;
            state.snapshot()
        };
        self.inner.render(snapshot);

        let inner = Arc::clone(&self.inner);
        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + poll_interval, poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                // Polls outlive the schedule so stop() never aborts a fetch
                let inner = Arc::clone(&inner);
                tokio::spawn(async move {
                    inner.poll().await;
                });
            }
        });
        *self.timer() = Some(handle);

        info!(
            interval_ms = poll_interval.as_millis() as u64,
            capacity, "Flow stream started"
        );
        Ok(())
    }

    /// Cancel the schedule, keeping buffer and cached sample
    ///
    /// A fetch already in flight still completes and may render.
    pub fn stop(&self) {
        if self.cancel_timer() {
            info!("Flow stream stopped");
        }
    }

    /// Run one acquisition step; the schedule calls this on every tick
    pub async fn poll(&self) -> PollOutcome {
        self.inner.poll().await
    }

    /// Min/max/average of the buffer plus the current gauge value
    pub fn current_stats(&self) -> FlowStats {
        let state = self.inner.state();
        state.buffer.stats(state.current)
    }

    /// Full snapshot, as the render callback would receive it
    pub fn summary(&self) -> FlowSummary {
        self.inner.state().summary()
    }

    /// Copy of the rolling history, oldest first
    pub fn buffer(&self) -> Vec<f64> {
        self.inner.state().buffer.to_vec()
    }

    /// Most recent successfully fetched sample
    pub fn last_known(&self) -> Option<f64> {
        self.inner.state().last_known
    }

    /// True while a schedule is active
    pub fn is_running(&self) -> bool {
        self.timer()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// True while a fetch is outstanding
    pub fn is_polling(&self) -> bool {
        self.inner.gate.is_in_flight()
    }

    fn timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel_timer(&self) -> bool {
        match self.timer().take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl<S> Drop for SampleStream<S> {
    fn drop(&mut self) {
        let timer = self
            .timer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = timer {
            handle.abort();
        }
    }
}
