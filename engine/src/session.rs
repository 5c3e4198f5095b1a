use crate::chart::{self, ChartGeometry, ChartPoint, TooltipSize};
use crate::narrative::{self, NarrativeContext};
use crate::remote::{HvacBackend, LocationId};
use crate::samples::SampleStore;
use crate::setpoint::{CommitFollowup, SetpointState};
use crate::trend::{Trend, TrendEstimator};
use crate::types::{Sample, ScheduleSummary, TelemetryReading};
use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Per-session tuning. The debounce is measured from the last edit.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub geometry: ChartGeometry,
    pub tooltip: TooltipSize,
    pub debounce: Duration,
}

impl Default for SessionConfig {
    fn default() -> SessionConfig {
        SessionConfig {
            geometry: ChartGeometry::default(),
            tooltip: TooltipSize::default(),
            debounce: Duration::from_millis(500),
        }
    }
}

/// Tooltip payload for the currently hovered sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveTooltip {
    pub index: usize,
    pub sample: Sample,
    pub anchor: ChartPoint,
    pub position: ChartPoint,
}

/// Aggregated read-only projection for the surrounding UI.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub clock: DateTime<Local>,
    pub selected_day: Option<NaiveDate>,
    pub telemetry: Option<TelemetryReading>,
    pub schedule: Option<ScheduleSummary>,
    pub setpoint: Option<f64>,
    pub trend: Trend,
    pub narrative: String,
    pub last_error: Option<String>,
}

struct SessionState {
    samples: SampleStore,
    selected_day: Option<NaiveDate>,
    telemetry: Option<TelemetryReading>,
    schedule: Option<ScheduleSummary>,
    trend: TrendEstimator,
    setpoint: SetpointState,
    active_index: Option<usize>,
    last_error: Option<String>,
    clock: DateTime<Local>,
}

impl SessionState {
    fn new() -> SessionState {
        SessionState {
            samples: SampleStore::new(),
            selected_day: None,
            telemetry: None,
            schedule: None,
            trend: TrendEstimator::new(),
            setpoint: SetpointState::new(),
            active_index: None,
            last_error: None,
            clock: Local::now(),
        }
    }
}

/// Owner of all live dashboard state for one logged-in session.
///
/// Every mutation funnels through this object. Async responses are applied
/// only if the session generation is unchanged (teardown invalidates it) and
/// no newer request of the same kind has been issued since, so late
/// responses can never overwrite fresher data.
pub struct DashboardSession {
    backend: Arc<dyn HvacBackend>,
    location: Option<LocationId>,
    config: SessionConfig,
    generation: AtomicU64,
    telemetry_seq: AtomicU64,
    schedule_seq: AtomicU64,
    weather_seq: AtomicU64,
    state: RwLock<SessionState>,
    debounce_task: Mutex<Option<JoinHandle<()>>>,
}

impl DashboardSession {
    pub fn new(
        backend: Arc<dyn HvacBackend>,
        location: Option<LocationId>,
        config: SessionConfig,
    ) -> DashboardSession {
        DashboardSession {
            backend,
            location,
            config,
            generation: AtomicU64::new(0),
            telemetry_seq: AtomicU64::new(0),
            schedule_seq: AtomicU64::new(0),
            weather_seq: AtomicU64::new(0),
            state: RwLock::new(SessionState::new()),
            debounce_task: Mutex::new(None),
        }
    }

    pub fn location(&self) -> Option<&LocationId> {
        self.location.as_ref()
    }

    pub fn geometry(&self) -> ChartGeometry {
        self.config.geometry
    }

    fn still_current(&self, generation: u64, issued: &AtomicU64, seq: u64) -> bool {
        generation == self.generation.load(Ordering::SeqCst) && seq == issued.load(Ordering::SeqCst)
    }

    /// One fast-cadence telemetry refresh. Failures keep the previous
    /// reading and surface as a recoverable error.
    pub async fn poll_telemetry_once(&self) {
        let Some(location) = self.location.clone() else {
            return;
        };
        let generation = self.generation.load(Ordering::SeqCst);
        let seq = self.telemetry_seq.fetch_add(1, Ordering::SeqCst) + 1;

        match self.backend.telemetry(&location).await {
            Ok(reading) => {
                let mut state = self.state.write().await;
                if !self.still_current(generation, &self.telemetry_seq, seq) {
                    tracing::debug!(%location, "discarding stale telemetry response");
                    return;
                }
                state.trend.record(reading.inside_temp, Local::now());
                state.telemetry = Some(reading);
                state.last_error = None;
            }
            Err(err) => {
                tracing::warn!(%location, error = %err, "telemetry poll failed");
                let mut state = self.state.write().await;
                if generation == self.generation.load(Ordering::SeqCst) {
                    state.last_error = Some(err.to_string());
                }
            }
        }
    }

    /// One slow-cadence schedule refresh. The setpoint pipeline decides
    /// whether the reported target may be applied.
    pub async fn poll_schedule_once(&self) {
        let Some(location) = self.location.clone() else {
            return;
        };
        let generation = self.generation.load(Ordering::SeqCst);
        let seq = self.schedule_seq.fetch_add(1, Ordering::SeqCst) + 1;

        match self.backend.schedule(&location, None).await {
            Ok(summary) => {
                let mut state = self.state.write().await;
                if !self.still_current(generation, &self.schedule_seq, seq) {
                    tracing::debug!(%location, "discarding stale schedule response");
                    return;
                }
                if !state.setpoint.apply_poll(summary.target_temp) {
                    tracing::debug!(%location, "setpoint edit in progress, poll target ignored");
                }
                state.schedule = Some(summary);
                state.last_error = None;
            }
            Err(err) => {
                tracing::warn!(%location, error = %err, "schedule poll failed");
                let mut state = self.state.write().await;
                if generation == self.generation.load(Ordering::SeqCst) {
                    state.last_error = Some(err.to_string());
                }
            }
        }
    }

    /// One forecast refresh; the series is replaced wholesale.
    pub async fn poll_weather_once(&self) {
        let Some(location) = self.location.clone() else {
            return;
        };
        let generation = self.generation.load(Ordering::SeqCst);
        let seq = self.weather_seq.fetch_add(1, Ordering::SeqCst) + 1;

        match self.backend.weather_series(&location).await {
            Ok(rows) => {
                let mut state = self.state.write().await;
                if !self.still_current(generation, &self.weather_seq, seq) {
                    tracing::debug!(%location, "discarding stale weather response");
                    return;
                }
                state.samples.replace(rows);
                state.active_index = None;
                state.last_error = None;
                if state.selected_day.is_none() {
                    state.selected_day = Some(Local::now().date_naive());
                }
            }
            Err(err) => {
                tracing::warn!(%location, error = %err, "weather refresh failed");
                let mut state = self.state.write().await;
                if generation == self.generation.load(Ordering::SeqCst) {
                    state.last_error = Some(err.to_string());
                }
            }
        }
    }

    /// UI clock tick.
    pub async fn tick_clock(&self) {
        let mut state = self.state.write().await;
        state.clock = Local::now();
    }

    /// User adjusted the setpoint. Restarts the debounce; after it elapses
    /// undisturbed the latest value is committed. At most one commit is in
    /// flight; a newer edit supersedes an older pending one.
    pub async fn request_setpoint_change(self: Arc<Self>, value: f64) {
        if self.location.is_none() {
            tracing::debug!("setpoint change ignored, no active location");
            return;
        }

        let serial = {
            let mut state = self.state.write().await;
            state.setpoint.begin_edit(value)
        };

        let session = Arc::clone(&self);
        let generation = self.generation.load(Ordering::SeqCst);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(session.config.debounce).await;
            if session.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            let to_commit = {
                let mut state = session.state.write().await;
                state.setpoint.debounce_elapsed(serial)
            };
            if let Some(value) = to_commit {
                // Detached so that aborting a later edit's stale timer can
                // never cancel a commit already in flight.
                tokio::spawn(async move {
                    session.run_commit(value, generation).await;
                });
            }
        });

        let mut slot = self.debounce_task.lock().unwrap();
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    async fn run_commit(&self, mut value: f64, generation: u64) {
        loop {
            let Some(location) = self.location.clone() else {
                return;
            };
            // A commit supersedes any schedule poll already in flight.
            self.schedule_seq.fetch_add(1, Ordering::SeqCst);

            let result = self.backend.commit_setpoint(&location, value).await;
            let followup = {
                let mut state = self.state.write().await;
                if self.generation.load(Ordering::SeqCst) != generation {
                    return;
                }
                match result {
                    Ok(summary) => {
                        tracing::debug!(%location, setpoint = value, "setpoint committed");
                        let authoritative = summary.target_temp;
                        state.schedule = Some(summary);
                        state.last_error = None;
                        state.setpoint.commit_succeeded(value, authoritative)
                    }
                    Err(err) => {
                        tracing::warn!(%location, setpoint = value, error = %err, "setpoint commit failed");
                        state.last_error = Some(err.to_string());
                        state.setpoint.commit_failed()
                    }
                }
            };
            match followup {
                CommitFollowup::Settled => return,
                CommitFollowup::CommitNext(next) => value = next,
            }
        }
    }

    /// Switch the chart to another calendar day.
    pub async fn select_day(&self, day: NaiveDate) {
        let mut state = self.state.write().await;
        state.selected_day = Some(day);
        state.active_index = None;
    }

    pub async fn selected_day(&self) -> Option<NaiveDate> {
        self.state.read().await.selected_day
    }

    pub async fn available_days(&self) -> Vec<NaiveDate> {
        self.state.read().await.samples.days()
    }

    /// Chart coordinates for the selected day's samples.
    pub async fn current_day_chart_points(&self) -> Vec<ChartPoint> {
        let state = self.state.read().await;
        match state.selected_day {
            Some(day) => chart::project(&state.samples.day_bucket(day), &self.config.geometry),
            None => Vec::new(),
        }
    }

    pub async fn day_bucket(&self, day: NaiveDate) -> Vec<Sample> {
        self.state.read().await.samples.day_bucket(day)
    }

    /// Pointer moved over the chart at x; updates the hovered sample index.
    pub async fn pointer_moved(&self, pointer_x: f64) {
        let mut state = self.state.write().await;
        let len = match state.selected_day {
            Some(day) => state.samples.day_bucket(day).len(),
            None => 0,
        };
        state.active_index = chart::index_at(pointer_x, len, &self.config.geometry);
    }

    /// Pointer left the chart; the tooltip disappears immediately.
    pub async fn pointer_left(&self) {
        let mut state = self.state.write().await;
        state.active_index = None;
    }

    pub async fn active_tooltip(&self) -> Option<ActiveTooltip> {
        let state = self.state.read().await;
        let day = state.selected_day?;
        let index = state.active_index?;
        let bucket = state.samples.day_bucket(day);
        let sample = bucket.get(index)?.clone();
        let anchor = chart::project(&bucket, &self.config.geometry)[index];
        Some(ActiveTooltip {
            index,
            sample,
            anchor,
            position: chart::tooltip_position(anchor, self.config.tooltip, &self.config.geometry),
        })
    }

    pub async fn trend_summary(&self) -> Trend {
        self.state.read().await.trend.current()
    }

    pub async fn setpoint_display_value(&self) -> Option<f64> {
        self.state.read().await.setpoint.display_value()
    }

    pub async fn status_narrative(&self) -> String {
        let state = self.state.read().await;
        narrative::status_narrative(&Self::narrative_context(&state))
    }

    pub async fn status_snapshot(&self) -> StatusSnapshot {
        let state = self.state.read().await;
        StatusSnapshot {
            clock: state.clock,
            selected_day: state.selected_day,
            telemetry: state.telemetry.clone(),
            schedule: state.schedule.clone(),
            setpoint: state.setpoint.display_value(),
            trend: state.trend.current(),
            narrative: narrative::status_narrative(&Self::narrative_context(&state)),
            last_error: state.last_error.clone(),
        }
    }

    fn narrative_context(state: &SessionState) -> NarrativeContext {
        let telemetry = state.telemetry.as_ref();
        let outdoor = telemetry
            .and_then(|t| t.outside_temp)
            .or_else(|| state.samples.nearest_to(state.clock).map(|s| s.temperature));
        NarrativeContext {
            current: telemetry.map(|t| t.inside_temp),
            target: state.setpoint.display_value(),
            mode: telemetry.map(|t| t.hvac_mode).unwrap_or(crate::types::HvacMode::Off),
            outdoor,
            trend: state.trend.current(),
        }
    }

    /// Invalidate the session: late responses are dropped, the debounce
    /// timer dies, and per-session data is cleared. Poll loops are stopped
    /// by their scheduler; after this call their responses no longer apply.
    pub async fn teardown(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.debounce_task.lock().unwrap().take() {
            handle.abort();
        }
        let mut state = self.state.write().await;
        state.samples.clear();
        state.telemetry = None;
        state.schedule = None;
        state.trend.clear();
        state.active_index = None;
        state.selected_day = None;
        state.last_error = None;
        tracing::debug!("session torn down");
    }
}
