use crate::types::{Sample, ScheduleSummary, TelemetryReading};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Identifier of the monitored location, as issued by the account service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LocationId(String);

impl LocationId {
    pub fn new(id: impl Into<String>) -> LocationId {
        LocationId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failures from the remote collaborators. All variants are recoverable:
/// polls retain the previous state and retry on the next tick, commits fall
/// back to the editing state.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request rejected: {0}")]
    Rejected(String),
}

/// The remote thermostat/weather collaborators, as abstract contracts.
///
/// Setpoint targets are clamped server-side to the 15-30°C comfort range;
/// callers see the clamped value come back in the returned summary.
#[async_trait]
pub trait HvacBackend: Send + Sync {
    /// Current thermostat state; polled on the fast cadence.
    async fn telemetry(&self, location: &LocationId) -> Result<TelemetryReading, RemoteError>;

    /// Upcoming schedule and totals; polled on the slow cadence. A `None`
    /// target means "use the server-saved value".
    async fn schedule(
        &self,
        location: &LocationId,
        target: Option<f64>,
    ) -> Result<ScheduleSummary, RemoteError>;

    /// Persist a user setpoint and return the recomputed schedule.
    async fn commit_setpoint(
        &self,
        location: &LocationId,
        target: f64,
    ) -> Result<ScheduleSummary, RemoteError>;

    /// Full forecast series for the location.
    async fn weather_series(&self, location: &LocationId) -> Result<Vec<Sample>, RemoteError>;
}
