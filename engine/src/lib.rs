//! Live control and time-series engine for the household energy dashboard.
//!
//! Owns the polled thermostat/weather state for one session: the raw sample
//! series with its per-day chart projection and tooltip hit-testing, the
//! sliding-window temperature trend, the debounced race-safe setpoint commit
//! pipeline, and the status narrative. Remote collaborators are reached
//! through the [`remote::HvacBackend`] trait; [`sim::SimulatedBackend`]
//! provides a deterministic in-process stand-in.

pub mod chart;
pub mod narrative;
pub mod poll;
pub mod remote;
pub mod samples;
pub mod session;
pub mod setpoint;
pub mod sim;
pub mod trend;
pub mod types;

pub use poll::{PollIntervals, PollScheduler};
pub use remote::{HvacBackend, LocationId, RemoteError};
pub use session::{DashboardSession, SessionConfig, StatusSnapshot};
pub use types::{HvacMode, Sample, ScheduleEntry, ScheduleMode, ScheduleSummary, TelemetryReading};
