use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One timestamped weather reading for a location.
///
/// Immutable once received; the timestamp is the ordering key. All numeric
/// fields are in the units the forecast source reports them in (°C, %,
/// W/m², mm, km/h).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Local>,
    pub temperature: f64,
    pub humidity: f64,
    pub solar_radiation: f64,
    pub apparent_temperature: f64,
    pub dew_point: f64,
    pub rain: f64,
    pub snow: f64,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacMode {
    Heating,
    Cooling,
    Off,
}

impl HvacMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HvacMode::Heating => "heating",
            HvacMode::Cooling => "cooling",
            HvacMode::Off => "off",
        }
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current thermostat state as reported by the telemetry endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryReading {
    pub inside_temp: f64,
    pub outside_temp: Option<f64>,
    pub hvac_mode: HvacMode,
    pub hvac_power_kw: f64,
    pub reason: String,
    pub timestamp: DateTime<Local>,
}

/// Scheduled HVAC action mode. Pre-heat/pre-cool run ahead of a pricing
/// peak; plain heat/cool react to the current temperature gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleMode {
    Heat,
    Cool,
    PreHeat,
    PreCool,
    Off,
}

impl ScheduleMode {
    pub fn is_active(&self) -> bool {
        !matches!(self, ScheduleMode::Off)
    }
}

/// One row of the upcoming HVAC schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub mode: ScheduleMode,
    pub start_time: String,
    pub end_time: String,
    pub power_kw: f64,
    pub cost: f64,
    pub reason: String,
}

/// Authoritative schedule state returned by the schedule endpoint and by a
/// setpoint commit. Entries are replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub target_temp: f64,
    pub total_energy_kwh: f64,
    pub total_cost: f64,
    pub comfort_score: f64,
    pub entries: Vec<ScheduleEntry>,
}
