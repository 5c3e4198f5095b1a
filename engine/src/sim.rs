//! Deterministic in-process collaborator.
//!
//! Stands in for the remote thermostat/weather service in tests and in the
//! dashboard's demo mode: a first-order indoor drift model with a deadband
//! thermostat, a 24-hour schedule builder with time-of-use pricing, and a
//! synthetic diurnal forecast.

use crate::remote::{HvacBackend, LocationId, RemoteError};
use crate::types::{
    HvacMode, Sample, ScheduleEntry, ScheduleMode, ScheduleSummary, TelemetryReading,
};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Local, Timelike};
use std::f64::consts::{PI, TAU};
use std::sync::Mutex;

/// Accepted setpoint range; commits outside it are clamped, not rejected.
pub const MIN_TARGET: f64 = 15.0;
pub const MAX_TARGET: f64 = 30.0;

/// The thermostat only engages beyond this gap from the target.
const DEADBAND: f64 = 0.5;

const HEAT_STEP: f64 = 0.2;
const COOL_STEP: f64 = 0.15;
const SOLAR_GAIN_PER_WM2: f64 = 0.0002;
const INDOOR_MIN: f64 = 10.0;
const INDOOR_MAX: f64 = 35.0;
const FORECAST_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insulation {
    Poor,
    Average,
    Excellent,
}

impl Insulation {
    /// Fraction of the indoor/outdoor gap closed per simulation step.
    fn drift_rate(&self) -> f64 {
        match self {
            Insulation::Poor => 0.03,
            Insulation::Average => 0.015,
            Insulation::Excellent => 0.005,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvacEquipment {
    Central,
    HeatPump,
    MiniSplit,
    WindowAc,
}

impl HvacEquipment {
    fn base_power_kw(&self, heating: bool) -> f64 {
        match (self, heating) {
            (HvacEquipment::Central, true) => 10.0,
            (HvacEquipment::Central, false) => 3.5,
            (HvacEquipment::HeatPump, _) => 3.0,
            (HvacEquipment::MiniSplit, true) => 1.5,
            (HvacEquipment::MiniSplit, false) => 1.2,
            (HvacEquipment::WindowAc, true) => 1.5,
            (HvacEquipment::WindowAc, false) => 1.0,
        }
    }
}

/// Static house characteristics driving the drift model.
#[derive(Debug, Clone)]
pub struct HouseProfile {
    pub insulation: Insulation,
    pub equipment: HvacEquipment,
    pub floor_area_sqft: f64,
    pub base_outdoor_temp: f64,
}

impl Default for HouseProfile {
    fn default() -> HouseProfile {
        HouseProfile {
            insulation: Insulation::Average,
            equipment: HvacEquipment::Central,
            floor_area_sqft: 1500.0,
            base_outdoor_temp: 12.0,
        }
    }
}

/// Time-of-use electricity price in $/kWh.
pub fn electricity_price(hour: u32) -> f64 {
    if hour >= 22 || hour < 6 {
        0.08
    } else if (16..21).contains(&hour) {
        0.20
    } else {
        0.12
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

struct SimState {
    indoor_temp: f64,
    target_temp: f64,
    weather: Vec<Sample>,
}

pub struct SimulatedBackend {
    house: HouseProfile,
    state: Mutex<SimState>,
}

impl SimulatedBackend {
    pub fn new(house: HouseProfile, initial_target: f64) -> SimulatedBackend {
        let weather = synth_forecast(&house);
        let target = initial_target.clamp(MIN_TARGET, MAX_TARGET);
        SimulatedBackend {
            house,
            state: Mutex::new(SimState {
                indoor_temp: target,
                target_temp: target,
                weather,
            }),
        }
    }

    fn capacity_kw(&self, heating: bool) -> f64 {
        let scale = (self.house.floor_area_sqft / 1500.0).clamp(0.5, 2.0);
        round2(self.house.equipment.base_power_kw(heating) * scale)
    }

    fn build_schedule(&self, state: &SimState) -> ScheduleSummary {
        let target = state.target_temp;
        let drift = self.house.insulation.drift_rate();
        let mut predicted = state.indoor_temp;
        let mut entries = Vec::with_capacity(24);
        let mut total_cost = 0.0;
        let mut total_energy = 0.0;
        let mut discomfort_hours = 0u32;

        for hour in 0..24u32 {
            let outdoor = state
                .weather
                .get(hour as usize)
                .map(|s| s.temperature)
                .unwrap_or(self.house.base_outdoor_temp);
            let gap = target - predicted;
            let peak_next = electricity_price((hour + 1) % 24) >= 0.20;
            let off_peak_now = electricity_price(hour) < 0.20;

            let (mode, power_kw, reason) = if gap > 1.0 || outdoor < target - 5.0 {
                predicted = (predicted + 1.0).min(target + 0.5);
                if off_peak_now && peak_next {
                    (
                        ScheduleMode::PreHeat,
                        self.capacity_kw(true),
                        "Pre-heating ahead of peak pricing".to_string(),
                    )
                } else {
                    (
                        ScheduleMode::Heat,
                        self.capacity_kw(true),
                        "Heating to hold target".to_string(),
                    )
                }
            } else if gap < -1.0 || outdoor > target + 5.0 {
                predicted = (predicted - 0.8).max(target - 0.5);
                if off_peak_now && peak_next {
                    (
                        ScheduleMode::PreCool,
                        self.capacity_kw(false),
                        "Pre-cooling ahead of peak pricing".to_string(),
                    )
                } else {
                    (
                        ScheduleMode::Cool,
                        self.capacity_kw(false),
                        "Cooling to hold target".to_string(),
                    )
                }
            } else {
                predicted += (outdoor - predicted) * drift;
                (ScheduleMode::Off, 0.0, "No action scheduled".to_string())
            };

            if (predicted - target).abs() > 1.0 {
                discomfort_hours += 1;
            }

            // One hour at power_kw: energy in kWh equals the power figure.
            let cost = round2(power_kw * electricity_price(hour));
            total_cost += cost;
            total_energy += power_kw;

            entries.push(ScheduleEntry {
                mode,
                start_time: format!("{hour:02}:00"),
                end_time: format!("{:02}:00", (hour + 1) % 24),
                power_kw,
                cost,
                reason,
            });
        }

        ScheduleSummary {
            target_temp: target,
            total_energy_kwh: round2(total_energy),
            total_cost: round2(total_cost),
            comfort_score: (95.0 - f64::from(discomfort_hours) * 2.0).clamp(0.0, 100.0),
            entries,
        }
    }
}

/// Hourly synthetic forecast from local midnight: a diurnal sinusoid with a
/// late-afternoon maximum, daylight-shaped solar radiation, and a mild wind
/// cycle. Deterministic for a given house profile and start time.
fn synth_forecast(house: &HouseProfile) -> Vec<Sample> {
    let now = Local::now();
    let day_start = now - ChronoDuration::seconds(i64::from(now.time().num_seconds_from_midnight()));

    (0..FORECAST_DAYS * 24)
        .map(|h| {
            let timestamp = day_start + ChronoDuration::hours(h);
            let hour = f64::from(timestamp.hour());
            let temperature =
                round2(house.base_outdoor_temp + 5.0 * (TAU * (hour - 10.0) / 24.0).sin());
            let solar = if (6.0..18.0).contains(&hour) {
                round2(600.0 * (PI * (hour - 6.0) / 12.0).sin())
            } else {
                0.0
            };
            let wind = round2(8.0 + 4.0 * (TAU * hour / 24.0).cos());
            Sample {
                timestamp,
                temperature,
                humidity: (55.0 - (temperature - house.base_outdoor_temp) * 2.0).clamp(20.0, 95.0),
                solar_radiation: solar.max(0.0),
                apparent_temperature: round2(temperature - wind * 0.1),
                dew_point: round2(temperature - 3.0),
                rain: 0.0,
                snow: 0.0,
                wind_speed: wind,
            }
        })
        .collect()
}

#[async_trait]
impl HvacBackend for SimulatedBackend {
    async fn telemetry(&self, _location: &LocationId) -> Result<TelemetryReading, RemoteError> {
        let mut state = self.state.lock().unwrap();
        let now = Local::now();
        let (outdoor, solar) = state
            .weather
            .iter()
            .min_by_key(|s| s.timestamp.signed_duration_since(now).num_seconds().abs())
            .map(|s| (s.temperature, s.solar_radiation))
            .unwrap_or((self.house.base_outdoor_temp, 0.0));

        let drift = (outdoor - state.indoor_temp) * self.house.insulation.drift_rate();
        let solar_gain = solar * SOLAR_GAIN_PER_WM2;
        let gap = state.target_temp - state.indoor_temp;

        let (hvac_mode, effect, hvac_power_kw, reason) = if gap > DEADBAND {
            (
                HvacMode::Heating,
                HEAT_STEP,
                self.capacity_kw(true),
                "Heating needed".to_string(),
            )
        } else if gap < -DEADBAND {
            (
                HvacMode::Cooling,
                -COOL_STEP,
                self.capacity_kw(false),
                "Cooling needed".to_string(),
            )
        } else {
            (HvacMode::Off, 0.0, 0.0, "At target temperature".to_string())
        };

        state.indoor_temp =
            (state.indoor_temp + drift + solar_gain + effect).clamp(INDOOR_MIN, INDOOR_MAX);

        Ok(TelemetryReading {
            inside_temp: round2(state.indoor_temp),
            outside_temp: Some(outdoor),
            hvac_mode,
            hvac_power_kw,
            reason,
            timestamp: now,
        })
    }

    async fn schedule(
        &self,
        _location: &LocationId,
        target: Option<f64>,
    ) -> Result<ScheduleSummary, RemoteError> {
        let mut state = self.state.lock().unwrap();
        if let Some(target) = target {
            state.target_temp = target.clamp(MIN_TARGET, MAX_TARGET);
        }
        Ok(self.build_schedule(&state))
    }

    async fn commit_setpoint(
        &self,
        _location: &LocationId,
        target: f64,
    ) -> Result<ScheduleSummary, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.target_temp = target.clamp(MIN_TARGET, MAX_TARGET);
        Ok(self.build_schedule(&state))
    }

    async fn weather_series(&self, _location: &LocationId) -> Result<Vec<Sample>, RemoteError> {
        Ok(self.state.lock().unwrap().weather.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> LocationId {
        LocationId::new("sim-home")
    }

    #[tokio::test]
    async fn thermostat_respects_the_deadband() {
        let sim = SimulatedBackend::new(HouseProfile::default(), 22.0);
        // Indoor starts at target, so the first reading is inside the band.
        let reading = sim.telemetry(&location()).await.unwrap();
        assert_eq!(reading.hvac_mode, HvacMode::Off);
        assert_eq!(reading.hvac_power_kw, 0.0);

        sim.state.lock().unwrap().indoor_temp = 19.0;
        let reading = sim.telemetry(&location()).await.unwrap();
        assert_eq!(reading.hvac_mode, HvacMode::Heating);
        assert!(reading.hvac_power_kw > 0.0);
        assert_eq!(reading.reason, "Heating needed");

        sim.state.lock().unwrap().indoor_temp = 26.0;
        let reading = sim.telemetry(&location()).await.unwrap();
        assert_eq!(reading.hvac_mode, HvacMode::Cooling);
    }

    #[tokio::test]
    async fn commits_clamp_to_the_comfort_range() {
        let sim = SimulatedBackend::new(HouseProfile::default(), 22.0);
        let summary = sim.commit_setpoint(&location(), 99.0).await.unwrap();
        assert_eq!(summary.target_temp, MAX_TARGET);
        let summary = sim.commit_setpoint(&location(), -10.0).await.unwrap();
        assert_eq!(summary.target_temp, MIN_TARGET);
    }

    #[tokio::test]
    async fn schedule_covers_24_hours_with_consistent_totals() {
        let sim = SimulatedBackend::new(HouseProfile::default(), 22.0);
        let summary = sim.schedule(&location(), None).await.unwrap();
        assert_eq!(summary.entries.len(), 24);
        assert_eq!(summary.entries[0].start_time, "00:00");
        assert_eq!(summary.entries[23].end_time, "00:00");

        let cost: f64 = summary.entries.iter().map(|e| e.cost).sum();
        assert!((summary.total_cost - round2(cost)).abs() < 0.01);
        let energy: f64 = summary.entries.iter().map(|e| e.power_kw).sum();
        assert!((summary.total_energy_kwh - round2(energy)).abs() < 0.01);
        assert!((0.0..=100.0).contains(&summary.comfort_score));
    }

    #[tokio::test]
    async fn forecast_is_hourly_and_spans_a_week() {
        let sim = SimulatedBackend::new(HouseProfile::default(), 22.0);
        let rows = sim.weather_series(&location()).await.unwrap();
        assert_eq!(rows.len(), 7 * 24);
        assert!(rows
            .windows(2)
            .all(|w| (w[1].timestamp - w[0].timestamp).num_hours() == 1));
        // Solar radiation goes dark at night.
        assert_eq!(rows[0].solar_radiation, 0.0);
        assert!(rows[12].solar_radiation > 0.0);
    }

    #[test]
    fn pricing_matches_the_time_of_use_bands() {
        assert_eq!(electricity_price(2), 0.08);
        assert_eq!(electricity_price(23), 0.08);
        assert_eq!(electricity_price(10), 0.12);
        assert_eq!(electricity_price(21), 0.12);
        assert_eq!(electricity_price(16), 0.20);
        assert_eq!(electricity_price(20), 0.20);
    }
}
