//! HTTP implementation of the collaborator contracts.
//!
//! Wire DTOs keep the collaborator's own field names (camelCase envelopes,
//! forecast rows with `temperature_2m`-style keys) and convert into engine
//! types at this boundary. Forecast rows missing a timestamp or temperature
//! are dropped; other missing numerics default to zero.

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::Deserialize;
use std::time::Duration;
use thermoview_engine::{
    HvacBackend, HvacMode, LocationId, RemoteError, Sample, ScheduleEntry, ScheduleMode,
    ScheduleSummary, TelemetryReading,
};

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Result<HttpBackend, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(HttpBackend {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn map_error(err: reqwest::Error) -> RemoteError {
    if err.is_status() {
        RemoteError::Rejected(err.to_string())
    } else if err.is_decode() {
        RemoteError::Malformed(err.to_string())
    } else {
        RemoteError::Transport(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TelemetryDto {
    inside_temp: f64,
    outside_temp: Option<f64>,
    hvac_mode: HvacMode,
    #[serde(default)]
    hvac_power: f64,
    #[serde(default)]
    reason: String,
    timestamp: Option<String>,
}

impl TelemetryDto {
    fn into_reading(self) -> TelemetryReading {
        let timestamp = self
            .timestamp
            .as_deref()
            .and_then(parse_collaborator_time)
            .unwrap_or_else(Local::now);
        TelemetryReading {
            inside_temp: self.inside_temp,
            outside_temp: self.outside_temp,
            hvac_mode: self.hvac_mode,
            hvac_power_kw: self.hvac_power,
            reason: self.reason,
            timestamp,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleEntryDto {
    mode: ScheduleMode,
    #[serde(default)]
    start_time: String,
    #[serde(default)]
    end_time: String,
    #[serde(default)]
    power_kw: f64,
    #[serde(default)]
    cost: f64,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleDto {
    target_temp: f64,
    #[serde(default)]
    total_energy_kwh: f64,
    #[serde(default)]
    total_cost: f64,
    #[serde(default)]
    comfort_score: f64,
    #[serde(default)]
    notifications: Vec<ScheduleEntryDto>,
}

impl ScheduleDto {
    fn into_summary(self) -> ScheduleSummary {
        ScheduleSummary {
            target_temp: self.target_temp,
            total_energy_kwh: self.total_energy_kwh,
            total_cost: self.total_cost,
            comfort_score: self.comfort_score,
            entries: self
                .notifications
                .into_iter()
                .map(|entry| ScheduleEntry {
                    mode: entry.mode,
                    start_time: entry.start_time,
                    end_time: entry.end_time,
                    power_kw: entry.power_kw,
                    cost: entry.cost,
                    reason: entry.reason,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WeatherRowDto {
    date: Option<String>,
    temperature_2m: Option<f64>,
    #[serde(default)]
    humidity_2m: Option<f64>,
    #[serde(default)]
    solar_radiation: Option<f64>,
    #[serde(default)]
    apparent_temperature: Option<f64>,
    #[serde(default)]
    dew_point_2m: Option<f64>,
    #[serde(default)]
    rain: Option<f64>,
    #[serde(default)]
    snowfall: Option<f64>,
    #[serde(default)]
    windspeed_10m: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WeatherSeriesDto {
    #[serde(default)]
    rows: Vec<WeatherRowDto>,
}

impl WeatherRowDto {
    fn into_sample(self) -> Option<Sample> {
        let timestamp = parse_collaborator_time(self.date.as_deref()?)?;
        let temperature = self.temperature_2m?;
        Some(Sample {
            timestamp,
            temperature,
            humidity: self.humidity_2m.unwrap_or(0.0),
            solar_radiation: self.solar_radiation.unwrap_or(0.0),
            apparent_temperature: self.apparent_temperature.unwrap_or(temperature),
            dew_point: self.dew_point_2m.unwrap_or(0.0),
            rain: self.rain.unwrap_or(0.0),
            snow: self.snowfall.unwrap_or(0.0),
            wind_speed: self.windspeed_10m.unwrap_or(0.0),
        })
    }
}

/// The collaborator formats timestamps either as RFC 3339 or as
/// `YYYY-MM-DD HH:MM:SS TZ`; the trailing zone abbreviation is informational
/// and the wall-clock part is already local time.
fn parse_collaborator_time(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Local));
    }
    let wall_clock = raw.get(..19)?;
    let naive = NaiveDateTime::parse_from_str(wall_clock, "%Y-%m-%d %H:%M:%S").ok()?;
    Local.from_local_datetime(&naive).earliest()
}

#[async_trait]
impl HvacBackend for HttpBackend {
    async fn telemetry(&self, location: &LocationId) -> Result<TelemetryReading, RemoteError> {
        let url = self.url(&format!("/api/thermostat/{location}/telemetry"));
        let dto: TelemetryDto = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(map_error)?
            .json()
            .await
            .map_err(map_error)?;
        Ok(dto.into_reading())
    }

    async fn schedule(
        &self,
        location: &LocationId,
        target: Option<f64>,
    ) -> Result<ScheduleSummary, RemoteError> {
        let url = self.url(&format!("/api/hvac/{location}/schedule"));
        let mut request = self.client.get(url);
        if let Some(target) = target {
            request = request.query(&[("target", target)]);
        }
        let dto: ScheduleDto = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(map_error)?
            .json()
            .await
            .map_err(map_error)?;
        Ok(dto.into_summary())
    }

    async fn commit_setpoint(
        &self,
        location: &LocationId,
        target: f64,
    ) -> Result<ScheduleSummary, RemoteError> {
        let url = self.url(&format!("/api/hvac/{location}/schedule"));
        let dto: ScheduleDto = self
            .client
            .post(url)
            .json(&serde_json::json!({ "targetTemp": target }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(map_error)?
            .json()
            .await
            .map_err(map_error)?;
        Ok(dto.into_summary())
    }

    async fn weather_series(&self, location: &LocationId) -> Result<Vec<Sample>, RemoteError> {
        let url = self.url(&format!("/api/weather/{location}"));
        let dto: WeatherSeriesDto = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(map_error)?
            .json()
            .await
            .map_err(map_error)?;
        Ok(dto.rows.into_iter().filter_map(WeatherRowDto::into_sample).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telemetry_dto_maps_into_a_reading() {
        let dto: TelemetryDto = serde_json::from_str(
            r#"{
                "insideTemp": 21.4,
                "outsideTemp": 8.0,
                "hvacMode": "heating",
                "hvacPower": 3.0,
                "reason": "Heating needed",
                "timestamp": "2024-03-04 06:00:00 EST"
            }"#,
        )
        .unwrap();
        let reading = dto.into_reading();
        assert_eq!(reading.inside_temp, 21.4);
        assert_eq!(reading.hvac_mode, HvacMode::Heating);
        assert_eq!(reading.hvac_power_kw, 3.0);
        assert_eq!(reading.timestamp.date_naive().to_string(), "2024-03-04");
    }

    #[test]
    fn schedule_dto_maps_notifications_into_entries() {
        let dto: ScheduleDto = serde_json::from_str(
            r#"{
                "targetTemp": 22.0,
                "totalEnergyKwh": 18.5,
                "totalCost": 2.22,
                "comfortScore": 93.0,
                "notifications": [
                    {"mode": "pre-heat", "startTime": "14:00", "endTime": "15:00",
                     "powerKw": 10.0, "cost": 1.2, "reason": "Pre-heating ahead of peak pricing"},
                    {"mode": "off", "startTime": "15:00", "endTime": "16:00"}
                ]
            }"#,
        )
        .unwrap();
        let summary = dto.into_summary();
        assert_eq!(summary.target_temp, 22.0);
        assert_eq!(summary.entries.len(), 2);
        assert_eq!(summary.entries[0].mode, ScheduleMode::PreHeat);
        assert_eq!(summary.entries[1].mode, ScheduleMode::Off);
        assert_eq!(summary.entries[1].power_kw, 0.0);
    }

    #[test]
    fn forecast_rows_without_timestamp_or_temperature_are_dropped() {
        let dto: WeatherSeriesDto = serde_json::from_str(
            r#"{"rows": [
                {"date": "2024-03-04 06:00:00 EST", "temperature_2m": 3.5,
                 "humidity_2m": 80.0, "windspeed_10m": 12.0},
                {"date": "2024-03-04 07:00:00 EST", "temperature_2m": null},
                {"date": null, "temperature_2m": 4.0},
                {"temperature_2m": 5.0}
            ]}"#,
        )
        .unwrap();
        let samples: Vec<Sample> = dto
            .rows
            .into_iter()
            .filter_map(WeatherRowDto::into_sample)
            .collect();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].temperature, 3.5);
        assert_eq!(samples[0].humidity, 80.0);
        assert_eq!(samples[0].wind_speed, 12.0);
        // Unreported numerics default rather than poisoning the row.
        assert_eq!(samples[0].rain, 0.0);
    }

    #[test]
    fn collaborator_times_parse_in_both_formats() {
        assert!(parse_collaborator_time("2024-03-04T06:00:00-05:00").is_some());
        assert!(parse_collaborator_time("2024-03-04 06:00:00 EST").is_some());
        assert!(parse_collaborator_time("2024-03-04 06:00:00").is_some());
        assert!(parse_collaborator_time("not a time").is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let backend = HttpBackend::new("http://localhost:8000/").unwrap();
        assert_eq!(
            backend.url("/api/weather/home-1"),
            "http://localhost:8000/api/weather/home-1"
        );
    }
}
