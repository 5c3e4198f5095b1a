//! Projection routes for the surrounding UI.
//!
//! The engine stays the single owner of all live state; these handlers only
//! read its projections and forward the one supported command.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thermoview_engine::chart::{self, ChartGeometry, ChartPoint};
use thermoview_engine::session::StatusSnapshot;
use thermoview_engine::{DashboardSession, Sample};
use tower_http::compression::CompressionLayer;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<DashboardSession>,
}

pub fn router(session: Arc<DashboardSession>) -> Router {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/chart", get(get_chart))
        .route("/api/days", get(get_days))
        .route("/api/setpoint", post(set_setpoint))
        .layer(CompressionLayer::new())
        .with_state(AppState { session })
}

async fn get_status(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.session.status_snapshot().await)
}

#[derive(Deserialize)]
struct ChartQuery {
    day: Option<NaiveDate>,
}

#[derive(Serialize)]
struct ChartResponse {
    day: Option<NaiveDate>,
    geometry: ChartGeometry,
    points: Vec<ChartPoint>,
    samples: Vec<Sample>,
}

/// Chart data for the requested day, defaulting to the session's selected
/// day. A day with no samples comes back empty rather than erroring.
async fn get_chart(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Json<ChartResponse> {
    let session = &state.session;
    let geometry = session.geometry();
    let day = match query.day {
        Some(day) => Some(day),
        None => session.selected_day().await,
    };
    let samples = match day {
        Some(day) => session.day_bucket(day).await,
        None => Vec::new(),
    };
    let points = chart::project(&samples, &geometry);
    Json(ChartResponse {
        day,
        geometry,
        points,
        samples,
    })
}

async fn get_days(State(state): State<AppState>) -> Json<Vec<NaiveDate>> {
    Json(state.session.available_days().await)
}

#[derive(Deserialize)]
struct SetpointRequest {
    target: f64,
}

async fn set_setpoint(
    State(state): State<AppState>,
    Json(request): Json<SetpointRequest>,
) -> Json<serde_json::Value> {
    Arc::clone(&state.session)
        .request_setpoint_change(request.target)
        .await;
    Json(serde_json::json!({
        "success": true,
        "display": state.session.setpoint_display_value().await,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use thermoview_engine::sim::{HouseProfile, SimulatedBackend};
    use thermoview_engine::{LocationId, SessionConfig};

    fn demo_state() -> AppState {
        let backend = Arc::new(SimulatedBackend::new(HouseProfile::default(), 22.0));
        let session = Arc::new(DashboardSession::new(
            backend,
            Some(LocationId::new("demo-home")),
            SessionConfig {
                debounce: Duration::from_millis(10),
                ..SessionConfig::default()
            },
        ));
        AppState { session }
    }

    #[tokio::test]
    async fn status_reflects_polled_simulator_state() {
        let state = demo_state();
        state.session.poll_schedule_once().await;
        state.session.poll_telemetry_once().await;

        let Json(snapshot) = get_status(State(state)).await;
        assert_eq!(snapshot.setpoint, Some(22.0));
        assert!(snapshot.telemetry.is_some());
        assert!(snapshot.schedule.is_some());
        assert!(!snapshot.narrative.is_empty());
    }

    #[tokio::test]
    async fn chart_returns_the_selected_day_by_default() {
        let state = demo_state();
        state.session.poll_weather_once().await;

        let Json(response) = get_chart(
            State(state.clone()),
            Query(ChartQuery { day: None }),
        )
        .await;
        assert!(response.day.is_some());
        assert_eq!(response.points.len(), response.samples.len());
        assert_eq!(response.points.len(), 24);

        let Json(days) = get_days(State(state)).await;
        assert_eq!(days.len(), 7);
    }

    #[tokio::test]
    async fn setpoint_command_reports_the_new_display_value() {
        let state = demo_state();
        state.session.poll_schedule_once().await;

        let Json(body) = set_setpoint(
            State(state.clone()),
            Json(SetpointRequest { target: 24.5 }),
        )
        .await;
        assert_eq!(body["success"], true);
        assert_eq!(body["display"], 24.5);

        tokio::time::sleep(Duration::from_millis(100)).await;
        // Debounce elapsed: the simulator confirmed the commit.
        assert_eq!(state.session.setpoint_display_value().await, Some(24.5));
    }
}
