use crate::trend::Trend;
use crate::types::HvacMode;

/// Inputs for one narrative evaluation.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeContext {
    pub current: Option<f64>,
    pub target: Option<f64>,
    pub mode: HvacMode,
    pub outdoor: Option<f64>,
    pub trend: Trend,
}

/// Human status line for the thermostat card.
///
/// Deterministic rule table, evaluated in precedence order:
/// missing reading, active conditioning by temperature gap, off-at-target,
/// natural drift while off, generic idle. Gap thresholds are 2.0 / 0.5 °C.
pub fn status_narrative(ctx: &NarrativeContext) -> String {
    let (current, target) = match (ctx.current, ctx.target) {
        (Some(current), Some(target)) => (current, target),
        _ => return "Waiting for the first reading".to_string(),
    };
    let gap = (target - current).abs();

    match ctx.mode {
        HvacMode::Heating | HvacMode::Cooling => {
            let verb = if ctx.mode == HvacMode::Heating {
                "heating"
            } else {
                "cooling"
            };
            if gap > 2.0 {
                format!("Actively {verb} toward {target:.1}°C ({})", ctx.trend)
            } else if gap > 0.5 {
                format!("Almost at target, {verb} ({})", ctx.trend)
            } else {
                format!("Fine-tuning around {target:.1}°C ({})", ctx.trend)
            }
        }
        HvacMode::Off => {
            if gap <= 0.5 {
                return format!("At target: {target:.1}°C");
            }
            if let Some(outdoor) = ctx.outdoor {
                // Sign test: is outdoor air moving the house toward the target?
                if (outdoor - current) * (target - current) > 0.0 {
                    return format!("Idle: outdoor air is nudging the house toward {target:.1}°C");
                }
                return format!("Idle: outdoor air is pulling the house away from {target:.1}°C");
            }
            format!("Idle, target {target:.1}°C")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend::{TrendDirection, Trend};

    fn ctx(current: f64, target: f64, mode: HvacMode) -> NarrativeContext {
        NarrativeContext {
            current: Some(current),
            target: Some(target),
            mode,
            outdoor: None,
            trend: Trend::flat(),
        }
    }

    #[test]
    fn missing_reading_is_initializing() {
        let mut c = ctx(21.0, 22.0, HvacMode::Off);
        c.current = None;
        assert_eq!(status_narrative(&c), "Waiting for the first reading");

        let mut c = ctx(21.0, 22.0, HvacMode::Off);
        c.target = None;
        assert_eq!(status_narrative(&c), "Waiting for the first reading");
    }

    #[test]
    fn wide_gap_while_heating_is_active_conditioning() {
        // 21.4 vs target 24: gap 2.6 > 2.
        let line = status_narrative(&ctx(21.4, 24.0, HvacMode::Heating));
        assert!(line.starts_with("Actively heating"), "{line}");
    }

    #[test]
    fn medium_gap_is_almost_at_target() {
        let line = status_narrative(&ctx(23.0, 24.0, HvacMode::Heating));
        assert!(line.starts_with("Almost at target"), "{line}");
    }

    #[test]
    fn small_gap_while_conditioning_is_fine_tuning() {
        let line = status_narrative(&ctx(23.7, 24.0, HvacMode::Cooling));
        assert!(line.starts_with("Fine-tuning"), "{line}");
    }

    #[test]
    fn off_within_half_degree_is_at_target() {
        // 22.0 vs 22.3: gap 0.3 <= 0.5.
        assert_eq!(
            status_narrative(&ctx(22.0, 22.3, HvacMode::Off)),
            "At target: 22.3°C"
        );
    }

    #[test]
    fn drift_toward_target_beats_generic_idle() {
        let mut c = ctx(20.0, 23.0, HvacMode::Off);
        c.outdoor = Some(28.0);
        let line = status_narrative(&c);
        assert!(line.contains("nudging the house toward"), "{line}");
    }

    #[test]
    fn drift_away_from_target_is_called_out() {
        let mut c = ctx(20.0, 23.0, HvacMode::Off);
        c.outdoor = Some(5.0);
        let line = status_narrative(&c);
        assert!(line.contains("pulling the house away"), "{line}");
    }

    #[test]
    fn no_outdoor_reading_falls_back_to_idle() {
        let line = status_narrative(&ctx(20.0, 23.0, HvacMode::Off));
        assert_eq!(line, "Idle, target 23.0°C");
    }

    #[test]
    fn trend_annotation_appears_on_conditioning_branches() {
        let mut c = ctx(21.0, 24.0, HvacMode::Heating);
        c.trend = Trend {
            direction: TrendDirection::Rising,
            rate_per_minute: 1.2,
        };
        let line = status_narrative(&c);
        assert!(line.contains("rising 1.2°C/min"), "{line}");
    }
}
