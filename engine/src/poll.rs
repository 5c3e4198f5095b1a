use crate::session::DashboardSession;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Cadences for the three refresh loops.
#[derive(Debug, Clone, Copy)]
pub struct PollIntervals {
    /// Fast thermostat telemetry.
    pub telemetry: Duration,
    /// Schedule summary and forecast series.
    pub schedule: Duration,
    /// UI clock tick.
    pub clock: Duration,
}

impl Default for PollIntervals {
    fn default() -> PollIntervals {
        PollIntervals {
            telemetry: Duration::from_secs(5),
            schedule: Duration::from_secs(60),
            clock: Duration::from_secs(1),
        }
    }
}

/// Runs the session's periodic refresh loops.
///
/// Each loop fires immediately on start and then at its fixed cadence; a
/// failure in one loop never affects the others. Loops hold the interval
/// across the refresh itself, so responses of one kind always apply in
/// issue order; missed ticks are delayed rather than bursted.
pub struct PollScheduler {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl PollScheduler {
    pub fn start(session: Arc<DashboardSession>, intervals: PollIntervals) -> PollScheduler {
        let cancel = CancellationToken::new();
        let handles = vec![
            spawn_loop(Arc::clone(&session), intervals.telemetry, cancel.clone(), Loop::Telemetry),
            spawn_loop(Arc::clone(&session), intervals.schedule, cancel.clone(), Loop::Schedule),
            spawn_loop(session, intervals.clock, cancel.clone(), Loop::Clock),
        ];
        PollScheduler { cancel, handles }
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Stop all loops and wait for them to exit. No timers survive this.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        join_all(self.handles).await;
        tracing::debug!("poll loops stopped");
    }
}

#[derive(Debug, Clone, Copy)]
enum Loop {
    Telemetry,
    Schedule,
    Clock,
}

fn spawn_loop(
    session: Arc<DashboardSession>,
    every: Duration,
    cancel: CancellationToken,
    kind: Loop,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => match kind {
                    Loop::Telemetry => session.poll_telemetry_once().await,
                    Loop::Schedule => {
                        session.poll_schedule_once().await;
                        session.poll_weather_once().await;
                    }
                    Loop::Clock => session.tick_clock().await,
                },
            }
        }
    })
}
