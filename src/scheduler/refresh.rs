//! Weekday history refresh job
//!
//! Runs once per weekday at a configured hour (B3 market timezone), pulling
//! a one-day history for each configured symbol through the Quote Service
//! and appending it to the cache. One symbol's failure never aborts the
//! remaining symbols; every outcome is logged.

use crate::error::Result;
use crate::services::QuoteService;
use crate::state::AppState;
use chrono::{DateTime, Datelike, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::America::Sao_Paulo;
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{error, info};

/// Timezone whose calendar drives the trigger (B3 exchange).
const MARKET_TZ: Tz = Sao_Paulo;

/// Per-symbol outcome of one refresh run
#[derive(Debug)]
pub struct RefreshOutcome {
    pub symbol: String,
    /// Number of rows saved, or the error that stopped this symbol.
    pub result: Result<usize>,
}

/// Background scheduler for the history refresh
///
/// Explicit lifecycle object: constructed with its dependencies, started
/// once, stoppable on shutdown. No ambient globals.
pub struct RefreshScheduler {
    state: Arc<AppState>,
    symbols: Vec<String>,
    hour: u32,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl RefreshScheduler {
    pub fn new(state: Arc<AppState>, symbols: Vec<String>, hour: u32) -> Self {
        Self {
            state,
            symbols,
            hour,
            shutdown_tx: None,
        }
    }

    /// Start the scheduler task. Calling `start` twice is a no-op.
    pub fn start(&mut self) {
        if self.shutdown_tx.is_some() {
            return;
        }

        let (tx, mut rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(tx);

        let state = self.state.clone();
        let symbols = self.symbols.clone();
        let hour = self.hour;

        tokio::spawn(async move {
            info!(
                "Refresh scheduler started: {} symbols, weekdays at {:02}:00 {}",
                symbols.len(),
                hour,
                MARKET_TZ
            );

            loop {
                let now = Utc::now().with_timezone(&MARKET_TZ);
                let wait = duration_until_next_run(now, hour);
                info!(
                    "Next refresh in {}h{:02}m",
                    wait.as_secs() / 3600,
                    (wait.as_secs() % 3600) / 60
                );

                tokio::select! {
                    _ = tokio::time::sleep(wait) => {
                        let outcomes = refresh_all(&state, &symbols).await;
                        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
                        info!(
                            "Refresh run finished: {} ok, {} failed",
                            outcomes.len() - failed,
                            failed
                        );
                    }
                    _ = &mut rx => {
                        info!("Refresh scheduler stopped");
                        break;
                    }
                }
            }
        });
    }

    /// Signal the scheduler task to stop.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some()
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Refresh every symbol sequentially, isolating per-symbol failures.
pub async fn refresh_all(state: &AppState, symbols: &[String]) -> Vec<RefreshOutcome> {
    let mut outcomes = Vec::with_capacity(symbols.len());

    for symbol in symbols {
        let result = refresh_one(state, symbol).await;
        if let Err(e) = &result {
            error!("Refresh failed for {}: {}", symbol, e);
        }
        outcomes.push(RefreshOutcome {
            symbol: symbol.clone(),
            result,
        });
    }

    outcomes
}

async fn refresh_one(state: &AppState, symbol: &str) -> Result<usize> {
    let bars = QuoteService::fetch_history(state, symbol, 1).await?;
    QuoteService::save_history(state, &bars)
}

/// Time until the next weekday trigger at `hour`:00 in the market timezone.
/// Pure in `now` so the weekday/rollover logic is testable.
fn duration_until_next_run(now: DateTime<Tz>, hour: u32) -> Duration {
    let target = NaiveTime::from_hms_opt(hour, 0, 0).expect("hour validated by config");

    let mut date = now.date_naive();
    if now.time() >= target {
        date = date.succ_opt().expect("date range");
    }
    while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        date = date.succ_opt().expect("date range");
    }

    let naive = date.and_time(target);
    let next = MARKET_TZ
        .from_local_datetime(&naive)
        .earliest()
        // local time skipped by a DST transition: run an hour later
        .or_else(|| {
            MARKET_TZ
                .from_local_datetime(&(naive + chrono::Duration::hours(1)))
                .earliest()
        });

    match next {
        Some(next) => (next - now).to_std().unwrap_or(Duration::ZERO),
        None => Duration::from_secs(24 * 3600),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::SqliteDb;
    use crate::market::testing::{bars_from_closes, ScriptedMarket};
    use tempfile::tempdir;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Tz> {
        MARKET_TZ.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn same_day_trigger_when_before_the_hour() {
        // Monday 2024-06-03 10:00 -> 18:00 same day
        let wait = duration_until_next_run(at(2024, 6, 3, 10, 0), 18);
        assert_eq!(wait.as_secs(), 8 * 3600);
    }

    #[test]
    fn after_the_hour_rolls_to_next_day() {
        // Monday 19:00 -> Tuesday 18:00
        let wait = duration_until_next_run(at(2024, 6, 3, 19, 0), 18);
        assert_eq!(wait.as_secs(), 23 * 3600);
    }

    #[test]
    fn friday_evening_skips_to_monday() {
        // Friday 2024-06-07 19:00 -> Monday 2024-06-10 18:00
        let wait = duration_until_next_run(at(2024, 6, 7, 19, 0), 18);
        assert_eq!(wait.as_secs(), (2 * 24 + 23) * 3600);
    }

    #[test]
    fn weekend_skips_to_monday() {
        // Saturday noon -> Monday 18:00
        let wait = duration_until_next_run(at(2024, 6, 8, 12, 0), 18);
        assert_eq!(wait.as_secs(), (2 * 24 + 6) * 3600);
    }

    #[tokio::test]
    async fn failures_are_isolated_per_symbol() {
        let dir = tempdir().unwrap();
        let db = Arc::new(SqliteDb::new(&dir.path().join("test.db")).unwrap());
        let market = ScriptedMarket::new()
            .with_failure("PETR4.SA")
            .with_series("VALE3.SA", bars_from_closes(&[61.0]));
        let state = AppState::with_market(db, Arc::new(market));

        let symbols = vec!["PETR4".to_string(), "VALE3".to_string()];
        let outcomes = refresh_all(&state, &symbols).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].result.is_err());
        assert_eq!(*outcomes[1].result.as_ref().unwrap(), 1);

        // the failing symbol did not stop the run; VALE3 rows were saved
        assert_eq!(state.db.get_stock_data("VALE3").unwrap().len(), 1);
        assert!(state.db.get_stock_data("PETR4").unwrap().is_empty());
    }
}
