use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::schemas::SettlementEvent;
use crate::settlement::SettlementNotifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReportingPeriod {
    pub year: i32,
    pub month: u32,
}

impl ReportingPeriod {
    pub fn from_datetime(occurred_at: &DateTime<Utc>) -> Self {
        Self {
            year: occurred_at.year(),
            month: occurred_at.month(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EarningsPeriod {
    pub period: ReportingPeriod,
    pub earned: u64,
    pub target: u64,
}

/// Monthly earnings series fed by settlement events. Settlements are
/// delivered at most once per payment upstream, so the ledger itself does
/// no dedup.
#[derive(Debug)]
pub struct EarningsLedger {
    baseline_target: u64,
    periods: BTreeMap<ReportingPeriod, EarningsPeriod>,
}

impl EarningsLedger {
    pub fn new(baseline_target: u64) -> Self {
        Self {
            baseline_target,
            periods: BTreeMap::new(),
        }
    }

    /// Adds the settled amount to the event's reporting period, seeding a
    /// fresh period entry from the baseline target when the month has no
    /// entry yet.
    pub fn record(&mut self, event: &SettlementEvent) {
        let period = ReportingPeriod::from_datetime(&event.occurred_at);
        let entry = self.periods.entry(period).or_insert_with(|| EarningsPeriod {
            period,
            earned: 0,
            target: self.baseline_target,
        });
        entry.earned += event.amount;
        tracing::debug!(
            year = period.year,
            month = period.month,
            earned = entry.earned,
            "earnings period updated"
        );
    }

    pub fn period(&self, period: &ReportingPeriod) -> Option<&EarningsPeriod> {
        self.periods.get(period)
    }

    pub fn earned_in(&self, period: &ReportingPeriod) -> u64 {
        self.periods.get(period).map_or(0, |entry| entry.earned)
    }

    pub fn periods(&self) -> impl Iterator<Item = &EarningsPeriod> {
        self.periods.values()
    }
}

/// Attaches the ledger to a notifier on a background task. The task ends
/// when the notifier is dropped.
pub fn spawn_earnings_listener(
    notifier: &SettlementNotifier,
    ledger: Arc<RwLock<EarningsLedger>>,
) -> JoinHandle<()> {
    let mut rx = notifier.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => ledger.write().await.record(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "earnings listener fell behind settlement events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
