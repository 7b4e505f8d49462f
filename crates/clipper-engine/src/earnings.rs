//! # Earnings Aggregator
//!
//! Read-only sums over the two ledgers, for holders of `ViewEarnings`.
//!
//! | Source     | Counts                 | Amount                  |
//! |------------|------------------------|-------------------------|
//! | `Bookings` | confirmed bookings     | the booked service's price |
//! | `Orders`   | completed orders       | the order's price       |
//!
//! Records are dated by the UTC calendar day they were created.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use clipper_core::earnings::{
    daily_series, month_bounds, EarningRecord, EarningsSeries, EarningsSummary, SummaryWindows,
};
use clipper_core::{Actor, Capability, Clock};
use clipper_db::Database;
use tracing::debug;

use crate::error::EngineResult;

/// Which ledger to aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EarningsSource {
    Bookings,
    Orders,
}

/// Computes earnings summaries and per-day series.
#[derive(Clone)]
pub struct EarningsAggregator {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl EarningsAggregator {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        EarningsAggregator { db, clock }
    }

    /// Totals for today, this week (from Monday) and this month.
    pub async fn summary(
        &self,
        actor: &Actor,
        source: EarningsSource,
    ) -> EngineResult<EarningsSummary> {
        actor.require(Capability::ViewEarnings)?;

        let windows = SummaryWindows::for_today(self.clock.today());
        let records = self.records(source, windows.earliest(), windows.today).await?;
        let summary = EarningsSummary::from_records(&records, &windows);

        debug!(?source, ?summary, "Computed earnings summary");
        Ok(summary)
    }

    /// One total per calendar day of `month`/`year`.
    pub async fn daily_series(
        &self,
        actor: &Actor,
        source: EarningsSource,
        year: i32,
        month: u32,
    ) -> EngineResult<EarningsSeries> {
        actor.require(Capability::ViewEarnings)?;

        let (first, last) = month_bounds(year, month)?;
        let records = self.records(source, first, last).await?;
        Ok(daily_series(&records, year, month)?)
    }

    /// [`daily_series`](Self::daily_series) for the current month.
    pub async fn current_month(
        &self,
        actor: &Actor,
        source: EarningsSource,
    ) -> EngineResult<EarningsSeries> {
        let today = self.clock.today();
        self.daily_series(actor, source, today.year(), today.month())
            .await
    }

    async fn records(
        &self,
        source: EarningsSource,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<EarningRecord>> {
        let records = match source {
            EarningsSource::Bookings => self.db.bookings().earning_records(from, to).await?,
            EarningsSource::Orders => self.db.orders().earning_records(from, to).await?,
        };
        Ok(records)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
