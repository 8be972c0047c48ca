//! Ingestion driver
//!
//! Walks a date range backwards from yesterday, pulling one day of orders
//! at a time, aggregating and upserting into the sales ledger. The
//! watermark is only advanced once the whole run completes, so an
//! interrupted run resumes from the last confirmed date; upsert
//! idempotence makes the reprocessing safe.

use crate::aggregate::aggregate_orders;
use crate::error::Result;
use crate::state::AppState;
use crate::store::DayUpsert;
use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

/// Default lookback when no watermark exists yet, in days
const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// What an ingestion run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Days fetched and written
    pub days_processed: usize,

    /// Days skipped because facts already existed (overwrite off)
    pub days_skipped: usize,

    /// Days where the commerce API was unavailable and counted as zero
    /// orders; candidates for a later re-ingest
    pub days_unavailable: usize,
}

/// Resumable order ingestion
pub struct IngestDriver;

impl IngestDriver {
    /// Ingest every day from the watermark up to yesterday and advance the
    /// watermark.
    ///
    /// Start is the day after the persisted watermark, or 30 days before
    /// yesterday when none exists. If the watermark is already at
    /// yesterday, the run is a no-op.
    pub async fn run(state: &AppState, overwrite: bool) -> Result<IngestReport> {
        let end = state.yesterday();
        let start = match state.watermark.load() {
            Some(last_import) => last_import + Duration::days(1),
            None => end - Duration::days(DEFAULT_LOOKBACK_DAYS),
        };

        if start > end {
            info!("Sales ledger already up to date (through {})", end);
            return Ok(IngestReport::default());
        }

        let report = Self::walk_range(state, start, end, overwrite).await?;
        state.watermark.save(end)?;

        info!(
            "Ingestion finished: {} days written, {} skipped, {} unavailable",
            report.days_processed, report.days_skipped, report.days_unavailable
        );
        Ok(report)
    }

    /// Re-ingest a single calendar day.
    ///
    /// Leaves the watermark untouched: a targeted repair of an old day must
    /// not move the global resume point.
    pub async fn run_single_day(
        state: &AppState,
        date: NaiveDate,
        overwrite: bool,
    ) -> Result<IngestReport> {
        Self::walk_range(state, date, date, overwrite).await
    }

    /// Ingest exactly the days of the trailing 30-day window that have no
    /// facts at all. Returns the dates that were processed.
    pub async fn backfill_missing(state: &AppState, overwrite: bool) -> Result<Vec<NaiveDate>> {
        let end = state.yesterday();
        let start = end - Duration::days(DEFAULT_LOOKBACK_DAYS);
        let missing = state.sales.missing_dates(start, end);

        if missing.is_empty() {
            info!("No missing days in {} to {}", start, end);
            return Ok(missing);
        }

        info!("Backfilling {} missing days", missing.len());
        for date in &missing {
            Self::walk_range(state, *date, *date, overwrite).await?;
        }
        Ok(missing)
    }

    /// Fetch, aggregate and upsert each day of `[start, end]`, newest
    /// first.
    async fn walk_range(
        state: &AppState,
        start: NaiveDate,
        end: NaiveDate,
        overwrite: bool,
    ) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        let mut day = end;
        while day >= start {
            let outcome = state.api.get_orders(day, day + Duration::days(1)).await;
            if outcome.is_unavailable() {
                warn!(
                    "Commerce API unavailable for {}; recording the day as zero orders",
                    day
                );
                report.days_unavailable += 1;
            }

            let orders = outcome.into_orders();
            let facts = aggregate_orders(day, &orders, &state.mapper);
            match state.sales.upsert_day(day, facts, overwrite)? {
                DayUpsert::Written(_) => report.days_processed += 1,
                DayUpsert::AlreadyPresent => report.days_skipped += 1,
            }

            day -= Duration::days(1);
        }

        Ok(report)
    }
}
