//! Services Layer
//!
//! Business logic on top of the ledgers. Presentation callers (web UI,
//! CLI, scheduled jobs) compose these: run ingestion, build the summary,
//! analyze selected SKUs, render the result.
//!
//! # Services
//!
//! - `SummaryService` - Per-SKU reconciliation and runway metrics
//! - `TrendService` - Per-SKU trend, seasonality and forecast
//! - `InsightsService` - Top sellers, rising SKUs, monthly aggregates

pub mod insights_service;
pub mod summary_service;
pub mod trend_service;

// Re-export commonly used types and services
pub use insights_service::{InsightsService, MonthlyBreakdown, MonthlySales, TrendingSku};
pub use summary_service::{SkuSummary, SummaryService, SummaryTotals};
pub use trend_service::{DailyPoint, ForecastPoint, SmoothedPoint, TrendResult, TrendService};
