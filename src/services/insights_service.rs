//! Insights Service
//!
//! Ranking and long-horizon views over the ledgers: best sellers of the
//! trailing window, SKUs with rising sales, and monthly aggregates for
//! the long-term view.

use crate::services::summary_service::{SkuSummary, SummaryService};
use crate::state::AppState;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Share of ranked SKUs reported as trending
const TRENDING_SHARE: f64 = 0.2;

/// Comparison window of the trending ranking, in days
const TRENDING_WINDOW_DAYS: i64 = 30;

/// Sales momentum of one SKU: trailing 30 days vs the 30 days before
#[derive(Debug, Clone, Serialize)]
pub struct TrendingSku {
    pub sku: String,
    pub name: Option<String>,
    pub last_30_days: i64,
    pub previous_30_days: i64,
    pub increase: i64,
    pub increase_pct: f64,
}

/// Quantity sold of one SKU in one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySales {
    /// Month formatted as YYYY-MM
    pub month: String,
    pub sku: String,
    pub quantity: i64,
}

/// Monthly aggregation over a date range
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyBreakdown {
    /// Per (month, SKU) sums, month-major order
    pub by_sku: Vec<MonthlySales>,

    /// Grand total per month
    pub totals: Vec<(String, i64)>,
}

/// Ranking and aggregation views
pub struct InsightsService;

impl InsightsService {
    /// The `n` best-selling SKUs of the trailing window.
    pub fn top_sellers(state: &AppState, n: usize) -> Vec<SkuSummary> {
        let mut rows = SummaryService::summarize(state);
        rows.sort_by(|a, b| {
            b.last_30_days_quantity
                .cmp(&a.last_30_days_quantity)
                .then_with(|| a.sku.cmp(&b.sku))
        });
        rows.truncate(n);
        rows
    }

    /// SKUs with the strongest absolute sales increase, trailing 30 days
    /// against the 30 days before. Only SKUs with sales in both windows
    /// rank; the top 20% are returned, strongest increase first.
    pub fn trending(state: &AppState) -> Vec<TrendingSku> {
        let end = state.today();
        let mid = end - Duration::days(TRENDING_WINDOW_DAYS);
        let start = end - Duration::days(2 * TRENDING_WINDOW_DAYS);

        let facts = state.sales.read_since(start);

        let mut last: BTreeMap<String, i64> = BTreeMap::new();
        let mut previous: BTreeMap<String, i64> = BTreeMap::new();
        for fact in &facts {
            if fact.date > mid {
                *last.entry(fact.sku.clone()).or_insert(0) += fact.quantity;
            } else if fact.date > start {
                *previous.entry(fact.sku.clone()).or_insert(0) += fact.quantity;
            }
        }

        let mut rows: Vec<TrendingSku> = last
            .iter()
            .filter_map(|(sku, &recent)| {
                let &prior = previous.get(sku)?;
                let increase = recent - prior;
                let increase_pct = if prior > 0 {
                    increase as f64 / prior as f64 * 100.0
                } else {
                    f64::INFINITY
                };

                Some(TrendingSku {
                    sku: sku.clone(),
                    name: state.catalog.name(sku).map(String::from),
                    last_30_days: recent,
                    previous_30_days: prior,
                    increase,
                    increase_pct,
                })
            })
            .collect();

        rows.sort_by(|a, b| b.increase.cmp(&a.increase).then_with(|| a.sku.cmp(&b.sku)));
        let keep = (rows.len() as f64 * TRENDING_SHARE) as usize;
        rows.truncate(keep);
        rows
    }

    /// Per-month, per-SKU quantities and per-month grand totals over
    /// `[from, to]`.
    pub fn monthly_totals(state: &AppState, from: NaiveDate, to: NaiveDate) -> MonthlyBreakdown {
        let mut facts = state.sales.read_since(from);
        facts.retain(|fact| fact.date <= to);

        let mut by_sku: BTreeMap<(String, String), i64> = BTreeMap::new();
        let mut totals: BTreeMap<String, i64> = BTreeMap::new();
        for fact in &facts {
            let month = format!("{:04}-{:02}", fact.date.year(), fact.date.month());
            *by_sku
                .entry((month.clone(), fact.sku.clone()))
                .or_insert(0) += fact.quantity;
            *totals.entry(month).or_insert(0) += fact.quantity;
        }

        MonthlyBreakdown {
            by_sku: by_sku
                .into_iter()
                .map(|((month, sku), quantity)| MonthlySales {
                    month,
                    sku,
                    quantity,
                })
                .collect(),
            totals: totals.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FetchOutcome, OrderApi};
    use crate::config::{ApiCredentials, AppConfig};
    use crate::models::SalesFact;
    use crate::store::FsBlobStore;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tempfile::tempdir;

    struct NoOrders;

    #[async_trait]
    impl OrderApi for NoOrders {
        async fn get_orders(&self, _start: NaiveDate, _end: NaiveDate) -> FetchOutcome {
            FetchOutcome::Fetched(Vec::new())
        }
    }

    fn test_state(dir: &tempfile::TempDir) -> AppState {
        let credentials = ApiCredentials {
            api_key: "key".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
        };
        let mut config = AppConfig::new(dir.path(), credentials);
        config.history_start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();

        let store = Arc::new(FsBlobStore::new(dir.path()).unwrap());
        AppState::with_collaborators(config, store, Arc::new(NoOrders)).unwrap()
    }

    fn seed_day(state: &AppState, date: NaiveDate, facts: &[(&str, i64)]) {
        let facts = facts
            .iter()
            .map(|(sku, quantity)| SalesFact {
                date,
                sku: sku.to_string(),
                quantity: *quantity,
                platform: "Shop".to_string(),
            })
            .collect();
        state.sales.upsert_day(date, facts, true).unwrap();
    }

    #[test]
    fn test_top_sellers_rank_by_window_quantity() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir);
        let yesterday = state.yesterday();

        seed_day(&state, yesterday, &[("a", 5), ("b", 20), ("c", 10)]);

        let top = InsightsService::top_sellers(&state, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].sku, "b");
        assert_eq!(top[1].sku, "c");
    }

    #[test]
    fn test_trending_keeps_top_fifth_by_increase() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir);
        let today = state.today();

        let recent_day = today - Duration::days(5);
        let prior_day = today - Duration::days(45);

        // Ten SKUs present in both windows; s9 rises most, s8 second.
        let skus: Vec<String> = (0..10).map(|i| format!("s{}", i)).collect();
        let recent: Vec<(&str, i64)> = skus
            .iter()
            .enumerate()
            .map(|(i, sku)| (sku.as_str(), 10 + 2 * i as i64))
            .collect();
        let prior: Vec<(&str, i64)> = skus.iter().map(|sku| (sku.as_str(), 10)).collect();
        seed_day(&state, recent_day, &recent);
        seed_day(&state, prior_day, &prior);

        let trending = InsightsService::trending(&state);
        assert_eq!(trending.len(), 2);
        assert_eq!(trending[0].sku, "s9");
        assert_eq!(trending[0].increase, 18);
        assert!((trending[0].increase_pct - 180.0).abs() < 1e-9);
        assert_eq!(trending[1].sku, "s8");
    }

    #[test]
    fn test_trending_requires_sales_in_both_windows() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir);
        let today = state.today();

        seed_day(&state, today - Duration::days(5), &[("new", 50)]);

        assert!(InsightsService::trending(&state).is_empty());
    }

    #[test]
    fn test_monthly_totals_bucket_by_calendar_month() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir);

        let date = |s: &str| s.parse::<NaiveDate>().unwrap();
        seed_day(&state, date("2024-01-15"), &[("a", 3), ("b", 2)]);
        seed_day(&state, date("2024-01-20"), &[("a", 4)]);
        seed_day(&state, date("2024-02-01"), &[("a", 5)]);

        let breakdown =
            InsightsService::monthly_totals(&state, date("2024-01-01"), date("2024-02-28"));

        assert_eq!(
            breakdown.by_sku,
            vec![
                MonthlySales {
                    month: "2024-01".to_string(),
                    sku: "a".to_string(),
                    quantity: 7
                },
                MonthlySales {
                    month: "2024-01".to_string(),
                    sku: "b".to_string(),
                    quantity: 2
                },
                MonthlySales {
                    month: "2024-02".to_string(),
                    sku: "a".to_string(),
                    quantity: 5
                },
            ]
        );
        assert_eq!(
            breakdown.totals,
            vec![("2024-01".to_string(), 9), ("2024-02".to_string(), 5)]
        );
    }

    #[test]
    fn test_monthly_totals_respect_the_range_bounds() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir);

        let date = |s: &str| s.parse::<NaiveDate>().unwrap();
        seed_day(&state, date("2024-01-15"), &[("a", 3)]);
        seed_day(&state, date("2024-03-15"), &[("a", 9)]);

        let breakdown =
            InsightsService::monthly_totals(&state, date("2024-01-01"), date("2024-02-28"));
        assert_eq!(breakdown.totals.len(), 1);
        assert_eq!(breakdown.totals[0].0, "2024-01");
    }
}
