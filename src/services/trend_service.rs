//! Trend Service
//!
//! Per-SKU sales statistics: blended linear trend, weekly seasonality,
//! smoothing and a 60-day forecast. Every statistic runs on the daily
//! zero-filled series; days without a sale count as zero, not as missing.
//! A SKU that cannot be analyzed yields the empty result; one SKU never
//! blocks the batch.

use crate::models::SalesFact;
use crate::state::AppState;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Blend weights for the long-term and trailing-30-day slopes
const LONG_TERM_WEIGHT: f64 = 0.7;
const SHORT_TERM_WEIGHT: f64 = 0.3;

/// Lookback of the short-term slope, in days
const SHORT_TERM_DAYS: i64 = 30;

/// Length of the seasonal cycle, in days
const SEASONAL_PERIOD: usize = 7;

/// Minimum daily points before a seasonal decomposition is attempted
const MIN_SEASONAL_POINTS: usize = 14;

/// Rolling-mean window for the smoothed series, in days
const SMOOTHING_WINDOW: usize = 14;

/// Forecast horizon, in days
const FORECAST_HORIZON_DAYS: i64 = 60;

/// Half-width of the confidence band, in standard deviations
const CONFIDENCE_SIGMAS: f64 = 2.0;

/// One day of the zero-filled daily series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub quantity: f64,
}

/// One day of history with its rolling mean
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SmoothedPoint {
    pub date: NaiveDate,
    pub quantity: f64,
    pub smoothed: f64,
}

/// One forecast day with confidence bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub forecast: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Per-SKU analysis result
#[derive(Debug, Clone, Serialize)]
pub struct TrendResult {
    /// Blended long/short-term slope, units per day
    pub overall_trend: f64,

    /// Additive weekday effect, Monday first; sums to zero
    pub seasonality: [f64; 7],

    pub smoothed: Vec<SmoothedPoint>,

    pub forecast: Vec<ForecastPoint>,
}

impl TrendResult {
    /// Fallback for SKUs without enough data to analyze.
    pub fn empty() -> Self {
        Self {
            overall_trend: 0.0,
            seasonality: [0.0; 7],
            smoothed: Vec::new(),
            forecast: Vec::new(),
        }
    }
}

/// Per-SKU statistical analysis
pub struct TrendService;

impl TrendService {
    /// Full analysis of one SKU's dated quantity facts.
    pub fn analyze(facts: &[SalesFact]) -> TrendResult {
        let series = Self::daily_series(facts);
        if series.is_empty() {
            return TrendResult::empty();
        }

        TrendResult {
            overall_trend: Self::blended_trend(&series),
            seasonality: Self::weekly_seasonality(&series),
            smoothed: Self::smooth(&series),
            forecast: Self::forecast(&series),
        }
    }

    /// Analyze every SKU appearing in `facts`, independently.
    pub fn analyze_all(facts: &[SalesFact]) -> BTreeMap<String, TrendResult> {
        let mut by_sku: BTreeMap<String, Vec<SalesFact>> = BTreeMap::new();
        for fact in facts {
            by_sku.entry(fact.sku.clone()).or_default().push(fact.clone());
        }

        by_sku
            .into_iter()
            .map(|(sku, sku_facts)| {
                let result = Self::analyze(&sku_facts);
                (sku, result)
            })
            .collect()
    }

    /// Analyze every SKU with sales since the configured history start.
    pub fn analyze_ledger(state: &AppState) -> BTreeMap<String, TrendResult> {
        Self::analyze_all(&state.sales.read_since(state.config.history_start))
    }

    /// Reindex dated facts to a contiguous daily series between the first
    /// and last sale, absent days as zero.
    pub fn daily_series(facts: &[SalesFact]) -> Vec<DailyPoint> {
        let mut by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        for fact in facts {
            *by_day.entry(fact.date).or_insert(0) += fact.quantity;
        }

        let (first, last) = match (by_day.keys().next(), by_day.keys().next_back()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Vec::new(),
        };

        let mut series = Vec::new();
        let mut day = first;
        while day <= last {
            series.push(DailyPoint {
                date: day,
                quantity: by_day.get(&day).copied().unwrap_or(0) as f64,
            });
            day += Duration::days(1);
        }
        series
    }

    /// Blended slope: 0.7 x full history + 0.3 x trailing 30 days.
    /// Fewer than two distinct days yields exactly 0.
    pub fn blended_trend(series: &[DailyPoint]) -> f64 {
        if series.len() < 2 {
            return 0.0;
        }

        let first = series[0].date;
        let as_point = |point: &DailyPoint| -> (f64, f64) {
            ((point.date - first).num_days() as f64, point.quantity)
        };

        let long_term = ols_slope(&series.iter().map(as_point).collect::<Vec<_>>());

        let cutoff = series[series.len() - 1].date - Duration::days(SHORT_TERM_DAYS);
        let recent: Vec<(f64, f64)> = series
            .iter()
            .filter(|point| point.date >= cutoff)
            .map(as_point)
            .collect();
        let short_term = ols_slope(&recent);

        LONG_TERM_WEIGHT * long_term + SHORT_TERM_WEIGHT * short_term
    }

    /// Additive weekday effect via classical period-7 decomposition:
    /// detrend with a centered 7-day moving average, average the residuals
    /// per weekday, re-center to sum zero. Series shorter than 14 points
    /// get a constant-zero effect.
    pub fn weekly_seasonality(series: &[DailyPoint]) -> [f64; 7] {
        if series.len() < MIN_SEASONAL_POINTS {
            return [0.0; 7];
        }

        let half = SEASONAL_PERIOD / 2;
        let mut sums = [0.0; 7];
        let mut counts = [0usize; 7];

        for i in half..series.len() - half {
            let window: f64 = series[i - half..=i + half]
                .iter()
                .map(|point| point.quantity)
                .sum();
            let trend = window / SEASONAL_PERIOD as f64;
            let weekday = series[i].date.weekday().num_days_from_monday() as usize;
            sums[weekday] += series[i].quantity - trend;
            counts[weekday] += 1;
        }

        let mut effect = [0.0; 7];
        for weekday in 0..SEASONAL_PERIOD {
            if counts[weekday] > 0 {
                effect[weekday] = sums[weekday] / counts[weekday] as f64;
            }
        }

        let mean = effect.iter().sum::<f64>() / SEASONAL_PERIOD as f64;
        for value in &mut effect {
            *value -= mean;
        }
        effect
    }

    /// Trailing rolling mean, window 14. The first 13 points use a
    /// shrinking window instead of being dropped.
    pub fn smooth(series: &[DailyPoint]) -> Vec<SmoothedPoint> {
        let mut out = Vec::with_capacity(series.len());

        for i in 0..series.len() {
            let window_start = i.saturating_sub(SMOOTHING_WINDOW - 1);
            let window = &series[window_start..=i];
            let mean =
                window.iter().map(|point| point.quantity).sum::<f64>() / window.len() as f64;

            out.push(SmoothedPoint {
                date: series[i].date,
                quantity: series[i].quantity,
                smoothed: mean,
            });
        }
        out
    }

    /// 60-day forward forecast: `day_index * trend + weekday_effect`, with
    /// a constant-width band of ±2 standard deviations of the historical
    /// series.
    pub fn forecast(series: &[DailyPoint]) -> Vec<ForecastPoint> {
        if series.is_empty() {
            return Vec::new();
        }

        let trend = Self::blended_trend(series);
        let seasonality = Self::weekly_seasonality(series);
        let band = CONFIDENCE_SIGMAS * sample_stddev(series);
        let last = series[series.len() - 1].date;

        (1..=FORECAST_HORIZON_DAYS)
            .map(|step| {
                let date = last + Duration::days(step);
                let weekday = date.weekday().num_days_from_monday() as usize;
                let value = step as f64 * trend + seasonality[weekday];

                ForecastPoint {
                    date,
                    forecast: value,
                    lower: value - band,
                    upper: value + band,
                }
            })
            .collect()
    }
}

/// Ordinary least-squares slope. Degenerate inputs (fewer than two points,
/// or no x-variance) yield 0.
fn ols_slope(points: &[(f64, f64)]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let sxx: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    if sxx == 0.0 {
        return 0.0;
    }

    let sxy: f64 = points
        .iter()
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();
    sxy / sxx
}

/// Sample standard deviation; fewer than two points yields 0.
fn sample_stddev(series: &[DailyPoint]) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }

    let n = series.len() as f64;
    let mean = series.iter().map(|point| point.quantity).sum::<f64>() / n;
    let variance = series
        .iter()
        .map(|point| (point.quantity - mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn fact(date_str: &str, quantity: i64) -> SalesFact {
        SalesFact {
            date: date(date_str),
            sku: "80534".to_string(),
            quantity,
            platform: "Shop".to_string(),
        }
    }

    fn linear_series(start: &str, days: i64) -> Vec<DailyPoint> {
        let start = date(start);
        (0..days)
            .map(|i| DailyPoint {
                date: start + Duration::days(i),
                quantity: i as f64,
            })
            .collect()
    }

    #[test]
    fn test_daily_series_fills_gaps_with_zero() {
        let facts = vec![fact("2024-03-01", 4), fact("2024-03-04", 2)];
        let series = TrendService::daily_series(&facts);

        assert_eq!(series.len(), 4);
        assert_eq!(series[1].quantity, 0.0);
        assert_eq!(series[2].quantity, 0.0);
        assert_eq!(series[3].quantity, 2.0);
    }

    #[test]
    fn test_daily_series_sums_same_day_facts() {
        let facts = vec![fact("2024-03-01", 4), fact("2024-03-01", 3)];
        let series = TrendService::daily_series(&facts);

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].quantity, 7.0);
    }

    #[test]
    fn test_trend_of_single_point_is_exactly_zero() {
        let facts = vec![fact("2024-03-01", 4)];
        let series = TrendService::daily_series(&facts);
        assert_eq!(TrendService::blended_trend(&series), 0.0);
    }

    #[test]
    fn test_trend_of_identical_dates_is_exactly_zero() {
        let facts = vec![fact("2024-03-01", 4), fact("2024-03-01", 9)];
        let series = TrendService::daily_series(&facts);
        assert_eq!(TrendService::blended_trend(&series), 0.0);
    }

    #[test]
    fn test_trend_of_linear_series_is_its_slope() {
        // Quantity rises by one unit per day, so both the long-term and
        // the short-term slope are 1 and so is the blend.
        let series = linear_series("2024-01-01", 90);
        let trend = TrendService::blended_trend(&series);
        assert!((trend - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_series_has_zero_seasonality() {
        let series = linear_series("2024-03-01", 13);
        assert_eq!(TrendService::weekly_seasonality(&series), [0.0; 7]);
    }

    #[test]
    fn test_seasonality_detects_weekday_spike() {
        // Four weeks starting on a Monday, all sales on Mondays.
        let start = date("2024-03-04");
        let series: Vec<DailyPoint> = (0..28)
            .map(|i| DailyPoint {
                date: start + Duration::days(i),
                quantity: if i % 7 == 0 { 10.0 } else { 0.0 },
            })
            .collect();

        let effect = TrendService::weekly_seasonality(&series);

        let monday = effect[0];
        assert!(monday > 0.0);
        for weekday in 1..7 {
            assert!(effect[weekday] < monday);
        }
        assert!(effect.iter().sum::<f64>().abs() < 1e-9);
    }

    #[test]
    fn test_smoothing_shrinks_the_leading_window() {
        let series = linear_series("2024-03-01", 20);
        let smoothed = TrendService::smooth(&series);

        assert_eq!(smoothed.len(), 20);
        // First point averages only itself.
        assert_eq!(smoothed[0].smoothed, 0.0);
        // Second point averages the first two.
        assert!((smoothed[1].smoothed - 0.5).abs() < 1e-9);
        // From index 13 on, the window is the full 14 days.
        let expected = (0..14).sum::<i64>() as f64 / 14.0;
        assert!((smoothed[13].smoothed - expected).abs() < 1e-9);
    }

    #[test]
    fn test_forecast_spans_sixty_days_after_history() {
        let series = linear_series("2024-01-01", 45);
        let forecast = TrendService::forecast(&series);

        assert_eq!(forecast.len(), 60);
        assert_eq!(forecast[0].date, date("2024-02-15"));
        assert_eq!(forecast[59].date, date("2024-04-14"));
    }

    #[test]
    fn test_forecast_band_has_constant_width() {
        let series = linear_series("2024-01-01", 45);
        let forecast = TrendService::forecast(&series);

        let width = forecast[0].upper - forecast[0].lower;
        assert!(width > 0.0);
        for point in &forecast {
            assert!((point.upper - point.lower - width).abs() < 1e-9);
            assert!(point.lower <= point.forecast && point.forecast <= point.upper);
        }
    }

    #[test]
    fn test_analyze_without_data_yields_empty_result() {
        let result = TrendService::analyze(&[]);
        assert_eq!(result.overall_trend, 0.0);
        assert_eq!(result.seasonality, [0.0; 7]);
        assert!(result.smoothed.is_empty());
        assert!(result.forecast.is_empty());
    }

    #[test]
    fn test_analyze_all_isolates_skus() {
        let mut facts = vec![fact("2024-03-01", 1)];
        facts.push(SalesFact {
            date: date("2024-03-01"),
            sku: "99999".to_string(),
            quantity: 2,
            platform: "Shop".to_string(),
        });

        let results = TrendService::analyze_all(&facts);
        assert_eq!(results.len(), 2);
        assert!(results.contains_key("80534"));
        assert!(results.contains_key("99999"));
    }
}
