//! Chart-ready distributions.
//!
//! Numeric columns produce a histogram plus boxplot statistics. Bin width
//! follows the Freedman–Diaconis rule; when that asks for more than
//! [`MAX_BINS`] bins the values are moved to `log10(x + 1)` space and the
//! series is flagged so the caller can label the axis. Text columns produce
//! the top categories as horizontal-bar data.

use crate::classify::{classify, VariableKind};
use crate::error::Result;
use crate::summary::{numeric_values, top_categories, TOP_CATEGORIES};
use crate::types::{Field, Record};
use crate::util::{mean, quantile, sample_std, sorted_finite};
use serde::Serialize;

pub const MAX_BINS: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSeries {
    Numeric(NumericDistribution),
    Categorical(CategoryBars),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericDistribution {
    pub field: Field,
    pub log_transformed: bool,
    pub histogram: Histogram,
    pub boxplot: Option<BoxPlot>,
}

/// `edges.len() == counts.len() + 1`; every bin is half-open except the
/// last, which also holds the maximum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxPlot {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub mean: f64,
    pub std_dev: Option<f64>,
    pub outliers: Vec<f64>,
}

/// Bar-chart data ordered ascending, so the largest bar is drawn last.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBars {
    pub field: Field,
    pub categories: Vec<String>,
    pub total_households: Vec<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinPlan {
    pub bins: usize,
    pub log_transform: bool,
}

/// Decide the bin count for ascending, finite `sorted` values.
pub fn plan_bins(sorted: &[f64]) -> BinPlan {
    let fallback = BinPlan {
        bins: MAX_BINS,
        log_transform: false,
    };
    let (Some(q1), Some(q3), Some(min), Some(max)) = (
        quantile(sorted, 0.25),
        quantile(sorted, 0.75),
        sorted.first(),
        sorted.last(),
    ) else {
        return fallback;
    };
    let width = 2.0 * (q3 - q1) / (sorted.len() as f64).cbrt();
    if !width.is_finite() || width <= 0.0 {
        return fallback;
    }
    let bins = (((max - min) / width).round() as usize).max(1);
    if bins > MAX_BINS {
        BinPlan {
            bins: MAX_BINS,
            log_transform: true,
        }
    } else {
        BinPlan {
            bins,
            log_transform: false,
        }
    }
}

/// Equal-width histogram between the minimum and maximum of `sorted`.
pub fn histogram(sorted: &[f64], bins: usize) -> Histogram {
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return Histogram {
            edges: Vec::new(),
            counts: Vec::new(),
        };
    };
    if max <= min || bins == 0 {
        return Histogram {
            edges: vec![min - 0.5, min + 0.5],
            counts: vec![sorted.len()],
        };
    }
    let width = (max - min) / bins as f64;
    let mut edges: Vec<f64> = (0..bins).map(|i| min + width * i as f64).collect();
    edges.push(max);
    let mut counts = vec![0usize; bins];
    for v in sorted {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Histogram { edges, counts }
}

/// Quartiles, Tukey whiskers (1.5 IQR), mean and standard deviation.
pub fn boxplot(sorted: &[f64]) -> Option<BoxPlot> {
    let q1 = quantile(sorted, 0.25)?;
    let median = quantile(sorted, 0.5)?;
    let q3 = quantile(sorted, 0.75)?;
    let iqr = q3 - q1;
    let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
    let (inside, outliers): (Vec<f64>, Vec<f64>) = sorted
        .iter()
        .partition(|v| **v >= lo_fence && **v <= hi_fence);
    Some(BoxPlot {
        q1,
        median,
        q3,
        lower_whisker: inside.first().copied().unwrap_or(q1),
        upper_whisker: inside.last().copied().unwrap_or(q3),
        mean: mean(sorted)?,
        std_dev: sample_std(sorted),
        outliers,
    })
}

fn numeric_distribution(rows: &[Record], field: Field) -> NumericDistribution {
    // Missing values (e.g. no households) never reach the log domain.
    let sorted = sorted_finite(numeric_values(rows, field));
    let plan = plan_bins(&sorted);
    let values = if plan.log_transform {
        sorted_finite(sorted.iter().map(|v| (v + 1.0).log10()))
    } else {
        sorted
    };
    NumericDistribution {
        field,
        log_transformed: plan.log_transform,
        histogram: histogram(&values, plan.bins),
        boxplot: boxplot(&values),
    }
}

pub fn distribution(rows: &[Record], field: Field) -> Result<ChartSeries> {
    match classify(field)? {
        VariableKind::Numeric => Ok(ChartSeries::Numeric(numeric_distribution(rows, field))),
        VariableKind::Categorical => {
            let top = top_categories(rows, field, TOP_CATEGORIES)?;
            let (categories, total_households) = top
                .into_iter()
                .rev()
                .map(|row| (row.category, row.total_households))
                .unzip();
            Ok(ChartSeries::Categorical(CategoryBars {
                field,
                categories,
                total_households,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows_with_values(values: &[f64]) -> Vec<Record> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Record::new(2020, format!("R{i}"), "S", "P", "Assigned", *v, 1))
            .collect()
    }

    #[test]
    fn test_plan_small_spread_is_not_transformed() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        let plan = plan_bins(&values);
        // IQR 49.5, n^(1/3) ~ 4.64 -> width ~ 21.3 -> 99 / 21.3 ~ 5 bins
        assert_eq!(plan.bins, 5);
        assert!(!plan.log_transform);
    }

    #[test]
    fn test_plan_heavy_tail_caps_and_flags() {
        let mut values: Vec<f64> = (1..=100).map(f64::from).collect();
        values.push(1_000_000.0);
        let plan = plan_bins(&values);
        assert_eq!(plan.bins, MAX_BINS);
        assert!(plan.log_transform);
    }

    #[test]
    fn test_plan_falls_back_when_iqr_is_zero() {
        let plan = plan_bins(&[5.0, 5.0, 5.0, 5.0]);
        assert_eq!(plan, BinPlan { bins: MAX_BINS, log_transform: false });
        assert_eq!(plan_bins(&[]).bins, MAX_BINS);
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0];
        let h = histogram(&values, 2);
        assert_eq!(h.edges, vec![0.0, 2.0, 4.0]);
        assert_eq!(h.counts, vec![2, 3]);

        let flat = histogram(&[7.0, 7.0], 30);
        assert_eq!(flat.counts, vec![2]);
        assert!(histogram(&[], 30).counts.is_empty());
    }

    #[test]
    fn test_boxplot_whiskers_and_outliers() {
        let values = [1.0, 2.0, 3.0, 4.0, 100.0];
        let b = boxplot(&values).unwrap();
        assert_eq!(b.q1, 2.0);
        assert_eq!(b.median, 3.0);
        assert_eq!(b.q3, 4.0);
        assert_eq!(b.lower_whisker, 1.0);
        assert_eq!(b.upper_whisker, 4.0);
        assert_eq!(b.outliers, vec![100.0]);
        assert_eq!(b.mean, 22.0);
        assert!(boxplot(&[]).is_none());
    }

    #[test]
    fn test_numeric_distribution_log_transformed() {
        let mut values: Vec<f64> = (1..=100).map(f64::from).collect();
        values.push(999_999.0);
        let ChartSeries::Numeric(d) = distribution(&rows_with_values(&values), Field::TotalValueAssigned).unwrap() else {
            panic!("expected numeric series");
        };
        assert!(d.log_transformed);
        assert!(d.histogram.counts.len() <= MAX_BINS);
        assert_eq!(d.histogram.counts.iter().sum::<usize>(), 101);
        let last_edge = *d.histogram.edges.last().unwrap();
        assert!((last_edge - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_bin_cap_holds_for_every_numeric_field() {
        let rows = rows_with_values(&[1.0, 10.0, 100.0, 1_000.0, 10_000.0, 1e9]);
        for field in Field::ALL {
            if let ChartSeries::Numeric(d) = distribution(&rows, field).unwrap() {
                assert!(d.histogram.counts.len() <= MAX_BINS, "{field}");
            }
        }
    }

    #[test]
    fn test_zero_household_rows_are_skipped() {
        let rows = vec![
            Record::new(2020, "A", "S", "P", "Assigned", 10.0, 0),
            Record::new(2020, "B", "S", "P", "Assigned", 10.0, 2),
            Record::new(2020, "C", "S", "P", "Assigned", 30.0, 2),
        ];
        let ChartSeries::Numeric(d) = distribution(&rows, Field::ValuePerHousehold).unwrap() else {
            panic!("expected numeric series");
        };
        assert_eq!(d.histogram.counts.iter().sum::<usize>(), 2);
    }

    #[test]
    fn test_categorical_bars_ascending() {
        let rows = vec![
            Record::new(2020, "A", "S", "P1", "Assigned", 1.0, 5),
            Record::new(2020, "A", "S", "P2", "Assigned", 1.0, 50),
            Record::new(2020, "A", "S", "P3", "Assigned", 1.0, 20),
        ];
        let ChartSeries::Categorical(bars) = distribution(&rows, Field::Program).unwrap() else {
            panic!("expected bar series");
        };
        assert_eq!(bars.categories, vec!["P1", "P3", "P2"]);
        assert_eq!(bars.total_households, vec![5, 20, 50]);
    }

    #[test]
    fn test_categorical_bars_tied_in_key_order() {
        let rows = vec![
            Record::new(2019, "B", "B1", "PB", "Assigned", 1.0, 10),
            Record::new(2020, "A", "A1", "PA", "Assigned", 1.0, 10),
        ];
        let ChartSeries::Categorical(bars) = distribution(&rows, Field::Program).unwrap() else {
            panic!("expected bar series");
        };
        // Ranked PA, PB; reversed for display.
        assert_eq!(bars.categories, vec!["PB", "PA"]);
    }
}
