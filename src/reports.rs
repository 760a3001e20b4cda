use crate::distribution::{boxplot, BoxPlot};
use crate::error::{AnalysisError, Result};
use crate::types::{CoverageRow, Field, Record};
use crate::util::{cmp_f64, mean, round_to, sorted_finite};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_TOP_REGIONS: usize = 5;

/// Regions drawn by [`region_boxplots`].
pub const BOXPLOT_REGIONS: usize = 5;

/// Columns regions can be ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TotalValueAssigned,
    HouseholdCount,
    ValuePerHousehold,
}

impl Metric {
    pub fn field(self) -> Field {
        match self {
            Metric::TotalValueAssigned => Field::TotalValueAssigned,
            Metric::HouseholdCount => Field::HouseholdCount,
            Metric::ValuePerHousehold => Field::ValuePerHousehold,
        }
    }

    /// Ratios are averaged, totals are summed.
    fn aggregate(self, values: &[f64]) -> Option<f64> {
        match self {
            Metric::ValuePerHousehold => mean(values),
            Metric::TotalValueAssigned | Metric::HouseholdCount => Some(values.iter().sum()),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field().name())
    }
}

impl FromStr for Metric {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.parse::<Field>()? {
            Field::TotalValueAssigned => Ok(Metric::TotalValueAssigned),
            Field::HouseholdCount => Ok(Metric::HouseholdCount),
            Field::ValuePerHousehold => Ok(Metric::ValuePerHousehold),
            other => Err(AnalysisError::FieldNotFound(format!(
                "'{other}' is not a rankable metric"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionAggregate {
    pub region: String,
    /// `None` when no row of the region has a value for the metric.
    pub value: Option<f64>,
}

/// Aggregate `metric` per region, largest first. Regions without a value
/// sort last; ties keep first-appearance order.
pub fn rank_regions(rows: &[Record], metric: Metric) -> Vec<RegionAggregate> {
    let field = metric.field();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut buckets: Vec<(&str, Vec<f64>)> = Vec::new();
    for r in rows {
        let slot = *index.entry(r.region.as_str()).or_insert_with(|| {
            buckets.push((r.region.as_str(), Vec::new()));
            buckets.len() - 1
        });
        if let Some(v) = r.numeric(field) {
            buckets[slot].1.push(v);
        }
    }
    let mut ranked: Vec<RegionAggregate> = buckets
        .into_iter()
        .map(|(region, values)| RegionAggregate {
            region: region.to_string(),
            value: metric.aggregate(&values),
        })
        .collect();
    ranked.sort_by(|a, b| match (a.value, b.value) {
        (Some(x), Some(y)) => cmp_f64(&y, &x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    ranked
}

/// Every row belonging to the `n` best regions by `metric`, in table order.
pub fn top_regions(rows: &[Record], metric: &str, n: usize) -> Result<Vec<Record>> {
    let metric: Metric = metric.parse()?;
    let keep: HashSet<String> = rank_regions(rows, metric)
        .into_iter()
        .take(n)
        .map(|a| a.region)
        .collect();
    Ok(rows
        .iter()
        .filter(|r| keep.contains(&r.region))
        .cloned()
        .collect())
}

/// Households and share of the grand total per program, largest first.
/// Percentages are rounded to two decimals.
pub fn program_coverage(rows: &[Record]) -> Vec<CoverageRow> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<CoverageRow> = Vec::new();
    for r in rows {
        let slot = *index.entry(r.program.as_str()).or_insert_with(|| {
            out.push(CoverageRow {
                program: r.program.clone(),
                household_count: 0,
                percentage: 0.0,
            });
            out.len() - 1
        });
        out[slot].household_count = out[slot].household_count.saturating_add(r.household_count);
    }
    let total = out
        .iter()
        .fold(0u64, |acc, row| acc.saturating_add(row.household_count));
    if total > 0 {
        for row in &mut out {
            row.percentage = round_to(row.household_count as f64 / total as f64 * 100.0, 2);
        }
    }
    out.sort_by(|a, b| b.household_count.cmp(&a.household_count));
    out
}

/// Boxplot of one region's values. The transform flag belongs to this
/// series alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionBoxPlot {
    pub region: String,
    pub metric: Metric,
    pub log_transformed: bool,
    pub boxplot: Option<BoxPlot>,
}

/// Per-region boxplots for the first [`BOXPLOT_REGIONS`] regions in
/// alphabetical order. Totals are compared on a natural-log scale with
/// zeros dropped; value per household is left as is.
pub fn region_boxplots(rows: &[Record], metric: Metric) -> Vec<RegionBoxPlot> {
    let regions: BTreeSet<&str> = rows.iter().map(|r| r.region.as_str()).collect();
    let field = metric.field();
    let log_transformed = metric != Metric::ValuePerHousehold;
    regions
        .into_iter()
        .take(BOXPLOT_REGIONS)
        .map(|region| {
            let values = rows
                .iter()
                .filter(|r| r.region == region)
                .filter_map(|r| r.numeric(field));
            let sorted = if log_transformed {
                sorted_finite(values.filter(|v| *v > 0.0).map(f64::ln))
            } else {
                sorted_finite(values)
            };
            RegionBoxPlot {
                region: region.to_string(),
                metric,
                log_transformed,
                boxplot: boxplot(&sorted),
            }
        })
        .collect()
}
