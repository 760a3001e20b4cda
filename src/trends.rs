use crate::classify::{classify, VariableKind};
use crate::error::{AnalysisError, Result};
use crate::types::{Field, Record, YearlyTrendRow};
use crate::util::mean;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Allowed values per categorical column. An empty set lets every value
/// through; non-empty sets are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableFilter {
    pub regions: BTreeSet<String>,
    pub sub_regions: BTreeSet<String>,
    pub programs: BTreeSet<String>,
}

impl TableFilter {
    pub fn new<I, J, K>(regions: I, sub_regions: J, programs: K) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        J: IntoIterator,
        J::Item: Into<String>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        TableFilter {
            regions: regions.into_iter().map(Into::into).collect(),
            sub_regions: sub_regions.into_iter().map(Into::into).collect(),
            programs: programs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(program: impl Into<String>) -> Self {
        TableFilter {
            programs: BTreeSet::from([program.into()]),
            ..TableFilter::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty() && self.sub_regions.is_empty() && self.programs.is_empty()
    }

    pub fn matches(&self, r: &Record) -> bool {
        fn allowed(set: &BTreeSet<String>, value: &str) -> bool {
            set.is_empty() || set.contains(value)
        }
        allowed(&self.regions, &r.region)
            && allowed(&self.sub_regions, &r.sub_region)
            && allowed(&self.programs, &r.program)
    }

    pub fn apply(&self, rows: &[Record]) -> Vec<Record> {
        rows.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// Three series aligned on `years` (ascending, no gaps filled in).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YearlySeries {
    pub years: Vec<i32>,
    pub total_value_assigned: Vec<f64>,
    pub household_count: Vec<u64>,
    pub avg_value_per_household: Vec<Option<f64>>,
}

impl YearlySeries {
    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn rows(&self) -> Vec<YearlyTrendRow> {
        (0..self.len())
            .map(|i| YearlyTrendRow {
                year: self.years[i],
                total_value_assigned: self.total_value_assigned[i],
                household_count: self.household_count[i],
                avg_value_per_household: self.avg_value_per_household[i],
            })
            .collect()
    }
}

#[derive(Default)]
struct YearAcc {
    total: f64,
    households: u64,
    ratios: Vec<f64>,
}

pub fn yearly_series(rows: &[Record], filter: &TableFilter) -> YearlySeries {
    let mut by_year: BTreeMap<i32, YearAcc> = BTreeMap::new();
    for r in rows.iter().filter(|r| filter.matches(r)) {
        let e = by_year.entry(r.year).or_default();
        e.total += r.total_value_assigned;
        e.households = e.households.saturating_add(r.household_count);
        if let Some(v) = r.value_per_household {
            e.ratios.push(v);
        }
    }
    let mut series = YearlySeries::default();
    for (year, acc) in by_year {
        series.years.push(year);
        series.total_value_assigned.push(acc.total);
        series.household_count.push(acc.households);
        series.avg_value_per_household.push(mean(&acc.ratios));
    }
    series
}

/// Distinct values of a text column in order of first appearance.
pub fn distinct_values(rows: &[Record], field: Field) -> Result<Vec<String>> {
    if classify(field)? != VariableKind::Categorical {
        return Err(AnalysisError::UnsupportedType {
            field: field.name().to_string(),
            type_name: field.column_type().name().to_string(),
        });
    }
    let mut seen: HashSet<&str> = HashSet::new();
    Ok(rows
        .iter()
        .filter_map(|r| r.text(field))
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect())
}
