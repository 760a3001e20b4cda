use crate::classify::{classify, VariableKind};
use crate::error::{AnalysisError, Result};
use crate::types::{CategoryTotalRow, ColumnProfileRow, ColumnType, Field, Record, StatisticRow};
use crate::util::{mean, quantile, sample_std, sorted_finite};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// How many categories a categorical summary keeps.
pub const TOP_CATEGORIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum SummaryTable {
    Numeric(Vec<StatisticRow>),
    Categorical(Vec<CategoryTotalRow>),
}

/// Describe-style statistics over the non-missing values of a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl Describe {
    pub fn rows(&self) -> Vec<StatisticRow> {
        [
            ("count", Some(self.count as f64)),
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.q25),
            ("50%", self.median),
            ("75%", self.q75),
            ("max", self.max),
        ]
        .into_iter()
        .map(|(statistic, value)| StatisticRow {
            statistic: statistic.to_string(),
            value,
        })
        .collect()
    }
}

pub fn describe(values: &[f64]) -> Describe {
    let sorted = sorted_finite(values.iter().copied());
    Describe {
        count: sorted.len(),
        mean: mean(&sorted),
        std: sample_std(&sorted),
        min: sorted.first().copied(),
        q25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted.last().copied(),
    }
}

/// Non-missing values of a numeric column.
pub fn numeric_values(rows: &[Record], field: Field) -> Vec<f64> {
    rows.iter().filter_map(|r| r.numeric(field)).collect()
}

/// Households summed per distinct value of a text column, largest first.
///
/// Groups are visited in key order and the sort is stable, so equal totals
/// come out alphabetically.
pub fn top_categories(rows: &[Record], field: Field, limit: usize) -> Result<Vec<CategoryTotalRow>> {
    if classify(field)? != VariableKind::Categorical {
        return Err(AnalysisError::UnsupportedType {
            field: field.name().to_string(),
            type_name: field.column_type().name().to_string(),
        });
    }
    let mut groups: BTreeMap<&str, u64> = BTreeMap::new();
    for r in rows {
        let Some(category) = r.text(field) else { continue };
        let total = groups.entry(category).or_insert(0);
        *total = total.saturating_add(r.household_count);
    }
    let mut totals: Vec<CategoryTotalRow> = groups
        .into_iter()
        .map(|(category, total_households)| CategoryTotalRow {
            category: category.to_string(),
            total_households,
        })
        .collect();
    totals.sort_by(|a, b| b.total_households.cmp(&a.total_households));
    totals.truncate(limit);
    Ok(totals)
}

/// One line of the column overview: storage type, non-missing values and
/// distinct values.
pub fn column_profile(rows: &[Record]) -> Vec<ColumnProfileRow> {
    Field::ALL
        .into_iter()
        .map(|field| {
            let (non_null, distinct) = match field.column_type() {
                ColumnType::Text => {
                    let values: Vec<&str> = rows.iter().filter_map(|r| r.text(field)).collect();
                    let distinct: HashSet<&str> = values.iter().copied().collect();
                    (values.len(), distinct.len())
                }
                _ => {
                    let values = numeric_values(rows, field);
                    let distinct: HashSet<u64> = values.iter().map(|v| v.to_bits()).collect();
                    (values.len(), distinct.len())
                }
            };
            ColumnProfileRow {
                column: field.name().to_string(),
                dtype: field.column_type().name().to_string(),
                non_null,
                distinct,
            }
        })
        .collect()
}

/// Summary table for one field: statistics for numeric columns, the top
/// categories by households for text columns.
pub fn summarize(rows: &[Record], field: Field) -> Result<SummaryTable> {
    match classify(field)? {
        VariableKind::Numeric => Ok(SummaryTable::Numeric(
            describe(&numeric_values(rows, field)).rows(),
        )),
        VariableKind::Categorical => Ok(SummaryTable::Categorical(top_categories(
            rows,
            field,
            TOP_CATEGORIES,
        )?)),
    }
}
