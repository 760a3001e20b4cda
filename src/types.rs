use crate::error::{AnalysisError, Result};
use crate::util::{display_count, display_money, display_opt, display_pct};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

/// One row of the raw CSV, addressed by normalized header names.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "ano_de_asignacion")]
    pub year: Option<String>,
    #[serde(rename = "departamento")]
    pub region: Option<String>,
    #[serde(rename = "municipio")]
    pub sub_region: Option<String>,
    #[serde(rename = "programa")]
    pub program: Option<String>,
    #[serde(rename = "estado_de_postulacion")]
    pub status: Option<String>,
    #[serde(rename = "valor_asignado")]
    pub total_value_assigned: Option<String>,
    #[serde(rename = "hogares")]
    pub household_count: Option<String>,
}

/// Storage type behind a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Date,
}

impl ColumnType {
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Real => "real",
            ColumnType::Text => "text",
            ColumnType::Date => "date",
        }
    }
}

/// Columns of the canonical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Year,
    Region,
    SubRegion,
    Program,
    Status,
    TotalValueAssigned,
    HouseholdCount,
    ValuePerHousehold,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Year,
        Field::Region,
        Field::SubRegion,
        Field::Program,
        Field::Status,
        Field::TotalValueAssigned,
        Field::HouseholdCount,
        Field::ValuePerHousehold,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Year => "year",
            Field::Region => "region",
            Field::SubRegion => "sub_region",
            Field::Program => "program",
            Field::Status => "status",
            Field::TotalValueAssigned => "total_value_assigned",
            Field::HouseholdCount => "household_count",
            Field::ValuePerHousehold => "value_per_household",
        }
    }

    /// Normalized header of the source column (or the derived column name).
    pub fn source_name(self) -> &'static str {
        match self {
            Field::Year => "ano_de_asignacion",
            Field::Region => "departamento",
            Field::SubRegion => "municipio",
            Field::Program => "programa",
            Field::Status => "estado_de_postulacion",
            Field::TotalValueAssigned => "valor_asignado",
            Field::HouseholdCount => "hogares",
            Field::ValuePerHousehold => "valor_por_hogar",
        }
    }

    pub fn column_type(self) -> ColumnType {
        match self {
            Field::Year | Field::HouseholdCount => ColumnType::Integer,
            Field::TotalValueAssigned | Field::ValuePerHousehold => ColumnType::Real,
            Field::Region | Field::SubRegion | Field::Program | Field::Status => ColumnType::Text,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = AnalysisError;

    /// Accepts either the canonical name or the normalized source header.
    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim();
        Field::ALL
            .into_iter()
            .find(|f| f.name() == key || f.source_name() == key)
            .ok_or_else(|| AnalysisError::FieldNotFound(key.to_string()))
    }
}

/// One aggregated group of the canonical table.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct Record {
    #[tabled(rename = "Year")]
    pub year: i32,
    #[tabled(rename = "Region")]
    pub region: String,
    #[tabled(rename = "SubRegion")]
    pub sub_region: String,
    #[tabled(rename = "Program")]
    pub program: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "TotalValueAssigned", display_with = "display_money")]
    pub total_value_assigned: f64,
    #[tabled(rename = "Households", display_with = "display_count")]
    pub household_count: u64,
    /// `None` when the group has no households.
    #[tabled(rename = "ValuePerHousehold", display_with = "display_opt")]
    pub value_per_household: Option<f64>,
}

impl Record {
    pub fn new(
        year: i32,
        region: impl Into<String>,
        sub_region: impl Into<String>,
        program: impl Into<String>,
        status: impl Into<String>,
        total_value_assigned: f64,
        household_count: u64,
    ) -> Self {
        let value_per_household = if household_count == 0 {
            None
        } else {
            Some(total_value_assigned / household_count as f64)
        };
        Record {
            year,
            region: region.into(),
            sub_region: sub_region.into(),
            program: program.into(),
            status: status.into(),
            total_value_assigned,
            household_count,
            value_per_household,
        }
    }

    /// Value of a numeric column; `None` for text columns and missing values.
    pub fn numeric(&self, field: Field) -> Option<f64> {
        match field {
            Field::Year => Some(self.year as f64),
            Field::TotalValueAssigned => Some(self.total_value_assigned),
            Field::HouseholdCount => Some(self.household_count as f64),
            Field::ValuePerHousehold => self.value_per_household,
            Field::Region | Field::SubRegion | Field::Program | Field::Status => None,
        }
    }

    /// Value of a text column; `None` for numeric columns.
    pub fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::Region => Some(&self.region),
            Field::SubRegion => Some(&self.sub_region),
            Field::Program => Some(&self.program),
            Field::Status => Some(&self.status),
            _ => None,
        }
    }
}

/// The loaded, aggregated dataset. Built once by the loader and only ever
/// handed out by shared reference.
#[derive(Debug, Clone, Default)]
pub struct CanonicalTable {
    records: Vec<Record>,
}

impl CanonicalTable {
    pub fn new(records: Vec<Record>) -> Self {
        CanonicalTable { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.records.len(), Field::ALL.len())
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct StatisticRow {
    #[tabled(rename = "Statistic")]
    pub statistic: String,
    #[tabled(rename = "Value", display_with = "display_opt")]
    pub value: Option<f64>,
}

/// Overview line for one canonical column.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct ColumnProfileRow {
    #[tabled(rename = "Column")]
    pub column: String,
    #[tabled(rename = "Dtype")]
    pub dtype: String,
    #[tabled(rename = "NonNull", display_with = "display_count")]
    pub non_null: usize,
    #[tabled(rename = "Distinct", display_with = "display_count")]
    pub distinct: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CategoryTotalRow {
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "TotalHouseholds", display_with = "display_count")]
    pub total_households: u64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CoverageRow {
    #[tabled(rename = "Program")]
    pub program: String,
    #[tabled(rename = "Households", display_with = "display_count")]
    pub household_count: u64,
    #[tabled(rename = "Percentage", display_with = "display_pct")]
    pub percentage: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct YearlyTrendRow {
    #[tabled(rename = "Year")]
    pub year: i32,
    #[tabled(rename = "TotalValueAssigned", display_with = "display_money")]
    pub total_value_assigned: f64,
    #[tabled(rename = "Households", display_with = "display_count")]
    pub household_count: u64,
    #[tabled(rename = "AvgValuePerHousehold", display_with = "display_opt")]
    pub avg_value_per_household: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_accepts_both_names() {
        assert_eq!("region".parse::<Field>().unwrap(), Field::Region);
        assert_eq!("departamento".parse::<Field>().unwrap(), Field::Region);
        assert_eq!(
            "valor_por_hogar".parse::<Field>().unwrap(),
            Field::ValuePerHousehold
        );
        assert!(matches!(
            "color".parse::<Field>(),
            Err(AnalysisError::FieldNotFound(name)) if name == "color"
        ));
    }

    #[test]
    fn test_value_per_household_missing_for_zero_households() {
        let r = Record::new(2020, "X", "X1", "P1", "Assigned", 500.0, 0);
        assert_eq!(r.value_per_household, None);
        assert_eq!(r.numeric(Field::ValuePerHousehold), None);

        let r = Record::new(2020, "X", "X1", "P1", "Assigned", 500.0, 4);
        assert_eq!(r.value_per_household, Some(125.0));
        assert_eq!(r.numeric(Field::HouseholdCount), Some(4.0));
        assert_eq!(r.text(Field::HouseholdCount), None);
        assert_eq!(r.text(Field::Program), Some("P1"));
    }

    #[test]
    fn test_shape_counts_all_columns() {
        let table = CanonicalTable::new(vec![Record::new(2020, "X", "X1", "P1", "A", 1.0, 1)]);
        assert_eq!(table.shape(), (1, 8));
        assert!(!table.is_empty());
    }
}
