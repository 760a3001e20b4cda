//! Numeric vs. categorical classification of columns.
//!
//! Every engine branches on [`VariableKind`] exactly once, right after
//! calling [`classify`].

use crate::error::{AnalysisError, Result};
use crate::types::{ColumnType, Field};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    Numeric,
    Categorical,
}

/// Classify a column by the type backing it.
pub fn classify_type(field: &str, column_type: ColumnType) -> Result<VariableKind> {
    match column_type {
        ColumnType::Integer | ColumnType::Real => Ok(VariableKind::Numeric),
        ColumnType::Text => Ok(VariableKind::Categorical),
        other => Err(AnalysisError::UnsupportedType {
            field: field.to_string(),
            type_name: other.name().to_string(),
        }),
    }
}

pub fn classify(field: Field) -> Result<VariableKind> {
    classify_type(field.name(), field.column_type())
}
