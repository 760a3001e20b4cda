//! # subsidy_report
//!
//! Analytics over assigned housing-subsidy records.
//!
//! The [`loader`] reads the raw CSV once into an immutable
//! [`CanonicalTable`]; every other module is a pure function of borrowed
//! rows plus parameters, returning tables or chart-ready series.
//!
//! - [`summary`] - describe-style statistics or top categories
//! - [`distribution`] - histogram/boxplot or bar series
//! - [`reports`] - top regions, per-region boxplots, program coverage
//! - [`trends`] - yearly series under region/sub-region/program filters
//! - [`explain`] - explanation lookups with a fallback text

pub mod classify;
pub mod config;
pub mod distribution;
pub mod error;
pub mod explain;
pub mod loader;
pub mod output;
pub mod reports;
pub mod summary;
pub mod trends;
pub mod types;
pub mod util;

pub use classify::{classify, VariableKind};
pub use distribution::{distribution, ChartSeries};
pub use error::{AnalysisError, Result};
pub use explain::{ExplanationSet, Explanations, FALLBACK_EXPLANATION};
pub use loader::{load_canonical, load_from_reader, LoadReport};
pub use reports::{program_coverage, region_boxplots, top_regions, Metric};
pub use summary::{column_profile, summarize, SummaryTable};
pub use trends::{distinct_values, yearly_series, TableFilter, YearlySeries};
pub use types::{CanonicalTable, Field, Record};
