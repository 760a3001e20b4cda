//! Command-line and environment configuration.

use crate::loader::ACCEPTED_STATUS;
use crate::reports::DEFAULT_TOP_REGIONS;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "subsidy-report")]
#[command(about = "Analyse assigned housing subsidies: summaries, distributions, rankings and trends", long_about = None)]
pub struct Cli {
    /// Raw subsidies CSV
    #[arg(
        long,
        global = true,
        env = "SUBSIDY_DATA",
        default_value = "data/subsidios_de_vivienda_asignados.csv"
    )]
    pub data: PathBuf,

    /// Directory holding the explanation JSON files
    #[arg(long, global = true, env = "SUBSIDY_ASSETS", default_value = "assets")]
    pub assets: PathBuf,

    /// Postulation status kept by the loader
    #[arg(long, global = true, default_value = ACCEPTED_STATUS)]
    pub status: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Row/column counts, per-column profile and the first rows of the canonical table
    Overview {
        #[arg(long, default_value = "5")]
        rows: usize,
    },

    /// Summary statistics (numeric) or top categories (categorical)
    Summary {
        /// Field name, e.g. `hogares` or `household_count`
        field: String,
    },

    /// Histogram + boxplot (numeric) or bar series (categorical), as JSON
    Distribution { field: String },

    /// Rows of the best regions by a metric, plus per-region boxplots
    TopRegions {
        #[arg(short, long, default_value = "household_count")]
        metric: String,

        #[arg(short, long, default_value_t = DEFAULT_TOP_REGIONS)]
        n: usize,

        /// Restrict to one program before ranking (e.g. "MI CASA YA")
        #[arg(short, long)]
        program: Option<String>,
    },

    /// Households and percentage share per program
    Coverage,

    /// Yearly totals under optional region/sub-region/program filters
    Trends {
        #[arg(long = "region")]
        regions: Vec<String>,

        #[arg(long = "sub-region")]
        sub_regions: Vec<String>,

        #[arg(long = "program")]
        programs: Vec<String>,
    },

    /// Write every table (CSV) and chart series (JSON) to a directory
    Report {
        #[arg(short, long, default_value = "output")]
        out: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_trends_accepts_repeated_filters() {
        let cli = Cli::parse_from([
            "subsidy-report",
            "trends",
            "--region",
            "Antioquia",
            "--region",
            "Bolívar",
            "--program",
            "MI CASA YA",
        ]);
        match cli.command {
            Command::Trends {
                regions,
                sub_regions,
                programs,
            } => {
                assert_eq!(regions, vec!["Antioquia", "Bolívar"]);
                assert!(sub_regions.is_empty());
                assert_eq!(programs, vec!["MI CASA YA"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.status, ACCEPTED_STATUS);
    }

    #[test]
    fn test_top_regions_defaults() {
        let cli = Cli::parse_from(["subsidy-report", "top-regions"]);
        match cli.command {
            Command::TopRegions { metric, n, program } => {
                assert_eq!(metric, "household_count");
                assert_eq!(n, DEFAULT_TOP_REGIONS);
                assert!(program.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
