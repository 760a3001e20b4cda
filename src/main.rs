// Entry point and high-level CLI flow.
//
// The canonical table is loaded exactly once, before any subcommand runs,
// and then lent out read-only to whichever report was asked for.
// - `summary` / `distribution` answer the per-variable analysis.
// - `coverage` answers which programs reach the most households.
// - `top-regions` answers how one program spreads across regions.
// - `trends` answers how subsidies evolve per year.
// - `report` writes all of the above to disk.
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use subsidy_report::config::{Cli, Command};
use subsidy_report::explain::ExplanationSet;
use subsidy_report::output;
use subsidy_report::reports::{
    program_coverage, rank_regions, region_boxplots, top_regions, Metric, DEFAULT_TOP_REGIONS,
};
use subsidy_report::summary::{column_profile, summarize, SummaryTable};
use subsidy_report::trends::{distinct_values, yearly_series, TableFilter};
use subsidy_report::types::{CanonicalTable, Field};
use subsidy_report::util::format_int;
use subsidy_report::{distribution, load_canonical, Result};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
}

fn print_summary(summary: &SummaryTable) {
    match summary {
        SummaryTable::Numeric(rows) => output::preview_table_rows(rows, rows.len()),
        SummaryTable::Categorical(rows) => output::preview_table_rows(rows, rows.len()),
    }
}

fn handle_overview(table: &CanonicalTable, preview_rows: usize) {
    let (rows, cols) = table.shape();
    println!(
        "The dataset has {} rows and {} columns.\n",
        format_int(rows),
        cols
    );
    let profile = column_profile(table.records());
    output::preview_table("Columns", None, &profile, profile.len());
    output::preview_table_rows(table.records(), preview_rows);
}

fn handle_summary(table: &CanonicalTable, explanations: &ExplanationSet, name: &str) -> Result<()> {
    let field: Field = name.parse()?;
    let summary = summarize(table.records(), field)?;
    println!("Summary statistics: {}\n", field);
    print_summary(&summary);
    println!("{}\n", explanations.distributions.get(name));
    Ok(())
}

fn handle_distribution(
    table: &CanonicalTable,
    explanations: &ExplanationSet,
    name: &str,
) -> Result<()> {
    let field: Field = name.parse()?;
    let series = distribution(table.records(), field)?;
    println!("{}", serde_json::to_string_pretty(&series)?);
    println!("\n{}\n", explanations.distributions.get(name));
    Ok(())
}

fn handle_top_regions(
    table: &CanonicalTable,
    explanations: &ExplanationSet,
    metric: &str,
    n: usize,
    program: Option<&str>,
) -> Result<()> {
    let scoped = match program {
        Some(p) => TableFilter::program(p).apply(table.records()),
        None => table.records().to_vec(),
    };
    let rows = top_regions(&scoped, metric, n)?;
    let parsed: Metric = metric.parse()?;
    println!("Top {} regions by {}", n, parsed);
    if let Some(p) = program {
        println!("(Program: {})", p);
    }
    println!();
    output::preview_table_rows(&rows, rows.len());
    println!(
        "{}",
        serde_json::to_string_pretty(&region_boxplots(&rows, parsed))?
    );
    println!("\n{}\n", explanations.regions.get(metric));
    Ok(())
}

fn handle_coverage(table: &CanonicalTable) {
    let coverage = program_coverage(table.records());
    output::preview_table(
        "Coverage by program",
        Some("Households and share of the total"),
        &coverage,
        coverage.len(),
    );
}

fn handle_trends(table: &CanonicalTable, filter: &TableFilter) {
    let series = yearly_series(table.records(), filter);
    let note = if filter.is_empty() {
        "No filters".to_string()
    } else {
        format!(
            "Regions: {:?}, sub-regions: {:?}, programs: {:?}",
            filter.regions, filter.sub_regions, filter.programs
        )
    };
    let rows = series.rows();
    output::preview_table("Yearly subsidy trends", Some(&note), &rows, rows.len());
}

/// Write every table and chart series into `out`, previewing each one.
fn handle_report(table: &CanonicalTable, out: &Path) -> Result<()> {
    std::fs::create_dir_all(out)?;
    let records = table.records();

    output::write_csv(&out.join("column_profile.csv"), &column_profile(records))?;

    for field in Field::ALL {
        let summary = summarize(records, field)?;
        match &summary {
            SummaryTable::Numeric(rows) => {
                output::write_csv(&out.join(format!("summary_{}.csv", field)), rows)?
            }
            SummaryTable::Categorical(rows) => {
                output::write_csv(&out.join(format!("summary_{}.csv", field)), rows)?
            }
        }
        output::write_json(
            &out.join(format!("distribution_{}.json", field)),
            &distribution(records, field)?,
        )?;
    }
    println!("Per-variable summaries and distributions written.\n");

    let coverage = program_coverage(records);
    let coverage_file = out.join("program_coverage.csv");
    output::write_csv(&coverage_file, &coverage)?;
    output::preview_table("Coverage by program", None, &coverage, 5);
    println!("(Full table exported to {})\n", coverage_file.display());

    for metric in [
        Metric::HouseholdCount,
        Metric::TotalValueAssigned,
        Metric::ValuePerHousehold,
    ] {
        let file = out.join(format!("top_regions_{}.csv", metric));
        let rows = top_regions(records, metric.field().name(), DEFAULT_TOP_REGIONS)?;
        output::write_csv(&file, &rows)?;
        output::write_json(
            &out.join(format!("region_ranking_{}.json", metric)),
            &rank_regions(records, metric),
        )?;
        output::write_json(
            &out.join(format!("region_boxplots_{}.json", metric)),
            &region_boxplots(&rows, metric),
        )?;
    }
    println!("Regional rankings written.\n");

    let series = yearly_series(records, &TableFilter::default());
    let trends_file = out.join("yearly_trends.csv");
    output::write_csv(&trends_file, &series.rows())?;
    output::write_json(&out.join("yearly_trends.json"), &series)?;
    output::preview_table("Yearly subsidy trends", Some("No filters"), &series.rows(), 3);
    println!("(Full table exported to {})\n", trends_file.display());

    let options = serde_json::json!({
        "regions": distinct_values(records, Field::Region)?,
        "sub_regions": distinct_values(records, Field::SubRegion)?,
        "programs": distinct_values(records, Field::Program)?,
    });
    output::write_json(&out.join("filter_options.json"), &options)?;
    info!(dir = %out.display(), "report written");
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let (table, load_report) = load_canonical(&cli.data, &cli.status)?;
    println!(
        "Processing dataset... ({} rows read, {} with status {}, {} groups)",
        format_int(load_report.total_rows),
        format_int(load_report.status_rows),
        cli.status,
        format_int(load_report.groups)
    );
    if load_report.parse_errors > 0 {
        println!(
            "Note: {} rows skipped due to parse/validation errors.",
            format_int(load_report.parse_errors)
        );
    }
    println!();
    let explanations = ExplanationSet::load(&cli.assets)?;

    match cli.command {
        Command::Overview { rows } => handle_overview(&table, rows),
        Command::Summary { field } => handle_summary(&table, &explanations, &field)?,
        Command::Distribution { field } => handle_distribution(&table, &explanations, &field)?,
        Command::TopRegions { metric, n, program } => {
            handle_top_regions(&table, &explanations, &metric, n, program.as_deref())?
        }
        Command::Coverage => handle_coverage(&table),
        Command::Trends {
            regions,
            sub_regions,
            programs,
        } => handle_trends(&table, &TableFilter::new(regions, sub_regions, programs)),
        Command::Report { out } => handle_report(&table, &out)?,
    }
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "aborted");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
