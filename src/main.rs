use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gsc_cleaner::header_resolver::{assign_roles, ColumnRole};
use gsc_cleaner::io::{default_output_path, load_table, write_table};
use gsc_cleaner::{AliasTable, Cleaner, CleanerConfig, CleaningReport};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gsc-cleaner")]
#[command(about = "Clean Google Search Console performance exports")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean an export and write the cleaned table
    Clean {
        /// Export file (.csv, .xlsx, .xls or .parquet)
        input: PathBuf,

        /// Output file (.csv or .parquet); defaults to cleaned_gsc_data.csv next to the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minimum share of Latin letters for a query to be kept (0-1)
        #[arg(long)]
        threshold: Option<f64>,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Also write the cleaning statistics as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Show column information and the detected column roles
    Inspect {
        /// Export file (.csv, .xlsx, .xls or .parquet)
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    match args.command {
        Commands::Clean {
            input,
            output,
            threshold,
            config,
            report,
        } => run_clean(input, output, threshold, config, report),
        Commands::Inspect { input } => run_inspect(input),
    }
}

fn build_config(threshold: Option<f64>, config_path: Option<PathBuf>) -> Result<CleanerConfig> {
    let mut config = match config_path {
        Some(path) => CleanerConfig::load(&path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => CleanerConfig::default(),
    };
    config = config.with_env()?;
    if let Some(t) = threshold {
        config = config.with_latin_threshold(t);
    }
    config.validate()?;
    Ok(config)
}

fn run_clean(
    input: PathBuf,
    output: Option<PathBuf>,
    threshold: Option<f64>,
    config_path: Option<PathBuf>,
    report_path: Option<PathBuf>,
) -> Result<()> {
    let config = build_config(threshold, config_path)?;
    info!("Latin threshold: {}", config.latin_threshold);

    let table = load_table(&input).with_context(|| format!("Error reading file {:?}", input))?;
    println!(
        "File loaded: {} rows x {} columns",
        table.row_count(),
        table.column_count()
    );

    let outcome = Cleaner::new(config).clean(&table)?;
    let report = CleaningReport::from_outcome(&outcome);

    println!("\n{}", "=".repeat(80));
    println!("{}", report);
    println!("{}", "=".repeat(80));

    let output = output.unwrap_or_else(|| default_output_path(&input));
    write_table(&outcome.table, &output)
        .with_context(|| format!("Failed to write cleaned data to {:?}", output))?;
    println!("\nCleaned data written to {}", output.display());

    if let Some(path) = report_path {
        std::fs::write(&path, report.to_json()?)
            .with_context(|| format!("Failed to write report to {:?}", path))?;
        println!("Statistics written to {}", path.display());
    }

    Ok(())
}

fn run_inspect(input: PathBuf) -> Result<()> {
    let table = load_table(&input).with_context(|| format!("Error reading file {:?}", input))?;

    println!("Shape: {} rows x {} columns", table.row_count(), table.column_count());
    println!("\nColumn Information");
    println!("{:<32} {:>14} {:>10}", "Column", "Non-Null Count", "Null Count");
    for column in table.columns() {
        let non_null = column.non_null_count();
        println!(
            "{:<32} {:>14} {:>10}",
            column.name,
            non_null,
            column.len() - non_null
        );
    }

    let aliases = AliasTable::default();
    let roles = assign_roles(&table.headers(), &aliases);
    let describe = |role: ColumnRole, idx: Option<usize>| match idx.and_then(|i| table.column(i)) {
        Some(column) => column.name.clone(),
        None => format!("Not found (accepted: {})", aliases.aliases_for(role).join(", ")),
    };

    println!("\nIdentified Columns");
    for (role, idx) in [
        (ColumnRole::Query, roles.query_column()),
        (ColumnRole::Page, roles.page_column()),
        (ColumnRole::Position, roles.position_column()),
    ] {
        println!("  {:<10} {}", role, describe(role, idx));
    }

    let metrics = roles.metric_columns();
    if metrics.is_empty() {
        println!("  {:<10} {}", ColumnRole::NumericMetric, describe(ColumnRole::NumericMetric, None));
    } else {
        for idx in metrics {
            println!("  {:<10} {}", ColumnRole::NumericMetric, describe(ColumnRole::NumericMetric, Some(idx)));
        }
    }

    if !roles.has_recognized() {
        println!("\nNo relevant columns found. Please check your file format and column names.");
    }

    Ok(())
}
