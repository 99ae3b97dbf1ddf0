//! CLI entry point for the estuary monthly feature builder.
//!
//! Fetches water-quality readings and estuary-barrage totals, aligns them by
//! calendar month and exports the resulting feature table.

mod infra;
mod services;

use crate::infra::config::ServiceConfig;
use crate::infra::dam::DamClient;
use crate::infra::water_quality::WaterQualityClient;
use crate::services::sources::{
    DamApi, WaterQualityApi, readings_or_empty, records_or_empty,
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use estuary_monthly::aligner::{Column, MergedTable, align, align_subset};
use estuary_monthly::dam::{DamQuery, DamTable};
use estuary_monthly::output::{export_csv, export_json, log_preview};
use estuary_monthly::water::{WaterQuery, WaterTable};
use std::ffi::OsStr;
use std::fs::File;
use std::path::Path;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Rows logged after each fetch or alignment.
const PREVIEW_ROWS: usize = 5;

#[derive(Parser)]
#[command(name = "estuary_monthly")]
#[command(about = "Builds a monthly water-quality / dam-discharge feature table", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch water-quality readings and export them
    Water {
        /// File to write
        #[arg(short, long, default_value = "water.csv")]
        output: String,

        /// Export the untouched API items as JSON instead of a normalized CSV
        #[arg(long, default_value_t = false)]
        raw: bool,

        /// Gzip the CSV output
        #[arg(long, default_value_t = false)]
        gzip: bool,

        #[command(flatten)]
        query: QueryArgs,
    },
    /// Fetch monthly dam discharge and rainfall totals and export them
    Dam {
        /// File to write
        #[arg(short, long, default_value = "dam.csv")]
        output: String,

        /// Rows requested from the single page fetched
        #[arg(long)]
        per_page: Option<u32>,

        /// Gzip the CSV output
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Align both datasets by calendar month and export the feature table
    Align {
        /// File to write
        #[arg(short, long, default_value = "features.csv")]
        output: String,

        /// Read water-quality readings from this CSV instead of the API
        #[arg(long)]
        water_csv: Option<String>,

        /// Read dam totals from this CSV instead of the API
        #[arg(long)]
        dam_csv: Option<String>,

        /// Output schema
        #[arg(long, value_enum, default_value_t = Schema::Full)]
        schema: Schema,

        /// Explicit output columns, comma separated (overrides --schema)
        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,

        /// Write JSON instead of CSV
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Gzip the CSV output
        #[arg(long, default_value_t = false)]
        gzip: bool,

        #[command(flatten)]
        query: QueryArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Schema {
    /// Every available water-quality mean plus both dam rates
    Full,
    /// The chlorophyll-a forecast features
    Chlorophyll,
}

/// Overrides for the water-quality query.
#[derive(Args)]
struct QueryArgs {
    /// Station codes, comma separated
    #[arg(long, value_delimiter = ',')]
    stations: Option<Vec<String>>,

    /// Years, comma separated
    #[arg(long, value_delimiter = ',')]
    years: Option<Vec<i32>>,

    /// Months (1-12), comma separated
    #[arg(long, value_delimiter = ',')]
    months: Option<Vec<u32>>,

    /// Rows requested from the single page fetched
    #[arg(long)]
    rows: Option<u32>,
}

impl QueryArgs {
    fn into_query(self) -> WaterQuery {
        let defaults = WaterQuery::default();
        WaterQuery {
            stations: self.stations.unwrap_or(defaults.stations),
            years: self.years.unwrap_or(defaults.years),
            months: self.months.unwrap_or(defaults.months),
            page_no: defaults.page_no,
            num_of_rows: self.rows.unwrap_or(defaults.num_of_rows),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_tracing()?;

    let cli = Cli::parse();
    let config = ServiceConfig::from_env()?;

    match cli.command {
        Commands::Water {
            output,
            raw,
            gzip,
            query,
        } => {
            let client =
                WaterQualityClient::new(config.water_url.clone(), config.water_key()?, query.into_query())?;
            if raw {
                let items = client.fetch_raw_items().await?;
                info!(items = items.len(), "Raw water-quality items fetched");
                export_json(&output, &items)?;
            } else {
                let table = client.fetch_readings().await?;
                log_preview(&table, PREVIEW_ROWS);
                export_csv(&output, &table, gzip)?;
            }
        }
        Commands::Dam {
            output,
            per_page,
            gzip,
        } => {
            let mut query = DamQuery::default();
            if let Some(per_page) = per_page {
                query.per_page = per_page;
            }
            let client = DamClient::new(
                config.dam_url.clone(),
                config.dam_key()?,
                config.dam_auth,
                query,
            )?;
            let table = client.fetch_records().await?;
            log_preview(&table, PREVIEW_ROWS);
            export_csv(&output, &table, gzip)?;
        }
        Commands::Align {
            output,
            water_csv,
            dam_csv,
            schema,
            columns,
            json,
            gzip,
            query,
        } => {
            let (water, dam) = tokio::join!(
                load_water(water_csv.as_deref(), &config, query.into_query()),
                load_dam(dam_csv.as_deref(), &config),
            );
            let (water, dam) = (water?, dam?);

            let table = build_features(&water, &dam, schema, columns.as_deref())?;
            log_preview(&table, PREVIEW_ROWS);

            if json {
                export_json(&output, &table)?;
            } else {
                export_csv(&output, &table, gzip)?;
            }
        }
    }

    Ok(())
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_tracing() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/estuary_monthly.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("estuary_monthly.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

/// Water readings from a local CSV, or from the API with the empty-on-failure
/// policy.
async fn load_water(path: Option<&str>, config: &ServiceConfig, query: WaterQuery) -> Result<WaterTable> {
    match path {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {path}"))?;
            let table = WaterTable::from_csv_reader(file)
                .with_context(|| format!("loading water-quality CSV {path}"))?;
            info!(path, rows = table.len(), columns = table.columns().len(), "Water-quality CSV loaded");
            Ok(table)
        }
        None => {
            let client = WaterQualityClient::new(config.water_url.clone(), config.water_key()?, query)?;
            Ok(readings_or_empty(&client).await)
        }
    }
}

/// Dam totals from a local CSV, or from the API with the empty-on-failure
/// policy.
async fn load_dam(path: Option<&str>, config: &ServiceConfig) -> Result<DamTable> {
    match path {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {path}"))?;
            let table = DamTable::from_csv_reader(file)
                .with_context(|| format!("loading dam CSV {path}"))?;
            info!(path, rows = table.len(), "Dam CSV loaded");
            Ok(table)
        }
        None => {
            let client = DamClient::new(
                config.dam_url.clone(),
                config.dam_key()?,
                config.dam_auth,
                DamQuery::default(),
            )?;
            Ok(records_or_empty(&client).await)
        }
    }
}

/// Runs the aligner with either the explicit column list or the named schema.
fn build_features(
    water: &WaterTable,
    dam: &DamTable,
    schema: Schema,
    columns: Option<&[String]>,
) -> Result<MergedTable> {
    let table = match (columns, schema) {
        (Some(names), _) => {
            let selected = names
                .iter()
                .map(|n| n.parse::<Column>())
                .collect::<Result<Vec<_>, _>>()?;
            align_subset(water, dam, &selected)?
        }
        (None, Schema::Chlorophyll) => align_subset(water, dam, &Column::CHLOROPHYLL_FEATURES)?,
        (None, Schema::Full) => align(water, dam),
    };
    Ok(table)
}
