use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod commands;

/// Timezone lookup by coordinate
#[derive(Parser)]
#[command(name = "tzq")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    data: DataArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Where the timezone data lives.
#[derive(Args, Clone)]
pub struct DataArgs {
    /// Index document: file path or http(s) URL
    #[arg(short = 'i', long, env = "TZQ_TZ_DATA", global = true)]
    tz_data: Option<String>,

    /// Geometry store: file path or http(s) URL
    #[arg(short = 'g', long, env = "TZQ_GEO_DATA", global = true)]
    geo_data: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, env = "TZQ_TIMEOUT_SECS", default_value = "30", global = true)]
    timeout: u64,

    /// Retries for transient HTTP failures
    #[arg(long, env = "TZQ_MAX_RETRIES", default_value = "2", global = true)]
    max_retries: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up the timezones at a single coordinate
    Query {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Include the current UTC offset of each timezone
        #[arg(long)]
        offset: bool,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Look up timezones for coordinates from a file
    Batch {
        /// Input file (CSV or GeoJSON)
        input: PathBuf,

        /// Output file (same format as input if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column name for latitude (CSV only)
        #[arg(long, default_value = "lat")]
        lat_col: String,

        /// Column name for longitude (CSV only)
        #[arg(long, default_value = "lon")]
        lon_col: String,
    },

    /// Display statistics about the index document
    Info,

    /// List the timezones in the index document
    List,

    /// Show the current UTC offset of a timezone
    Offset {
        /// IANA timezone id, e.g. Europe/Paris
        tzid: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Query {
            lat,
            lon,
            offset,
            json,
        } => commands::query::run(&cli.data, lat, lon, offset, json).await,
        Commands::Batch {
            input,
            output,
            lat_col,
            lon_col,
        } => commands::batch::run(&cli.data, input, output, lat_col, lon_col).await,
        Commands::Info => commands::info::run(&cli.data).await,
        Commands::List => commands::list::run(&cli.data).await,
        Commands::Offset { tzid } => commands::offset::run(&tzid),
    }
}
