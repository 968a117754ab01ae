use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "limitboard",
    about = "A-share limit-up / limit-down derived state builder"
)]
pub struct Cli {
    /// Optional config file; defaults to ./limitboard.toml when present
    #[arg(long, global = true, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Override storage.data_dir
    #[arg(long = "data-dir", global = true, value_hint = clap::ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rebuild the whole snapshot from the raw bar archive
    Rebuild,

    /// Merge a Parquet file of freshly fetched daily bars into archive and snapshot
    Merge {
        /// Parquet file with the bar archive columns
        #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
        bars: PathBuf,
    },

    /// Print derived rows of one symbol as JSON lines
    Show {
        #[arg(long)]
        symbol: String,

        /// First trade date (inclusive), YYYY-MM-DD
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last trade date (inclusive), YYYY-MM-DD
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Print market sentiment statistics for one trade date
    Stats {
        /// Trade date, YYYY-MM-DD; defaults to the latest date in the snapshot
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}
