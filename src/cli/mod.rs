pub mod dashboard;
pub mod status;
pub mod summary;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::error::Result;
use crate::filter::FilterArgs;
use crate::loader::load_cached;
use crate::models::Dataset;
use crate::settings::{load_settings, resolve_data_file, Settings};

#[derive(Parser)]
#[command(
    name = "dealscope",
    version,
    about = "Analyze how discounts affect sales, profit, and customer behavior across categories and regions."
)]
pub struct Cli {
    /// CSV file to analyze (default: ecommerce_dataset.csv, or `data_file` in settings)
    #[arg(long, global = true)]
    pub file: Option<String>,

    /// Write debug-level events to the log file
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive dashboard (plain-text summary when not on a terminal).
    Dashboard {
        #[command(flatten)]
        filters: FilterOpts,
    },
    /// Print metrics, panel tables and insights as plain text.
    Summary {
        #[command(flatten)]
        filters: FilterOpts,
    },
    /// Show settings and a profile of the dataset.
    Status,
    /// Print a shell completion script.
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// Initial filter values. Anything not given starts at its default.
#[derive(Args, Clone, Default, Debug)]
pub struct FilterOpts {
    /// Category to include (repeatable; default: all)
    #[arg(long = "category", value_name = "NAME")]
    pub categories: Vec<String>,
    /// Region to include (repeatable; default: all)
    #[arg(long = "region", value_name = "NAME")]
    pub regions: Vec<String>,
    /// Lowest discount to include (default: dataset minimum)
    #[arg(long = "min-discount", value_name = "FRACTION")]
    pub min_discount: Option<f64>,
    /// Highest discount to include (default: dataset maximum)
    #[arg(long = "max-discount", value_name = "FRACTION")]
    pub max_discount: Option<f64>,
}

impl From<&FilterOpts> for FilterArgs {
    fn from(opts: &FilterOpts) -> Self {
        FilterArgs {
            categories: opts.categories.clone(),
            regions: opts.regions.clone(),
            min_discount: opts.min_discount,
            max_discount: opts.max_discount,
        }
    }
}

/// Settings plus the resolved data file for this run.
pub(crate) struct Context {
    pub settings: Settings,
    pub data_file: PathBuf,
}

impl Context {
    pub fn new(file_override: Option<&str>) -> Self {
        let settings = load_settings();
        let data_file = resolve_data_file(&settings, file_override);
        Self {
            settings,
            data_file,
        }
    }

    pub fn dataset(&self) -> Result<&'static Dataset> {
        load_cached(&self.data_file)
    }
}
