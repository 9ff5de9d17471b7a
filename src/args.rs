use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "whatcms",
    about = "Scan the websites behind a list of email addresses for HubSpot usage",
    version,
    long_about = None
)]
pub struct Args {
    /// Input CSV file with email addresses
    #[arg(required_unless_present = "init")]
    pub input: Option<PathBuf>,

    /// Output CSV file for results
    #[arg(required_unless_present = "init")]
    pub output: Option<PathBuf>,

    /// Include every domain in the output, not just the HubSpot ones
    #[arg(long)]
    pub all: bool,

    /// Show per-domain progress
    #[arg(short, long)]
    pub verbose: bool,

    /// Delay between requests in seconds
    #[arg(long, default_value_t = 1.0)]
    pub delay: f64,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Also try the www. variant of each domain
    #[arg(long)]
    pub www: bool,

    /// Write the input rows back with scanned_url and hubspot_status appended
    #[arg(long)]
    pub annotate: bool,

    /// Maximum number of redirects to follow per request
    #[arg(long, default_value_t = 10)]
    pub max_redirects: usize,

    /// Send this User-Agent instead of a rotating browser one
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Path to a custom indicator file
    #[arg(short, long)]
    pub indicators: Option<PathBuf>,

    /// Initialize hubspot_indicators.txt with the default indicators
    #[arg(long)]
    pub init: bool,
}
