pub mod args;
pub mod config;
pub mod detector;
pub mod domain;
pub mod fetcher;
pub mod indicators;
pub mod output;
pub mod scanner;
pub mod stats;
pub mod utils;

pub use args::Args;
pub use config::ScanConfig;
pub use detector::Detector;
pub use domain::EmailSheet;
pub use fetcher::{FetchError, FetchErrorKind, FetchedPage, PageFetcher, PageSource};
pub use output::{results_to_csv, write_results};
pub use scanner::{run_scan, scan_domains};
pub use stats::{ScanReport, ScanResult, ScanSummary};
