use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::ScanConfig;
use crate::detector::Detector;
use crate::domain::EmailSheet;
use crate::fetcher::{PageFetcher, PageSource};
use crate::output;
use crate::stats::{ScanReport, ScanResult, ScanSummary};
use crate::Args;

/// Fetches one domain and runs the detector over its body.
pub async fn scan_domain<S: PageSource>(domain: &str, source: &S, detector: &Detector) -> ScanResult {
    match source.fetch(domain).await {
        Ok(page) => {
            let indicator = detector.detect(&page.body).map(str::to_string);
            ScanResult {
                domain: domain.to_string(),
                has_hubspot: indicator.is_some(),
                url: page.url,
                error: String::new(),
                indicator,
            }
        }
        Err(error) => ScanResult {
            domain: domain.to_string(),
            has_hubspot: false,
            url: String::new(),
            error: error.to_string(),
            indicator: None,
        },
    }
}

fn progress_line(index: usize, total: usize, result: &ScanResult) -> String {
    let outcome = match (&result.indicator, result.is_error()) {
        (_, true) => format!("✗ {}", result.error),
        (Some(indicator), false) => format!("✓ HubSpot detected ({indicator})"),
        (None, false) => "- No HubSpot".to_string(),
    };
    format!("[{index}/{total}] {}: {outcome}", result.domain)
}

/// Scans `domains` one after another, pausing `config.delay` between them.
///
/// `on_progress` receives the 1-based index, the total and each finished
/// result. Per-domain failures are recorded on the result and never stop the
/// loop.
pub async fn scan_domains<S, F>(
    domains: &[String],
    source: &S,
    detector: &Detector,
    config: &ScanConfig,
    mut on_progress: F,
) -> Vec<ScanResult>
where
    S: PageSource,
    F: FnMut(usize, usize, &ScanResult),
{
    let start_time = Instant::now();
    let total = domains.len();
    info!(action = "start", component = "scanner", domain_count = total, "Scanning unique domains");

    let mut results = Vec::with_capacity(total);
    for (i, domain) in domains.iter().enumerate() {
        let index = i + 1;
        let result = scan_domain(domain, source, detector).await;

        if config.verbose {
            info!(
                action = "scanned",
                component = "scanner",
                domain = %result.domain,
                has_hubspot = result.has_hubspot,
                "{}",
                progress_line(index, total, &result)
            );
        }
        on_progress(index, total, &result);
        results.push(result);

        if index < total && !config.delay.is_zero() {
            tokio::time::sleep(config.delay).await;
        }
    }

    let summary = ScanSummary::from_results(&results);
    info!(
        action = "complete",
        component = "scanner",
        scanned = summary.scanned,
        detected = summary.detected,
        failed = summary.failed,
        duration_ms = start_time.elapsed().as_millis(),
        "Scan completed"
    );
    results
}

/// Reads emails from `input`, then scans every unique domain with a live fetcher.
pub async fn run_scan<R, F>(input: R, config: &ScanConfig, on_progress: F) -> Result<ScanReport>
where
    R: Read,
    F: FnMut(usize, usize, &ScanResult),
{
    let sheet = EmailSheet::from_reader(input)?;
    scan_sheet(sheet, config, on_progress).await
}

async fn scan_sheet<F>(sheet: EmailSheet, config: &ScanConfig, on_progress: F) -> Result<ScanReport>
where
    F: FnMut(usize, usize, &ScanResult),
{
    let domains = sheet.domains();
    if domains.is_empty() {
        warn!(action = "extract", component = "domain_extraction", "No valid email addresses found");
    }

    let fetcher = PageFetcher::new(config).context("Failed to build HTTP client")?;
    let detector = Detector::from_config(config)?;
    let results = scan_domains(&domains, &fetcher, &detector, config, on_progress).await;

    Ok(ScanReport { sheet, results })
}

/// CLI pipeline: read the input file, scan, write the output file.
pub async fn scan_and_write(args: &Args, config: &ScanConfig) -> Result<ScanSummary> {
    let total_start_time = Instant::now();
    let input = args.input.as_deref().context("Missing input CSV path")?;
    let output_path = args.output.as_deref().context("Missing output CSV path")?;

    let sheet = EmailSheet::from_path(input)?;
    let report = scan_sheet(sheet, config, |_, _, _| {}).await?;

    write_report(&report, output_path, args.annotate, config.include_all)?;

    info!(
        action = "complete",
        component = "pipeline",
        duration_ms = total_start_time.elapsed().as_millis(),
        "Run completed"
    );
    Ok(report.summary())
}

fn write_report(report: &ScanReport, path: &Path, annotate: bool, include_all: bool) -> Result<usize> {
    if annotate {
        output::write_annotated(path, &report.sheet, &report.results, include_all)
    } else {
        output::write_results(path, &report.results, include_all)
    }
}

pub fn print_scan_summary(summary: &ScanSummary, output_path: &Path, include_all: bool) {
    println!("\n--- HubSpot Scan ---");
    println!(
        "Domains scanned: {}",
        crate::utils::format_number(summary.scanned)
    );
    println!(
        "HubSpot detected: {}",
        crate::utils::format_number(summary.detected)
    );
    println!(
        "Failed to fetch: {}",
        crate::utils::format_number(summary.failed)
    );
    println!("Results written to {}", output_path.display());
    if !include_all {
        println!("Output contains only domains with HubSpot detected");
    }
}
