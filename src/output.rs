use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::domain::EmailSheet;
use crate::stats::ScanResult;

pub const RESULT_HEADERS: [&str; 4] = ["domain", "has_hubspot", "url", "error"];
pub const ANNOTATION_HEADERS: [&str; 2] = ["scanned_url", "hubspot_status"];

/// Results kept in the output: everything, or only HubSpot detections.
pub fn retained(results: &[ScanResult], include_all: bool) -> impl Iterator<Item = &ScanResult> {
    results
        .iter()
        .filter(move |result| include_all || result.has_hubspot)
}

fn headerless_writer<W: Write>(writer: W) -> Writer<W> {
    WriterBuilder::new().has_headers(false).from_writer(writer)
}

/// Writes the `domain,has_hubspot,url,error` CSV. Returns the number of data rows.
pub fn write_results_to<W: Write>(writer: W, results: &[ScanResult], include_all: bool) -> Result<usize> {
    let mut wtr = headerless_writer(writer);
    // Header is written by hand so it is present even with no rows.
    wtr.write_record(RESULT_HEADERS)?;

    let mut written = 0;
    for result in retained(results, include_all) {
        wtr.serialize(result)?;
        written += 1;
    }

    wtr.flush()?;
    Ok(written)
}

pub fn results_to_csv(results: &[ScanResult], include_all: bool) -> Result<String> {
    let mut buffer = Vec::new();
    write_results_to(&mut buffer, results, include_all)?;
    String::from_utf8(buffer).context("CSV output was not valid UTF-8")
}

pub fn write_results(path: &Path, results: &[ScanResult], include_all: bool) -> Result<usize> {
    debug!(action = "export", component = "result_writer", file_path = ?path, result_count = results.len(), "Exporting results to CSV");

    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {:?}", path))?;
    let written = write_results_to(file, results, include_all)
        .with_context(|| format!("Failed to write results to {:?}", path))?;

    info!(action = "complete", component = "result_writer", file_path = ?path, row_count = written, "Wrote results CSV");
    Ok(written)
}

/// Writes every input row back with `scanned_url` and `hubspot_status` appended.
pub fn write_annotated_to<W: Write>(
    writer: W,
    sheet: &EmailSheet,
    results: &[ScanResult],
    include_all: bool,
) -> Result<usize> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(writer);

    if let Some(header) = &sheet.header {
        let mut record = header.clone();
        record.extend(ANNOTATION_HEADERS.iter().map(|h| h.to_string()));
        wtr.write_record(&record)?;
    }

    let by_domain: HashMap<&str, &ScanResult> = results
        .iter()
        .map(|result| (result.domain.as_str(), result))
        .collect();

    let mut written = 0;
    for row in &sheet.rows {
        let result = sheet
            .domain_for_row(row)
            .and_then(|domain| by_domain.get(domain.as_str()).copied());

        let (scanned_url, status) = match result {
            Some(result) if include_all || result.has_hubspot => {
                (result.url.clone(), result.status_label())
            }
            None if include_all => (String::new(), String::new()),
            _ => continue,
        };

        let mut record = row.clone();
        record.push(scanned_url);
        record.push(status);
        wtr.write_record(&record)?;
        written += 1;
    }

    wtr.flush()?;
    Ok(written)
}

pub fn write_annotated(
    path: &Path,
    sheet: &EmailSheet,
    results: &[ScanResult],
    include_all: bool,
) -> Result<usize> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {:?}", path))?;
    let written = write_annotated_to(file, sheet, results, include_all)
        .with_context(|| format!("Failed to write annotated rows to {:?}", path))?;

    info!(action = "complete", component = "annotated_writer", file_path = ?path, row_count = written, "Wrote annotated CSV");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn result(domain: &str, has_hubspot: bool, url: &str, error: &str) -> ScanResult {
        ScanResult {
            domain: domain.to_string(),
            has_hubspot,
            url: url.to_string(),
            error: error.to_string(),
            indicator: has_hubspot.then(|| "hubspot".to_string()),
        }
    }

    fn sample() -> Vec<ScanResult> {
        vec![
            result("a.com", true, "https://a.com/", ""),
            result("b.com", false, "https://www.b.com/", ""),
            result("c.com", false, "", "Timeout after 10s (http://c.com)"),
        ]
    }

    #[test]
    fn test_hubspot_only_output() {
        let csv = results_to_csv(&sample(), false).unwrap();
        assert_eq!(
            csv,
            "domain,has_hubspot,url,error\na.com,True,https://a.com/,\n"
        );
    }

    #[test]
    fn test_all_output_keeps_every_domain_in_order() {
        let csv = results_to_csv(&sample(), true).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "domain,has_hubspot,url,error",
                "a.com,True,https://a.com/,",
                "b.com,False,https://www.b.com/,",
                "c.com,False,,Timeout after 10s (http://c.com)",
            ]
        );
    }

    #[test]
    fn test_header_written_without_rows() {
        assert_eq!(results_to_csv(&[], true).unwrap(), "domain,has_hubspot,url,error\n");
        assert_eq!(
            results_to_csv(&sample()[1..], false).unwrap(),
            "domain,has_hubspot,url,error\n"
        );
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let results = vec![result("d.com", false, "", "HTTP error (http://d.com/): a, b")];
        let csv = results_to_csv(&results, true).unwrap();
        assert!(csv.ends_with("d.com,False,,\"HTTP error (http://d.com/): a, b\"\n"));
    }

    #[test]
    fn test_write_results_overwrites_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "stale content that is longer than the new output\n").unwrap();

        let written = write_results(&path, &sample(), false).unwrap();
        assert_eq!(written, 1);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "domain,has_hubspot,url,error\na.com,True,https://a.com/,\n"
        );
    }

    #[test]
    fn test_write_results_to_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        assert!(write_results(&path, &sample(), true).is_err());
    }

    fn annotated_sheet() -> EmailSheet {
        EmailSheet::from_reader(
            "name,email\nAnn,ann@a.com\nBob,bob@B.com\nCy,cy@c.com\nNo,none\nAl,al@a.com\n".as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn test_annotated_hubspot_only() {
        let mut buffer = Vec::new();
        let written = write_annotated_to(&mut buffer, &annotated_sheet(), &sample(), false).unwrap();
        assert_eq!(written, 2);
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "name,email,scanned_url,hubspot_status\n\
             Ann,ann@a.com,https://a.com/,Yes\n\
             Al,al@a.com,https://a.com/,Yes\n"
        );
    }

    #[test]
    fn test_annotated_rows_share_one_result_per_domain() {
        let sheet = EmailSheet::from_reader(
            "email\nann@a.com\nbob@A.com\ncy@a.com\n".as_bytes(),
        )
        .unwrap();
        let mut buffer = Vec::new();
        let written = write_annotated_to(&mut buffer, &sheet, &sample(), false).unwrap();
        assert_eq!(written, 3);
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.lines().skip(1).all(|line| line.ends_with(",https://a.com/,Yes")));
    }

    #[test]
    fn test_annotated_header_from_bom_input_is_not_a_data_row() {
        let sheet = EmailSheet::from_reader("\u{feff}email\nann@a.com\n".as_bytes()).unwrap();
        let mut buffer = Vec::new();
        write_annotated_to(&mut buffer, &sheet, &sample(), true).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "email,scanned_url,hubspot_status\nann@a.com,https://a.com/,Yes\n"
        );
    }

    #[test]
    fn test_annotated_all_rows() {
        let mut buffer = Vec::new();
        let written = write_annotated_to(&mut buffer, &annotated_sheet(), &sample(), true).unwrap();
        assert_eq!(written, 5);
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[2], "Bob,bob@B.com,https://www.b.com/,No");
        assert_eq!(lines[3], "Cy,cy@c.com,,Error: Timeout after 10s (http://c.com)");
        assert_eq!(lines[4], "No,none,,");
    }
}
