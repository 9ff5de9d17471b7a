use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Header names accepted for the email column, highest priority first.
pub const EMAIL_COLUMN_NAMES: [&str; 3] = ["email", "e-mail", "mail"];

/// Returns the lowercased text after the last `@`, if any.
pub fn domain_from_email(email: &str) -> Option<String> {
    let (_, domain) = email.trim().rsplit_once('@')?;
    let domain = domain.trim();
    if domain.is_empty() {
        return None;
    }
    Some(domain.to_lowercase())
}

/// Deduplicates domains extracted from `emails`, keeping first-seen order.
pub fn unique_domains<'a, I>(emails: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut domains = Vec::new();
    for email in emails {
        if let Some(domain) = domain_from_email(email) {
            if seen.insert(domain.clone()) {
                domains.push(domain);
            }
        }
    }
    domains
}

/// A row holding an address is data, even if one of its cells reads `email`.
fn find_email_column(row: &[String]) -> Option<usize> {
    if row.iter().any(|cell| cell.contains('@')) {
        return None;
    }
    let names: Vec<String> = row.iter().map(|h| h.trim().to_lowercase()).collect();
    EMAIL_COLUMN_NAMES
        .iter()
        .find_map(|wanted| names.iter().position(|name| name == wanted))
}

/// A parsed input CSV: optional header row, data rows and the email column.
#[derive(Debug, Clone)]
pub struct EmailSheet {
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
    pub email_column: usize,
}

impl EmailSheet {
    pub fn from_path(path: &Path) -> Result<Self> {
        info!(action = "read", component = "input_csv", file_path = ?path, "Reading input CSV");
        let file =
            File::open(path).with_context(|| format!("Failed to open input CSV {:?}", path))?;
        Self::from_reader(file).with_context(|| format!("Invalid input CSV {:?}", path))
    }

    /// The first row is a header only when it names an email column; otherwise
    /// it is data and the first column holds the email.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record =
                record.with_context(|| format!("Failed to parse CSV record {}", index + 1))?;
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        if rows.is_empty() {
            anyhow::bail!("Empty or invalid CSV file");
        }

        // Excel's "CSV UTF-8" export starts with a byte order mark.
        if let Some(first_cell) = rows[0].first_mut() {
            if let Some(stripped) = first_cell.strip_prefix('\u{feff}') {
                *first_cell = stripped.to_string();
            }
        }

        let (header, email_column) = match find_email_column(&rows[0]) {
            Some(column) => (Some(rows.remove(0)), column),
            None => (None, 0),
        };

        debug!(
            action = "parse",
            component = "input_csv",
            has_header = header.is_some(),
            email_column,
            row_count = rows.len(),
            "Parsed input CSV"
        );

        Ok(Self {
            header,
            rows,
            email_column,
        })
    }

    pub fn email_for_row<'a>(&self, row: &'a [String]) -> Option<&'a str> {
        row.get(self.email_column).map(String::as_str)
    }

    pub fn domain_for_row(&self, row: &[String]) -> Option<String> {
        self.email_for_row(row).and_then(domain_from_email)
    }

    pub fn domains(&self) -> Vec<String> {
        let domains = unique_domains(self.rows.iter().filter_map(|row| self.email_for_row(row)));
        info!(
            action = "extract",
            component = "domain_extraction",
            row_count = self.rows.len(),
            unique_domains = domains.len(),
            "Extracted unique domains"
        );
        domains
    }
}
