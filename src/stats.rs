use serde::{Serialize, Serializer};

use crate::domain::EmailSheet;

/// Outcome of scanning one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub domain: String,
    #[serde(serialize_with = "serialize_bool_literal")]
    pub has_hubspot: bool,
    pub url: String,
    pub error: String,
    #[serde(skip)]
    pub indicator: Option<String>,
}

impl ScanResult {
    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }

    /// `Yes`, `No` or `Error: <message>`, as written by the annotated output.
    pub fn status_label(&self) -> String {
        if self.is_error() {
            format!("Error: {}", self.error)
        } else if self.has_hubspot {
            "Yes".to_string()
        } else {
            "No".to_string()
        }
    }
}

pub fn bool_literal(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn serialize_bool_literal<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(bool_literal(*value))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub scanned: usize,
    pub detected: usize,
    pub failed: usize,
}

impl ScanSummary {
    pub fn from_results(results: &[ScanResult]) -> Self {
        Self {
            scanned: results.len(),
            detected: results.iter().filter(|r| r.has_hubspot).count(),
            failed: results.iter().filter(|r| r.is_error()).count(),
        }
    }
}

/// Parsed input together with the per-domain results, in first-seen order.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub sheet: EmailSheet,
    pub results: Vec<ScanResult>,
}

impl ScanReport {
    pub fn summary(&self) -> ScanSummary {
        ScanSummary::from_results(&self.results)
    }
}
