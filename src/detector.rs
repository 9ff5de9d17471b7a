use anyhow::Result;

use crate::config::ScanConfig;
use crate::indicators;

/// Case-insensitive substring matcher over a fixed indicator list.
#[derive(Debug, Clone)]
pub struct Detector {
    indicators: Vec<String>,
}

impl Detector {
    pub fn new<I, S>(indicators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let indicators = indicators
            .into_iter()
            .map(|i| i.as_ref().trim().to_lowercase())
            .filter(|i| !i.is_empty())
            .collect();
        Self { indicators }
    }

    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(indicators::default_indicators()?))
    }

    /// Uses the configured indicators, or the embedded defaults when none are set.
    pub fn from_config(config: &ScanConfig) -> Result<Self> {
        if config.indicators.is_empty() {
            Self::with_defaults()
        } else {
            Ok(Self::new(&config.indicators))
        }
    }

    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    /// Returns the first indicator, in list order, found in `body`.
    pub fn detect(&self, body: &str) -> Option<&str> {
        if body.is_empty() {
            return None;
        }
        let html = body.to_lowercase();
        self.indicators
            .iter()
            .find(|indicator| html.contains(indicator.as_str()))
            .map(String::as_str)
    }

    pub fn has_hubspot(&self, body: &str) -> bool {
        self.detect(body).is_some()
    }
}
