use anyhow::Result;
use std::time::Duration;

use crate::args::Args;
use crate::indicators;

/// Settings shared by the CLI and embedding callers.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub timeout: Duration,
    pub delay: Duration,
    pub max_redirects: usize,
    pub try_www: bool,
    pub user_agent: Option<String>,
    pub include_all: bool,
    pub verbose: bool,
    pub indicators: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            delay: Duration::from_secs(1),
            max_redirects: 10,
            try_www: false,
            user_agent: None,
            include_all: false,
            verbose: false,
            indicators: Vec::new(),
        }
    }
}

impl ScanConfig {
    /// Expects arguments already checked by [`crate::utils::validate_args`].
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            timeout: Duration::from_secs(args.timeout),
            delay: Duration::try_from_secs_f64(args.delay)?,
            max_redirects: args.max_redirects,
            try_www: args.www,
            user_agent: args.user_agent.clone(),
            include_all: args.all,
            verbose: args.verbose,
            indicators: indicators::load_indicators(args.indicators.as_deref())?,
        })
    }
}
