use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::info;

// Include default indicators at compile time
const DEFAULT_INDICATORS_BYTES: &[u8] = include_bytes!("../default_indicators.txt");

/// File picked up from the working directory when no `--indicators` path is given.
pub const DEFAULT_INDICATOR_FILE: &str = "hubspot_indicators.txt";

/// Parses an indicator list: one per line, `#` comments and blank lines skipped.
pub fn parse_indicators(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_lowercase)
        .collect()
}

pub fn default_indicators() -> Result<Vec<String>> {
    let default_content = std::str::from_utf8(DEFAULT_INDICATORS_BYTES)
        .context("Failed to decode embedded default indicators")?;
    Ok(parse_indicators(default_content))
}

fn read_indicator_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read indicator file {:?}", path))?;
    let indicators = parse_indicators(&content);
    if indicators.is_empty() {
        anyhow::bail!("Indicator file {:?} contains no indicators", path);
    }
    Ok(indicators)
}

pub fn load_indicators(indicator_file_path: Option<&Path>) -> Result<Vec<String>> {
    let start_time = Instant::now();
    info!(
        action = "start",
        component = "indicator_loading",
        "Starting indicator loading"
    );

    let indicators = if let Some(path) = indicator_file_path {
        info!(action = "load", component = "indicator_file", file_path = ?path, "Loading indicators from specified file");
        if !path.exists() {
            anyhow::bail!("Indicator file not found: {:?}", path);
        }
        read_indicator_file(path)?
    } else {
        let default_file = Path::new(DEFAULT_INDICATOR_FILE);
        if default_file.exists() {
            info!(action = "load", component = "default_indicator_file", file_path = ?default_file, "Loading indicators from default file");
            read_indicator_file(default_file)?
        } else {
            info!(
                action = "load",
                component = "embedded_indicators",
                "Using embedded default indicators"
            );
            default_indicators()?
        }
    };

    let load_time = start_time.elapsed();
    info!(
        action = "complete",
        component = "indicator_loading",
        indicator_count = indicators.len(),
        duration_ms = load_time.as_millis(),
        "Loaded indicators"
    );
    Ok(indicators)
}

pub fn init_default_indicators(target: &Path) -> Result<()> {
    if target.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first if you want to reinitialize.",
            target.display()
        );
    }

    let default_content = std::str::from_utf8(DEFAULT_INDICATORS_BYTES)
        .context("Failed to decode embedded default indicators")?;

    fs::write(target, default_content)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    println!("Created {} with default indicators", target.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_embedded_defaults_cover_hubspot_hosts() {
        let indicators = default_indicators().unwrap();
        for expected in [
            "hubspot",
            "hs-scripts.com",
            "js.hs-scripts.com",
            "js.hsforms.net",
            "hbspt.forms",
            "hbspt.cta",
        ] {
            assert!(
                indicators.iter().any(|i| i == expected),
                "missing default indicator {expected}"
            );
        }
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let parsed = parse_indicators("# comment\n\n  HubSpot  \nhbspt.cta\n   \n#x\n");
        assert_eq!(parsed, vec!["hubspot", "hbspt.cta"]);
    }

    #[test]
    fn test_load_from_specified_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.txt");
        fs::write(&path, "wp-content\n").unwrap();

        let indicators = load_indicators(Some(&path)).unwrap();
        assert_eq!(indicators, vec!["wp-content"]);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.txt");
        let err = load_indicators(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_empty_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.txt");
        fs::write(&path, "# nothing here\n").unwrap();
        assert!(load_indicators(Some(&path)).is_err());
    }

    #[test]
    fn test_init_writes_defaults_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_INDICATOR_FILE);

        init_default_indicators(&path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(parse_indicators(&written), default_indicators().unwrap());

        assert!(init_default_indicators(&path).is_err());
    }
}
