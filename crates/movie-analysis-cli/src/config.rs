//! Configuration loading and resolution.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use movie_analysis::AnalysisConfig;

/// Resolve the config file path, if any exists.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }

    if let Ok(env_path) = std::env::var("MOVIE_ANALYSIS_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    let cwd_config = PathBuf::from(".movie-analysis/config.json");
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    let home_config = default_config_path();
    home_config.exists().then_some(home_config)
}

fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());

    Path::new(&home).join(".movie-analysis").join("config.json")
}

/// Load the effective configuration: file (if found), then env overrides.
pub fn load_config(explicit: Option<&str>) -> Result<AnalysisConfig> {
    let mut config = match resolve_config_path(explicit) {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            AnalysisConfig::load(&path)
                .with_context(|| format!("failed to load config {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };
    config.apply_env_overrides()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_explicit_path_wins() {
        assert_eq!(
            resolve_config_path(Some("/tmp/custom.json")),
            Some(PathBuf::from("/tmp/custom.json"))
        );
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"selectors": {{"score": "span.score"}}}}"#).unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.selectors.score, "span.score");
        assert_eq!(config.selectors.year, "span.start-year");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        assert!(load_config(Some("/nonexistent/movie-analysis.json")).is_err());
    }
}
