//! Configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::estimation::HillClimbingEstimator;
use crate::session::SessionConfig;

/// Top-level wordcat configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordcatConfig {
    /// Distinct words to collect before scoring.
    #[serde(default = "default_quota")]
    pub quota: usize,
    /// Ability assumed before the first answer.
    #[serde(default = "default_start_theta")]
    pub start_theta: f64,
    /// Ability estimator settings.
    #[serde(default)]
    pub estimator: HillClimbingEstimator,
    /// Default instrument file.
    #[serde(default)]
    pub instrument: Option<PathBuf>,
    /// Default norms file.
    #[serde(default)]
    pub norms: Option<PathBuf>,
    /// Where session state files and reports are written.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

fn default_quota() -> usize {
    25
}
fn default_start_theta() -> f64 {
    -5.0
}
fn default_state_dir() -> PathBuf {
    PathBuf::from("./wordcat-sessions")
}

impl Default for WordcatConfig {
    fn default() -> Self {
        Self {
            quota: default_quota(),
            start_theta: default_start_theta(),
            estimator: HillClimbingEstimator::default(),
            instrument: None,
            norms: None,
            state_dir: default_state_dir(),
        }
    }
}

impl WordcatConfig {
    /// Settings for [`crate::session::AdaptiveSession`].
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            quota: self.quota,
            start_theta: self.start_theta,
            estimator: self.estimator.clone(),
        }
    }

    /// Reject values the session cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.quota == 0 {
            anyhow::bail!("quota must be at least 1");
        }
        if !self.start_theta.is_finite() {
            anyhow::bail!("start_theta must be finite, got {}", self.start_theta);
        }
        let est = &self.estimator;
        if !(est.lower_bound.is_finite() && est.upper_bound.is_finite())
            || est.lower_bound >= est.upper_bound
        {
            anyhow::bail!(
                "estimator bounds must be finite with lower < upper, got [{}, {}]",
                est.lower_bound,
                est.upper_bound
            );
        }
        if !(est.initial_step > 0.0 && est.initial_step.is_finite()) {
            anyhow::bail!("estimator initial_step must be positive, got {}", est.initial_step);
        }
        if !(est.precision > 0.0 && est.precision.is_finite()) {
            anyhow::bail!("estimator precision must be positive, got {}", est.precision);
        }
        if est.max_iterations == 0 {
            anyhow::bail!("estimator max_iterations must be at least 1");
        }
        Ok(())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `wordcat.toml` in the current directory
/// 2. `~/.config/wordcat/config.toml`
///
/// Environment variable overrides: `WORDCAT_QUOTA`, `WORDCAT_START_THETA`.
pub fn load_config() -> Result<WordcatConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<WordcatConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("wordcat.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => WordcatConfig::default(),
    };

    let config = apply_overrides(config, |name| std::env::var(name).ok())?;
    config.validate().with_context(|| match &config_path {
        Some(path) => format!("invalid config: {}", path.display()),
        None => "invalid config".to_string(),
    })?;

    tracing::debug!(
        source = ?config_path,
        quota = config.quota,
        start_theta = config.start_theta,
        "configuration loaded"
    );
    Ok(config)
}

/// Parse a TOML config string and resolve `${VAR}` references in its paths.
pub fn parse_config_str(content: &str) -> Result<WordcatConfig> {
    let mut config: WordcatConfig = toml::from_str(content)?;
    config.instrument = config.instrument.as_deref().map(resolve_path);
    config.norms = config.norms.as_deref().map(resolve_path);
    config.state_dir = resolve_path(&config.state_dir);
    Ok(config)
}

fn apply_overrides(
    mut config: WordcatConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<WordcatConfig> {
    if let Some(quota) = lookup("WORDCAT_QUOTA") {
        config.quota = quota
            .trim()
            .parse()
            .with_context(|| format!("WORDCAT_QUOTA is not a count: {quota}"))?;
    }
    if let Some(theta) = lookup("WORDCAT_START_THETA") {
        config.start_theta = theta
            .trim()
            .parse()
            .with_context(|| format!("WORDCAT_START_THETA is not a number: {theta}"))?;
    }
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("wordcat"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_WORDCAT_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_WORDCAT_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_WORDCAT_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("no_close_${brace"), "no_close_${brace");
        std::env::remove_var("_WORDCAT_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = WordcatConfig::default();
        assert_eq!(config.quota, 25);
        assert_eq!(config.start_theta, -5.0);
        assert_eq!(config.state_dir, PathBuf::from("./wordcat-sessions"));
        assert!(config.validate().is_ok());

        let session = config.session_config();
        assert_eq!(session.quota, 25);
        assert_eq!(session.estimator.upper_bound, 6.0);
    }

    #[test]
    fn parse_partial_config() {
        std::env::set_var("_WORDCAT_DATA_DIR", "/data/cdi");
        let config = parse_config_str(
            r#"
quota = 10
instrument = "${_WORDCAT_DATA_DIR}/ws.toml"

[estimator]
precision = 0.001
"#,
        )
        .unwrap();
        std::env::remove_var("_WORDCAT_DATA_DIR");

        assert_eq!(config.quota, 10);
        assert_eq!(config.start_theta, -5.0);
        assert_eq!(config.instrument, Some(PathBuf::from("/data/cdi/ws.toml")));
        assert_eq!(config.estimator.precision, 0.001);
        assert_eq!(config.estimator.lower_bound, -6.0);
        assert!(config.norms.is_none());
    }

    #[test]
    fn overrides_apply_and_reject_garbage() {
        let config = apply_overrides(WordcatConfig::default(), |name| match name {
            "WORDCAT_QUOTA" => Some("40".into()),
            "WORDCAT_START_THETA" => Some(" -3.5 ".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.quota, 40);
        assert_eq!(config.start_theta, -3.5);

        let err = apply_overrides(WordcatConfig::default(), |name| {
            (name == "WORDCAT_QUOTA").then(|| "lots".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("WORDCAT_QUOTA"));
    }

    #[test]
    fn invalid_values_rejected() {
        let zero_quota = WordcatConfig {
            quota: 0,
            ..Default::default()
        };
        assert!(zero_quota.validate().is_err());

        let mut inverted = WordcatConfig::default();
        inverted.estimator.lower_bound = 3.0;
        inverted.estimator.upper_bound = -3.0;
        assert!(inverted.validate().is_err());

        let mut no_precision = WordcatConfig::default();
        no_precision.estimator.precision = 0.0;
        assert!(no_precision.validate().is_err());
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wordcat.toml");
        std::fs::write(&path, "quota = 0\n").unwrap();
        let err = load_config_from(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("quota must be at least 1"));

        assert!(load_config_from(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
