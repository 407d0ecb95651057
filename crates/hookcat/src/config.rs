//! Configuration for hookcat.
//!
//! The webhook URL comes from the first non-empty source in this order:
//! command-line flag, `DISCORD_WEBHOOK_URL`, config file. The config file may
//! also raise the HTTP timeout and the retry count.

use crate::error::{HookcatError, HookcatResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the default webhook URL.
pub const WEBHOOK_URL_ENV: &str = "DISCORD_WEBHOOK_URL";

/// Default overall HTTP client timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// On-disk YAML config file.
///
/// ```yaml
/// webhook_url: https://discord.com/api/webhooks/...
/// timeout: 15        # seconds, ignored when 0
/// max_retries: 5     # ignored when 0
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub timeout: u64,
    #[serde(default)]
    pub max_retries: u32,
}

impl ConfigFile {
    /// Read and parse a YAML config file.
    pub fn load(path: &Path) -> HookcatResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HookcatError::Config(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> HookcatResult<Self> {
        // An empty document deserializes to null rather than an empty map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(content).map_err(|source| HookcatError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Raw inputs gathered by the binary before resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// `--webhook-url` flag.
    pub webhook_url_flag: Option<String>,
    /// Value of `DISCORD_WEBHOOK_URL`.
    pub webhook_url_env: Option<String>,
    /// `--config` flag.
    pub config_file: Option<PathBuf>,
    /// `--one-line` flag.
    pub one_line: bool,
    /// `--verbose` flag.
    pub verbose: bool,
}

/// Resolved run configuration. Immutable once built.
#[derive(Debug, Clone)]
pub struct Config {
    /// Destination webhook. Without one, input is only echoed.
    pub webhook_url: Option<String>,
    /// Send each line as its own message instead of batching all input.
    pub one_line: bool,
    /// Log at debug level and report metrics at the end of the run.
    pub verbose: bool,
    /// Overall HTTP client timeout.
    pub timeout: Duration,
    /// Retries after the first failed attempt.
    pub max_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_url: None,
            one_line: false,
            verbose: false,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl Config {
    /// Apply source precedence and defaults.
    pub fn resolve(sources: ConfigSources) -> HookcatResult<Self> {
        let mut config = Self {
            webhook_url: sources
                .webhook_url_flag
                .and_then(non_empty)
                .or_else(|| sources.webhook_url_env.and_then(non_empty)),
            one_line: sources.one_line,
            verbose: sources.verbose,
            ..Self::default()
        };

        if let Some(path) = sources.config_file.as_deref() {
            let file = ConfigFile::load(path)?;

            if config.webhook_url.is_none() {
                config.webhook_url = file.webhook_url.and_then(non_empty);
            }
            if file.timeout > 0 {
                config.timeout = Duration::from_secs(file.timeout);
            }
            if file.max_retries > 0 {
                config.max_retries = file.max_retries;
            }
        }

        Ok(config)
    }

    /// The webhook URL, if one is configured.
    pub fn destination(&self) -> Option<&str> {
        self.webhook_url.as_deref()
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("hookcat.yaml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = Config::resolve(ConfigSources::default()).unwrap();
        assert!(config.webhook_url.is_none());
        assert!(!config.one_line);
        assert!(!config.verbose);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_flag_beats_env_and_file() {
        let dir = tempdir().unwrap();
        let path = write_config(&dir, "webhook_url: https://file.example/hook\n");

        let config = Config::resolve(ConfigSources {
            webhook_url_flag: Some("https://flag.example/hook".into()),
            webhook_url_env: Some("https://env.example/hook".into()),
            config_file: Some(path),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(config.destination(), Some("https://flag.example/hook"));
    }

    #[test]
    fn test_env_beats_file() {
        let dir = tempdir().unwrap();
        let path = write_config(&dir, "webhook_url: https://file.example/hook\n");

        let config = Config::resolve(ConfigSources {
            webhook_url_env: Some("https://env.example/hook".into()),
            config_file: Some(path),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(config.destination(), Some("https://env.example/hook"));
    }

    #[test]
    fn test_file_used_when_flag_and_env_empty() {
        let dir = tempdir().unwrap();
        let path = write_config(
            &dir,
            "webhook_url: https://file.example/hook\ntimeout: 12\nmax_retries: 7\n",
        );

        let config = Config::resolve(ConfigSources {
            webhook_url_flag: Some("".into()),
            webhook_url_env: Some("   ".into()),
            config_file: Some(path),
            one_line: true,
            verbose: true,
        })
        .unwrap();

        assert_eq!(config.destination(), Some("https://file.example/hook"));
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(config.max_retries, 7);
        assert!(config.one_line);
        assert!(config.verbose);
    }

    #[test]
    fn test_zero_values_in_file_keep_defaults() {
        let dir = tempdir().unwrap();
        let path = write_config(&dir, "timeout: 0\nmax_retries: 0\n");

        let config = Config::resolve(ConfigSources {
            config_file: Some(path),
            ..Default::default()
        })
        .unwrap();

        assert!(config.webhook_url.is_none());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_empty_file_is_valid() {
        let dir = tempdir().unwrap();
        let path = write_config(&dir, "");

        let config = Config::resolve(ConfigSources {
            config_file: Some(path),
            ..Default::default()
        })
        .unwrap();

        assert!(config.webhook_url.is_none());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempdir().unwrap();
        let path = write_config(&dir, "timeout: [not, a, number]\n");

        let result = Config::resolve(ConfigSources {
            config_file: Some(path.clone()),
            ..Default::default()
        });

        match result {
            Err(HookcatError::ConfigFile { path: err_path, .. }) => assert_eq!(err_path, path),
            other => panic!("expected ConfigFile error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let result = Config::resolve(ConfigSources {
            config_file: Some(dir.path().join("missing.yaml")),
            ..Default::default()
        });

        assert!(matches!(result, Err(HookcatError::Config(_))));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let dir = tempdir().unwrap();
        let path = write_config(&dir, "webhook_url: https://x.example\nusername: bot\n");

        let file = ConfigFile::load(&path).unwrap();
        assert_eq!(file.webhook_url.as_deref(), Some("https://x.example"));
    }
}
