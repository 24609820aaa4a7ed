//! Server configuration.
//!
//! Built from CLI flags or loaded from a YAML file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for the mock server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Directory whose files are served as responses
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Artificial per-request response delay
    #[serde(default)]
    pub delay: DelayConfig,

    /// Unescape the query string in request log lines
    #[serde(default = "default_true")]
    pub unescape_request_query: bool,

    /// Render responses as templates against the JSON request body
    #[serde(default)]
    pub template: bool,

    /// How request paths are resolved to files
    #[serde(default)]
    pub routing: RoutingMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            port: default_port(),
            delay: DelayConfig::default(),
            unescape_request_query: true,
            template: false,
            routing: RoutingMode::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            anyhow::bail!("data_dir cannot be empty");
        }
        if self.port == 0 {
            anyhow::bail!("port cannot be 0");
        }
        self.delay.validate()?;
        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

/// Path resolution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    /// Resolve every request fresh: data root + request path
    #[default]
    Direct,
    /// Walk the data root once at startup and match routes exactly
    Enumerated,
}

/// Latency simulation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DelayConfig {
    /// Fixed delay in milliseconds
    #[serde(default)]
    pub fixed_ms: u64,

    /// Minimum delay for random range (ms)
    #[serde(default)]
    pub min_ms: u64,

    /// Maximum delay for random range (ms)
    #[serde(default)]
    pub max_ms: u64,
}

impl DelayConfig {
    /// Fixed delay, no jitter.
    pub fn fixed(ms: u64) -> Self {
        Self {
            fixed_ms: ms,
            ..Self::default()
        }
    }

    /// Calculate the actual delay to apply for one request.
    pub fn calculate(&self) -> u64 {
        if self.fixed_ms > 0 {
            return self.fixed_ms;
        }
        if self.max_ms > self.min_ms {
            use rand::Rng;
            let mut rng = rand::thread_rng();
            return rng.gen_range(self.min_ms..=self.max_ms);
        }
        self.min_ms
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.max_ms > 0 && self.max_ms < self.min_ms {
            anyhow::bail!("delay max_ms must be >= min_ms");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.port, 8080);
        assert!(config.unescape_request_query);
        assert!(!config.template);
        assert_eq!(config.routing, RoutingMode::Direct);
        assert_eq!(config.delay.calculate(), 0);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
data_dir: ./responses
port: 9000
delay:
  fixed_ms: 250
template: true
routing: enumerated
"#;
        let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("./responses"));
        assert_eq!(config.port, 9000);
        assert_eq!(config.delay.fixed_ms, 250);
        assert!(config.template);
        assert!(config.unescape_request_query); // default survives partial config
        assert_eq!(config.routing, RoutingMode::Enumerated);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let yaml = "data_dir: ./data\nnot_a_field: 1\n";
        assert!(serde_yaml::from_str::<ServerConfig>(yaml).is_err());
    }

    #[test]
    fn test_from_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mockdir.yaml");
        std::fs::write(&path, "port: 3000\n").unwrap();

        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let config = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_delay_range() {
        let config = ServerConfig {
            delay: DelayConfig {
                fixed_ms: 0,
                min_ms: 100,
                max_ms: 50,
            },
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_delay_calculation() {
        assert_eq!(DelayConfig::fixed(100).calculate(), 100);

        let range = DelayConfig {
            fixed_ms: 0,
            min_ms: 50,
            max_ms: 150,
        };
        assert!((50..=150).contains(&range.calculate()));
    }
}
