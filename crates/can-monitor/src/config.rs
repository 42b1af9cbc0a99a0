//! Monitor configuration

use crate::MonitorError;
use config::{Config, Environment, File, Source};
use pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};

/// Base name of the optional configuration file (`can-monitor.toml`, ...)
pub const CONFIG_FILE: &str = "can-monitor";

/// Prefix of overriding environment variables (`CAN_MONITOR_FRAME_COUNT`, ...)
pub const ENV_PREFIX: &str = "CAN_MONITOR";

/// Where frames come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Paced random simulator
    Mock,
    /// Frame server speaking the 24-byte wire layout
    Tcp,
}

/// How the run report is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

/// Monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Frames to process before the run completes
    pub frame_count: u64,

    /// Simulator rate (frames per second)
    pub frame_rate: u32,

    /// Simulator identifier range (inclusive)
    pub id_min: u32,
    pub id_max: u32,

    /// Sleep between simulated frames to honour `frame_rate`
    pub paced: bool,

    /// Fixed simulator seed for reproducible runs
    pub seed: Option<u64>,

    pub source: SourceKind,

    /// Frame server address for the TCP source
    pub tcp_addr: String,

    /// Buffering parameters
    pub pipeline: PipelineConfig,

    /// Report format
    pub report: OutputFormat,

    /// Print raw frames instead of running the pipeline
    pub dump_frames: bool,

    /// Discard decoded signals instead of logging them
    pub quiet: bool,

    /// Maximum log level (`trace` .. `error`)
    pub log_level: String,

    /// Log line format
    pub log_format: OutputFormat,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            frame_count: 100,
            frame_rate: 10,
            id_min: 0x100,
            id_max: 0x500,
            paced: true,
            seed: None,
            source: SourceKind::Mock,
            tcp_addr: "127.0.0.1:8888".to_string(),
            pipeline: PipelineConfig::default(),
            report: OutputFormat::Text,
            dump_frames: false,
            quiet: false,
            log_level: "info".to_string(),
            log_format: OutputFormat::Text,
        }
    }
}

impl MonitorConfig {
    /// Short paced run that prints raw frames, no decoding
    pub fn frame_dump() -> Self {
        Self {
            frame_count: 10,
            frame_rate: 5,
            dump_frames: true,
            ..Default::default()
        }
    }

    /// Unpaced high-volume run with signal logging off
    pub fn stress() -> Self {
        Self {
            frame_count: 1_000_000,
            paced: false,
            quiet: true,
            pipeline: PipelineConfig::high_throughput(),
            ..Default::default()
        }
    }

    /// Check values the pipeline and sources would otherwise reject at runtime
    pub fn validate(&self) -> Result<(), MonitorError> {
        self.pipeline.validate()?;
        if self.id_min > self.id_max {
            return Err(MonitorError::Config(format!(
                "id_min {:#X} exceeds id_max {:#X}",
                self.id_min, self.id_max
            )));
        }
        if self.source == SourceKind::Tcp && self.tcp_addr.is_empty() {
            return Err(MonitorError::Config("tcp source needs tcp_addr".to_string()));
        }
        Ok(())
    }
}

/// Load defaults, then `can-monitor.{toml,json,...}` if present, then `CAN_MONITOR_*`
pub fn load_config() -> Result<MonitorConfig, MonitorError> {
    layered(File::with_name(CONFIG_FILE).required(false), env_source())
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn layered<F, E>(file: F, env: E) -> Result<MonitorConfig, MonitorError>
where
    F: Source + Send + Sync + 'static,
    E: Source + Send + Sync + 'static,
{
    let config: MonitorConfig = Config::builder()
        .add_source(Config::try_from(&MonitorConfig::default())?)
        .add_source(file)
        .add_source(env)
        .build()?
        .try_deserialize()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env_source().source(Some(map))
    }

    fn no_file() -> impl Source + Send + Sync + 'static {
        File::from_str("", FileFormat::Toml)
    }

    #[test]
    fn test_defaults() {
        let config = layered(no_file(), env(&[])).unwrap();
        assert_eq!(config, MonitorConfig::default());
        assert_eq!(config.pipeline.batch_threshold, 32);
        assert_eq!(config.pipeline.slot_count, 2);
        assert_eq!(config.source, SourceKind::Mock);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = File::from_str(
            r#"
            frame_count = 500
            source = "tcp"
            report = "json"

            [pipeline]
            batch_threshold = 8
            "#,
            FileFormat::Toml,
        );
        let config = layered(file, env(&[])).unwrap();
        assert_eq!(config.frame_count, 500);
        assert_eq!(config.source, SourceKind::Tcp);
        assert_eq!(config.report, OutputFormat::Json);
        assert_eq!(config.pipeline.batch_threshold, 8);
        assert_eq!(config.pipeline.slot_count, 2);
    }

    #[test]
    fn test_env_overrides_file() {
        let file = File::from_str("frame_count = 500", FileFormat::Toml);
        let config = layered(
            file,
            env(&[
                ("CAN_MONITOR_FRAME_COUNT", "42"),
                ("CAN_MONITOR_QUIET", "true"),
                ("CAN_MONITOR_PIPELINE__SLOT_COUNT", "4"),
                ("CAN_MONITOR_SEED", "7"),
                ("UNRELATED_FRAME_COUNT", "9"),
            ]),
        )
        .unwrap();
        assert_eq!(config.frame_count, 42);
        assert!(config.quiet);
        assert_eq!(config.pipeline.slot_count, 4);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = layered(no_file(), env(&[("CAN_MONITOR_PIPELINE__BATCH_THRESHOLD", "0")]));
        assert!(result.is_err());

        let result = layered(
            no_file(),
            env(&[("CAN_MONITOR_ID_MIN", "2048"), ("CAN_MONITOR_ID_MAX", "256")]),
        );
        assert!(matches!(result, Err(MonitorError::Config(_))));
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(MonitorConfig::frame_dump().validate().is_ok());
        assert!(MonitorConfig::stress().validate().is_ok());
    }
}
