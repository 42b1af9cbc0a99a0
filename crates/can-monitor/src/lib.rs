//! CAN Monitor
//!
//! Wiring for the `can-monitor` binary: configuration, logging, source
//! selection and run reports.

mod config;
mod report;

pub use crate::config::{
    load_config, MonitorConfig, OutputFormat, SourceKind, CONFIG_FILE, ENV_PREFIX,
};
pub use crate::report::{dump_frames, format_report};

use frame_source::{FrameSource, MockCanSource, SourceError, TcpFrameSource};
use pipeline::{LogSink, NullSink, PipelineError, ProcessingPipeline};
use signal_decoder::SignalDecoder;
use thiserror::Error;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Monitor setup errors
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid log level '{0}'")]
    LogLevel(String),

    #[error("Failed to install log subscriber: {0}")]
    Logging(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Failed to render report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Initialize logging
pub fn init_logging(level: &str, format: OutputFormat) -> Result<(), MonitorError> {
    let level: Level = level
        .parse()
        .map_err(|_| MonitorError::LogLevel(level.to_string()))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_names(true);

    match format {
        OutputFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
        OutputFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }
    Ok(())
}

/// Open the frame source selected by `config`
pub fn build_source(config: &MonitorConfig) -> Result<Box<dyn FrameSource>, MonitorError> {
    match config.source {
        SourceKind::Mock => {
            let mut source = match config.seed {
                Some(seed) => MockCanSource::with_seed(seed),
                None => MockCanSource::new(),
            };
            source.set_rate(config.frame_rate);
            source.set_id_range(config.id_min, config.id_max)?;
            source.set_pacing(config.paced);
            info!(
                "Mock source: {} frames/s, id range {:03X}-{:03X}{}",
                config.frame_rate,
                config.id_min,
                config.id_max,
                if config.paced { "" } else { " (unpaced)" }
            );
            Ok(Box::new(source))
        }
        SourceKind::Tcp => {
            info!("Connecting to frame server at {}", config.tcp_addr);
            Ok(Box::new(TcpFrameSource::connect(config.tcp_addr.as_str())?))
        }
    }
}

/// Build the pipeline around `source` with the reference decoder
pub fn build_pipeline(
    config: &MonitorConfig,
    source: Box<dyn FrameSource>,
) -> Result<ProcessingPipeline, MonitorError> {
    let decoder = SignalDecoder::reference();
    let pipeline = if config.quiet {
        ProcessingPipeline::new(source, decoder, NullSink, config.pipeline.clone())?
    } else {
        ProcessingPipeline::new(source, decoder, LogSink, config.pipeline.clone())?
    };
    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_seeded_mock_pipeline() {
        let config = MonitorConfig {
            seed: Some(11),
            paced: false,
            quiet: true,
            ..Default::default()
        };
        let source = build_source(&config).unwrap();
        let mut pipeline = build_pipeline(&config, source).unwrap();

        let report = pipeline.run(config.frame_count).unwrap();
        assert_eq!(report.stats.frames_produced, 100);
        assert!(report.is_lossless());
    }

    #[test]
    fn test_bad_id_range_is_source_error() {
        let config = MonitorConfig {
            id_max: 0x2000_0000,
            ..Default::default()
        };
        assert!(matches!(build_source(&config), Err(MonitorError::Source(_))));
    }

    #[test]
    fn test_unknown_log_level() {
        assert!(matches!(
            init_logging("loud", OutputFormat::Text),
            Err(MonitorError::LogLevel(_))
        ));
    }
}
