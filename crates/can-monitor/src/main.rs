//! CAN Monitor - Main Entry Point

use anyhow::Context;
use can_monitor::{
    build_pipeline, build_source, dump_frames, format_report, init_logging, load_config,
};
use tracing::{info, warn};

/// Exit status after a second interrupt (128 + SIGINT)
const FORCED_EXIT_CODE: i32 = 130;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = load_config().context("loading configuration")?;
    if let Some(arg) = std::env::args().nth(1) {
        config.frame_count = arg
            .parse()
            .with_context(|| format!("invalid frame count '{}'", arg))?;
    }
    init_logging(&config.log_level, config.log_format)?;

    info!("=== CAN Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let mut source = build_source(&config)?;
    let frame_count = config.frame_count;

    if config.dump_frames {
        tokio::task::spawn_blocking(move || {
            dump_frames(source.as_mut(), frame_count, &mut std::io::stdout().lock())
        })
        .await??;
        return Ok(());
    }

    let mut pipeline = build_pipeline(&config, source)?;
    let stop = pipeline.stop_handle();

    // Started here so an interrupt always finds a run to stop
    pipeline.start(frame_count)?;
    let mut run = tokio::task::spawn_blocking(move || pipeline.wait());

    let report = tokio::select! {
        result = &mut run => result??,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, draining buffered frames");
            stop.request_stop();
            tokio::select! {
                result = &mut run => result??,
                _ = tokio::signal::ctrl_c() => {
                    warn!("Second interrupt, exiting without draining");
                    std::process::exit(FORCED_EXIT_CODE);
                }
            }
        }
    };

    println!("{}", format_report(&report, config.report)?);
    Ok(())
}
