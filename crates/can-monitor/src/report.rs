//! Console output

use crate::{MonitorError, OutputFormat};
use frame_source::FrameSource;
use pipeline::{RunOutcome, RunReport};
use std::io::Write;

/// Print `count` raw frames from `source` without decoding them.
///
/// Returns the number of frames written.
pub fn dump_frames<W: Write>(
    source: &mut dyn FrameSource,
    count: u64,
    out: &mut W,
) -> Result<u64, MonitorError> {
    writeln!(out, "timestamp (µs) | ID | [DLC] data")?;
    writeln!(out, "--------------------------------")?;

    for written in 0..count {
        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                out.flush()?;
                tracing::warn!("Frame dump ended after {} frames: {}", written, e);
                return Err(e.into());
            }
        };
        writeln!(out, "{}", frame)?;
    }
    out.flush()?;
    Ok(count)
}

/// Render a run report for the console
pub fn format_report(report: &RunReport, format: OutputFormat) -> Result<String, MonitorError> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(report)?);
    }

    let stats = &report.stats;
    let outcome = match &report.outcome {
        RunOutcome::Completed => "completed".to_string(),
        RunOutcome::Stopped => "stopped on request".to_string(),
        RunOutcome::SourceError(e) => format!("source failed: {}", e),
    };

    Ok(format!(
        "Run {} ({} of {} frames)\n  \
         Frames produced:  {}\n  \
         Frames consumed:  {}\n  \
         Batches:          {}\n  \
         Signals:          {} decoded, {} invalid, {} unrecognized\n  \
         Elapsed:          {} ms ({:.0} frames/s)",
        outcome,
        stats.frames_produced,
        report.target_frames,
        stats.frames_produced,
        stats.frames_consumed,
        stats.batches,
        stats.signals_decoded,
        stats.invalid_signals,
        stats.unrecognized_frames,
        report.elapsed.as_millis(),
        report.throughput(),
    ))
}
