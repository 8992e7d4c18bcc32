use crate::core::timing::TimingAnalysis;
use crate::io::raster::{RowReader, RowWriter};
use crate::types::{FrameRecord, SampleFormat, SarError, SarResult};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// What to do when a frame starts after the lines already written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GapPolicy {
    /// Append the frame's rows directly; the merged time axis loses the gap
    Append,
    /// Insert zero rows for the missing lines before the frame
    ZeroFill,
}

impl Default for GapPolicy {
    fn default() -> Self {
        GapPolicy::Append
    }
}

/// How one frame contributes rows to the merged raster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePlan {
    pub frame: usize,
    pub expected_start_line: f64,
    /// Lines already written past this frame's expected start; negative for a gap
    pub overlap_lines: i64,
    pub skipped_lines: usize,
    pub filled_lines: usize,
    pub lines_to_write: usize,
    /// Lines in the merged raster once this frame is written
    pub cumulative_lines: usize,
}

/// Place one frame after `prior_cumulative` merged lines
pub fn plan_frame(
    frame: usize,
    length: usize,
    expected_start_line: f64,
    prior_cumulative: usize,
    gap_policy: GapPolicy,
) -> SarResult<FramePlan> {
    let overlap_lines = if frame == 0 {
        0
    } else {
        // Half-line starts round away from zero
        prior_cumulative as i64 - expected_start_line.round() as i64
    };

    let skipped_lines = overlap_lines.max(0) as usize;
    if skipped_lines > length {
        return Err(SarError::Geometry(format!(
            "Frame {} would write {} lines: {} overlapping lines exceed its length of {}",
            frame,
            length as i64 - skipped_lines as i64,
            skipped_lines,
            length
        )));
    }

    let filled_lines = match gap_policy {
        GapPolicy::ZeroFill if overlap_lines < 0 => (-overlap_lines) as usize,
        _ => 0,
    };
    let lines_to_write = length - skipped_lines;

    Ok(FramePlan {
        frame,
        expected_start_line,
        overlap_lines,
        skipped_lines,
        filled_lines,
        lines_to_write,
        cumulative_lines: prior_cumulative + filled_lines + lines_to_write,
    })
}

/// Fold the time-ordered frames into per-frame plans, threading the
/// cumulative line count through
pub fn plan_concatenation(
    frames: &[FrameRecord],
    timing: &TimingAnalysis,
    gap_policy: GapPolicy,
) -> SarResult<Vec<FramePlan>> {
    if frames.len() != timing.expected_start_lines.len() {
        return Err(SarError::Geometry(format!(
            "Timing covers {} frames but {} were given",
            timing.expected_start_lines.len(),
            frames.len()
        )));
    }

    let (_, plans) = frames
        .iter()
        .zip(&timing.expected_start_lines)
        .enumerate()
        .try_fold(
            (0usize, Vec::with_capacity(frames.len())),
            |(cumulative, mut plans), (i, (frame, &start_line))| {
                let plan = plan_frame(i, frame.length, start_line, cumulative, gap_policy)?;
                let cumulative = plan.cumulative_lines;
                plans.push(plan);
                Ok::<_, SarError>((cumulative, plans))
            },
        )?;

    Ok(plans)
}

/// Streams frame rows into a single output raster
pub struct LineConcatenator {
    format: SampleFormat,
}

impl LineConcatenator {
    pub fn new(format: SampleFormat) -> Self {
        Self { format }
    }

    /// Write every frame according to its plan. Frames must share one width.
    pub fn concatenate<W: Write>(
        &self,
        frames: &[FrameRecord],
        plans: &[FramePlan],
        sink: W,
    ) -> SarResult<W> {
        let width = frames.first().ok_or(SarError::NoFrames)?.width;
        if let Some(frame) = frames.iter().find(|f| f.width != width) {
            return Err(SarError::Geometry(format!(
                "Frame {} is {} samples wide, expected {}",
                frame.path.display(),
                frame.width,
                width
            )));
        }

        let row_bytes = width * self.format.bytes_per_sample();
        let mut writer = RowWriter::new(sink, row_bytes);

        for (frame, plan) in frames.iter().zip(plans) {
            if plan.filled_lines > 0 {
                log::warn!(
                    "Filling {} zero lines before frame {}",
                    plan.filled_lines,
                    plan.frame
                );
                writer.write_zero_rows(plan.filled_lines)?;
            }

            if plan.lines_to_write == 0 {
                log::warn!("Frame {} lies entirely within lines already written", plan.frame);
            } else {
                let mut reader = RowReader::open(&frame.path, row_bytes)?;
                reader.seek_to_row(plan.skipped_lines)?;
                writer.copy_rows(&mut reader, plan.lines_to_write)?;
            }

            log::debug!(
                "Frame {}: skipped {} lines, wrote {}, total {}",
                plan.frame,
                plan.skipped_lines,
                plan.lines_to_write,
                writer.rows_written()
            );

            if writer.rows_written() != plan.cumulative_lines {
                return Err(SarError::Geometry(format!(
                    "Frame {} left {} lines in the output, planned {}",
                    plan.frame,
                    writer.rows_written(),
                    plan.cumulative_lines
                )));
            }
        }

        log::info!(
            "Concatenated {} frames into {} lines of {} samples",
            frames.len(),
            writer.rows_written(),
            width
        );
        writer.finish()
    }
}
