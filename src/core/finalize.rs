use crate::types::{
    seconds_between, FrameRecord, MergedFrame, QualityWarning, SampleFormat, SarError, SarResult,
};

/// Builds the merged frame description and checks it against track timing
pub struct MetadataFinalizer {
    line_tolerance: f64,
}

impl MetadataFinalizer {
    pub fn new(line_tolerance: f64) -> Self {
        Self { line_tolerance }
    }

    /// `frames` must be the time-ordered inputs of the merge
    pub fn finalize(
        &self,
        frames: &[FrameRecord],
        number_of_lines: usize,
        number_of_samples: usize,
        track_prf: f64,
        sample_format: SampleFormat,
    ) -> SarResult<(MergedFrame, Option<QualityWarning>)> {
        let first = frames.first().ok_or(SarError::NoFrames)?;
        let last = frames.last().ok_or(SarError::NoFrames)?;

        let sensing_start = first.sensing_start;
        let sensing_stop = last.sensing_stop;
        let sensing_mid = sensing_start + (sensing_stop - sensing_start) / 2;

        let merged = MergedFrame {
            sensing_start,
            sensing_stop,
            sensing_mid,
            number_of_lines,
            number_of_samples,
            prf: track_prf,
            sample_format,
            sources: frames.iter().map(|f| f.path.clone()).collect(),
        };

        let expected_lines = seconds_between(sensing_start, sensing_stop) * track_prf;
        let warning = if (expected_lines - number_of_lines as f64).abs() > self.line_tolerance {
            log::warn!(
                "⚠️  Merged product has {} lines but track timing predicts {:.1}",
                number_of_lines,
                expected_lines
            );
            Some(QualityWarning::MergedLengthMismatch {
                number_of_lines,
                expected_lines,
            })
        } else {
            None
        };

        log::info!(
            "Merged frame: {} x {} samples, sensing {} to {}",
            number_of_lines,
            number_of_samples,
            sensing_start.to_rfc3339(),
            sensing_stop.to_rfc3339()
        );
        Ok((merged, warning))
    }
}
