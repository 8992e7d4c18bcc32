use crate::types::{seconds_between, FrameRecord, QualityWarning, SarError, SarResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Below this many lines a boundary counts as contiguous
const CONTIGUOUS_EPSILON_LINES: f64 = 1e-6;

/// Relationship between two consecutive frames in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryKind {
    Contiguous,
    Gap,
    Overlap,
}

/// Timing diagnostics for the boundary between frame `frame - 1` and `frame`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameBoundary {
    pub frame: usize,
    pub gap_seconds: f64,
    pub gap_lines: f64,
    pub kind: BoundaryKind,
}

/// Per-frame placement on the track-wide line grid
#[derive(Debug, Clone)]
pub struct TimingAnalysis {
    pub track_prf: f64,
    pub first_start: DateTime<Utc>,
    pub expected_start_lines: Vec<f64>,
    pub boundaries: Vec<FrameBoundary>,
    pub warnings: Vec<QualityWarning>,
}

/// Row a frame should occupy if the whole track runs at `track_prf`
pub fn expected_start_line(frame: &FrameRecord, first_start: DateTime<Utc>, track_prf: f64) -> f64 {
    seconds_between(first_start, frame.sensing_start) * track_prf
}

/// Classify the boundary between two time-ordered frames
pub fn frame_boundary(previous: &FrameRecord, next: &FrameRecord, index: usize, track_prf: f64) -> FrameBoundary {
    let gap_seconds = seconds_between(previous.sensing_stop, next.sensing_start);
    let gap_lines = gap_seconds * track_prf;

    let kind = if gap_lines > CONTIGUOUS_EPSILON_LINES {
        BoundaryKind::Gap
    } else if gap_lines < -CONTIGUOUS_EPSILON_LINES {
        BoundaryKind::Overlap
    } else {
        BoundaryKind::Contiguous
    };

    FrameBoundary {
        frame: index,
        gap_seconds,
        gap_lines,
        kind,
    }
}

/// Computes expected start lines and gap/overlap diagnostics
pub struct TimingAnalyzer {
    line_tolerance: f64,
}

impl TimingAnalyzer {
    pub fn new(line_tolerance: f64) -> Self {
        Self { line_tolerance }
    }

    /// Analyze time-ordered frames. The first frame's PRF is the track rate.
    pub fn analyze(&self, frames: &[FrameRecord]) -> SarResult<TimingAnalysis> {
        let first = frames.first().ok_or(SarError::NoFrames)?;
        let track_prf = first.prf;
        let first_start = first.sensing_start;

        let mut warnings = Vec::new();

        let boundaries: Vec<FrameBoundary> = frames
            .windows(2)
            .enumerate()
            .map(|(i, pair)| frame_boundary(&pair[0], &pair[1], i + 1, track_prf))
            .collect();

        for boundary in &boundaries {
            match boundary.kind {
                BoundaryKind::Gap => {
                    log::warn!(
                        "⚠️  Gap of {:.6} s ({:.1} lines) between frames {} and {}",
                        boundary.gap_seconds,
                        boundary.gap_lines,
                        boundary.frame - 1,
                        boundary.frame
                    );
                    warnings.push(QualityWarning::Gap {
                        frame: boundary.frame,
                        seconds: boundary.gap_seconds,
                        lines: boundary.gap_lines,
                    });
                }
                BoundaryKind::Overlap => log::info!(
                    "Overlap of {:.6} s ({:.1} lines) between frames {} and {}",
                    -boundary.gap_seconds,
                    -boundary.gap_lines,
                    boundary.frame - 1,
                    boundary.frame
                ),
                BoundaryKind::Contiguous => log::debug!(
                    "Frames {} and {} are contiguous",
                    boundary.frame - 1,
                    boundary.frame
                ),
            }
        }

        let mut expected_start_lines = Vec::with_capacity(frames.len());
        for (i, frame) in frames.iter().enumerate() {
            let start_line = expected_start_line(frame, first_start, track_prf);
            log::debug!("Frame {} expected start line {:.3}", i, start_line);
            expected_start_lines.push(start_line);

            if frame.prf != track_prf {
                log::warn!(
                    "Frame {} PRF {} Hz differs from track PRF {} Hz",
                    i,
                    frame.prf,
                    track_prf
                );
                warnings.push(QualityWarning::PrfMismatch {
                    frame: i,
                    prf: frame.prf,
                    track_prf,
                });
            }

            let timing_lines = frame.lines_from_timing();
            if (frame.length as f64 - timing_lines).abs() > self.line_tolerance {
                log::warn!(
                    "Frame {} has {} lines but its sensing window spans {:.1} lines",
                    i,
                    frame.length,
                    timing_lines
                );
                warnings.push(QualityWarning::FrameLengthMismatch {
                    frame: i,
                    length: frame.length,
                    expected_lines: timing_lines,
                });
            }
        }

        Ok(TimingAnalysis {
            track_prf,
            first_start,
            expected_start_lines,
            boundaries,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn frame(start_s: i64, length: usize, prf: f64) -> FrameRecord {
        let t0 = Utc.with_ymd_and_hms(2008, 5, 17, 14, 0, 0).unwrap();
        let start = t0 + Duration::seconds(start_s);
        let stop = start + Duration::microseconds((length as f64 / prf * 1e6) as i64);
        FrameRecord::new(format!("f{}.slc", start_s), 8, length, start, stop, prf)
    }

    #[test]
    fn test_expected_start_lines() {
        let frames = vec![frame(0, 1000, 10.0), frame(95, 1000, 10.0), frame(190, 1000, 10.0)];
        let analysis = TimingAnalyzer::new(10.0).analyze(&frames).unwrap();

        assert_relative_eq!(analysis.track_prf, 10.0);
        assert_relative_eq!(analysis.expected_start_lines[0], 0.0);
        assert_relative_eq!(analysis.expected_start_lines[1], 950.0);
        assert_relative_eq!(analysis.expected_start_lines[2], 1900.0);
        assert!(analysis.warnings.is_empty());
    }

    #[test]
    fn test_overlap_boundary() {
        let frames = vec![frame(0, 1000, 10.0), frame(95, 1000, 10.0)];
        let analysis = TimingAnalyzer::new(10.0).analyze(&frames).unwrap();

        let boundary = &analysis.boundaries[0];
        assert_eq!(boundary.kind, BoundaryKind::Overlap);
        assert_relative_eq!(boundary.gap_seconds, -5.0);
        assert_relative_eq!(boundary.gap_lines, -50.0);
    }

    #[test]
    fn test_gap_boundary_warns() {
        let frames = vec![frame(0, 1000, 10.0), frame(110, 1000, 10.0)];
        let analysis = TimingAnalyzer::new(10.0).analyze(&frames).unwrap();

        assert_eq!(analysis.boundaries[0].kind, BoundaryKind::Gap);
        assert_relative_eq!(analysis.boundaries[0].gap_lines, 100.0);
        assert!(matches!(
            analysis.warnings.as_slice(),
            [QualityWarning::Gap { frame: 1, .. }]
        ));
    }

    #[test]
    fn test_contiguous_boundary() {
        let frames = vec![frame(0, 1000, 10.0), frame(100, 500, 10.0)];
        let analysis = TimingAnalyzer::new(10.0).analyze(&frames).unwrap();
        assert_eq!(analysis.boundaries[0].kind, BoundaryKind::Contiguous);
        assert!(analysis.warnings.is_empty());
    }

    #[test]
    fn test_length_mismatch_warning() {
        let mut long = frame(0, 1000, 10.0);
        long.length = 1020;
        let analysis = TimingAnalyzer::new(10.0).analyze(&[long]).unwrap();
        assert!(matches!(
            analysis.warnings.as_slice(),
            [QualityWarning::FrameLengthMismatch { frame: 0, length: 1020, .. }]
        ));

        let mut close = frame(0, 1000, 10.0);
        close.length = 1010;
        let analysis = TimingAnalyzer::new(10.0).analyze(&[close]).unwrap();
        assert!(analysis.warnings.is_empty());
    }

    #[test]
    fn test_prf_mismatch_warning() {
        let frames = vec![frame(0, 1000, 10.0), frame(100, 1000, 12.5)];
        let analysis = TimingAnalyzer::new(10.0).analyze(&frames).unwrap();
        assert!(analysis
            .warnings
            .iter()
            .any(|w| matches!(w, QualityWarning::PrfMismatch { frame: 1, .. })));
    }

    #[test]
    fn test_no_frames() {
        assert!(matches!(
            TimingAnalyzer::new(10.0).analyze(&[]),
            Err(SarError::NoFrames)
        ));
    }
}
