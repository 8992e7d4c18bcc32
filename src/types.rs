use chrono::{DateTime, Utc};
use ndarray::Array2;
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complex-valued SAR data type (I + jQ)
pub type SarComplex = Complex<f32>;

/// 2D complex SAR data array (azimuth x range)
pub type SarImage = Array2<SarComplex>;

/// Sample type of a row-major binary raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleFormat {
    /// Interleaved 16-bit integer I/Q
    ComplexInt16,
    /// Interleaved 32-bit float I/Q
    ComplexFloat32,
    /// Interleaved 64-bit float I/Q
    ComplexFloat64,
}

impl SampleFormat {
    /// Size in bytes of a single complex sample
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            SampleFormat::ComplexInt16 => std::mem::size_of::<Complex<i16>>(),
            SampleFormat::ComplexFloat32 => std::mem::size_of::<Complex<f32>>(),
            SampleFormat::ComplexFloat64 => std::mem::size_of::<Complex<f64>>(),
        }
    }

    /// Data type name used in `.xml` image headers
    pub fn image_data_type(&self) -> &'static str {
        match self {
            SampleFormat::ComplexInt16 => "CSHORT",
            SampleFormat::ComplexFloat32 => "CFLOAT",
            SampleFormat::ComplexFloat64 => "CDOUBLE",
        }
    }

    /// GDAL data type name used in `.vrt` descriptions
    pub fn gdal_data_type(&self) -> &'static str {
        match self {
            SampleFormat::ComplexInt16 => "CInt16",
            SampleFormat::ComplexFloat32 => "CFloat32",
            SampleFormat::ComplexFloat64 => "CFloat64",
        }
    }
}

impl Default for SampleFormat {
    fn default() -> Self {
        SampleFormat::ComplexFloat32
    }
}

impl std::fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.gdal_data_type())
    }
}

/// Elapsed time from `from` to `to` in seconds, with microsecond precision
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    match delta.num_microseconds() {
        Some(us) => us as f64 * 1e-6,
        None => delta.num_milliseconds() as f64 * 1e-3,
    }
}

/// One decoded acquisition: raster location plus geometry and timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub path: PathBuf,
    pub width: usize,                  // samples per row
    pub length: usize,                 // rows (azimuth lines)
    pub sensing_start: DateTime<Utc>,
    pub sensing_stop: DateTime<Utc>,
    pub prf: f64,                      // Hz
}

impl FrameRecord {
    pub fn new<P: AsRef<Path>>(
        path: P,
        width: usize,
        length: usize,
        sensing_start: DateTime<Utc>,
        sensing_stop: DateTime<Utc>,
        prf: f64,
    ) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            width,
            length,
            sensing_start,
            sensing_stop,
            prf,
        }
    }

    /// Acquisition duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        seconds_between(self.sensing_start, self.sensing_stop)
    }

    /// Number of lines the sensing window predicts at this frame's PRF
    pub fn lines_from_timing(&self) -> f64 {
        self.duration_seconds() * self.prf
    }

    pub fn row_bytes(&self, format: SampleFormat) -> usize {
        self.width * format.bytes_per_sample()
    }

    /// Expected byte size of the raster file
    pub fn raster_bytes(&self, format: SampleFormat) -> u64 {
        self.row_bytes(format) as u64 * self.length as u64
    }
}

/// The combined product handed to downstream collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedFrame {
    pub sensing_start: DateTime<Utc>,
    pub sensing_stop: DateTime<Utc>,
    pub sensing_mid: DateTime<Utc>,
    pub number_of_lines: usize,
    pub number_of_samples: usize,
    pub prf: f64,
    pub sample_format: SampleFormat,
    /// Input rasters in merge order
    pub sources: Vec<PathBuf>,
}

/// Data-quality findings. These never stop a merge; they flag that the
/// merged time axis may not be perfectly uniform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QualityWarning {
    /// Frame was zero-padded to the common width
    WidthPadded {
        path: PathBuf,
        original_width: usize,
        width: usize,
    },
    /// Missing azimuth time between two consecutive frames
    Gap {
        frame: usize,
        seconds: f64,
        lines: f64,
    },
    /// Frame PRF differs from the track PRF of the first frame
    PrfMismatch {
        frame: usize,
        prf: f64,
        track_prf: f64,
    },
    /// Frame length disagrees with its sensing window
    FrameLengthMismatch {
        frame: usize,
        length: usize,
        expected_lines: f64,
    },
    /// Merged length disagrees with the track sensing window
    MergedLengthMismatch {
        number_of_lines: usize,
        expected_lines: f64,
    },
}

impl std::fmt::Display for QualityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityWarning::WidthPadded { path, original_width, width } => write!(
                f,
                "{} padded from {} to {} samples",
                path.display(),
                original_width,
                width
            ),
            QualityWarning::Gap { frame, seconds, lines } => write!(
                f,
                "gap of {:.6} s ({:.1} lines) before frame {}",
                seconds, lines, frame
            ),
            QualityWarning::PrfMismatch { frame, prf, track_prf } => write!(
                f,
                "frame {} PRF {} Hz differs from track PRF {} Hz",
                frame, prf, track_prf
            ),
            QualityWarning::FrameLengthMismatch { frame, length, expected_lines } => write!(
                f,
                "frame {} has {} lines but its sensing window spans {:.1}",
                frame, length, expected_lines
            ),
            QualityWarning::MergedLengthMismatch { number_of_lines, expected_lines } => write!(
                f,
                "merged product has {} lines but track timing predicts {:.1}",
                number_of_lines, expected_lines
            ),
        }
    }
}

/// Error types for frame stitching
#[derive(Debug, thiserror::Error)]
pub enum SarError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No frames to merge")]
    NoFrames,

    #[error("Raster {path} is {actual} bytes, expected {expected}")]
    RasterSize {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML rendering error: {0}")]
    XmlRendering(String),
}

/// Result type for stitching operations
pub type SarResult<T> = Result<T, SarError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_bytes_per_sample() {
        assert_eq!(SampleFormat::ComplexInt16.bytes_per_sample(), 4);
        assert_eq!(SampleFormat::ComplexFloat32.bytes_per_sample(), 8);
        assert_eq!(SampleFormat::ComplexFloat64.bytes_per_sample(), 16);
    }

    #[test]
    fn test_seconds_between_sub_second() {
        let t0 = Utc.with_ymd_and_hms(2008, 3, 1, 12, 0, 0).unwrap();
        let t1 = t0 + Duration::microseconds(2_500_250);
        assert!((seconds_between(t0, t1) - 2.50025).abs() < 1e-9);
        assert!((seconds_between(t1, t0) + 2.50025).abs() < 1e-9);
    }

    #[test]
    fn test_frame_lines_from_timing() {
        let t0 = Utc.with_ymd_and_hms(2008, 3, 1, 12, 0, 0).unwrap();
        let frame = FrameRecord::new("a.slc", 100, 1000, t0, t0 + Duration::seconds(100), 10.0);
        assert!((frame.lines_from_timing() - 1000.0).abs() < 1e-9);
        assert_eq!(frame.row_bytes(SampleFormat::ComplexFloat32), 800);
        assert_eq!(frame.raster_bytes(SampleFormat::ComplexFloat32), 800_000);
    }
}
