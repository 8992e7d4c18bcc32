use crate::io::raster::{RowReader, RowWriter};
use crate::types::{FrameRecord, SampleFormat, SarError, SarResult};
use std::path::{Path, PathBuf};

/// A frame whose raster was rewritten at the common width
#[derive(Debug, Clone)]
pub struct PaddedFrame {
    /// Position of the frame in the normalized list
    pub index: usize,
    pub original_width: usize,
    pub original_path: PathBuf,
    pub padded_path: PathBuf,
}

/// Result of width normalization
#[derive(Debug, Clone)]
pub struct WidthNormalization {
    /// Frames in input order, all reporting `max_width`
    pub frames: Vec<FrameRecord>,
    pub max_width: usize,
    pub padded: Vec<PaddedFrame>,
}

impl WidthNormalization {
    /// Delete the padded rasters once nothing reads them any more
    pub fn cleanup(&self) -> SarResult<()> {
        for padded in &self.padded {
            std::fs::remove_file(&padded.padded_path)?;
            log::debug!("Removed padded raster {}", padded.padded_path.display());
        }
        Ok(())
    }
}

/// Pads frames narrower than the widest frame with zero samples on the right
pub struct WidthNormalizer {
    format: SampleFormat,
    work_dir: PathBuf,
}

impl WidthNormalizer {
    pub fn new<P: AsRef<Path>>(format: SampleFormat, work_dir: P) -> Self {
        Self {
            format,
            work_dir: work_dir.as_ref().to_path_buf(),
        }
    }

    pub fn max_width(frames: &[FrameRecord]) -> SarResult<usize> {
        frames.iter().map(|f| f.width).max().ok_or(SarError::NoFrames)
    }

    pub fn normalize(&self, frames: &[FrameRecord]) -> SarResult<WidthNormalization> {
        let max_width = Self::max_width(frames)?;
        log::info!("Normalizing {} frames to width {}", frames.len(), max_width);

        let mut normalized = Vec::with_capacity(frames.len());
        let mut padded = Vec::new();

        for (index, frame) in frames.iter().enumerate() {
            if frame.width == max_width {
                normalized.push(frame.clone());
                continue;
            }

            log::warn!(
                "Frame {} is {} samples wide, padding {} samples to width {}",
                frame.path.display(),
                frame.width,
                max_width - frame.width,
                max_width
            );
            let padded_path = self.pad_frame(frame, max_width)?;

            let mut record = frame.clone();
            record.path = padded_path.clone();
            record.width = max_width;
            normalized.push(record);

            padded.push(PaddedFrame {
                index,
                original_width: frame.width,
                original_path: frame.path.clone(),
                padded_path,
            });
        }

        Ok(WidthNormalization {
            frames: normalized,
            max_width,
            padded,
        })
    }

    fn pad_frame(&self, frame: &FrameRecord, max_width: usize) -> SarResult<PathBuf> {
        let stem = frame
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "frame".to_string());

        let target = tempfile::Builder::new()
            .prefix(&format!("{}.", stem))
            .suffix(".padded")
            .tempfile_in(&self.work_dir)?;

        let mut reader = RowReader::open(&frame.path, frame.row_bytes(self.format))?;
        let mut writer = RowWriter::new(target, max_width * self.format.bytes_per_sample());
        writer.copy_rows(&mut reader, frame.length)?;

        let target = writer.finish()?;
        let path = target
            .into_temp_path()
            .keep()
            .map_err(|e| SarError::Io(e.error))?;

        log::debug!("Padded {} -> {}", frame.path.display(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    fn frame(dir: &Path, name: &str, width: usize, length: usize, fill: u8) -> FrameRecord {
        let path = dir.join(name);
        std::fs::write(&path, vec![fill; width * length * 8]).unwrap();
        let t0 = Utc.with_ymd_and_hms(2006, 8, 9, 10, 0, 0).unwrap();
        FrameRecord::new(path, width, length, t0, t0 + Duration::seconds(1), length as f64)
    }

    #[test]
    fn test_pads_narrow_frames() {
        let dir = TempDir::new().unwrap();
        let frames = vec![
            frame(dir.path(), "wide.slc", 6, 3, 0xAB),
            frame(dir.path(), "narrow.slc", 4, 3, 0xCD),
        ];

        let normalizer = WidthNormalizer::new(SampleFormat::ComplexFloat32, dir.path());
        let result = normalizer.normalize(&frames).unwrap();

        assert_eq!(result.max_width, 6);
        assert!(result.frames.iter().all(|f| f.width == 6));
        assert_eq!(result.frames[0].path, frames[0].path);
        assert_eq!(result.padded.len(), 1);
        assert_eq!(result.padded[0].index, 1);
        assert_eq!(result.padded[0].original_width, 4);

        let bytes = std::fs::read(&result.frames[1].path).unwrap();
        assert_eq!(bytes.len(), 6 * 8 * 3);
        for row in bytes.chunks(6 * 8) {
            assert!(row[..32].iter().all(|&b| b == 0xCD));
            assert!(row[32..].iter().all(|&b| b == 0));
        }

        // Original raster is left alone
        assert_eq!(std::fs::metadata(&frames[1].path).unwrap().len(), 4 * 8 * 3);
    }

    #[test]
    fn test_equal_widths_untouched() {
        let dir = TempDir::new().unwrap();
        let frames = vec![
            frame(dir.path(), "a.slc", 5, 2, 1),
            frame(dir.path(), "b.slc", 5, 2, 2),
        ];
        let result = WidthNormalizer::new(SampleFormat::ComplexFloat32, dir.path())
            .normalize(&frames)
            .unwrap();
        assert!(result.padded.is_empty());
        assert_eq!(result.frames, frames);
    }

    #[test]
    fn test_cleanup_removes_padded() {
        let dir = TempDir::new().unwrap();
        let frames = vec![
            frame(dir.path(), "a.slc", 3, 2, 1),
            frame(dir.path(), "b.slc", 2, 2, 2),
        ];
        let result = WidthNormalizer::new(SampleFormat::ComplexFloat32, dir.path())
            .normalize(&frames)
            .unwrap();
        let padded = result.padded[0].padded_path.clone();
        assert!(padded.exists());

        result.cleanup().unwrap();
        assert!(!padded.exists());
    }

    #[test]
    fn test_short_raster_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut short = frame(dir.path(), "short.slc", 2, 2, 1);
        short.length = 5;
        let frames = vec![frame(dir.path(), "a.slc", 3, 2, 1), short];

        let result = WidthNormalizer::new(SampleFormat::ComplexFloat32, dir.path()).normalize(&frames);
        assert!(matches!(result, Err(SarError::Io(_))));
    }

    #[test]
    fn test_no_frames() {
        assert!(matches!(WidthNormalizer::max_width(&[]), Err(SarError::NoFrames)));
    }
}
