#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use slc_stitch::{FrameMetadata, FrameRecord};
use std::path::{Path, PathBuf};

pub const BYTES_PER_SAMPLE: usize = 8;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn track_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2008, 1, 23, 21, 14, 30).unwrap()
}

/// Write a complex float32 frame whose sample (row, col) holds
/// (global azimuth line, col), plus its JSON metadata sidecar.
///
/// The global line of row 0 is `start_s * prf`.
pub fn write_frame(
    dir: &Path,
    name: &str,
    width: usize,
    length: usize,
    start_s: f64,
    prf: f64,
) -> FrameRecord {
    let path = dir.join(name);
    let first_line = (start_s * prf).round() as usize;

    let mut bytes = Vec::with_capacity(width * length * BYTES_PER_SAMPLE);
    for row in 0..length {
        for col in 0..width {
            bytes.extend_from_slice(&((first_line + row) as f32).to_le_bytes());
            bytes.extend_from_slice(&(col as f32 + 1.0).to_le_bytes());
        }
    }
    std::fs::write(&path, bytes).unwrap();

    let start = track_start() + Duration::microseconds((start_s * 1e6).round() as i64);
    let stop = start + Duration::microseconds((length as f64 / prf * 1e6).round() as i64);
    let metadata = FrameMetadata {
        width,
        length,
        sensing_start: start,
        sensing_stop: stop,
        prf,
    };
    metadata.save_for(&path).unwrap();
    metadata.into_record(path)
}

/// Decode a merged raster into (line id, column id) per sample
pub fn read_samples(path: &Path, width: usize) -> Vec<Vec<(f32, f32)>> {
    let bytes = std::fs::read(path).unwrap();
    assert_eq!(bytes.len() % (width * BYTES_PER_SAMPLE), 0);
    bytes
        .chunks(width * BYTES_PER_SAMPLE)
        .map(|row| {
            row.chunks(BYTES_PER_SAMPLE)
                .map(|s| {
                    (
                        f32::from_le_bytes([s[0], s[1], s[2], s[3]]),
                        f32::from_le_bytes([s[4], s[5], s[6], s[7]]),
                    )
                })
                .collect()
        })
        .collect()
}

pub fn files_with_suffix(dir: &Path, suffix: &str) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.to_string_lossy().ends_with(suffix))
        .collect()
}

pub fn files_with_prefix(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().starts_with(prefix))
                .unwrap_or(false)
        })
        .collect()
}
