use crate::io::metadata_store::merged_metadata_path;
use crate::types::{FrameRecord, SarError, SarResult};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Default pattern for decoded frame rasters
pub const DEFAULT_RASTER_PATTERN: &str = r"\.slc$";

/// Per-frame metadata as written by the sensor decoder, stored next to
/// each raster as `<raster>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMetadata {
    pub width: usize,
    pub length: usize,
    pub sensing_start: DateTime<Utc>,
    pub sensing_stop: DateTime<Utc>,
    pub prf: f64,
}

impl FrameMetadata {
    pub fn sidecar_path<P: AsRef<Path>>(raster: P) -> PathBuf {
        let mut name = raster.as_ref().as_os_str().to_os_string();
        name.push(".json");
        PathBuf::from(name)
    }

    pub fn load_for<P: AsRef<Path>>(raster: P) -> SarResult<Self> {
        let sidecar = Self::sidecar_path(&raster);
        let file = File::open(&sidecar).map_err(|e| {
            SarError::Metadata(format!(
                "Cannot open frame metadata {}: {}",
                sidecar.display(),
                e
            ))
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn save_for<P: AsRef<Path>>(&self, raster: P) -> SarResult<()> {
        let file = File::create(Self::sidecar_path(raster))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn into_record<P: AsRef<Path>>(self, raster: P) -> FrameRecord {
        FrameRecord::new(
            raster,
            self.width,
            self.length,
            self.sensing_start,
            self.sensing_stop,
            self.prf,
        )
    }
}

/// Discovers decoded frames in a directory
pub struct FrameCatalog {
    directory: PathBuf,
    pattern: Regex,
}

impl FrameCatalog {
    pub fn new<P: AsRef<Path>>(directory: P) -> SarResult<Self> {
        Self::with_pattern(directory, DEFAULT_RASTER_PATTERN)
    }

    pub fn with_pattern<P: AsRef<Path>>(directory: P, pattern: &str) -> SarResult<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| SarError::Metadata(format!("Invalid raster pattern: {}", e)))?;
        Ok(Self {
            directory: directory.as_ref().to_path_buf(),
            pattern,
        })
    }

    /// List matching rasters and load their metadata.
    ///
    /// Frames come back in file-name order, which is not time order. Rasters
    /// produced by an earlier merge are skipped.
    pub fn discover(&self) -> SarResult<Vec<FrameRecord>> {
        if !self.directory.is_dir() {
            log::error!("Frame directory not found: {}", self.directory.display());
            return Err(SarError::NoFrames);
        }

        let mut rasters = Vec::new();
        for entry in std::fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| self.pattern.is_match(n))
                .unwrap_or(false);
            if !matches {
                continue;
            }
            if merged_metadata_path(&path).is_file() {
                log::debug!("Skipping merged product {}", path.display());
                continue;
            }
            rasters.push(path);
        }
        rasters.sort();

        if rasters.is_empty() {
            log::error!(
                "No rasters matching '{}' in {}",
                self.pattern.as_str(),
                self.directory.display()
            );
            return Err(SarError::NoFrames);
        }

        let frames = rasters
            .into_iter()
            .map(|raster| Ok(FrameMetadata::load_for(&raster)?.into_record(raster)))
            .collect::<SarResult<Vec<_>>>()?;

        log::info!(
            "Discovered {} frames in {}",
            frames.len(),
            self.directory.display()
        );
        Ok(frames)
    }
}
