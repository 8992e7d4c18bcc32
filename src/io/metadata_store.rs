use crate::types::{MergedFrame, SarError, SarResult};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Persistence collaborator for merged frame metadata
pub trait MetadataStore {
    fn persist(&mut self, key: &str, frame: &MergedFrame) -> SarResult<()>;
    fn load(&self, key: &str) -> SarResult<MergedFrame>;
}

/// Suffix of a merged frame's metadata file. Distinct from the `.json`
/// frame sidecars so a merged raster is never read back as an input frame.
pub const MERGED_METADATA_SUFFIX: &str = ".merged.json";

/// Metadata file describing a merged raster written next to it
pub fn merged_metadata_path<P: AsRef<Path>>(raster: P) -> PathBuf {
    let mut name = raster.as_ref().as_os_str().to_os_string();
    name.push(MERGED_METADATA_SUFFIX);
    PathBuf::from(name)
}

/// Stores each merged frame as `<directory>/<key>.merged.json`
#[derive(Debug, Clone)]
pub struct JsonMetadataStore {
    directory: PathBuf,
}

impl JsonMetadataStore {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}{}", key, MERGED_METADATA_SUFFIX))
    }
}

impl MetadataStore for JsonMetadataStore {
    fn persist(&mut self, key: &str, frame: &MergedFrame) -> SarResult<()> {
        std::fs::create_dir_all(&self.directory)?;
        let path = self.path_for(key);
        let file = File::create(&path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), frame)?;
        log::info!("Persisted merged frame metadata to {}", path.display());
        Ok(())
    }

    fn load(&self, key: &str) -> SarResult<MergedFrame> {
        let path = self.path_for(key);
        let file = File::open(&path).map_err(|e| {
            SarError::Metadata(format!("Cannot open {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// Keeps merged frames in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryMetadataStore {
    frames: HashMap<String, MergedFrame>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl MetadataStore for MemoryMetadataStore {
    fn persist(&mut self, key: &str, frame: &MergedFrame) -> SarResult<()> {
        self.frames.insert(key.to_string(), frame.clone());
        Ok(())
    }

    fn load(&self, key: &str) -> SarResult<MergedFrame> {
        self.frames
            .get(key)
            .cloned()
            .ok_or_else(|| SarError::Metadata(format!("No merged frame stored under '{}'", key)))
    }
}
