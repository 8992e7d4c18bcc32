//! I/O modules for frame rasters, frame discovery, headers and metadata

pub mod raster;
pub mod catalog;
pub mod header;
pub mod metadata_store;

pub use raster::{RowReader, RowWriter, read_azimuth_window, validate_raster};
pub use catalog::{FrameCatalog, FrameMetadata};
pub use header::{HeaderRenderer, XmlHeaderRenderer};
pub use metadata_store::{JsonMetadataStore, MemoryMetadataStore, MetadataStore};
