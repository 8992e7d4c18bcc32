//! slc-stitch: multi-frame SLC stitching
//!
//! Merges time-adjacent decoded SLC frames into one contiguous raster along
//! the ground track. Frame boundaries are reconciled from sensing times and
//! PRF alone: overlapping lines are dropped, gaps are reported, narrower
//! frames are zero-padded, and rows are streamed so that each output row maps
//! to one azimuth sample.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use crate::types::{
    FrameRecord, MergedFrame, QualityWarning, SampleFormat, SarComplex, SarError, SarImage,
    SarResult,
};

pub use crate::io::{FrameCatalog, FrameMetadata, HeaderRenderer, MetadataStore, XmlHeaderRenderer};
pub use crate::core::{FrameMergeConfig, FrameMerger, GapPolicy, MergeReport};

/// Python module definition
#[cfg(feature = "python")]
mod python {
    use crate::core::{FrameMergeConfig, FrameMerger, GapPolicy};
    use crate::io::{read_azimuth_window, FrameCatalog};
    use crate::types::{SarComplex, SarError};
    use numpy::{IntoPyArray, PyArray2};
    use pyo3::prelude::*;

    fn to_py_err(e: SarError) -> PyErr {
        PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("{}", e))
    }

    /// Merge all frames found in `directory` and return the merge report as JSON
    #[pyfunction]
    #[pyo3(signature = (directory, output, pattern=None, zero_fill_gaps=false))]
    fn merge_frames(
        directory: String,
        output: String,
        pattern: Option<String>,
        zero_fill_gaps: bool,
    ) -> PyResult<String> {
        let catalog = match pattern {
            Some(pattern) => FrameCatalog::with_pattern(&directory, &pattern),
            None => FrameCatalog::new(&directory),
        }
        .map_err(to_py_err)?;
        let frames = catalog.discover().map_err(to_py_err)?;

        let mut config = FrameMergeConfig::default();
        if zero_fill_gaps {
            config.gap_policy = GapPolicy::ZeroFill;
        }

        let report = FrameMerger::new(config)
            .merge(frames, &output)
            .map_err(to_py_err)?;
        serde_json::to_string(&report).map_err(|e| to_py_err(e.into()))
    }

    /// Read azimuth lines of a complex float32 raster as a numpy array
    #[pyfunction]
    fn read_window<'py>(
        py: Python<'py>,
        path: String,
        width: usize,
        start_line: usize,
        lines: usize,
    ) -> PyResult<&'py PyArray2<SarComplex>> {
        let window = read_azimuth_window(&path, width, start_line, lines).map_err(to_py_err)?;
        Ok(window.into_pyarray(py))
    }

    #[pymodule]
    fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(merge_frames, m)?)?;
        m.add_function(wrap_pyfunction!(read_window, m)?)?;
        Ok(())
    }
}
