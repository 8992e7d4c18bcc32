/*!
 * Multi-frame SLC merge pipeline
 *
 * Sorts decoded frames by sensing start, pads them to a common width, places
 * each on the track line grid from its timing, streams the rows into a single
 * raster and describes the result as a `MergedFrame`:
 *
 *   frames -> WidthNormalizer -> TimingAnalyzer -> LineConcatenator
 *          -> MetadataFinalizer -> raster + headers + stored metadata
 */

use crate::core::concatenate::{plan_concatenation, FramePlan, GapPolicy, LineConcatenator};
use crate::core::finalize::MetadataFinalizer;
use crate::core::timing::{FrameBoundary, TimingAnalyzer};
use crate::core::width_normalize::WidthNormalizer;
use crate::io::header::{HeaderRenderer, XmlHeaderRenderer};
use crate::io::metadata_store::{JsonMetadataStore, MetadataStore};
use crate::io::raster::validate_raster;
use crate::types::{FrameRecord, MergedFrame, QualityWarning, SampleFormat, SarError, SarResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Configuration for frame merging
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameMergeConfig {
    pub sample_format: SampleFormat,
    pub line_tolerance: f64,          // lines before a timing mismatch is reported
    pub gap_policy: GapPolicy,
    pub work_dir: Option<PathBuf>,    // padded frames; defaults to the output directory
    pub render_header: bool,
    pub keep_padded_frames: bool,
}

impl Default for FrameMergeConfig {
    fn default() -> Self {
        Self {
            sample_format: SampleFormat::ComplexFloat32,
            line_tolerance: 10.0,
            gap_policy: GapPolicy::Append,
            work_dir: None,
            render_header: true,
            keep_padded_frames: false,
        }
    }
}

impl FrameMergeConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> SarResult<Self> {
        let file = File::open(path.as_ref())?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// Per-frame outcome of a merge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSummary {
    pub path: PathBuf,
    pub original_width: usize,
    pub plan: FramePlan,
}

/// Everything a merge produced besides the raster itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeReport {
    pub output: PathBuf,
    pub merged: MergedFrame,
    pub frames: Vec<FrameSummary>,
    pub boundaries: Vec<FrameBoundary>,
    pub warnings: Vec<QualityWarning>,
    pub headers: Vec<PathBuf>,
}

impl MergeReport {
    pub fn has_gaps(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, QualityWarning::Gap { .. }))
    }
}

/// Order frames by sensing start; ties fall back to the raster path so the
/// result never depends on discovery order
pub fn sort_frames(frames: &mut [FrameRecord]) {
    frames.sort_by(|a, b| {
        a.sensing_start
            .cmp(&b.sensing_start)
            .then_with(|| a.path.cmp(&b.path))
    });
}

/// Reject frames no merge can make sense of
pub fn validate_frames(frames: &[FrameRecord], format: SampleFormat) -> SarResult<()> {
    if frames.is_empty() {
        return Err(SarError::NoFrames);
    }

    for frame in frames {
        let name = frame.path.display();
        if frame.width == 0 || frame.length == 0 {
            return Err(SarError::InvalidFrame(format!(
                "{} has empty geometry {} x {}",
                name, frame.length, frame.width
            )));
        }
        if !(frame.prf.is_finite() && frame.prf > 0.0) {
            return Err(SarError::InvalidFrame(format!(
                "{} has invalid PRF {}",
                name, frame.prf
            )));
        }
        if frame.sensing_stop < frame.sensing_start {
            return Err(SarError::InvalidFrame(format!(
                "{} stops at {} before it starts at {}",
                name,
                frame.sensing_stop.to_rfc3339(),
                frame.sensing_start.to_rfc3339()
            )));
        }
        validate_raster(frame, format)?;
    }
    Ok(())
}

/// Frame merge processor
pub struct FrameMerger {
    config: FrameMergeConfig,
}

impl FrameMerger {
    pub fn new(config: FrameMergeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FrameMergeConfig {
        &self.config
    }

    /// Merge frames into `output`, rendering headers next to it and storing
    /// the merged frame as `<output>.merged.json`
    pub fn merge<P: AsRef<Path>>(&self, frames: Vec<FrameRecord>, output: P) -> SarResult<MergeReport> {
        let output = output.as_ref();
        let mut store = JsonMetadataStore::new(output_dir(output));
        self.merge_with(frames, output, &XmlHeaderRenderer, &mut store)
    }

    /// Merge with explicit header and metadata collaborators
    pub fn merge_with<P: AsRef<Path>>(
        &self,
        mut frames: Vec<FrameRecord>,
        output: P,
        renderer: &dyn HeaderRenderer,
        store: &mut dyn MetadataStore,
    ) -> SarResult<MergeReport> {
        let output = output.as_ref();
        let format = self.config.sample_format;
        log::info!("🔗 Merging {} frames into {}", frames.len(), output.display());

        validate_frames(&frames, format)?;
        sort_frames(&mut frames);

        let output_dir = output_dir(output);
        let work_dir = self.config.work_dir.clone().unwrap_or_else(|| output_dir.clone());
        std::fs::create_dir_all(&work_dir)?;

        // Step 1: common width
        let normalization = WidthNormalizer::new(format, &work_dir).normalize(&frames)?;
        let mut warnings: Vec<QualityWarning> = normalization
            .padded
            .iter()
            .map(|p| QualityWarning::WidthPadded {
                path: p.original_path.clone(),
                original_width: p.original_width,
                width: normalization.max_width,
            })
            .collect();

        // Step 2: placement on the track line grid
        let timing = TimingAnalyzer::new(self.config.line_tolerance).analyze(&normalization.frames)?;
        warnings.extend(timing.warnings.iter().cloned());

        // Step 3: stream rows into a temporary file, renamed into place once
        // headers are rendered
        let plans = plan_concatenation(&normalization.frames, &timing, self.config.gap_policy)?;
        let staging = tempfile::Builder::new()
            .prefix(".merge-")
            .tempfile_in(&output_dir)?;
        let staging = LineConcatenator::new(format).concatenate(&normalization.frames, &plans, staging)?;
        staging.as_file().sync_all()?;

        // Step 4: merged description
        let number_of_lines = plans.last().map(|p| p.cumulative_lines).unwrap_or(0);
        let (merged, length_warning) = MetadataFinalizer::new(self.config.line_tolerance).finalize(
            &frames,
            number_of_lines,
            normalization.max_width,
            timing.track_prf,
            format,
        )?;
        warnings.extend(length_warning);

        // Step 5: headers, raster, stored metadata; undone in reverse on failure
        let headers = if self.config.render_header {
            renderer.render(output, &merged)?
        } else {
            Vec::new()
        };
        if let Err(e) = staging.persist(output) {
            discard(&headers);
            return Err(SarError::Io(e.error));
        }
        if let Err(e) = store.persist(&metadata_key(output), &merged) {
            discard(&headers);
            discard(std::slice::from_ref(&output.to_path_buf()));
            return Err(e);
        }

        if !self.config.keep_padded_frames {
            normalization.cleanup()?;
        }

        let summaries = frames
            .iter()
            .zip(plans)
            .map(|(frame, plan)| FrameSummary {
                path: frame.path.clone(),
                original_width: frame.width,
                plan,
            })
            .collect();

        log::info!(
            "✅ Merge complete: {} lines x {} samples, {} warnings",
            merged.number_of_lines,
            merged.number_of_samples,
            warnings.len()
        );

        Ok(MergeReport {
            output: output.to_path_buf(),
            merged,
            frames: summaries,
            boundaries: timing.boundaries,
            warnings,
            headers,
        })
    }
}

/// Remove files written by a merge that did not complete
fn discard(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = std::fs::remove_file(path) {
            log::warn!("Could not remove {}: {}", path.display(), e);
        }
    }
}

fn output_dir(output: &Path) -> PathBuf {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Key under which a merged frame is stored: the output file name
fn metadata_key(output: &Path) -> String {
    output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "merged".to_string())
}
