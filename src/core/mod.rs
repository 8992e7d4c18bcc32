//! Core frame stitching modules

pub mod width_normalize;
pub mod timing;
pub mod concatenate;
pub mod finalize;
pub mod frame_merge;

// Re-export main types
pub use width_normalize::{WidthNormalizer, WidthNormalization, PaddedFrame};
pub use timing::{TimingAnalyzer, TimingAnalysis, FrameBoundary, BoundaryKind, expected_start_line};
pub use concatenate::{LineConcatenator, FramePlan, GapPolicy, plan_frame, plan_concatenation};
pub use finalize::MetadataFinalizer;
pub use frame_merge::{FrameMerger, FrameMergeConfig, MergeReport, FrameSummary, sort_frames, validate_frames};
