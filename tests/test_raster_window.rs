mod common;

use common::*;
use slc_stitch::io::read_azimuth_window;
use slc_stitch::{FrameMergeConfig, FrameMerger, SarComplex};
use tempfile::TempDir;

#[test]
fn test_window_across_frame_boundary() {
    init_logging();
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let frames = vec![
        write_frame(input.path(), "f1.slc", 8, 400, 0.0, 20.0),
        write_frame(input.path(), "f2.slc", 8, 400, 18.0, 20.0),
    ];
    let output = out.path().join("merged.slc");
    let report = FrameMerger::new(FrameMergeConfig::default())
        .merge(frames, &output)
        .unwrap();
    assert_eq!(report.merged.number_of_lines, 760);

    let window = read_azimuth_window(&output, 8, 395, 10).unwrap();
    assert_eq!(window.dim(), (10, 8));
    for (i, row) in window.outer_iter().enumerate() {
        assert_eq!(row[0], SarComplex::new((395 + i) as f32, 1.0));
        assert_eq!(row[7], SarComplex::new((395 + i) as f32, 8.0));
    }
}

#[test]
fn test_window_past_end_fails() {
    let input = TempDir::new().unwrap();
    write_frame(input.path(), "f1.slc", 2, 10, 0.0, 1.0);
    assert!(read_azimuth_window(input.path().join("f1.slc"), 2, 5, 10).is_err());
}
