use crate::types::{FrameRecord, SampleFormat, SarComplex, SarError, SarImage, SarResult};
use ndarray::Array2;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Check that a frame's raster holds exactly `width * length` samples
pub fn validate_raster(frame: &FrameRecord, format: SampleFormat) -> SarResult<()> {
    let actual = std::fs::metadata(&frame.path)?.len();
    let expected = frame.raster_bytes(format);

    if actual != expected {
        return Err(SarError::RasterSize {
            path: frame.path.clone(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Sequential row reader over a row-major raster file.
///
/// Holds a single row buffer, so memory use does not depend on raster length.
pub struct RowReader {
    inner: BufReader<File>,
    buffer: Vec<u8>,
}

impl RowReader {
    pub fn open<P: AsRef<Path>>(path: P, row_bytes: usize) -> SarResult<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self {
            inner: BufReader::new(file),
            buffer: vec![0u8; row_bytes],
        })
    }

    /// Position the reader at the start of `row`
    pub fn seek_to_row(&mut self, row: usize) -> SarResult<()> {
        let offset = row as u64 * self.buffer.len() as u64;
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    pub fn read_row(&mut self) -> SarResult<&[u8]> {
        self.inner.read_exact(&mut self.buffer)?;
        Ok(&self.buffer)
    }
}

/// Buffered row writer that counts the rows it has emitted
pub struct RowWriter<W: Write> {
    inner: BufWriter<W>,
    row_bytes: usize,
    rows_written: usize,
}

impl<W: Write> RowWriter<W> {
    pub fn new(inner: W, row_bytes: usize) -> Self {
        Self {
            inner: BufWriter::new(inner),
            row_bytes,
            rows_written: 0,
        }
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Write one row; rows shorter than the output width are zero-padded
    pub fn write_row(&mut self, row: &[u8]) -> SarResult<()> {
        if row.len() > self.row_bytes {
            return Err(SarError::Geometry(format!(
                "Row of {} bytes does not fit output rows of {} bytes",
                row.len(),
                self.row_bytes
            )));
        }
        self.inner.write_all(row)?;
        if row.len() < self.row_bytes {
            write_zeros(&mut self.inner, self.row_bytes - row.len())?;
        }
        self.rows_written += 1;
        Ok(())
    }

    pub fn write_zero_rows(&mut self, count: usize) -> SarResult<()> {
        for _ in 0..count {
            write_zeros(&mut self.inner, self.row_bytes)?;
            self.rows_written += 1;
        }
        Ok(())
    }

    /// Copy `count` rows from the reader's current position
    pub fn copy_rows(&mut self, reader: &mut RowReader, count: usize) -> SarResult<()> {
        for _ in 0..count {
            let row = reader.read_row()?;
            self.write_row(row)?;
        }
        Ok(())
    }

    /// Flush buffered rows and hand back the underlying sink
    pub fn finish(self) -> SarResult<W> {
        self.inner.into_inner().map_err(|e| SarError::Io(e.into_error()))
    }
}

fn write_zeros<W: Write>(out: &mut W, mut count: usize) -> std::io::Result<()> {
    const ZEROS: [u8; 4096] = [0u8; 4096];
    while count > 0 {
        let chunk = count.min(ZEROS.len());
        out.write_all(&ZEROS[..chunk])?;
        count -= chunk;
    }
    Ok(())
}

/// Read `lines` azimuth lines of a little-endian complex float32 raster
/// starting at `start_line` into an (azimuth x range) array
pub fn read_azimuth_window<P: AsRef<Path>>(
    path: P,
    width: usize,
    start_line: usize,
    lines: usize,
) -> SarResult<SarImage> {
    let bytes_per_sample = SampleFormat::ComplexFloat32.bytes_per_sample();
    let mut reader = RowReader::open(path, width * bytes_per_sample)?;
    reader.seek_to_row(start_line)?;

    let mut window = Array2::<SarComplex>::zeros((lines, width));
    for line in 0..lines {
        let row = reader.read_row()?;
        for (col, sample) in row.chunks_exact(bytes_per_sample).enumerate() {
            let re = f32::from_le_bytes([sample[0], sample[1], sample[2], sample[3]]);
            let im = f32::from_le_bytes([sample[4], sample[5], sample[6], sample[7]]);
            window[[line, col]] = SarComplex::new(re, im);
        }
    }

    log::debug!("Read {} x {} window at line {}", lines, width, start_line);
    Ok(window)
}
