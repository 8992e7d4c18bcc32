use crate::types::{MergedFrame, SarError, SarResult};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Renders header/sidecar files describing a raster on disk
pub trait HeaderRenderer {
    fn render(&self, raster: &Path, frame: &MergedFrame) -> SarResult<Vec<PathBuf>>;
}

/// Writes an `.xml` image header and a GDAL `.vrt` next to the raster
#[derive(Debug, Clone, Default)]
pub struct XmlHeaderRenderer;

#[derive(Debug, Serialize)]
#[serde(rename = "imageFile")]
struct ImageHeader {
    property: Vec<Property>,
}

#[derive(Debug, Serialize)]
struct Property {
    #[serde(rename = "@name")]
    name: String,
    value: String,
}

impl Property {
    fn new(name: &str, value: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "VRTDataset")]
struct VrtDataset {
    #[serde(rename = "@rasterXSize")]
    raster_x_size: usize,
    #[serde(rename = "@rasterYSize")]
    raster_y_size: usize,
    #[serde(rename = "VRTRasterBand")]
    band: VrtRasterBand,
}

#[derive(Debug, Serialize)]
struct VrtRasterBand {
    #[serde(rename = "@dataType")]
    data_type: &'static str,
    #[serde(rename = "@band")]
    band: u32,
    #[serde(rename = "@subClass")]
    sub_class: &'static str,
    #[serde(rename = "SourceFilename")]
    source_filename: SourceFilename,
    #[serde(rename = "ByteOrder")]
    byte_order: &'static str,
    #[serde(rename = "ImageOffset")]
    image_offset: u64,
    #[serde(rename = "PixelOffset")]
    pixel_offset: usize,
    #[serde(rename = "LineOffset")]
    line_offset: usize,
}

#[derive(Debug, Serialize)]
struct SourceFilename {
    #[serde(rename = "@relativeToVRT")]
    relative_to_vrt: u8,
    #[serde(rename = "$text")]
    name: String,
}

fn sidecar(raster: &Path, extension: &str) -> PathBuf {
    let mut name = raster.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

impl XmlHeaderRenderer {
    pub fn image_header(&self, raster: &Path, frame: &MergedFrame) -> SarResult<String> {
        let file_name = raster
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let header = ImageHeader {
            property: vec![
                Property::new("file_name", file_name),
                Property::new("width", frame.number_of_samples),
                Property::new("length", frame.number_of_lines),
                Property::new("data_type", frame.sample_format.image_data_type()),
                Property::new("byte_order", "l"),
                Property::new("access_mode", "read"),
                Property::new("scheme", "BIP"),
                Property::new("sensing_start", frame.sensing_start.to_rfc3339()),
                Property::new("sensing_mid", frame.sensing_mid.to_rfc3339()),
                Property::new("sensing_stop", frame.sensing_stop.to_rfc3339()),
                Property::new("prf", frame.prf),
            ],
        };

        quick_xml::se::to_string(&header).map_err(|e| SarError::XmlRendering(e.to_string()))
    }

    pub fn vrt(&self, raster: &Path, frame: &MergedFrame) -> SarResult<String> {
        let bytes_per_sample = frame.sample_format.bytes_per_sample();
        let file_name = raster
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let dataset = VrtDataset {
            raster_x_size: frame.number_of_samples,
            raster_y_size: frame.number_of_lines,
            band: VrtRasterBand {
                data_type: frame.sample_format.gdal_data_type(),
                band: 1,
                sub_class: "VRTRawRasterBand",
                source_filename: SourceFilename {
                    relative_to_vrt: 1,
                    name: file_name,
                },
                byte_order: "LSB",
                image_offset: 0,
                pixel_offset: bytes_per_sample,
                line_offset: bytes_per_sample * frame.number_of_samples,
            },
        };

        quick_xml::se::to_string(&dataset).map_err(|e| SarError::XmlRendering(e.to_string()))
    }
}

impl HeaderRenderer for XmlHeaderRenderer {
    fn render(&self, raster: &Path, frame: &MergedFrame) -> SarResult<Vec<PathBuf>> {
        let xml_path = sidecar(raster, "xml");
        std::fs::write(&xml_path, self.image_header(raster, frame)?)?;

        let vrt_path = sidecar(raster, "vrt");
        std::fs::write(&vrt_path, self.vrt(raster, frame)?)?;

        log::info!("Rendered headers for {}", raster.display());
        Ok(vec![xml_path, vrt_path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SampleFormat;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    fn merged() -> MergedFrame {
        let start = Utc.with_ymd_and_hms(2009, 2, 14, 5, 30, 0).unwrap();
        MergedFrame {
            sensing_start: start,
            sensing_stop: start + Duration::seconds(20),
            sensing_mid: start + Duration::seconds(10),
            number_of_lines: 200,
            number_of_samples: 64,
            prf: 10.0,
            sample_format: SampleFormat::ComplexFloat32,
            sources: Vec::new(),
        }
    }

    #[test]
    fn test_image_header_properties() {
        let xml = XmlHeaderRenderer
            .image_header(Path::new("/data/merged.slc"), &merged())
            .unwrap();
        assert!(xml.starts_with("<imageFile>"));
        assert!(xml.contains("<property name=\"width\"><value>64</value></property>"));
        assert!(xml.contains("<property name=\"length\"><value>200</value></property>"));
        assert!(xml.contains("<value>CFLOAT</value>"));
        assert!(xml.contains("<value>merged.slc</value>"));
    }

    #[test]
    fn test_vrt_geometry() {
        let vrt = XmlHeaderRenderer
            .vrt(Path::new("merged.slc"), &merged())
            .unwrap();
        assert!(vrt.contains("rasterXSize=\"64\""));
        assert!(vrt.contains("rasterYSize=\"200\""));
        assert!(vrt.contains("dataType=\"CFloat32\""));
        assert!(vrt.contains("<LineOffset>512</LineOffset>"));
        assert!(vrt.contains(">merged.slc</SourceFilename>"));
    }

    #[test]
    fn test_render_writes_sidecars() {
        let dir = TempDir::new().unwrap();
        let raster = dir.path().join("merged.slc");
        let written = XmlHeaderRenderer.render(&raster, &merged()).unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.path().join("merged.slc.xml").exists());
        assert!(dir.path().join("merged.slc.vrt").exists());
    }
}
