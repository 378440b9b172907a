use serde::Deserialize;

use crate::error::MosaicError;

#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    /// Folder containing the documents.
    pub input: String,
    /// Path of the output zip bundle.
    pub output: String,
    /// Optional JSON report of the bundle entries.
    pub report: Option<String>,
    pub pixel_size: Option<u32>,
    pub jpeg_quality: Option<u8>,
    pub min_region: Option<f64>,
    #[serde(default)]
    pub edits: Vec<Edit>,
}

/// Mosaic regions to apply to one image, followed by `undo` undos.
#[derive(Debug, Clone, Deserialize)]
pub struct Edit {
    /// Document name relative to the input folder, e.g. `reports/a.docx`.
    pub document: String,
    /// Zero-based image position inside the document.
    pub image: usize,
    #[serde(default)]
    pub regions: Vec<RegionSpec>,
    #[serde(default)]
    pub undo: usize,
}

/// A mosaic rectangle as written in a job file.
///
/// Accepted forms:
/// - string: `"10, 20, 300, 40"` or `"10,20,300,40@16"` (with block size)
/// - list: `[10, 20, 300, 40]`
/// - map: `{ x: 10, y: 20, width: 300, height: 40, pixel_size: 16 }`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "RawRegion")]
pub struct RegionSpec {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub pixel_size: Option<u32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRegion {
    Text(String),
    List(Vec<f64>),
    Map {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        pixel_size: Option<u32>,
    },
}

impl TryFrom<RawRegion> for RegionSpec {
    type Error = MosaicError;

    fn try_from(raw: RawRegion) -> Result<Self, Self::Error> {
        match raw {
            RawRegion::Text(s) => parse_region(&s),
            RawRegion::List(values) => region_from_values(&values, None),
            RawRegion::Map {
                x,
                y,
                width,
                height,
                pixel_size,
            } => region_from_values(&[x, y, width, height], pixel_size),
        }
    }
}

/// 領域文字列 `"x,y,width,height[@pixel_size]"` をパースする。
pub fn parse_region(s: &str) -> crate::error::Result<RegionSpec> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(MosaicError::config("Region cannot be empty"));
    }

    let (coords, pixel_size) = match trimmed.split_once('@') {
        Some((coords, size)) => {
            let size: u32 = size.trim().parse().map_err(|_| {
                MosaicError::config(format!("Invalid pixel size in region: '{size}'"))
            })?;
            (coords, Some(size))
        }
        None => (trimmed, None),
    };

    let values = coords
        .split(',')
        .map(|part| {
            let part = part.trim();
            part.parse::<f64>()
                .map_err(|_| MosaicError::config(format!("Invalid region value: '{part}'")))
        })
        .collect::<crate::error::Result<Vec<f64>>>()?;

    region_from_values(&values, pixel_size)
}

fn region_from_values(values: &[f64], pixel_size: Option<u32>) -> crate::error::Result<RegionSpec> {
    let [x, y, width, height] = values else {
        return Err(MosaicError::config(format!(
            "Region needs 4 values (x, y, width, height), got {}",
            values.len()
        )));
    };
    if values.iter().any(|v| !v.is_finite()) {
        return Err(MosaicError::config("Region values must be finite numbers"));
    }
    if *width < 0.0 || *height < 0.0 {
        return Err(MosaicError::config(format!(
            "Region width/height must be non-negative, got {width}x{height}"
        )));
    }
    if let Some(size) = pixel_size {
        super::validate_pixel_size(size)?;
    }
    Ok(RegionSpec {
        x: *x,
        y: *y,
        width: *width,
        height: *height,
        pixel_size,
    })
}
