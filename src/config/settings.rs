use std::path::Path;

use serde::Deserialize;

use crate::raster::codec::DEFAULT_JPEG_QUALITY;
use crate::session::DEFAULT_MIN_REGION;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default mosaic block size in pixels.
    pub pixel_size: u32,
    /// Smallest selection (buffer pixels, each side) that is applied.
    pub min_region: f64,
    /// Quality for re-encoding edited JPEG images.
    pub jpeg_quality: u8,
    /// rayon worker threads; 0 keeps rayon's default.
    pub parallel_workers: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            pixel_size: 10,
            min_region: DEFAULT_MIN_REGION,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            parallel_workers: 0,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let settings: Settings = serde_yml::from_str(yaml).map_err(|e| {
            crate::error::MosaicError::config(format!("Failed to parse settings YAML: {e}"))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        super::validate_pixel_size(self.pixel_size)?;
        super::validate_jpeg_quality(self.jpeg_quality)?;
        if !self.min_region.is_finite() || self.min_region < 0.0 {
            return Err(crate::error::MosaicError::config(format!(
                "min_region must be a non-negative number, got {}",
                self.min_region
            )));
        }
        Ok(())
    }
}
