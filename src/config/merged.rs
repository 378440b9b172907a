use super::job::Job;
use super::settings::Settings;
use crate::pipeline::regenerate::RegenerateOptions;
use crate::session::EditPolicy;

#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub pixel_size: u32,
    pub min_region: f64,
    pub jpeg_quality: u8,
    pub parallel_workers: usize,
}

impl MergedConfig {
    /// JobのOption値がSomeならJobの値を、NoneならSettingsの値を使用する。
    pub fn new(settings: &Settings, job: &Job) -> Self {
        MergedConfig {
            pixel_size: job.pixel_size.unwrap_or(settings.pixel_size),
            min_region: job.min_region.unwrap_or(settings.min_region),
            jpeg_quality: job.jpeg_quality.unwrap_or(settings.jpeg_quality),
            parallel_workers: settings.parallel_workers,
        }
    }

    /// Check values that may have come from job overrides.
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

    pub fn edit_policy(&self) -> EditPolicy {
        EditPolicy {
            min_region: self.min_region,
        }
    }

    pub fn regenerate_options(&self) -> RegenerateOptions {
        RegenerateOptions {
            jpeg_quality: self.jpeg_quality,
            cancel: None,
        }
    }
}
