pub mod job;
pub mod merged;
pub mod settings;

use settings::Settings;
use std::path::Path;

use crate::error::MosaicError;

/// ジョブファイルのパスからsettings.yamlを自動検出して読み込む。
///
/// ジョブファイルと同じディレクトリに `settings.yaml` が存在すれば読み込み、
/// 存在しなければデフォルト設定を返す。
pub fn load_settings_for_job(job_file_path: &Path) -> crate::error::Result<Settings> {
    let dir = job_file_path
        .parent()
        .ok_or_else(|| MosaicError::config("Cannot determine job file directory"))?;

    let settings_path = dir.join("settings.yaml");

    if settings_path.exists() {
        Settings::from_file(&settings_path)
    } else {
        Ok(Settings::default())
    }
}

pub(crate) fn validate_pixel_size(pixel_size: u32) -> crate::error::Result<()> {
    if pixel_size == 0 {
        return Err(MosaicError::config("pixel_size must be at least 1"));
    }
    Ok(())
}

pub(crate) fn validate_jpeg_quality(quality: u8) -> crate::error::Result<()> {
    if !(1..=100).contains(&quality) {
        return Err(MosaicError::config(format!(
            "jpeg_quality must be 1-100, got {quality}"
        )));
    }
    Ok(())
}
