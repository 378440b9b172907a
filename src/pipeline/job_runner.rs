// ジョブ単位: フォルダ読込 -> 画像抽出 -> 編集適用 -> 文書再生成 -> バンドル出力

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::job::Edit;
use crate::config::merged::MergedConfig;
use crate::docx::DocxCodec;
use crate::input::collect_folder;
use crate::pipeline::bundle::BundleEntry;
use crate::pipeline::extract::{ExtractionFailure, ExtractionOutcome, ExtractionSummary, extract};
use crate::pipeline::regenerate::regenerate;
use crate::raster::Region;
use crate::session::{EditOutcome, EditingSession};

/// Configuration for a single job.
pub struct JobConfig {
    pub input_dir: PathBuf,
    pub output_path: PathBuf,
    pub report_path: Option<PathBuf>,
    pub config: MergedConfig,
    pub edits: Vec<Edit>,
}

/// Result of a job that produced a bundle.
#[derive(Debug)]
pub struct JobResult {
    pub input_dir: PathBuf,
    pub output_path: PathBuf,
    pub images_found: usize,
    pub images_modified: usize,
    /// Edits skipped because the region was below the minimum size.
    pub regions_ignored: usize,
    pub entries: Vec<BundleEntry>,
    pub extraction_failures: Vec<ExtractionFailure>,
}

#[derive(Debug)]
pub enum JobOutcome {
    Completed(JobResult),
    /// The input folder held no extractable images; nothing was written.
    NoImagesFound {
        input_dir: PathBuf,
        summary: ExtractionSummary,
    },
}

/// Run one job end to end.
pub fn run_job(config: &JobConfig) -> crate::error::Result<JobOutcome> {
    let files = collect_folder(&config.input_dir)?;
    let codec = DocxCodec;

    let extraction = match extract(&files, &codec) {
        ExtractionOutcome::Found(extraction) => extraction,
        ExtractionOutcome::NoImagesFound(summary) => {
            warn!(input = %config.input_dir.display(), "no images found");
            return Ok(JobOutcome::NoImagesFound {
                input_dir: config.input_dir.clone(),
                summary,
            });
        }
    };
    let images_found = extraction.records.len();
    let session = EditingSession::new(extraction.records, config.config.edit_policy());

    let mut regions_ignored = 0;
    for edit in &config.edits {
        let index = session.locate(&edit.document, edit.image)?;
        session.materialize(index)?;

        for rect in &edit.regions {
            let region = Region::new(
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                rect.pixel_size.unwrap_or(config.config.pixel_size),
            );
            if let EditOutcome::Ignored(reason) = session.apply(index, &region)? {
                warn!(
                    document = %edit.document,
                    image = edit.image,
                    ?reason,
                    "region ignored"
                );
                regions_ignored += 1;
            }
        }
        for _ in 0..edit.undo {
            session.undo(index)?;
        }
    }

    let images_modified = session.modified_count()?;
    let records = session.snapshot()?;
    let bundle = regenerate(&records, &codec, &config.config.regenerate_options())?;

    if let Some(parent) = config.output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&config.output_path, &bundle.bytes)?;
    if let Some(report_path) = &config.report_path {
        std::fs::write(report_path, bundle.report_json()?)?;
    }

    info!(
        output = %config.output_path.display(),
        images_found,
        images_modified,
        "job finished"
    );

    Ok(JobOutcome::Completed(JobResult {
        input_dir: config.input_dir.clone(),
        output_path: config.output_path.clone(),
        images_found,
        images_modified,
        regions_ignored,
        entries: bundle.entries,
        extraction_failures: extraction.summary.failures,
    }))
}
