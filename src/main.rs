use std::path::{Path, PathBuf};
use std::process::ExitCode;

use docx_mosaic::config::job::JobFile;
use docx_mosaic::config::merged::MergedConfig;
use docx_mosaic::config::{self};
use docx_mosaic::docx::DocxCodec;
use docx_mosaic::input::collect_folder;
use docx_mosaic::pipeline::extract::{ExtractionOutcome, extract};
use docx_mosaic::pipeline::job_runner::{JobConfig, JobOutcome};
use docx_mosaic::pipeline::orchestrator::run_all_jobs;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: docx_mosaic <jobs.yaml>...");
        eprintln!("       docx_mosaic --list <folder>");
        eprintln!("  Apply mosaic regions to images in Word documents according to job files.");
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("docx_mosaic {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    if args[0] == "--list" {
        return match args.get(1) {
            Some(folder) => list_images(Path::new(folder)),
            None => {
                eprintln!("ERROR: --list requires a folder argument");
                ExitCode::FAILURE
            }
        };
    }

    let mut job_configs: Vec<JobConfig> = Vec::new();
    let mut workers = 0usize;

    for job_file_arg in &args {
        let job_file_path = Path::new(job_file_arg);

        // Load settings from the same directory as the job file.
        let settings = match config::load_settings_for_job(job_file_path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("ERROR: Failed to load settings for {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let yaml_content = match std::fs::read_to_string(job_file_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("ERROR: Failed to read job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let job_file: JobFile = match serde_yml::from_str(&yaml_content) {
            Ok(jf) => jf,
            Err(e) => {
                eprintln!("ERROR: Failed to parse job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        // Resolve job file directory for relative paths.
        let job_dir = job_file_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        for job in &job_file.jobs {
            let merged = MergedConfig::new(&settings, job);
            if let Err(e) = merged.validate() {
                eprintln!("ERROR: {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
            workers = workers.max(merged.parallel_workers);

            job_configs.push(JobConfig {
                input_dir: resolve_path(&job_dir, &job.input),
                output_path: resolve_path(&job_dir, &job.output),
                report_path: job.report.as_deref().map(|r| resolve_path(&job_dir, r)),
                config: merged,
                edits: job.edits.clone(),
            });
        }
    }

    if workers > 0
        && let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build_global()
    {
        eprintln!("WARNING: could not configure {workers} worker threads: {e}");
    }

    let results = run_all_jobs(&job_configs);

    let mut has_error = false;
    for (i, result) in results.iter().enumerate() {
        match result {
            Ok(JobOutcome::Completed(job_result)) => {
                for failure in &job_result.extraction_failures {
                    eprintln!(
                        "WARNING: skipped {}: {}",
                        failure.document, failure.message
                    );
                }
                eprintln!(
                    "OK: {} -> {} ({} images, {} modified, {} documents)",
                    job_result.input_dir.display(),
                    job_result.output_path.display(),
                    job_result.images_found,
                    job_result.images_modified,
                    job_result.entries.len()
                );
            }
            Ok(JobOutcome::NoImagesFound { input_dir, summary }) => {
                eprintln!(
                    "ERROR: no images found in Word documents under {} ({} documents scanned, {} failed)",
                    input_dir.display(),
                    summary.documents_scanned,
                    summary.failures.len()
                );
                has_error = true;
            }
            Err(e) => {
                eprintln!(
                    "ERROR: {} -> {}: {e}",
                    job_configs[i].input_dir.display(),
                    job_configs[i].output_path.display()
                );
                has_error = true;
            }
        }
    }

    if has_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Print every image found under `folder`, one per line.
fn list_images(folder: &Path) -> ExitCode {
    let files = match collect_folder(folder) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return ExitCode::FAILURE;
        }
    };

    match extract(&files, &DocxCodec) {
        ExtractionOutcome::Found(extraction) => {
            for failure in &extraction.summary.failures {
                eprintln!("WARNING: skipped {}: {}", failure.document, failure.message);
            }
            for record in &extraction.records {
                println!(
                    "{}\t{}\t{}\t{}x{}\t{}",
                    record.id(),
                    record.document_name(),
                    record.position(),
                    record.width(),
                    record.height(),
                    record.content_type()
                );
            }
            ExitCode::SUCCESS
        }
        ExtractionOutcome::NoImagesFound(summary) => {
            eprintln!(
                "ERROR: no images found in Word documents under {} ({} documents scanned)",
                folder.display(),
                summary.documents_scanned
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("docx_mosaic=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve a potentially relative path against a base directory.
/// If the path is already absolute, return it as-is.
fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}
