//! End-to-end `pack` pipeline: directory → walk → classify/encode → manifest.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use mdpack_shared::{ItemError, Result};

use crate::assembler::ManifestAssembler;
use crate::encoder::{Encoder, ImageHandling};

/// Configuration for the `pack` pipeline.
#[derive(Debug, Clone)]
pub struct PackConfig {
    /// Root of the tree to package.
    pub input: PathBuf,
    /// Manifest destination.
    pub output: PathBuf,
}

/// Result of the `pack` pipeline.
#[derive(Debug, Clone)]
pub struct PackResult {
    /// Where the manifest was written.
    pub output: PathBuf,
    /// Records in the manifest.
    pub records: usize,
    /// Of which markdown.
    pub markdown: usize,
    /// Of which images (embedded or described).
    pub images: usize,
    /// Files that were neither markdown nor images.
    pub ignored: usize,
    /// Files dropped because of a per-file error.
    pub failed: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after a file became a record.
    fn file_packed(&self, path: &str, records_so_far: usize);
    /// Called when a file was dropped because of an error.
    fn file_failed(&self, error: &ItemError);
    /// Called when the pipeline completes.
    fn done(&self, result: &PackResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn file_packed(&self, _path: &str, _records_so_far: usize) {}
    fn file_failed(&self, _error: &ItemError) {}
    fn done(&self, _result: &PackResult) {}
}

/// Run the full `pack` pipeline.
///
/// 1. Walk the input tree (fatal if the root is not a directory)
/// 2. Classify and encode each file, one at a time; per-file errors (including
///    entries the walk could not read) skip the file
/// 3. Write the manifest (fatal if it cannot be written)
#[instrument(skip_all, fields(input = %config.input.display(), images = images.as_str()))]
pub async fn pack(
    config: &PackConfig,
    images: ImageHandling<'_>,
    progress: &dyn ProgressReporter,
) -> Result<PackResult> {
    let start = Instant::now();

    // --- Phase 1: Walk ---
    progress.phase("Scanning input folder");
    let files = mdpack_discovery::walk(&config.input)?;

    // --- Phase 2: Classify & encode ---
    progress.phase("Packing files");
    let encoder = Encoder::new(images);
    let mut assembler = ManifestAssembler::new();
    let (mut markdown, mut image_count, mut ignored, mut failed) = (0, 0, 0, 0);

    for entry in files {
        let encoded = match entry {
            Ok(file) => encoder.encode(&file).await,
            Err(e) => Err(e),
        };
        match encoded {
            Ok(Some(record)) => {
                if record.mime_type.starts_with("image/") {
                    image_count += 1;
                } else {
                    markdown += 1;
                }
                debug!(path = %record.file_path, mime = %record.mime_type, "packed file");
                let path = record.file_path.clone();
                assembler.push(record);
                progress.file_packed(&path, assembler.len());
            }
            Ok(None) => ignored += 1,
            Err(e) => {
                warn!(path = %e.path, error = %e.kind, "skipping file");
                progress.file_failed(&e);
                failed += 1;
            }
        }
    }

    // --- Phase 3: Write manifest ---
    progress.phase("Writing manifest");
    assembler.write(&config.output)?;

    let result = PackResult {
        output: config.output.clone(),
        records: assembler.len(),
        markdown,
        images: image_count,
        ignored,
        failed,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        records = result.records,
        markdown = result.markdown,
        images = result.images,
        ignored = result.ignored,
        failed = result.failed,
        elapsed_ms = result.elapsed.as_millis(),
        "pack pipeline complete"
    );

    Ok(result)
}
