//! Per-file encoding.
//!
//! Turns one [`DiscoveredFile`] into zero or one [`FileRecord`]. Every
//! failure is returned as an [`ItemError`] scoped to that file; the encoder
//! never touches the manifest itself.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use mdpack_captioning::ImageDescriber;
use mdpack_discovery::DiscoveredFile;
use mdpack_shared::{FileRecord, ItemError};

use crate::classify::{ContentKind, classify};

/// How images are represented for the whole run.
#[derive(Clone, Copy)]
pub enum ImageHandling<'a> {
    /// Markdown-only: images are ignored like any other non-`.md` file.
    Skip,
    /// Images are stored as base64 `contents`.
    Embed,
    /// Images are replaced by a description from the captioning service.
    Describe(&'a dyn ImageDescriber),
}

impl ImageHandling<'_> {
    pub fn includes_images(&self) -> bool {
        !matches!(self, Self::Skip)
    }

    /// Short name used in logs and summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Embed => "embed",
            Self::Describe(_) => "describe",
        }
    }
}

impl std::fmt::Debug for ImageHandling<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encodes discovered files under a fixed [`ImageHandling`].
#[derive(Debug, Clone, Copy)]
pub struct Encoder<'a> {
    images: ImageHandling<'a>,
}

impl<'a> Encoder<'a> {
    pub fn new(images: ImageHandling<'a>) -> Self {
        Self { images }
    }

    /// Produce the record for `file`, or `Ok(None)` if its kind is ignored.
    ///
    /// Reads are blocking and the file is fully consumed before returning.
    pub async fn encode(&self, file: &DiscoveredFile) -> Result<Option<FileRecord>, ItemError> {
        match classify(&file.path, self.images.includes_images()) {
            ContentKind::Markdown => {
                let text = std::fs::read_to_string(&file.path)
                    .map_err(|e| ItemError::read(&file.relative, e))?;
                Ok(Some(FileRecord::markdown(&file.relative, text)))
            }
            ContentKind::Image { mime_type } => {
                let describer = match self.images {
                    ImageHandling::Skip => return Ok(None),
                    ImageHandling::Embed => None,
                    ImageHandling::Describe(describer) => Some(describer),
                };
                let bytes =
                    std::fs::read(&file.path).map_err(|e| ItemError::read(&file.relative, e))?;
                encode_image(file, mime_type, &bytes, describer).await.map(Some)
            }
            ContentKind::Ignored => {
                debug!(path = %file.relative, "not markdown or image, skipping");
                Ok(None)
            }
        }
    }
}

/// Embed `bytes` as base64, or replace them with a caption when a
/// describer is given.
async fn encode_image(
    file: &DiscoveredFile,
    mime_type: String,
    bytes: &[u8],
    describer: Option<&dyn ImageDescriber>,
) -> Result<FileRecord, ItemError> {
    match describer {
        Some(describer) => {
            let description = describer
                .describe_image(bytes, &mime_type)
                .await
                .map_err(|e| ItemError::collaborator(&file.relative, &e))?;
            Ok(FileRecord::described_image(
                &file.relative,
                mime_type,
                description,
            ))
        }
        None => Ok(FileRecord::embedded_image(
            &file.relative,
            mime_type,
            STANDARD.encode(bytes),
        )),
    }
}
