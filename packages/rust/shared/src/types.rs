//! Core domain types for mdpack manifests.

use serde::{Deserialize, Serialize};

/// MIME type every `.md` file is recorded with, whatever the extension table says.
pub const MARKDOWN_MIME: &str = "text/markdown";

// ---------------------------------------------------------------------------
// FileRecord
// ---------------------------------------------------------------------------

/// One manifest entry per successfully processed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Path relative to the scanned root, `/`-separated on every platform.
    pub file_path: String,
    /// Extension-inferred MIME type.
    pub mime_type: String,
    /// Either the file contents or a generated description, never both.
    #[serde(flatten)]
    pub payload: Payload,
}

/// The content half of a [`FileRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// Raw text (markdown) or base64 bytes (embedded image).
    Contents {
        contents: String,
        #[serde(rename = "isBase64Encoded")]
        is_base64_encoded: bool,
    },
    /// Caption returned by the captioning service, in place of the image bytes.
    Description {
        #[serde(rename = "imageAltTextDescription")]
        image_alt_text_description: String,
    },
}

impl FileRecord {
    /// A markdown record carrying the file's text verbatim.
    pub fn markdown(file_path: impl Into<String>, text: String) -> Self {
        Self {
            file_path: file_path.into(),
            mime_type: MARKDOWN_MIME.into(),
            payload: Payload::Contents {
                contents: text,
                is_base64_encoded: false,
            },
        }
    }

    /// An image record carrying the base64-encoded bytes.
    pub fn embedded_image(
        file_path: impl Into<String>,
        mime_type: impl Into<String>,
        base64: String,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            mime_type: mime_type.into(),
            payload: Payload::Contents {
                contents: base64,
                is_base64_encoded: true,
            },
        }
    }

    /// An image record carrying only a generated description.
    pub fn described_image(
        file_path: impl Into<String>,
        mime_type: impl Into<String>,
        description: String,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            mime_type: mime_type.into(),
            payload: Payload::Description {
                image_alt_text_description: description,
            },
        }
    }

    /// Stored contents, if this record carries any.
    pub fn contents(&self) -> Option<&str> {
        match &self.payload {
            Payload::Contents { contents, .. } => Some(contents),
            Payload::Description { .. } => None,
        }
    }

    /// Stored description, if this record carries one.
    pub fn description(&self) -> Option<&str> {
        match &self.payload {
            Payload::Description {
                image_alt_text_description,
            } => Some(image_alt_text_description),
            Payload::Contents { .. } => None,
        }
    }

    pub fn is_base64_encoded(&self) -> bool {
        matches!(
            self.payload,
            Payload::Contents {
                is_base64_encoded: true,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_record_shape() {
        let record = FileRecord::markdown("a.md", "# Hi".into());
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["filePath"], "a.md");
        assert_eq!(json["mimeType"], "text/markdown");
        assert_eq!(json["contents"], "# Hi");
        assert_eq!(json["isBase64Encoded"], false);
        assert!(json.get("imageAltTextDescription").is_none());
    }

    #[test]
    fn described_image_has_no_contents() {
        let record = FileRecord::described_image("img/b.png", "image/png", "A red square.".into());
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["imageAltTextDescription"], "A red square.");
        assert!(json.get("contents").is_none());
        assert!(json.get("isBase64Encoded").is_none());
        assert!(record.contents().is_none());
    }

    #[test]
    fn record_deserializes_either_payload() {
        let embedded: FileRecord = serde_json::from_str(
            r#"{"filePath":"b.png","mimeType":"image/png","contents":"AAAA","isBase64Encoded":true}"#,
        )
        .expect("deserialize embedded");
        assert!(embedded.is_base64_encoded());
        assert_eq!(embedded.contents(), Some("AAAA"));

        let described: FileRecord = serde_json::from_str(
            r#"{"filePath":"b.png","mimeType":"image/png","imageAltTextDescription":"cat"}"#,
        )
        .expect("deserialize described");
        assert_eq!(described.description(), Some("cat"));
        assert!(!described.is_base64_encoded());
    }
}
