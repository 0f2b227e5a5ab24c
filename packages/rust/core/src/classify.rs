//! File classification.
//!
//! Decides, from the file name alone, whether a discovered file becomes a
//! markdown record, an image record, or nothing. There is no content
//! sniffing: a PNG renamed to `.txt` is ignored, and a text file renamed to
//! `.png` is treated as an image.

use std::path::Path;

/// Content category of a discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    /// `.md` file, recorded as UTF-8 text.
    Markdown,
    /// File whose extension maps to an `image/*` MIME type.
    Image { mime_type: String },
    /// Anything else. Not represented in the manifest.
    Ignored,
}

/// Classify `path`.
///
/// Images win over markdown; with `include_images` off, only `.md` files are
/// eligible.
pub fn classify(path: &Path, include_images: bool) -> ContentKind {
    if include_images {
        if let Some(mime) = mime_guess::from_path(path).first() {
            if mime.type_() == mime_guess::mime::IMAGE {
                return ContentKind::Image {
                    mime_type: mime.essence_str().to_string(),
                };
            }
        }
    }

    let is_markdown = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));

    if is_markdown {
        ContentKind::Markdown
    } else {
        ContentKind::Ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(mime: &str) -> ContentKind {
        ContentKind::Image {
            mime_type: mime.into(),
        }
    }

    #[test]
    fn markdown_any_case() {
        assert_eq!(classify(Path::new("a.md"), true), ContentKind::Markdown);
        assert_eq!(classify(Path::new("docs/README.MD"), true), ContentKind::Markdown);
        assert_eq!(classify(Path::new("notes.Md"), false), ContentKind::Markdown);
    }

    #[test]
    fn common_images() {
        assert_eq!(classify(Path::new("img/b.png"), true), image("image/png"));
        assert_eq!(classify(Path::new("photo.JPG"), true), image("image/jpeg"));
        assert_eq!(classify(Path::new("anim.gif"), true), image("image/gif"));
        assert_eq!(classify(Path::new("logo.svg"), true), image("image/svg+xml"));
    }

    #[test]
    fn images_disabled_in_markdown_only_mode() {
        assert_eq!(classify(Path::new("b.png"), false), ContentKind::Ignored);
    }

    #[test]
    fn other_files_ignored() {
        assert_eq!(classify(Path::new("main.rs"), true), ContentKind::Ignored);
        assert_eq!(classify(Path::new("manifest.json"), true), ContentKind::Ignored);
        assert_eq!(classify(Path::new("Makefile"), true), ContentKind::Ignored);
        assert_eq!(classify(Path::new("archive.md.bak"), true), ContentKind::Ignored);
    }

    #[test]
    fn extension_decides_not_content() {
        // A PNG saved under a non-image extension is not detected.
        assert_eq!(classify(Path::new("picture.dat"), true), ContentKind::Ignored);
        // Text saved under an image extension is taken at its word.
        assert_eq!(classify(Path::new("fake.png"), true), image("image/png"));
    }
}
