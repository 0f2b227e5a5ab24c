//! `tokens` workflow: count how many model tokens a text file costs.

use std::path::Path;

use tracing::{debug, instrument};

use mdpack_shared::{MdpackError, Result};

/// Token counts for one text under the encodings mdpack reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCounts {
    /// `o200k_base`, the gpt-4o encoding.
    pub gpt4o: usize,
    /// `cl100k_base`.
    pub cl100k: usize,
}

/// Count `text` under both encodings.
///
/// Special-token markup such as `<|endoftext|>` is counted as ordinary text.
pub fn count_tokens(text: &str) -> Result<TokenCounts> {
    let o200k = tiktoken_rs::o200k_base()
        .map_err(|e| MdpackError::tokenizer(format!("o200k_base: {e}")))?;
    let cl100k = tiktoken_rs::cl100k_base()
        .map_err(|e| MdpackError::tokenizer(format!("cl100k_base: {e}")))?;

    Ok(TokenCounts {
        gpt4o: o200k.encode_ordinary(text).len(),
        cl100k: cl100k.encode_ordinary(text).len(),
    })
}

/// Read `path` as UTF-8 and count its tokens.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn count_file_tokens(path: &Path) -> Result<TokenCounts> {
    let text = std::fs::read_to_string(path).map_err(|e| MdpackError::io(path, e))?;
    let counts = count_tokens(&text)?;
    debug!(gpt4o = counts.gpt4o, cl100k = counts.cl100k, "counted tokens");
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_no_tokens() {
        let counts = count_tokens("").unwrap();
        assert_eq!(counts, TokenCounts { gpt4o: 0, cl100k: 0 });
    }

    #[test]
    fn short_phrase_counts() {
        let counts = count_tokens("hello world").unwrap();
        assert_eq!(counts.gpt4o, 2);
        assert_eq!(counts.cl100k, 2);
    }

    #[test]
    fn special_token_text_is_not_rejected() {
        let counts = count_tokens("<|endoftext|>").unwrap();
        assert!(counts.gpt4o > 1);
        assert!(counts.cl100k > 1);
    }

    #[test]
    fn file_counts_match_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        let text = "# Title\n\nSome naïve prose about 日本.\n";
        std::fs::write(&path, text).unwrap();

        assert_eq!(count_file_tokens(&path).unwrap(), count_tokens(text).unwrap());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = count_file_tokens(&dir.path().join("gone.txt")).unwrap_err();
        assert!(matches!(err, MdpackError::Io { .. }));
    }

    #[test]
    fn non_utf8_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bin.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(count_file_tokens(&path).unwrap_err(), MdpackError::Io { .. }));
    }
}
