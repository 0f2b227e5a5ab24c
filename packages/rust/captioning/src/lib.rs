//! Image captioning and prompt completion over a chat-completions API.
//!
//! The pack pipeline only sees the [`ImageDescriber`] trait; [`ChatClient`] is
//! the production implementation, talking to an Azure-OpenAI-style
//! deployment. The same client backs `mdpack prompt`.

mod client;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use mdpack_shared::Result;

pub use client::{ChatClient, Completion, TokenUsage};

/// Turns image bytes into a natural-language description.
///
/// Each call is a single attempt; any retry policy belongs to the implementor.
#[async_trait]
pub trait ImageDescriber: Send + Sync {
    /// Describe `bytes`, whose extension-inferred MIME type is `mime_type`.
    async fn describe_image(&self, bytes: &[u8], mime_type: &str) -> Result<String>;
}

/// Build a `data:` URI carrying `bytes` as standard base64.
pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}
