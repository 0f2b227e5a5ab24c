//! `prompt` workflow: send a prompt file to the chat service and save the reply.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use mdpack_captioning::{ChatClient, TokenUsage};
use mdpack_shared::{MdpackError, Result};

use crate::assembler::write_atomic;

/// Configuration for [`run_prompt`].
#[derive(Debug, Clone)]
pub struct PromptConfig {
    /// File holding the prompt text.
    pub prompt: PathBuf,
    /// Optional file appended after a blank line.
    pub additional: Option<PathBuf>,
    /// Where the reply is saved.
    pub output: PathBuf,
}

/// Result of a prompt round-trip.
#[derive(Debug, Clone)]
pub struct PromptResult {
    pub output: PathBuf,
    pub usage: Option<TokenUsage>,
    pub elapsed: Duration,
}

/// Read the prompt, appending `additional` (separated by a blank line) if given.
pub fn load_prompt(prompt: &Path, additional: Option<&Path>) -> Result<String> {
    let mut text = std::fs::read_to_string(prompt).map_err(|e| MdpackError::io(prompt, e))?;

    if let Some(extra) = additional {
        info!(path = %extra.display(), "appending additional content");
        let extra_text =
            std::fs::read_to_string(extra).map_err(|e| MdpackError::io(extra, e))?;
        text = format!("{text}\n\n{extra_text}");
    }

    Ok(text)
}

/// Send the prompt and write the reply to `config.output`.
#[instrument(skip_all, fields(prompt = %config.prompt.display()))]
pub async fn run_prompt(client: &ChatClient, config: &PromptConfig) -> Result<PromptResult> {
    let text = load_prompt(&config.prompt, config.additional.as_deref())?;

    let start = Instant::now();
    let completion = client.complete(&text).await?;
    write_atomic(&config.output, completion.text.as_bytes())?;

    let result = PromptResult {
        output: config.output.clone(),
        usage: completion.usage,
        elapsed: start.elapsed(),
    };

    info!(
        output = %result.output.display(),
        elapsed_ms = result.elapsed.as_millis(),
        "prompt response saved"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdpack_shared::CaptioningConfig;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn load_prompt_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let prompt = tmp.path().join("prompt.txt");
        std::fs::write(&prompt, "Summarize:").unwrap();

        assert_eq!(load_prompt(&prompt, None).unwrap(), "Summarize:");
    }

    #[test]
    fn load_prompt_with_additional() {
        let tmp = tempfile::tempdir().unwrap();
        let prompt = tmp.path().join("prompt.txt");
        let extra = tmp.path().join("manifest.json");
        std::fs::write(&prompt, "Summarize:").unwrap();
        std::fs::write(&extra, "[]").unwrap();

        let text = load_prompt(&prompt, Some(&extra)).unwrap();
        assert_eq!(text, "Summarize:\n\n[]");
    }

    #[test]
    fn load_prompt_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_prompt(&tmp.path().join("nope.txt"), None).unwrap_err();
        assert!(matches!(err, MdpackError::Io { .. }));
    }

    #[tokio::test]
    async fn run_prompt_saves_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "# Summary\n\nShort." } }],
                "usage": { "prompt_tokens": 3, "completion_tokens": 5, "total_tokens": 8 }
            })))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let prompt = tmp.path().join("prompt.txt");
        std::fs::write(&prompt, "Summarize this.").unwrap();

        let client = ChatClient::new(
            &CaptioningConfig {
                endpoint: server.uri(),
                deployment: "chat".into(),
                ..Default::default()
            },
            "k".into(),
        )
        .unwrap();

        let config = PromptConfig {
            prompt,
            additional: None,
            output: tmp.path().join("responses/out.md"),
        };
        let result = run_prompt(&client, &config).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&config.output).unwrap(),
            "# Summary\n\nShort."
        );
        assert_eq!(result.usage.map(|u| u.total_tokens), Some(8));
    }
}
