use std::time::Duration;

use fqa_core::config::LlmConfig;
use fqa_core::error::{codes, AppError};
use serde::{Deserialize, Serialize};

use super::Llm;

/// Chat-completions client (`{base_url}/chat/completions`, bearer auth).
#[derive(Clone)]
pub struct OpenAiChatLlm {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    system_prompt: String,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAiChatLlm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChatLlm")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiChatLlm {
    pub fn from_config(cfg: &LlmConfig, api_key: &str) -> Result<Self, AppError> {
        let base_url = cfg.base_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
            return Err(
                AppError::new(codes::CONFIG_INVALID, "llm.base_url must be an http(s) URL")
                    .with_details(format!("base_url={base_url}")),
            );
        }
        if api_key.trim().is_empty() {
            return Err(AppError::new(
                codes::CONFIG_MISSING_CREDENTIAL,
                "OpenAI API key is empty",
            ));
        }
        Ok(Self {
            base_url,
            api_key: api_key.trim().to_string(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_output_tokens,
            system_prompt: cfg.system_prompt.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl Llm for OpenAiChatLlm {
    fn complete(&self, prompt: &str) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.base_url);
        let req = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let body = serde_json::to_value(req).map_err(|e| {
            AppError::new(codes::LLM_REQUEST_FAILED, "Failed to encode completion request")
                .with_details(e.to_string())
        })?;

        log::debug!(
            "requesting completion: model={} prompt_chars={}",
            self.model,
            prompt.chars().count()
        );
        let resp = ureq::post(&url)
            .timeout(self.timeout)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(body);

        match resp {
            Ok(r) if r.status() == 200 => {
                let v: ChatResponse = r.into_json().map_err(|e| {
                    AppError::new(codes::LLM_REQUEST_FAILED, "Failed to decode completion response")
                        .with_details(e.to_string())
                })?;
                let text = v
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .unwrap_or_default();
                if text.trim().is_empty() {
                    return Err(AppError::new(
                        codes::LLM_EMPTY_RESPONSE,
                        "Completion response was empty",
                    ));
                }
                Ok(text)
            }
            Ok(r) => Err(
                AppError::new(codes::LLM_REQUEST_FAILED, "Completion request failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(ureq::Error::Status(status, r)) => {
                let body = r.into_string().unwrap_or_default();
                Err(
                    AppError::new(codes::LLM_REQUEST_FAILED, "Completion request was rejected")
                        .with_details(format!("status={status}; body={}", truncate(&body, 300)))
                        .with_retryable(status == 429 || status >= 500),
                )
            }
            Err(e) => Err(
                AppError::new(codes::LLM_REQUEST_FAILED, "Failed to call completion endpoint")
                    .with_details(e.to_string())
                    .with_retryable(true),
            ),
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_never_includes_the_key() {
        let llm = OpenAiChatLlm::from_config(&LlmConfig::default(), " sk-secret ").expect("llm");
        let shown = format!("{llm:?}");
        assert!(shown.contains("gpt-4o"));
        assert!(!shown.contains("sk-secret"));
        assert_eq!(llm.model(), "gpt-4o");
    }
}
