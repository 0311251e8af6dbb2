use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::provider::{
    CompletionClient, CompletionRequest, CompletionResponse, ProviderError, TokenUsage,
};

pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com".to_string()),
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let body = build_request_body(req);
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));

        debug!(model = %req.model, prompt_len = req.prompt.len(), "sending request to OpenAI");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status == 429 {
            let retry = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|s| s * 1000) // convert seconds to ms
                .unwrap_or(5000);
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry,
            });
        }

        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "OpenAI API error");
            return Err(ProviderError::Api {
                status,
                message: text,
            });
        }

        let api_resp: ApiResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        parse_response(api_resp)
    }
}

fn build_request_body(req: &CompletionRequest) -> serde_json::Value {
    serde_json::json!({
        "model": req.model,
        "messages": [{ "role": "user", "content": req.prompt }],
        "max_tokens": req.params.max_tokens,
        "temperature": req.params.temperature,
        "top_p": req.params.top_p,
        "frequency_penalty": req.params.frequency_penalty,
        "presence_penalty": req.params.presence_penalty,
    })
}

fn parse_response(resp: ApiResponse) -> Result<CompletionResponse, ProviderError> {
    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Parse("response has no choices".to_string()))?;
    let content = choice
        .message
        .content
        .ok_or_else(|| ProviderError::Parse("choice has no content".to_string()))?;

    let usage = resp
        .usage
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        content,
        model: resp.model,
        usage,
        stop_reason: choice.finish_reason.unwrap_or_default(),
    })
}

// OpenAI API response types (deserialization only)

#[derive(Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use recap_core::config::GenerationParams;

    #[test]
    fn request_body_carries_generation_params() {
        let req = CompletionRequest {
            model: "gpt-3.5-turbo-16k".to_string(),
            prompt: "chat log".to_string(),
            params: GenerationParams::default(),
        };
        let body = build_request_body(&req);
        assert_eq!(body["model"], "gpt-3.5-turbo-16k");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "chat log");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["presence_penalty"], 1.0);
        assert_eq!(body["top_p"], 1.0);
    }

    #[test]
    fn parses_first_choice_and_usage() {
        let json = r#"{
            "model": "gpt-3.5-turbo-16k-0613",
            "choices": [{"message": {"role": "assistant", "content": "summary"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 5000, "completion_tokens": 200, "total_tokens": 5200}
        }"#;
        let resp = parse_response(serde_json::from_str(json).unwrap()).unwrap();
        assert_eq!(resp.content, "summary");
        assert_eq!(resp.usage.total_tokens, 5200);
        assert_eq!(resp.stop_reason, "stop");
    }

    #[test]
    fn empty_choices_is_a_parse_error() {
        let json = r#"{"model": "m", "choices": []}"#;
        let err = parse_response(serde_json::from_str(json).unwrap()).unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)));
    }
}
