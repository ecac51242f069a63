use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{AnalyzerError, TranscriptAnalyzer};
use crate::domain::{TodoItem, TranscriptAnalysis};

pub const DEFAULT_TITLE_MODEL: &str = "gpt-3.5-turbo";
pub const FALLBACK_TITLE: &str = "Untitled Meeting";

const TITLE_EXCERPT_CHARS: usize = 500;
const TITLE_MAX_TOKENS: u32 = 20;

const ANALYSIS_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that analyzes meeting transcriptions.";
const TITLE_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that generates concise meeting titles.";

/// Meeting report, to-do list and title through OpenAI chat completions.
pub struct OpenAiTranscriptAnalyzer {
    client: Client,
    api_key: String,
    base_url: String,
    title_model: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct AnalysisPayload {
    #[serde(default)]
    todo_list: Vec<String>,
    #[serde(default)]
    report: String,
}

impl OpenAiTranscriptAnalyzer {
    pub fn new(api_key: String, base_url: Option<String>, title_model: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            title_model: title_model.unwrap_or_else(|| DEFAULT_TITLE_MODEL.to_string()),
        }
    }

    async fn chat(&self, request: &ChatCompletionRequest<'_>) -> Result<String, AnalyzerError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AnalyzerError::ApiRequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalyzerError::ApiRequestFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AnalyzerError::InvalidResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AnalyzerError::InvalidResponse("no choices returned".to_string()))
    }

    async fn generate_title(&self, transcript: &str) -> String {
        let request = ChatCompletionRequest {
            model: &self.title_model,
            messages: vec![
                message("system", TITLE_SYSTEM_PROMPT),
                message("user", &build_title_prompt(transcript)),
            ],
            max_tokens: Some(TITLE_MAX_TOKENS),
            response_format: None,
        };

        match self.chat(&request).await {
            Ok(raw) => {
                let title = clean_title(&raw);
                if title.is_empty() {
                    FALLBACK_TITLE.to_string()
                } else {
                    title
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Title generation failed, using fallback");
                FALLBACK_TITLE.to_string()
            }
        }
    }
}

#[async_trait]
impl TranscriptAnalyzer for OpenAiTranscriptAnalyzer {
    async fn analyze(
        &self,
        transcript: &str,
        model: &str,
        custom_prompt: Option<&str>,
    ) -> Result<TranscriptAnalysis, AnalyzerError> {
        if self.api_key.trim().is_empty() {
            return Err(AnalyzerError::MissingCredential(
                "OpenAI API key is not set".to_string(),
            ));
        }

        let request = ChatCompletionRequest {
            model,
            messages: vec![
                message("system", ANALYSIS_SYSTEM_PROMPT),
                message("user", &build_analysis_prompt(transcript, custom_prompt)),
            ],
            max_tokens: None,
            response_format: Some(ResponseFormat {
                kind: "json_object",
            }),
        };

        tracing::debug!(model, chars = transcript.len(), "Requesting transcript analysis");
        let content = self.chat(&request).await?;
        let payload = parse_analysis(&content)?;
        let title = self.generate_title(transcript).await;

        tracing::info!(
            todo_items = payload.todo_list.len(),
            title = %title,
            "Transcript analysis completed"
        );

        Ok(TranscriptAnalysis {
            title,
            report: payload.report,
            todo_items: payload.todo_list.into_iter().map(TodoItem::open).collect(),
        })
    }
}

fn message(role: &str, content: &str) -> ChatMessage {
    ChatMessage {
        role: role.to_string(),
        content: content.to_string(),
    }
}

fn parse_analysis(content: &str) -> Result<AnalysisPayload, AnalyzerError> {
    serde_json::from_str(content).map_err(|e| AnalyzerError::InvalidResponse(e.to_string()))
}

pub fn build_analysis_prompt(transcript: &str, custom_prompt: Option<&str>) -> String {
    let mut instructions = String::from(
        "You are an expert AI assistant. Analyze the following meeting transcription and provide:\n\
         1. A list of \"To Do\" items.\n\
         2. A concise meeting report summarizing the key points, decisions, and next steps.",
    );

    if let Some(extra) = custom_prompt.map(str::trim).filter(|p| !p.is_empty()) {
        instructions.push_str("\n\nAdditional Instructions:\n");
        instructions.push_str(extra);
    }

    format!(
        "{instructions}\n\nTranscription:\n{transcript}\n\n\
         Format the output as a JSON object with keys \"todo_list\" (list of strings) and \"report\" (string)."
    )
}

pub fn build_title_prompt(transcript: &str) -> String {
    let excerpt: String = transcript.chars().take(TITLE_EXCERPT_CHARS).collect();
    format!(
        "Based on the following meeting transcription, generate a short, descriptive title (maximum 5 words).\n\
         The title should capture the main topic or purpose of the meeting.\n\n\
         Transcription:\n{excerpt}...\n\n\
         Respond with ONLY the title, nothing else."
    )
}

pub fn clean_title(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_prompt_includes_transcript_and_output_contract() {
        let prompt = build_analysis_prompt("we agreed to ship friday", None);

        assert!(prompt.contains("we agreed to ship friday"));
        assert!(prompt.contains("\"todo_list\""));
        assert!(!prompt.contains("Additional Instructions"));
    }

    #[test]
    fn analysis_prompt_appends_custom_instructions() {
        let prompt = build_analysis_prompt("text", Some("Focus on budget"));

        assert!(prompt.contains("Additional Instructions:\nFocus on budget"));
    }

    #[test]
    fn blank_custom_prompt_is_ignored() {
        let prompt = build_analysis_prompt("text", Some("   "));

        assert!(!prompt.contains("Additional Instructions"));
    }

    #[test]
    fn title_prompt_uses_only_leading_excerpt() {
        let transcript = format!("{}{}", "a".repeat(TITLE_EXCERPT_CHARS), "TAIL");

        let prompt = build_title_prompt(&transcript);

        assert!(!prompt.contains("TAIL"));
    }

    #[test]
    fn title_is_stripped_of_quotes() {
        assert_eq!(clean_title(" \"Budget Review\"\n"), "Budget Review");
        assert_eq!(clean_title("'Sprint Planning'"), "Sprint Planning");
    }

    #[test]
    fn parses_analysis_payload_with_missing_keys() {
        let payload = parse_analysis(r#"{"report": "Short"}"#).unwrap();

        assert!(payload.todo_list.is_empty());
        assert_eq!(payload.report, "Short");
    }

    #[test]
    fn rejects_non_json_analysis() {
        assert!(matches!(
            parse_analysis("not json"),
            Err(AnalyzerError::InvalidResponse(_))
        ));
    }
}
