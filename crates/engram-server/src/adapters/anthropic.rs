//! Anthropic Importance Classifier
//!
//! Asks a small Claude model whether an interaction is worth remembering.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use engram::domain::services::text::{truncate_chars, MAX_REQUEST_CHARS, MAX_RESPONSE_CHARS};
use engram::{ClassificationResult, DomainError, ImportanceClassifier, RawClassification};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 500;

pub struct AnthropicClassifier {
    client: Client,
    api_key: Option<String>,
    model: String,
    url: String,
}

impl AnthropicClassifier {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.into(),
            url: MESSAGES_URL.to_string(),
        }
    }

    /// Point at a different Messages endpoint (proxies, gateways)
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl ImportanceClassifier for AnthropicClassifier {
    async fn classify(
        &self,
        request: &str,
        response: &str,
    ) -> Result<ClassificationResult, DomainError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| DomainError::Classifier("ANTHROPIC_API_KEY not set".to_string()))?;

        let body = MessageRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: build_prompt(request, response),
            }],
        };

        let reply = self
            .client
            .post(&self.url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Classifier(format!("Request failed: {e}")))?;

        if !reply.status().is_success() {
            let status = reply.status();
            let text = reply.text().await.unwrap_or_default();
            return Err(DomainError::Classifier(format!(
                "API error {}: {}",
                status.as_u16(),
                text
            )));
        }

        let message: MessageResponse = reply
            .json()
            .await
            .map_err(|e| DomainError::Classifier(format!("Parse error: {e}")))?;

        parse_verdict(&message)
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

fn build_prompt(request: &str, response: &str) -> String {
    format!(
        r#"Analyze this AI interaction and decide whether it should be kept as long-term knowledge.

REQUEST:
{request}

RESPONSE:
{response}

Reply ONLY with valid JSON in this format:
{{
  "isImportant": boolean,
  "type": "decision" | "fix" | "learning" | "pattern" | "preference" | "config" | "error" | "context",
  "summary": "Short summary (max 200 characters)",
  "tags": ["tag1", "tag2", "tag3"],
  "confidence": 0.0-1.0,
  "context": "Optional: why this matters"
}}

Rules:
- isImportant=true ONLY when a decision was made, a bug was fixed, something new was learned or a pattern was established
- isImportant=false for small talk, simple questions, code generation without explanation and repetitions
- confidence: 0.9+ = very important, 0.7-0.9 = important, below 0.7 = do not keep
- tags: at most 5, lowercase, useful for search"#,
        request = truncate_chars(request, MAX_REQUEST_CHARS),
        response = truncate_chars(response, MAX_RESPONSE_CHARS),
    )
}

fn parse_verdict(message: &MessageResponse) -> Result<ClassificationResult, DomainError> {
    let text = message
        .content
        .first()
        .filter(|block| block.kind == "text")
        .and_then(|block| block.text.as_deref())
        .ok_or_else(|| DomainError::Classifier("Reply has no text block".to_string()))?;

    let json = extract_json_object(text)
        .ok_or_else(|| DomainError::Classifier("Reply contains no JSON object".to_string()))?;

    let raw: RawClassification = serde_json::from_str(json)
        .map_err(|e| DomainError::Classifier(format!("Invalid verdict JSON: {e}")))?;

    Ok(ClassificationResult::sanitized(raw))
}

/// Outermost `{...}` span of the text
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

// ============================================
// Request/Response Types
// ============================================

#[derive(Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessageResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use engram::MemoryKind;

    fn reply(text: &str) -> MessageResponse {
        MessageResponse {
            content: vec![ContentBlock {
                kind: "text".to_string(),
                text: Some(text.to_string()),
            }],
        }
    }

    #[test]
    fn test_extract_json_object() {
        assert_eq!(extract_json_object(r#"{"a":1}"#), Some(r#"{"a":1}"#));
        assert_eq!(
            extract_json_object("Sure!\n{\"a\": {\"b\": 2}}\nDone."),
            Some("{\"a\": {\"b\": 2}}")
        );
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_parse_verdict_sanitizes() {
        let message = reply(
            r#"Here you go:
{"isImportant": true, "type": "Fix", "summary": "Pinned serde", "tags": ["Serde", "serde", "build"], "confidence": 1.4}"#,
        );
        let verdict = parse_verdict(&message).unwrap();

        assert!(verdict.is_important);
        assert_eq!(verdict.kind, MemoryKind::Fix);
        assert_eq!(verdict.tags, vec!["serde", "build"]);
        assert_eq!(verdict.confidence, 1.0);
        assert!(verdict.context.is_none());
    }

    #[test]
    fn test_parse_verdict_failures() {
        assert!(parse_verdict(&reply("I cannot answer that")).is_err());
        assert!(parse_verdict(&reply("{not json}")).is_err());
        assert!(parse_verdict(&MessageResponse { content: vec![] }).is_err());
    }

    #[test]
    fn test_prompt_truncates_inputs() {
        let prompt = build_prompt(&"q".repeat(5000), &"r".repeat(5000));
        assert!(prompt.contains(&"q".repeat(2000)));
        assert!(!prompt.contains(&"q".repeat(2001)));
        assert!(prompt.contains(&"r".repeat(3000)));
        assert!(!prompt.contains(&"r".repeat(3001)));
    }

    #[tokio::test]
    async fn test_missing_key_is_classifier_error() {
        let classifier = AnthropicClassifier::new(None, "model");
        let err = classifier.classify("q", "a").await.unwrap_err();
        assert!(matches!(err, DomainError::Classifier(_)));
    }
}
