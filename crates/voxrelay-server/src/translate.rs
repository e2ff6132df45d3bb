//! Translation prompt construction and model-output interpretation.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use voxrelay_types::{TranslationRequest, TranslationResult};

const INSTRUCTION: &str = "Translate the provided TEXT into each TARGET in 'targets'.";

const OUTPUT_SHAPE: &str = "Return ONLY a JSON object of the form:\n\
{ \"source_lang\": \"<iso or 'auto-detected'>\", \"translations\": { \"<tgt>\": \"...\", ... } }\n\
No explanations. Here is the input JSON:\n";

/// Ways a chat completion can fail to carry a usable translation.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionError {
    /// `choices[0].message.content` is absent or not a string.
    MissingContent,
    /// The content string is not JSON.
    NonJsonContent(String),
    /// The content is JSON but not `{source_lang, translations}`.
    UnexpectedShape(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

/// Body of a chat-completion call in JSON mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub temperature: f32,
    pub response_format: Value,
    pub messages: Vec<ChatMessage>,
}

impl ChatCompletionRequest {
    pub fn for_translation(model: &str, request: &TranslationRequest) -> Self {
        Self {
            model: model.to_string(),
            temperature: 0.0,
            response_format: json!({ "type": "json_object" }),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt(request),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(request),
                },
            ],
        }
    }
}

pub fn system_prompt(request: &TranslationRequest) -> String {
    let formality = format!("- Formality: {}.", request.formality);
    [
        "You are a professional multilingual translator.",
        "Output MUST be valid JSON (no markdown, no code fences, no prose).",
        "Rules:",
        "- Be faithful and idiomatic in the TARGET language.",
        "- Preserve meaning, tone, numbers, punctuation, emoji, and line breaks.",
        "- Do NOT translate code blocks, variable names, file paths, or URLs.",
        "- If a term appears in GLOSSARY, use its mapped target form exactly.",
        "- If text is already in a target language, return it unchanged for that target.",
        formality.as_str(),
    ]
    .join("\n")
}

pub fn user_prompt(request: &TranslationRequest) -> String {
    let payload = json!({
        "instruction": INSTRUCTION,
        "source_lang": request.source_lang_or_auto(),
        "targets": request.targets,
        "glossary": request.glossary,
        "text": request.text,
    });
    format!("{OUTPUT_SHAPE}{payload}")
}

/// Pulls the translation out of a chat-completion response body.
///
/// The content is checked against the `{source_lang, translations}` shape and
/// then handed back as parsed, key order and extra fields included.
pub fn parse_completion(data: &Value) -> Result<Value, CompletionError> {
    let content = data
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or(CompletionError::MissingContent)?;

    let parsed: Value = serde_json::from_str(content)
        .map_err(|_| CompletionError::NonJsonContent(content.to_string()))?;

    if TranslationResult::deserialize(&parsed).is_err() {
        return Err(CompletionError::UnexpectedShape(content.to_string()));
    }
    Ok(parsed)
}
