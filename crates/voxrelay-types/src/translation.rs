//! Translation request and result shapes.
//!
//! Requests arrive as loosely-typed JSON from the browser, so validation is
//! done against a [`serde_json::Value`] rather than through a derived
//! `Deserialize`: a wrong-typed `targets` must produce the same 400 message as
//! a missing one.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Register the translation should be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formality {
    Formal,
    #[default]
    Neutral,
    Casual,
}

impl Formality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Formal => "formal",
            Self::Neutral => "neutral",
            Self::Casual => "casual",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "formal" => Some(Self::Formal),
            "neutral" => Some(Self::Neutral),
            "casual" => Some(Self::Casual),
            _ => None,
        }
    }
}

impl fmt::Display for Formality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller input rejected before any upstream call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// `text` is missing or empty, or `targets` is not a non-empty array of strings.
    #[error("Provide 'text' and non-empty array 'targets'.")]
    MissingTextOrTargets,

    /// The request body could not be read as a JSON object.
    #[error("Request body must be a JSON object.")]
    MalformedBody,

    /// `source_lang` was present but not a string.
    #[error("'source_lang' must be a string.")]
    InvalidSourceLang,

    /// `formality` was not one of the supported registers.
    #[error("'formality' must be one of formal, neutral, casual (got {0}).")]
    InvalidFormality(String),

    /// `glossary` was not an object of string values.
    #[error("'glossary' must be an object mapping terms to strings.")]
    InvalidGlossary,
}

/// A validated translation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationRequest {
    pub text: String,
    pub targets: Vec<String>,
    /// `None` lets the model detect the source language.
    pub source_lang: Option<String>,
    pub formality: Formality,
    pub glossary: BTreeMap<String, String>,
}

impl TranslationRequest {
    /// Validates a raw request body.
    ///
    /// `null` and absent optional fields fall back to their defaults; an empty
    /// `source_lang` is treated as absent.
    pub fn from_value(body: &Value) -> Result<Self, ValidationError> {
        let object = match body {
            Value::Object(map) => map,
            Value::Null => return Err(ValidationError::MissingTextOrTargets),
            _ => return Err(ValidationError::MalformedBody),
        };

        let text = match object.get("text") {
            Some(Value::String(text)) if !text.is_empty() => text.clone(),
            _ => return Err(ValidationError::MissingTextOrTargets),
        };

        let targets = match object.get("targets") {
            Some(Value::Array(items)) if !items.is_empty() => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or(ValidationError::MissingTextOrTargets)?,
            _ => return Err(ValidationError::MissingTextOrTargets),
        };

        let source_lang = match object.get("source_lang") {
            None | Some(Value::Null) => None,
            Some(Value::String(lang)) if lang.trim().is_empty() => None,
            Some(Value::String(lang)) => Some(lang.trim().to_string()),
            Some(_) => return Err(ValidationError::InvalidSourceLang),
        };

        let formality = match object.get("formality") {
            None | Some(Value::Null) => Formality::default(),
            Some(Value::String(raw)) => Formality::parse(raw)
                .ok_or_else(|| ValidationError::InvalidFormality(raw.clone()))?,
            Some(other) => return Err(ValidationError::InvalidFormality(other.to_string())),
        };

        let glossary = match object.get("glossary") {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::Object(entries)) => entries
                .iter()
                .map(|(term, mapped)| mapped.as_str().map(|m| (term.clone(), m.to_string())))
                .collect::<Option<BTreeMap<_, _>>>()
                .ok_or(ValidationError::InvalidGlossary)?,
            Some(_) => return Err(ValidationError::InvalidGlossary),
        };

        Ok(Self {
            text,
            targets,
            source_lang,
            formality,
            glossary,
        })
    }

    /// Source language label sent to the model.
    pub fn source_lang_or_auto(&self) -> &str {
        self.source_lang.as_deref().unwrap_or("auto")
    }
}

/// Shape the model's translation output must have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResult {
    /// ISO code or the model's `auto-detected` marker.
    pub source_lang: String,
    /// Target code → translated text.
    pub translations: BTreeMap<String, String>,
}
