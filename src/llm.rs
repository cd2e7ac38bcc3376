use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::LlmConfig;
use crate::content::{build_prompt, prepare_content};
use crate::error::{AppError, Result};

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that extracts information from text and returns it in JSON format.";
const OPENAI_MODEL: &str = "gpt-4";
const GROQ_MODEL: &str = "mixtral-8x7b-32768";
const GEMINI_MODEL: &str = "gemini-pro";

// Outermost braces, for replies that wrap the JSON object in prose or fences
static JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("Failed to compile JSON object pattern"));

/// The LLM providers a caller may pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelChoice {
    #[default]
    Gpt4,
    Gemini,
    Groq,
}

impl ModelChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelChoice::Gpt4 => "gpt-4",
            ModelChoice::Gemini => "gemini",
            ModelChoice::Groq => "groq",
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelChoice {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gpt-4" => Ok(ModelChoice::Gpt4),
            "gemini" => Ok(ModelChoice::Gemini),
            "groq" => Ok(ModelChoice::Groq),
            _ => Err(AppError::Validation("Invalid model specified".to_string())),
        }
    }
}

/// A named piece of information the model is asked to locate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub content: String,
    pub fields: Vec<FieldSpec>,
    pub model: ModelChoice,
}

pub type ExtractedData = BTreeMap<String, String>;

#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractedData>;
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

/// Extractor backed by the hosted LLM providers.
#[derive(Clone)]
pub struct LlmExtractor {
    client: Client,
    config: LlmConfig,
}

impl LlmExtractor {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// OpenAI-compatible chat completion, shared by OpenAI and Groq.
    async fn chat_completion(
        &self,
        base_url: &str,
        api_key: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String> {
        let body = ChatRequest {
            model: model.into(),
            messages: vec![
                Message {
                    role: "system".into(),
                    content: SYSTEM_PROMPT.into(),
                },
                Message {
                    role: "user".into(),
                    content: prompt.into(),
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_object".into(),
            },
        };

        let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        let json: Value = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .timeout(self.config.request_timeout)
            .json(&body)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(provider_error)?
            .json()
            .await
            .map_err(provider_error)?;

        let message = &json["choices"][0]["message"];
        if !message.is_object() {
            return Err(AppError::Extraction(
                "Invalid response format from LLM".to_string(),
            ));
        }

        Ok(message["content"].as_str().unwrap_or_default().to_string())
    }

    async fn gemini(&self, api_key: &str, prompt: &str) -> Result<String> {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.into(),
                }],
            }],
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.gemini_base_url.trim_end_matches('/'),
            GEMINI_MODEL
        );
        let json: Value = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .timeout(self.config.request_timeout)
            .json(&body)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(provider_error)?
            .json()
            .await
            .map_err(provider_error)?;

        let parts = json["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| AppError::Extraction("Invalid response format from Gemini".to_string()))?;

        Ok(parts
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect::<String>())
    }
}

#[async_trait]
impl Extractor for LlmExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractedData> {
        let content = prepare_content(&request.content);
        let prompt = build_prompt(&content, &request.fields);
        debug!(model = %request.model, prompt_len = prompt.len(), "Built extraction prompt");

        let reply = match request.model {
            ModelChoice::Gpt4 => {
                let key = require_key(&self.config.openai_api_key, "OPENAI_API_KEY")?;
                self.chat_completion(&self.config.openai_base_url, key, OPENAI_MODEL, &prompt)
                    .await?
            }
            ModelChoice::Groq => {
                let key = require_key(&self.config.groq_api_key, "GROQ_API_KEY")?;
                self.chat_completion(&self.config.groq_base_url, key, GROQ_MODEL, &prompt)
                    .await?
            }
            ModelChoice::Gemini => {
                let key = require_key(&self.config.gemini_api_key, "GEMINI_API_KEY")?;
                self.gemini(key, &prompt).await?
            }
        };

        let data = parse_extraction(&reply)?;
        info!(model = %request.model, fields = data.len(), "Extraction completed");
        Ok(data)
    }
}

fn require_key<'a>(key: &'a Option<String>, name: &str) -> Result<&'a str> {
    key.as_deref()
        .ok_or_else(|| AppError::Config(format!("{} is not configured", name)))
}

/// Provider URLs may carry credentials, so the URL is stripped before the
/// error reaches logs or the response body.
fn provider_error(err: reqwest::Error) -> AppError {
    let err = err.without_url();
    if err.is_timeout() {
        return AppError::Extraction("LLM provider timed out".to_string());
    }
    AppError::Extraction(err.to_string())
}

/// Turns a model reply into a flat field map. An empty reply yields an empty map.
pub fn parse_extraction(reply: &str) -> Result<ExtractedData> {
    let reply = reply.trim();
    if reply.is_empty() {
        return Ok(ExtractedData::new());
    }

    let object = match serde_json::from_str::<Value>(reply) {
        Ok(Value::Object(map)) => map,
        _ => JSON_OBJECT
            .find(reply)
            .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok())
            .and_then(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .ok_or_else(|| {
                AppError::Extraction("Failed to parse model response as JSON".to_string())
            })?,
    };

    Ok(object
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Null => "N/A".to_string(),
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}
