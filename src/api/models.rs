use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::llm::{ExtractedData, ExtractionRequest, FieldSpec, ModelChoice};

#[derive(Debug, Deserialize)]
pub struct CrawlRequest {
    #[serde(default)]
    pub url: Option<String>,
}

impl CrawlRequest {
    /// The target URL, accepted if a standard URL parser accepts it.
    pub fn validated_url(&self) -> Result<String> {
        let url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AppError::Validation("URL is required".to_string()))?;

        url::Url::parse(url)
            .map_err(|_| AppError::Validation("Invalid URL format".to_string()))?;

        Ok(url.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct CrawlResponse {
    pub data: String,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<FieldSpec>>,
    #[serde(default)]
    pub model: Option<String>,
}

impl ExtractRequest {
    pub fn into_extraction(self) -> Result<ExtractionRequest> {
        let content = self
            .content
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Content is required".to_string()))?;

        let fields = self.fields.filter(|fields| !fields.is_empty()).ok_or_else(|| {
            AppError::Validation("Fields array is required and must not be empty".to_string())
        })?;

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if field.name.trim().is_empty() || field.description.trim().is_empty() {
                return Err(AppError::Validation(
                    "Each field must have a name and description".to_string(),
                ));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(AppError::Validation(format!(
                    "Duplicate field name: {}",
                    field.name
                )));
            }
        }

        let model = match self.model.as_deref() {
            Some(name) => name.parse::<ModelChoice>()?,
            None => ModelChoice::default(),
        };

        Ok(ExtractionRequest {
            content,
            fields,
            model,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub extracted_data: ExtractedData,
}
