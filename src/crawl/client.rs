use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::config::CrawlConfig;
use crate::crawl::poller::JobStatusSource;
use crate::crawl::{CrawlJob, JobStatus};
use crate::error::{AppError, Result};

// Create a static client to reuse connections
static CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(10)
        .build()
        .expect("Failed to build HTTP client")
});

#[derive(Serialize)]
struct SubmitRequest<'a> {
    urls: [&'a str; 1],
}

#[derive(Deserialize)]
struct TaskResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    markdown: Option<Value>,
    #[serde(default)]
    html: Option<Value>,
}

/// Client for the crawl service's job API.
#[derive(Clone, Debug)]
pub struct CrawlClient {
    http: Client,
    submit_url: Url,
    task_base: Url,
    token: String,
    submit_timeout: Duration,
}

impl CrawlClient {
    pub fn from_config(config: &CrawlConfig) -> Result<Self> {
        let api_url = config
            .api_url
            .as_deref()
            .ok_or_else(|| AppError::Config("CRAWL4AI_API_URL is not configured".to_string()))?;

        let submit_url = Url::parse(api_url)
            .map_err(|e| AppError::Config(format!("Invalid CRAWL4AI_API_URL: {}", e)))?;
        let task_base = task_base_url(&submit_url)?;

        Ok(Self {
            http: CLIENT.clone(),
            submit_url,
            task_base,
            token: config.api_token.clone(),
            submit_timeout: config.submit_timeout,
        })
    }

    /// Starts a crawl job for `url` and returns the job id assigned by the service.
    pub async fn submit(&self, url: &str) -> Result<String> {
        debug!(endpoint = %self.submit_url, %url, "Submitting crawl job");

        let response = self
            .http
            .post(self.submit_url.clone())
            .bearer_auth(&self.token)
            .timeout(self.submit_timeout)
            .json(&SubmitRequest { urls: [url] })
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        let job_id = extract_job_id(&body).ok_or_else(|| {
            AppError::InvalidUpstreamResponse("missing task_id".to_string())
        })?;

        info!(%url, job_id = %job_id, "Crawl job submitted");
        Ok(job_id)
    }

    pub fn task_url(&self, job_id: &str) -> Url {
        let mut url = self.task_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("task").push(job_id);
        }
        url
    }
}

#[async_trait]
impl JobStatusSource for CrawlClient {
    async fn job_status(&self, job_id: &str) -> Result<CrawlJob> {
        let task: TaskResponse = self
            .http
            .get(self.task_url(job_id))
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|e| AppError::InvalidUpstreamResponse(format!("unreadable task status: {}", e)))?;

        let as_text = |value: Option<Value>| value.and_then(|v| v.as_str().map(str::to_string));

        Ok(CrawlJob {
            job_id: job_id.to_string(),
            status: JobStatus::from_wire(task.status.as_deref().unwrap_or_default()),
            markdown: as_text(task.markdown),
            html: as_text(task.html),
        })
    }
}

/// The status endpoint lives next to the submission endpoint: a trailing
/// `/crawl` segment is dropped and `/task/<id>` appended.
fn task_base_url(submit_url: &Url) -> Result<Url> {
    let mut base = submit_url.clone();
    base.set_query(None);
    base.set_fragment(None);

    let path = base.path().trim_end_matches('/');
    let trimmed = path.strip_suffix("/crawl").unwrap_or(path).to_string();
    base.set_path(&trimmed);

    if base.cannot_be_a_base() {
        return Err(AppError::Config(format!(
            "Invalid CRAWL4AI_API_URL: {} cannot be used as a base address",
            submit_url
        )));
    }
    Ok(base)
}

fn extract_job_id(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    match json.get("task_id")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
