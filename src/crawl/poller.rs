use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::PollSettings;
use crate::crawl::{CrawlJob, JobStatus};
use crate::error::{AppError, Result};

/// Anything that can report the current state of a crawl job.
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    async fn job_status(&self, job_id: &str) -> Result<CrawlJob>;
}

/// Queries `job_id` until it completes with content, at most
/// `settings.max_attempts` times, waiting `settings.interval` between queries.
///
/// A failed status query aborts the loop immediately. A job reported as
/// `failed` keeps being polled like a pending one.
pub async fn poll<S>(source: &S, job_id: &str, settings: PollSettings) -> Result<String>
where
    S: JobStatusSource + ?Sized,
{
    for attempt in 1..=settings.max_attempts {
        let job = source.job_status(job_id).await?;
        let status = job.status;

        if let Some(content) = job.into_content() {
            info!(job_id, attempt, "Crawl result ready");
            return Ok(content);
        }

        if status == JobStatus::Failed {
            warn!(job_id, attempt, "Crawl service reports the job as failed");
        } else {
            debug!(job_id, attempt, ?status, "Crawl result not ready yet");
        }

        if attempt < settings.max_attempts {
            tokio::time::sleep(settings.interval).await;
        }
    }

    warn!(job_id, attempts = settings.max_attempts, "Gave up waiting for crawl result");
    Err(AppError::Timeout("Timed out waiting for crawl result".to_string()))
}
