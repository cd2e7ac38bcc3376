//! Asynchronous crawl orchestration: submit a job to the crawl service, then
//! poll its status until the crawled content is available.

pub mod client;
pub mod poller;

pub use client::CrawlClient;
pub use poller::{JobStatusSource, poll};

/// Lifecycle of a crawl job as reported by the crawl service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Completed,
    Failed,
}

impl JobStatus {
    /// Exact, case-sensitive match; any other string is still pending.
    pub fn from_wire(status: &str) -> Self {
        match status {
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }
}

/// Snapshot of a job's state. The crawl service owns the job; this is a
/// read-only view of one status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlJob {
    pub job_id: String,
    pub status: JobStatus,
    pub markdown: Option<String>,
    pub html: Option<String>,
}

impl CrawlJob {
    /// The crawled content, once the job is completed and has a non-empty
    /// content field. Markdown is preferred over HTML.
    pub fn into_content(self) -> Option<String> {
        if self.status != JobStatus::Completed {
            return None;
        }

        let non_empty = |field: Option<String>| field.filter(|s| !s.is_empty());
        non_empty(self.markdown).or_else(|| non_empty(self.html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(status: JobStatus, markdown: Option<&str>, html: Option<&str>) -> CrawlJob {
        CrawlJob {
            job_id: "job-1".to_string(),
            status,
            markdown: markdown.map(str::to_string),
            html: html.map(str::to_string),
        }
    }

    #[test]
    fn parses_wire_status() {
        assert_eq!(JobStatus::from_wire("completed"), JobStatus::Completed);
        assert_eq!(JobStatus::from_wire("failed"), JobStatus::Failed);
        assert_eq!(JobStatus::from_wire("COMPLETED"), JobStatus::Pending);
        assert_eq!(JobStatus::from_wire(" completed"), JobStatus::Pending);
        assert_eq!(JobStatus::from_wire("pending"), JobStatus::Pending);
        assert_eq!(JobStatus::from_wire("processing"), JobStatus::Pending);
    }

    #[test]
    fn prefers_markdown_over_html() {
        let content = job(JobStatus::Completed, Some("# Title"), Some("<h1>Title</h1>"));
        assert_eq!(content.into_content().as_deref(), Some("# Title"));
    }

    #[test]
    fn falls_back_to_html_when_markdown_empty() {
        let content = job(JobStatus::Completed, Some(""), Some("<p>hi</p>"));
        assert_eq!(content.into_content().as_deref(), Some("<p>hi</p>"));
    }

    #[test]
    fn completed_without_content_is_not_accepted() {
        assert_eq!(job(JobStatus::Completed, Some(""), None).into_content(), None);
        assert_eq!(job(JobStatus::Completed, None, None).into_content(), None);
    }

    #[test]
    fn content_ignored_until_completed() {
        assert_eq!(job(JobStatus::Pending, Some("# early"), None).into_content(), None);
        assert_eq!(job(JobStatus::Failed, Some("# partial"), None).into_content(), None);
    }
}
