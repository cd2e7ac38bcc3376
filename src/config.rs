use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};

const DEFAULT_RATE_LIMIT_WINDOW_MS: u64 = 60_000;
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 60;
const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 10;
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub rate_limit: RateLimitConfig,
    pub crawl: CrawlConfig,
    pub llm: LlmConfig,
}

#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
}

/// Crawl service settings. `api_url` is the job-submission endpoint; it is
/// optional at startup and checked per request.
#[derive(Clone, Debug)]
pub struct CrawlConfig {
    pub api_url: Option<String>,
    pub api_token: String,
    pub submit_timeout: Duration,
    pub poll: PollSettings,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub openai_base_url: String,
    pub gemini_base_url: String,
    pub groq_base_url: String,
    pub request_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            gemini_api_key: None,
            groq_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            groq_base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_var("PORT", 3000u16)?;
        let ip = IpAddr::from_str(&host)
            .map_err(|e| AppError::Config(format!("Invalid host address: {}", e)))?;

        let rate_limit = RateLimitConfig {
            window: Duration::from_millis(parse_var(
                "RATE_LIMIT_WINDOW_MS",
                DEFAULT_RATE_LIMIT_WINDOW_MS,
            )?),
            max_requests: parse_var("RATE_LIMIT_MAX_REQUESTS", DEFAULT_RATE_LIMIT_MAX_REQUESTS)?,
        };

        let crawl = CrawlConfig {
            api_url: optional_var("CRAWL4AI_API_URL"),
            api_token: env::var("CRAWL4AI_API_AUTH").unwrap_or_default(),
            submit_timeout: SUBMIT_TIMEOUT,
            poll: PollSettings {
                max_attempts: parse_var("CRAWL_POLL_MAX_ATTEMPTS", DEFAULT_POLL_MAX_ATTEMPTS)?,
                interval: Duration::from_millis(parse_var(
                    "CRAWL_POLL_INTERVAL_MS",
                    DEFAULT_POLL_INTERVAL_MS,
                )?),
            },
        };

        let llm = LlmConfig {
            openai_api_key: optional_var("OPENAI_API_KEY"),
            gemini_api_key: optional_var("GEMINI_API_KEY"),
            groq_api_key: optional_var("GROQ_API_KEY"),
            openai_base_url: optional_var("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            gemini_base_url: optional_var("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            groq_base_url: optional_var("GROQ_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(parse_var(
                "LLM_TIMEOUT_SECS",
                DEFAULT_LLM_TIMEOUT_SECS,
            )?),
        };

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            rate_limit,
            crawl,
            llm,
        })
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_var(name) {
        Some(raw) => parse_value(name, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e)))
}
