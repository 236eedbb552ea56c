//! 页面抓取

use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};

use crate::infrastructure::config::ScrapeConfig;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("请求失败: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("无效的链接: {0}")]
    InvalidUrl(String),
}

/// 抓取到的页面
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 带超时和请求头的 GET
pub trait PageFetcher: Send + Sync {
    fn get(&self, url: &str) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send;
}

/// 基于 reqwest 的实现，不重试
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &ScrapeConfig) -> Result<Self, FetchError> {
        Self::with_timeout(&config.user_agent, Duration::from_secs(config.timeout_seconds))
    }

    pub fn with_timeout(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-GB,en;q=0.9"));

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let url = reqwest::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FetchedPage { status, body })
    }
}
