/// 摘要 API 客户端
///
/// 按词条名获取 Wikipedia 页面摘要
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::SummaryError;

/// 背景资料提供方
///
/// 尽力而为：每次请求相互独立，失败只影响对应的那一道题。
#[async_trait]
pub trait SummaryProvider: Send + Sync {
    async fn fetch_summary(&self, title: &str) -> Result<String, SummaryError>;
}

/// Wikipedia REST 摘要客户端
pub struct WikipediaClient {
    client: Client,
    base_url: Url,
}

impl WikipediaClient {
    pub fn new(config: &Config) -> Result<Self, SummaryError> {
        let base_url = Url::parse(&config.summary_api_base_url)
            .map_err(|e| SummaryError::InvalidUrl(format!("{}: {}", config.summary_api_base_url, e)))?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|source| SummaryError::RequestFailed {
                title: String::new(),
                source,
            })?;

        Ok(Self { client, base_url })
    }

    /// 拼接词条地址，词条名作为单独的路径段编码
    fn summary_url(&self, title: &str) -> Result<Url, SummaryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SummaryError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(title);
        Ok(url)
    }
}

#[async_trait]
impl SummaryProvider for WikipediaClient {
    async fn fetch_summary(&self, title: &str) -> Result<String, SummaryError> {
        let url = self.summary_url(title)?;
        debug!("请求摘要: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| SummaryError::RequestFailed {
                title: title.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(SummaryError::NotFound {
                    title: title.to_string(),
                })
            }
            status if !status.is_success() => {
                return Err(SummaryError::BadStatus {
                    title: title.to_string(),
                    status,
                })
            }
            _ => {}
        }

        let page: PageSummary =
            response
                .json()
                .await
                .map_err(|source| SummaryError::RequestFailed {
                    title: title.to_string(),
                    source,
                })?;

        page.into_extract().ok_or_else(|| SummaryError::NotFound {
            title: title.to_string(),
        })
    }
}

/// 摘要接口响应中用到的字段
#[derive(Debug, Deserialize)]
struct PageSummary {
    #[serde(default)]
    extract: Option<String>,
}

impl PageSummary {
    fn into_extract(self) -> Option<String> {
        self.extract
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
    }
}
