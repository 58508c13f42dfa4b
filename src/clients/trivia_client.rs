/// 题库 API 客户端
///
/// 封装所有与 Open Trivia DB 相关的调用逻辑
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ProviderError;
use crate::models::{Category, Question, RawQuestion};

/// 题型参数，固定为四选一
pub const MULTIPLE_CHOICE: &str = "multiple";

/// 一次取题请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRequest {
    pub amount: usize,
    pub category: Category,
}

impl BatchRequest {
    pub fn new(amount: usize, category: Category) -> Self {
        Self { amount, category }
    }
}

/// 题目提供方
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// 获取一整批已校验的题目
    async fn fetch_batch(&self, request: &BatchRequest) -> Result<Vec<Question>, ProviderError>;
}

/// Open Trivia DB 客户端
pub struct OpenTdbClient {
    client: Client,
    base_url: String,
}

impl OpenTdbClient {
    /// 创建新的题库客户端
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ProviderError::request_failed(&config.trivia_api_base_url, e))?;

        Ok(Self {
            client,
            base_url: config.trivia_api_base_url.clone(),
        })
    }
}

#[async_trait]
impl QuestionProvider for OpenTdbClient {
    async fn fetch_batch(&self, request: &BatchRequest) -> Result<Vec<Question>, ProviderError> {
        debug!(
            "请求题目: amount={}, category={}, type={}",
            request.amount,
            request.category.code(),
            MULTIPLE_CHOICE
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("amount", request.amount.to_string()),
                ("category", request.category.code().to_string()),
                ("type", MULTIPLE_CHOICE.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::request_failed(&self.base_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::BadStatus {
                endpoint: self.base_url.clone(),
                status,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::request_failed(&self.base_url, e))?;

        debug!("题库返回 {} 字节", body.len());

        parse_batch(&body, request.amount)
    }
}

/// Open Trivia DB 响应
#[derive(Debug, Deserialize)]
struct OpenTdbResponse {
    response_code: u8,
    #[serde(default)]
    results: Vec<RawQuestion>,
}

/// 解析并校验题库返回的 JSON
///
/// # 参数
/// - `body`: 响应体
/// - `expected`: 期望的题目数量
///
/// # 返回
/// 恰好 `expected` 道格式正确的题目，否则返回 `ProviderError`
pub fn parse_batch(body: &str, expected: usize) -> Result<Vec<Question>, ProviderError> {
    let response: OpenTdbResponse = serde_json::from_str(body)?;

    if response.response_code != 0 {
        // 5 表示请求过于频繁
        if response.response_code == 5 {
            warn!("题库请求频率限制，请稍后重试");
        }
        return Err(ProviderError::BadResponseCode {
            code: response.response_code,
        });
    }

    if response.results.len() != expected {
        return Err(ProviderError::WrongQuestionCount {
            expected,
            actual: response.results.len(),
        });
    }

    response
        .results
        .into_iter()
        .enumerate()
        .map(|(index, raw)| raw.into_question(index))
        .collect()
}
