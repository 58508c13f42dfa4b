use thiserror::Error;

use crate::models::SessionStatus;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 题库相关错误
    #[error("题库错误: {0}")]
    Provider(#[from] ProviderError),
    /// 答案校验错误
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 当前状态不允许该操作
    #[error("状态错误: 当前状态为 {current}，无法执行 {operation}")]
    InvalidState {
        operation: &'static str,
        current: SessionStatus,
    },
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 题库（题目提供方）错误
///
/// `start()` 遇到这些错误时会话保持原状态，可直接重试。
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        source: reqwest::Error,
    },
    /// 请求超时
    #[error("获取题目超时 (超过 {timeout_secs} 秒)")]
    Timeout { timeout_secs: u64 },
    /// HTTP 状态码错误
    #[error("API返回错误状态 ({endpoint}): {status}")]
    BadStatus {
        endpoint: String,
        status: reqwest::StatusCode,
    },
    /// 题库返回非零的 response_code
    #[error("题库返回错误码: {code}")]
    BadResponseCode { code: u8 },
    /// 题目数量不符
    #[error("题目数量不符: 期望 {expected} 道，实际 {actual} 道")]
    WrongQuestionCount { expected: usize, actual: usize },
    /// 单道题格式错误
    #[error("第 {index} 题格式错误: {reason}")]
    MalformedQuestion { index: usize, reason: String },
    /// JSON 解析失败
    #[error("JSON解析失败: {0}")]
    JsonParseFailed(#[from] serde_json::Error),
}

/// 答案校验错误，发生时不修改任何状态
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 提交时仍有未作答的题目
    #[error("还有 {} 道题未作答: {:?}", .unanswered.len(), .unanswered)]
    Unanswered { unanswered: Vec<usize> },
    /// 题目索引越界
    #[error("题目索引 {index} 超出范围 (共 {count} 道题)")]
    IndexOutOfRange { index: usize, count: usize },
    /// 所选值不是该题的选项
    #[error("第 {index} 题没有选项 {value:?}")]
    UnknownAlternative { index: usize, value: String },
}

/// 摘要获取失败
///
/// 不会作为硬错误抛出，对应的摘要保持“不可用”。
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("摘要请求失败 ({title}): {source}")]
    RequestFailed {
        title: String,
        source: reqwest::Error,
    },
    #[error("摘要请求返回错误状态 ({title}): {status}")]
    BadStatus {
        title: String,
        status: reqwest::StatusCode,
    },
    #[error("未找到词条: {title}")]
    NotFound { title: String },
    #[error("无效的摘要地址: {0}")]
    InvalidUrl(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        source: toml::de::Error,
    },
    /// 配置项取值无效
    #[error("配置项 {field} 无效: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建状态错误
    pub fn invalid_state(operation: &'static str, current: SessionStatus) -> Self {
        AppError::InvalidState { operation, current }
    }

    pub fn is_provider(&self) -> bool {
        matches!(self, AppError::Provider(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}

impl ProviderError {
    /// 创建API请求失败错误
    pub fn request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        ProviderError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// 创建题目格式错误
    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        ProviderError::MalformedQuestion {
            index,
            reason: reason.into(),
        }
    }
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
