use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::Category;

/// 指定配置文件路径的环境变量
pub const CONFIG_FILE_ENV: &str = "QUIZ_CONFIG_FILE";

/// 程序配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 每局题目数量
    pub question_count: usize,
    /// 题目分类
    pub category: Category,
    /// 题库 API 地址
    pub trivia_api_base_url: String,
    /// 摘要 API 地址（词条名拼接在末尾）
    pub summary_api_base_url: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 请求时使用的 User-Agent
    pub user_agent: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            question_count: 5,
            category: Category::Geography,
            trivia_api_base_url: "https://opentdb.com/api.php".to_string(),
            summary_api_base_url: "https://en.wikipedia.org/api/rest_v1/page/summary".to_string(),
            request_timeout_secs: 10,
            user_agent: concat!("quizzical/", env!("CARGO_PKG_VERSION")).to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，缺省字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 加载配置：设置了 `QUIZ_CONFIG_FILE` 时先读文件，再用环境变量覆盖，最后校验
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_file(path)?,
            _ => Self::default(),
        };
        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(self) -> Self {
        Self {
            question_count: std::env::var("QUIZ_QUESTION_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(self.question_count),
            category: std::env::var("QUIZ_CATEGORY").ok().and_then(|v| v.parse().ok()).and_then(Category::from_code).unwrap_or(self.category),
            trivia_api_base_url: std::env::var("TRIVIA_API_BASE_URL").unwrap_or(self.trivia_api_base_url),
            summary_api_base_url: std::env::var("SUMMARY_API_BASE_URL").unwrap_or(self.summary_api_base_url),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.request_timeout_secs),
            user_agent: std::env::var("QUIZ_USER_AGENT").unwrap_or(self.user_agent),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.question_count == 0 {
            return Err(ConfigError::invalid("question_count", "题目数量必须大于 0"));
        }
        // Open Trivia DB 单次最多返回 50 道题
        if self.question_count > 50 {
            return Err(ConfigError::invalid(
                "question_count",
                format!("题目数量最多 50，当前为 {}", self.question_count),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid("request_timeout_secs", "超时时间必须大于 0"));
        }
        if self.trivia_api_base_url.trim().is_empty() {
            return Err(ConfigError::invalid("trivia_api_base_url", "地址不能为空"));
        }
        if self.summary_api_base_url.trim().is_empty() {
            return Err(ConfigError::invalid("summary_api_base_url", "地址不能为空"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
