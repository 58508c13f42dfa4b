//! # Quizzical
//!
//! 单局四选一知识问答客户端
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 与外部 API 交互，只暴露"取题""取摘要"能力
//! - `OpenTdbClient` - Open Trivia DB 题库
//! - `WikipediaClient` - Wikipedia 页面摘要
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 无状态或只持有随机源的单一能力
//! - `AlternativePlacement` - 确定正确答案的位置
//! - `ScoringEngine` - 计分与批改
//! - `SummaryEnricher` - 并发获取背景资料
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 会话状态机
//! - `QuizController` - NotStarted → InProgress → Submitted，按会话代数合并摘要
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/` - 终端应用，负责输入循环和展示
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{QuestionProvider, SummaryProvider};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{PlacedQuestion, Question, QuizSession, SessionStatus};
pub use orchestrator::QuizApp;
pub use workflow::{QuizController, SummaryMerge};
