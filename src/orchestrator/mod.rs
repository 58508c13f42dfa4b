//! 编排层
//!
//! 终端应用：读取命令、驱动会话控制器、渲染题目和结果

pub mod command;
pub mod quiz_app;

pub use command::Command;
pub use quiz_app::QuizApp;
