//! 终端测验应用 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：创建题库 / 摘要客户端和会话控制器
//! 2. **输入循环**：读取命令并调用控制器的对应操作
//! 3. **展示**：只在这里对题干和选项做 HTML 实体解码
//! 4. **摘要合并**：等待输入的同时接收后台返回的摘要

use anyhow::{Context, Result};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{AppError, ValidationError};
use crate::models::{PlacedQuestion, SessionStatus};
use crate::orchestrator::command::{Command, HELP_TEXT};
use crate::services::QuestionReview;
use crate::utils::logging::log_startup;
use crate::utils::{HtmlEntityDecoder, TextNormalizer};
use crate::workflow::{QuizController, SummaryMerge};

/// 应用主结构
pub struct QuizApp {
    config: Config,
    controller: QuizController,
    normalizer: HtmlEntityDecoder,
    show_summaries: bool,
}

impl QuizApp {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let controller = QuizController::from_config(&config).context("创建会话控制器失败")?;

        Ok(Self::with_controller(config, controller, HtmlEntityDecoder::new()))
    }

    pub fn with_controller(
        config: Config,
        controller: QuizController,
        normalizer: HtmlEntityDecoder,
    ) -> Self {
        Self {
            config,
            controller,
            normalizer,
            show_summaries: false,
        }
    }

    /// 运行输入循环，直到 quit 或输入结束
    pub async fn run(mut self) -> Result<()> {
        println!("{}", render_start_screen(&self.config));
        prompt();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                line = lines.next_line() => line.context("读取输入失败")?,
                Some(merge) = self.controller.recv_summary_update(),
                    if self.controller.pending_summaries() > 0 => {
                    self.on_summary(merge);
                    continue;
                }
            };

            let Some(line) = line else {
                info!("输入结束，程序退出");
                break;
            };

            match Command::parse(&line) {
                Some(Command::Quit) => break,
                Some(command) => self.handle(command).await,
                None if line.trim().is_empty() => {}
                None => println!("无法识别的命令: {}（输入 help 查看帮助）", line.trim()),
            }
            prompt();
        }

        Ok(())
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Start => self.start().await,
            Command::NewGame => {
                self.controller.reset();
                self.show_summaries = false;
                self.start().await;
            }
            Command::Answer {
                question,
                alternative,
            } => self.answer(question, alternative),
            Command::Submit => self.submit(),
            Command::ToggleSummaries => self.toggle_summaries(),
            Command::Show => self.show(),
            Command::Help => println!("{}", HELP_TEXT),
            Command::Quit => {}
        }
    }

    async fn start(&mut self) {
        if self.controller.status() == SessionStatus::InProgress {
            println!("本局尚未提交，输入 new 可放弃并重新开始");
            return;
        }
        match self.controller.start().await {
            Ok(()) => self.show(),
            Err(e) => {
                error!("❌ 开始答题失败: {}", e);
                println!("获取题目失败: {}\n输入 start 重试", e);
            }
        }
    }

    fn answer(&mut self, question: usize, alternative: usize) {
        let index = question - 1;
        let value = self
            .controller
            .questions()
            .get(index)
            .and_then(|q| q.alternatives().get(alternative - 1))
            .cloned();

        let Some(value) = value else {
            println!("没有第 {} 题的第 {} 个选项", question, alternative);
            return;
        };

        match self.controller.select_answer(index, &value) {
            Ok(()) => println!(
                "第 {} 题已选择: {}",
                question,
                self.normalizer.normalize(&value)
            ),
            Err(AppError::InvalidState { current, .. }) => {
                println!("当前{}，不能作答", current)
            }
            Err(e) => println!("{}", e),
        }
    }

    fn submit(&mut self) {
        match self.controller.submit() {
            Ok(score) => {
                self.show();
                println!(
                    "{}",
                    render_score(score, self.controller.question_count())
                );
                println!("输入 new 再来一局，输入 info 查看详细答案");
            }
            Err(AppError::Validation(ValidationError::Unanswered { unanswered })) => {
                let numbers: Vec<String> =
                    unanswered.iter().map(|i| (i + 1).to_string()).collect();
                println!("请先完成所有题目，未作答: {}", numbers.join(", "));
            }
            Err(e) => println!("{}", e),
        }
    }

    fn toggle_summaries(&mut self) {
        if self.controller.status() != SessionStatus::Submitted {
            println!("提交后才能查看详细答案");
            return;
        }
        self.controller.drain_summary_updates();
        self.show_summaries = !self.show_summaries;
        self.show();
    }

    fn on_summary(&mut self, merge: SummaryMerge) {
        debug!("{}", merge);
        if let SummaryMerge::Merged { index } = merge {
            if self.show_summaries {
                if let Some(Some(text)) = self.controller.summaries().get(index) {
                    println!("\n[第 {} 题 详细答案] {}", index + 1, text);
                    prompt();
                }
            }
        }
    }

    fn show(&self) {
        if self.controller.session().is_empty() {
            println!("{}", render_start_screen(&self.config));
            return;
        }

        let review = self.controller.review().ok();
        for (index, question) in self.controller.questions().iter().enumerate() {
            let view = QuestionView {
                number: index + 1,
                question,
                selected: self.controller.answers()[index].as_deref(),
                review: review.as_ref().and_then(|r| r.get(index)),
                summary: if self.show_summaries {
                    Some(self.controller.summaries()[index].as_deref())
                } else {
                    None
                },
            };
            println!("{}", render_question(&view, &self.normalizer));
        }
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// 一道题的展示数据
pub struct QuestionView<'a> {
    pub number: usize,
    pub question: &'a PlacedQuestion,
    pub selected: Option<&'a str>,
    /// 提交后才有
    pub review: Option<&'a QuestionReview>,
    /// 打开详细答案时才有；内层 `None` 表示摘要尚不可用
    pub summary: Option<Option<&'a str>>,
}

pub fn render_start_screen(config: &Config) -> String {
    format!(
        "\n{}\n  Quizzical\n  主题: {}\n  共 {} 题，输入 start 开始\n{}",
        "=".repeat(40),
        config.category,
        config.question_count,
        "=".repeat(40)
    )
}

/// 渲染一道题
///
/// 标记: `●` 已选择，提交后 `✓` 为正确答案，`✗` 为选错的答案
pub fn render_question(view: &QuestionView<'_>, normalizer: &dyn TextNormalizer) -> String {
    let mut out = format!(
        "{}. {}\n",
        view.number,
        normalizer.normalize(view.question.prompt())
    );

    for (i, alternative) in view.question.alternatives().iter().enumerate() {
        let is_selected = view.selected == Some(alternative.as_str());
        let mark = match view.review {
            Some(_) if alternative == view.question.correct_answer() => "✓",
            Some(review) if is_selected && !review.is_correct => "✗",
            _ if is_selected => "●",
            _ => " ",
        };
        out.push_str(&format!(
            "   {} [{}] {}\n",
            mark,
            i + 1,
            normalizer.normalize(alternative)
        ));
    }

    if let Some(summary) = view.summary {
        out.push_str(&format!("   ℹ {}\n", summary.unwrap_or("（暂无资料）")));
    }
    out
}

pub fn render_score(score: usize, total: usize) -> String {
    format!("你答对了 {}/{} 题", score, total)
}
