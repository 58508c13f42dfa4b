//! 测验会话聚合
//!
//! `QuizSession` 只保存状态，状态转换规则由 `QuizController` 负责执行。

use chrono::{DateTime, Local};
use std::fmt;

use crate::models::question::PlacedQuestion;

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Submitted,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::NotStarted => "未开始",
            SessionStatus::InProgress => "答题中",
            SessionStatus::Submitted => "已提交",
        };
        write!(f, "{}", name)
    }
}

/// 会话代数
///
/// 每次 `start()` / `reset()` 递增，用于丢弃过期的异步结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 一局测验的全部状态
///
/// - `answers[i] == None` 表示未作答
/// - `summaries[i] == None` 表示摘要尚不可用
#[derive(Debug, Clone)]
pub struct QuizSession {
    generation: Generation,
    status: SessionStatus,
    questions: Vec<PlacedQuestion>,
    answers: Vec<Option<String>>,
    summaries: Vec<Option<String>>,
    score: Option<usize>,
    started_at: Option<DateTime<Local>>,
    submitted_at: Option<DateTime<Local>>,
}

impl QuizSession {
    /// 创建未开始的空会话
    pub fn not_started(generation: Generation) -> Self {
        Self {
            generation,
            status: SessionStatus::NotStarted,
            questions: Vec::new(),
            answers: Vec::new(),
            summaries: Vec::new(),
            score: None,
            started_at: None,
            submitted_at: None,
        }
    }

    /// 用一整批已定位的题目创建答题中的会话
    pub(crate) fn in_progress(generation: Generation, questions: Vec<PlacedQuestion>) -> Self {
        let count = questions.len();
        Self {
            generation,
            status: SessionStatus::InProgress,
            questions,
            answers: vec![None; count],
            summaries: vec![None; count],
            score: None,
            started_at: Some(Local::now()),
            submitted_at: None,
        }
    }

    pub(crate) fn set_answer(&mut self, index: usize, value: String) {
        if let Some(slot) = self.answers.get_mut(index) {
            *slot = Some(value);
        }
    }

    /// 冻结答案并记录得分
    pub(crate) fn freeze(&mut self, score: usize) {
        self.status = SessionStatus::Submitted;
        self.score = Some(score);
        self.submitted_at = Some(Local::now());
    }

    /// 写入摘要，只触碰 `summaries`
    pub(crate) fn set_summary(&mut self, index: usize, text: String) -> bool {
        match self.summaries.get_mut(index) {
            Some(slot) => {
                *slot = Some(text);
                true
            }
            None => false,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn questions(&self) -> &[PlacedQuestion] {
        &self.questions
    }

    pub fn answers(&self) -> &[Option<String>] {
        &self.answers
    }

    pub fn summaries(&self) -> &[Option<String>] {
        &self.summaries
    }

    pub fn score(&self) -> Option<usize> {
        self.score
    }

    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    pub fn submitted_at(&self) -> Option<DateTime<Local>> {
        self.submitted_at
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// 未作答题目的索引
    pub fn unanswered(&self) -> Vec<usize> {
        self.answers
            .iter()
            .enumerate()
            .filter(|(_, answer)| answer.is_none())
            .map(|(index, _)| index)
            .collect()
    }
}
