//! 计分服务 - 业务能力层

use crate::models::PlacedQuestion;

/// 单道题的批改结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionReview {
    pub index: usize,
    pub selected: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// 计分服务
///
/// 纯函数，对同一份冻结的答案重复调用结果不变。
/// 比较使用题库返回的原始字符串，区分大小写，不做任何规范化。
pub struct ScoringEngine;

impl ScoringEngine {
    /// 统计答对的题目数量，结果在 [0, N] 之间
    pub fn score(answers: &[Option<String>], questions: &[PlacedQuestion]) -> usize {
        questions
            .iter()
            .zip(answers)
            .filter(|(question, answer)| Self::is_correct(question, answer.as_deref()))
            .count()
    }

    /// 逐题批改
    pub fn review(answers: &[Option<String>], questions: &[PlacedQuestion]) -> Vec<QuestionReview> {
        questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let selected = answers.get(index).cloned().flatten();
                QuestionReview {
                    index,
                    is_correct: Self::is_correct(question, selected.as_deref()),
                    selected,
                    correct_answer: question.correct_answer().to_string(),
                }
            })
            .collect()
    }

    fn is_correct(question: &PlacedQuestion, answer: Option<&str>) -> bool {
        answer == Some(question.correct_answer())
    }
}
