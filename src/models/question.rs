use serde::Deserialize;

use crate::error::ProviderError;

/// 每道题的错误选项数量
pub const INCORRECT_ANSWER_COUNT: usize = 3;

/// 每道题展示的选项数量（错误选项 + 正确答案）
pub const ALTERNATIVE_COUNT: usize = INCORRECT_ANSWER_COUNT + 1;

/// 题库返回的原始题目记录
///
/// 字段名与 Open Trivia DB 的 JSON 保持一致，未经校验。
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestion {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub category: String,
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

impl RawQuestion {
    /// 校验并转换为 `Question`
    ///
    /// # 参数
    /// - `index`: 题目在批次中的位置（仅用于错误信息）
    pub fn into_question(self, index: usize) -> Result<Question, ProviderError> {
        if !self.kind.is_empty() && self.kind != "multiple" {
            return Err(ProviderError::malformed(
                index,
                format!("题型应为 multiple，实际为 {}", self.kind),
            ));
        }
        if self.question.trim().is_empty() {
            return Err(ProviderError::malformed(index, "题干为空"));
        }
        if self.correct_answer.is_empty() {
            return Err(ProviderError::malformed(index, "正确答案为空"));
        }

        let count = self.incorrect_answers.len();
        let incorrect: [String; INCORRECT_ANSWER_COUNT] =
            self.incorrect_answers.try_into().map_err(|_| {
                ProviderError::malformed(
                    index,
                    format!("错误选项应为 {} 个，实际为 {}", INCORRECT_ANSWER_COUNT, count),
                )
            })?;

        if incorrect.iter().any(|alt| alt.is_empty()) {
            return Err(ProviderError::malformed(index, "存在空的错误选项"));
        }
        if incorrect.contains(&self.correct_answer) {
            return Err(ProviderError::malformed(index, "错误选项与正确答案重复"));
        }
        if incorrect
            .iter()
            .enumerate()
            .any(|(i, alt)| incorrect[..i].contains(alt))
        {
            return Err(ProviderError::malformed(index, "错误选项重复"));
        }

        Ok(Question {
            prompt: self.question,
            correct_answer: self.correct_answer,
            incorrect_answers: incorrect,
            category: self.category,
            difficulty: self.difficulty,
        })
    }
}

/// 一道已校验的选择题，获取后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    prompt: String,
    correct_answer: String,
    incorrect_answers: [String; INCORRECT_ANSWER_COUNT],
    category: String,
    difficulty: String,
}

impl Question {
    pub fn new(
        prompt: impl Into<String>,
        correct_answer: impl Into<String>,
        incorrect_answers: [String; INCORRECT_ANSWER_COUNT],
    ) -> Self {
        Self {
            prompt: prompt.into(),
            correct_answer: correct_answer.into(),
            incorrect_answers,
            category: String::new(),
            difficulty: String::new(),
        }
    }

    pub fn with_metadata(mut self, category: impl Into<String>, difficulty: impl Into<String>) -> Self {
        self.category = category.into();
        self.difficulty = difficulty.into();
        self
    }

    /// 原始题干（可能包含 HTML 实体）
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    pub fn incorrect_answers(&self) -> &[String] {
        &self.incorrect_answers
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn difficulty(&self) -> &str {
        &self.difficulty
    }
}

/// 已确定选项顺序的题目
///
/// 正确答案的插入位置在获取批次时确定一次，之后重复读取顺序不变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedQuestion {
    question: Question,
    slot: usize,
    alternatives: [String; ALTERNATIVE_COUNT],
}

impl PlacedQuestion {
    /// 把正确答案插入到 `slot` 位置，后面的错误选项依次右移
    pub(crate) fn new(question: Question, slot: usize) -> Self {
        let slot = slot.min(INCORRECT_ANSWER_COUNT);
        let [a, b, c] = question.incorrect_answers.clone();
        let correct = question.correct_answer.clone();
        let alternatives = match slot {
            0 => [correct, a, b, c],
            1 => [a, correct, b, c],
            2 => [a, b, correct, c],
            _ => [a, b, c, correct],
        };

        Self {
            question,
            slot,
            alternatives,
        }
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn prompt(&self) -> &str {
        self.question.prompt()
    }

    pub fn correct_answer(&self) -> &str {
        self.question.correct_answer()
    }

    /// 正确答案所在位置
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    /// 判断 `value` 是否是本题的选项之一（原始字符串比较）
    pub fn has_alternative(&self, value: &str) -> bool {
        self.alternatives.iter().any(|alt| alt == value)
    }
}
