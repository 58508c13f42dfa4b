//! 选项定位服务 - 业务能力层
//!
//! 为每道题抽取一次正确答案的位置，结果随题目一起保存

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{PlacedQuestion, Question, ALTERNATIVE_COUNT};

/// 选项定位服务
///
/// 职责：
/// - 在 [0, 4) 上均匀抽取正确答案的位置
/// - 每道题独立抽取，内容重复的题目也不共享结果
/// - 只在取题时调用，渲染时不再重新计算
pub struct AlternativePlacement {
    rng: StdRng,
}

impl AlternativePlacement {
    /// 使用系统熵源创建
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// 使用固定种子创建，结果可复现
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn draw_slot(&mut self) -> usize {
        self.rng.random_range(0..ALTERNATIVE_COUNT)
    }

    pub fn place(&mut self, question: Question) -> PlacedQuestion {
        let slot = self.draw_slot();
        PlacedQuestion::new(question, slot)
    }

    pub fn place_batch(&mut self, questions: Vec<Question>) -> Vec<PlacedQuestion> {
        questions
            .into_iter()
            .map(|question| self.place(question))
            .collect()
    }
}

impl Default for AlternativePlacement {
    fn default() -> Self {
        Self::new()
    }
}
