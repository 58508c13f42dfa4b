//! 摘要合并结果

use std::fmt::Display;

use crate::models::Generation;

/// 一条摘要结果被控制器处理后的去向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryMerge {
    /// 已写入 `summaries[index]`
    Merged { index: usize },
    /// 获取失败，`summaries[index]` 保持不可用
    Unavailable { index: usize },
    /// 属于已被丢弃的会话，直接忽略
    Stale { generation: Generation },
}

impl SummaryMerge {
    /// 是否属于当前会话
    pub fn is_current(&self) -> bool {
        !matches!(self, SummaryMerge::Stale { .. })
    }
}

impl Display for SummaryMerge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryMerge::Merged { index } => write!(f, "[题目#{}] 摘要已合并", index + 1),
            SummaryMerge::Unavailable { index } => write!(f, "[题目#{}] 摘要不可用", index + 1),
            SummaryMerge::Stale { generation } => write!(f, "[会话 {}] 过期摘要已丢弃", generation),
        }
    }
}
