use serde::{Deserialize, Serialize};

/// 题库分类（Open Trivia DB 的分类代码）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    /// 综合知识
    GeneralKnowledge = 9,
    /// 书籍
    Books = 10,
    /// 电影
    Film = 11,
    /// 音乐
    Music = 12,
    /// 科学与自然
    ScienceNature = 17,
    /// 计算机
    Computers = 18,
    /// 数学
    Mathematics = 19,
    /// 神话
    Mythology = 20,
    /// 体育
    Sports = 21,
    /// 地理
    #[default]
    Geography = 22,
    /// 历史
    History = 23,
    /// 政治
    Politics = 24,
    /// 艺术
    Art = 25,
    /// 动物
    Animals = 27,
}

impl Category {
    /// 获取分类代码
    pub fn code(self) -> u16 {
        self as u16
    }

    /// 获取显示名称
    pub fn name(self) -> &'static str {
        match self {
            Category::GeneralKnowledge => "综合知识",
            Category::Books => "书籍",
            Category::Film => "电影",
            Category::Music => "音乐",
            Category::ScienceNature => "科学与自然",
            Category::Computers => "计算机",
            Category::Mathematics => "数学",
            Category::Mythology => "神话",
            Category::Sports => "体育",
            Category::Geography => "地理",
            Category::History => "历史",
            Category::Politics => "政治",
            Category::Art => "艺术",
            Category::Animals => "动物",
        }
    }

    /// 从代码解析分类
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            9 => Some(Category::GeneralKnowledge),
            10 => Some(Category::Books),
            11 => Some(Category::Film),
            12 => Some(Category::Music),
            17 => Some(Category::ScienceNature),
            18 => Some(Category::Computers),
            19 => Some(Category::Mathematics),
            20 => Some(Category::Mythology),
            21 => Some(Category::Sports),
            22 => Some(Category::Geography),
            23 => Some(Category::History),
            24 => Some(Category::Politics),
            25 => Some(Category::Art),
            27 => Some(Category::Animals),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
