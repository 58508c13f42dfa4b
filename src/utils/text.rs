//! 文本规范化
//!
//! 题库返回的题干和选项带有 HTML 实体（如 `&quot;`、`&#039;`、`&Scaron;`），
//! 只在展示时解码，比较答案时始终使用原始字符串。

/// 把原始文本转换为可读文本
pub trait TextNormalizer: Send + Sync {
    fn normalize(&self, raw: &str) -> String;
}

/// HTML 实体解码器
///
/// 使用 `html-escape` 的完整实体表：命名实体、十进制 `&#39;` 和十六进制 `&#x27;` 引用。
/// 无法识别的实体原样保留。
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlEntityDecoder;

impl HtmlEntityDecoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode(&self, raw: &str) -> String {
        html_escape::decode_html_entities(raw).into_owned()
    }
}

impl TextNormalizer for HtmlEntityDecoder {
    fn normalize(&self, raw: &str) -> String {
        self.decode(raw)
    }
}
