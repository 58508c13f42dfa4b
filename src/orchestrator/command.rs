//! 终端命令解析

/// 用户输入的命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// 开始答题
    Start,
    /// 为第 `question` 题选择第 `alternative` 个选项（均从 1 开始）
    Answer { question: usize, alternative: usize },
    /// 提交
    Submit,
    /// 再来一局
    NewGame,
    /// 显示 / 隐藏详细答案
    ToggleSummaries,
    /// 重新显示题目
    Show,
    Help,
    Quit,
}

impl Command {
    /// 解析一行输入，无法识别时返回 `None`
    ///
    /// 答题格式：`3 2` 或 `3:2`，表示第 3 题选第 2 个选项。
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let lowered = line.to_ascii_lowercase();
        let command = match lowered.as_str() {
            "start" | "s" => Command::Start,
            "submit" | "done" => Command::Submit,
            "new" | "again" | "n" => Command::NewGame,
            "info" | "i" => Command::ToggleSummaries,
            "show" | "ls" => Command::Show,
            "help" | "h" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => return Self::parse_answer(line),
        };
        Some(command)
    }

    fn parse_answer(line: &str) -> Option<Self> {
        let mut parts = line
            .split(|c: char| c.is_whitespace() || c == ':')
            .filter(|part| !part.is_empty());
        let question = parts.next()?.parse().ok()?;
        let alternative = parts.next()?.parse().ok()?;
        if parts.next().is_some() || question == 0 || alternative == 0 {
            return None;
        }
        Some(Command::Answer {
            question,
            alternative,
        })
    }
}

pub const HELP_TEXT: &str = "\
命令:
  start        开始答题
  <题号> <选项>  选择答案，例如 `2 3`
  submit       提交答案
  info         显示 / 隐藏详细答案（提交后）
  new          再来一局
  show         重新显示题目
  quit         退出";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keywords() {
        assert_eq!(Command::parse("start"), Some(Command::Start));
        assert_eq!(Command::parse("  SUBMIT "), Some(Command::Submit));
        assert_eq!(Command::parse("again"), Some(Command::NewGame));
        assert_eq!(Command::parse("info"), Some(Command::ToggleSummaries));
        assert_eq!(Command::parse("q"), Some(Command::Quit));
    }

    #[test]
    fn test_parse_answer_forms() {
        let expected = Some(Command::Answer {
            question: 3,
            alternative: 2,
        });
        assert_eq!(Command::parse("3 2"), expected);
        assert_eq!(Command::parse("3:2"), expected);
        assert_eq!(Command::parse("  3   2 "), expected);
    }

    #[test]
    fn test_parse_rejects_bad_answers() {
        assert_eq!(Command::parse("0 1"), None);
        assert_eq!(Command::parse("1 0"), None);
        assert_eq!(Command::parse("1"), None);
        assert_eq!(Command::parse("1 2 3"), None);
        assert_eq!(Command::parse("one two"), None);
        assert_eq!(Command::parse(""), None);
    }
}
