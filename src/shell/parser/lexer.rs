use std::iter::Peekable;
use std::str::Chars;

use log::debug;

/// 词法状态
#[derive(Debug, PartialEq, Clone, Copy)]
enum Mode {
    Normal,
    SingleQuote,
    DoubleQuote,
    /// 转义下一个字符，之后回到 `resume`
    Escaped { resume: Quote },
}

/// The mode an escape returns to.
#[derive(Debug, PartialEq, Clone, Copy)]
enum Quote {
    None,
    Double,
}

impl Quote {
    fn mode(self) -> Mode {
        match self {
            Quote::None => Mode::Normal,
            Quote::Double => Mode::DoubleQuote,
        }
    }
}

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
    mode: Mode,
    current: String,
    tokens: Vec<String>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.chars().peekable(),
            mode: Mode::Normal,
            current: String::new(),
            tokens: Vec::new(),
        }
    }

    /// 消费全部输入。未闭合的引号或转义不会报错，已累积的内容照常输出。
    pub fn tokenize(mut self) -> Vec<String> {
        while let Some(c) = self.read_char() {
            match self.mode {
                Mode::Escaped { resume } => {
                    self.current.push(c);
                    self.mode = resume.mode();
                }
                Mode::SingleQuote => match c {
                    '\'' => self.mode = Mode::Normal,
                    c => self.current.push(c),
                },
                Mode::DoubleQuote => match c {
                    '"' => self.mode = Mode::Normal,
                    '\\' if self.peek_char().is_some_and(escapable_in_double_quotes) => {
                        self.mode = Mode::Escaped {
                            resume: Quote::Double,
                        }
                    }
                    c => self.current.push(c),
                },
                Mode::Normal => match c {
                    '\\' => {
                        self.mode = Mode::Escaped {
                            resume: Quote::None,
                        }
                    }
                    '\'' => self.mode = Mode::SingleQuote,
                    '"' => self.mode = Mode::DoubleQuote,
                    c if c.is_whitespace() => self.flush(),
                    c => self.current.push(c),
                },
            }
        }

        if self.mode != Mode::Normal {
            debug!("输入在 {:?} 状态下结束，按原样输出", self.mode);
        }
        self.flush();
        self.tokens
    }

    fn read_char(&mut self) -> Option<char> {
        self.input.next()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.tokens.push(std::mem::take(&mut self.current));
        }
    }
}

fn escapable_in_double_quotes(c: char) -> bool {
    matches!(c, '"' | '$' | '\\' | '\n' | '`')
}

/// Splits a raw input line into tokens.
pub fn tokenize(line: &str) -> Vec<String> {
    Lexer::new(line).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_command() {
        assert_eq!(tokenize("ls -l"), vec!["ls", "-l"]);
    }

    #[test]
    fn test_whitespace_collapses() {
        assert_eq!(tokenize("  echo \t  a   b  "), vec!["echo", "a", "b"]);
        assert!(tokenize("   ").is_empty());
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_pipe_and_redirection_tokens() {
        assert_eq!(
            tokenize("ls | grep foo 2>> err.log"),
            vec!["ls", "|", "grep", "foo", "2>>", "err.log"]
        );
    }

    #[test]
    fn test_quoted_strings() {
        assert_eq!(
            tokenize(r#"echo 'a b' "c\"d""#),
            vec!["echo", "a b", "c\"d"]
        );
    }

    #[test]
    fn test_backslash_in_single_quotes_is_literal() {
        assert_eq!(tokenize(r#"echo 'a\nb\'"#), vec!["echo", "a\\nb\\"]);
    }

    #[test]
    fn test_backslash_in_double_quotes() {
        // 只有 " $ \ ` 换行 可以被转义
        assert_eq!(
            tokenize(r#"echo "a\$b" "c\\d" "e\nf""#),
            vec!["echo", "a$b", "c\\d", "e\\nf"]
        );
    }

    #[test]
    fn test_backslash_outside_quotes() {
        assert_eq!(tokenize(r"echo a\ b \'x\'"), vec!["echo", "a b", "'x'"]);
        assert_eq!(tokenize(r"echo \\n"), vec!["echo", "\\n"]);
    }

    #[test]
    fn test_adjacent_quotes_concatenate() {
        assert_eq!(
            tokenize(r#"echo 'hello'"world"x''"#),
            vec!["echo", "helloworldx"]
        );
    }

    #[test]
    fn test_empty_quotes_produce_no_token() {
        assert_eq!(tokenize("echo '' \"\""), vec!["echo"]);
    }

    #[test]
    fn test_unterminated_quote_is_flushed() {
        assert_eq!(tokenize("echo 'abc def"), vec!["echo", "abc def"]);
        assert_eq!(tokenize("echo \"abc"), vec!["echo", "abc"]);
        assert_eq!(tokenize("echo abc\\"), vec!["echo", "abc"]);
    }

    #[test]
    fn test_unquoted_round_trip() {
        let tokens = tokenize("cat  /etc/hosts |   wc -l > out.txt");
        assert_eq!(tokenize(&tokens.join(" ")), tokens);
    }
}
