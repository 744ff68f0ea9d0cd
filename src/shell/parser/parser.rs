use log::warn;

use super::ast::{Command, Pipeline};
use super::lexer;

pub const PIPE: &str = "|";

pub struct Parser {
    tokens: Vec<String>,
}

impl Parser {
    pub fn new(line: &str) -> Self {
        Self::from_tokens(lexer::tokenize(line))
    }

    pub fn from_tokens(tokens: Vec<String>) -> Self {
        Parser { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// 按 `|` 切分。空的片段（开头、结尾或连续的 `|`）直接丢弃。
    pub fn parse_pipeline(&self) -> Pipeline {
        let mut commands = Vec::new();

        for (index, segment) in self.tokens.split(|token| token == PIPE).enumerate() {
            if segment.is_empty() {
                if !self.tokens.is_empty() {
                    warn!("丢弃第 {} 个空的管道片段", index + 1);
                }
                continue;
            }
            commands.push(Command::from_tokens(segment.to_vec()));
        }

        Pipeline { commands }
    }
}
