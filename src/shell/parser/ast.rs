use std::ffi::{CString, NulError};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Truncate,
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub path: PathBuf,
    pub mode: WriteMode,
}

/// 重定向操作符
pub fn redirect_operator(token: &str) -> Option<(Stream, WriteMode)> {
    match token {
        ">" | "1>" => Some((Stream::Stdout, WriteMode::Truncate)),
        ">>" | "1>>" => Some((Stream::Stdout, WriteMode::Append)),
        "2>" => Some((Stream::Stderr, WriteMode::Truncate)),
        "2>>" => Some((Stream::Stderr, WriteMode::Append)),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    /// 用户输入的原始 token（包含重定向部分），用于日志
    pub tokens: Vec<String>,
    pub args: Vec<String>,
    pub stdout: Option<Redirection>,
    pub stderr: Option<Redirection>,
}

impl Command {
    /// Builds a command from its raw tokens.
    ///
    /// Arguments stop at the first redirection operator; the token after it is
    /// the target path and everything later is ignored. An operator with no
    /// path leaves the stream untouched.
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        let mut command = Command::default();
        let mut iter = tokens.iter();

        while let Some(token) = iter.next() {
            if let Some((stream, mode)) = redirect_operator(token) {
                if let Some(path) = iter.next() {
                    let redirection = Some(Redirection {
                        path: PathBuf::from(path),
                        mode,
                    });
                    match stream {
                        Stream::Stdout => command.stdout = redirection,
                        Stream::Stderr => command.stderr = redirection,
                    }
                }
                break;
            }
            command.args.push(token.clone());
        }

        command.tokens = tokens;
        command
    }

    pub fn program(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or_default()
    }

    pub fn arguments(&self) -> &[String] {
        self.args.get(1..).unwrap_or_default()
    }

    /// exec 前才生成 C 字符串
    pub fn argv(&self) -> Result<Vec<CString>, NulError> {
        self.args.iter().map(|arg| CString::new(arg.as_bytes())).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
}

impl Pipeline {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}
