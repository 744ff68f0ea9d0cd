use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    /// 命令名无法解析
    #[error("{0}: command not found")]
    NotFound(String),

    /// 重定向目标无法打开
    #[error("{}: {}", .path.display(), os_error_text(.source))]
    Redirect { path: PathBuf, source: io::Error },

    /// fork / pipe / dup2 等系统调用失败
    #[error("{context}: {}", .source.desc())]
    Sys { context: &'static str, source: Errno },

    /// 解析出的程序无法执行
    #[error("{program}: {}", .source.desc())]
    Exec { program: String, source: Errno },
}

impl ShellError {
    pub fn sys(context: &'static str) -> impl FnOnce(Errno) -> ShellError {
        move |source| ShellError::Sys { context, source }
    }

    /// 子进程以此作为退出码
    pub fn exit_status(&self) -> i32 {
        match self {
            ShellError::NotFound(_) | ShellError::Exec { .. } => 127,
            _ => 1,
        }
    }
}

/// The OS description of an error, without the `(os error N)` suffix.
pub fn os_error_text(err: &io::Error) -> String {
    match err.raw_os_error() {
        Some(code) => Errno::from_raw(code).desc().to_string(),
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_error_text() {
        let err = io::Error::from_raw_os_error(libc::ENOENT);
        assert_eq!(os_error_text(&err), "No such file or directory");

        let err = io::Error::new(io::ErrorKind::Other, "custom");
        assert_eq!(os_error_text(&err), "custom");
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ShellError::NotFound("nope".into()).to_string(),
            "nope: command not found"
        );
        let err = ShellError::Redirect {
            path: PathBuf::from("/x/out.txt"),
            source: io::Error::from_raw_os_error(libc::EACCES),
        };
        assert_eq!(err.to_string(), "/x/out.txt: Permission denied");
        assert_eq!(
            ShellError::sys("pipe")(Errno::EMFILE).to_string(),
            "pipe: Too many open files"
        );
    }

    #[test]
    fn test_exit_status() {
        assert_eq!(ShellError::NotFound("x".into()).exit_status(), 127);
        let exec = ShellError::Exec {
            program: "x".into(),
            source: Errno::ENOEXEC,
        };
        assert_eq!(exec.exit_status(), 127);
        let redirect = ShellError::Redirect {
            path: PathBuf::from("out"),
            source: io::Error::from_raw_os_error(libc::EISDIR),
        };
        assert_eq!(redirect.exit_status(), 1);
    }
}
