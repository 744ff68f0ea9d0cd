use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::mem::ManuallyDrop;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::process;

use log::{debug, error};
use nix::errno::Errno;
use nix::unistd::{dup2, execv, fork, pipe, ForkResult, Pid};

use super::builtins;
use super::wait::wait_all;
use crate::shell::context::ShellContext;
use crate::shell::error::ShellError;
use crate::shell::parser::ast::{Command, Pipeline, Redirection, WriteMode};
use crate::shell::signals;
use crate::utils::path::find_executable;

/// What a forked stage runs.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Stage {
    Builtin,
    External(PathBuf),
    Missing,
    /// 只有重定向，没有命令
    Empty,
}

pub struct Executor {
    name: String,
}

impl Executor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// Runs a pipeline to completion and returns its status.
    pub fn execute(&self, pipeline: &Pipeline, ctx: &mut ShellContext) -> i32 {
        let status = match pipeline.commands.as_slice() {
            [] => return ctx.last_status,
            [command] if builtins::is_state_mutating(command) => {
                debug!("在 shell 进程内执行: {:?}", command.tokens);
                self.run_in_shell(command, ctx)
            }
            commands => self.run_pipeline(commands, ctx),
        };
        ctx.last_status = status;
        status
    }

    fn run_in_shell(&self, command: &Command, ctx: &mut ShellContext) -> i32 {
        let mut out: Box<dyn Write> = match &command.stdout {
            Some(redirection) => match open_target(redirection) {
                Ok(file) => Box::new(file),
                Err(e) => return self.report(&e),
            },
            None => Box::new(io::stdout()),
        };
        let mut err: Box<dyn Write> = match &command.stderr {
            Some(redirection) => match open_target(redirection) {
                Ok(file) => Box::new(file),
                Err(e) => return self.report(&e),
            },
            None => Box::new(io::stderr()),
        };
        builtins::run(
            command.program(),
            command.arguments(),
            ctx,
            &mut *out,
            &mut *err,
        )
    }

    fn run_pipeline(&self, commands: &[Command], ctx: &mut ShellContext) -> i32 {
        let last = commands.len() - 1;
        let mut pids: Vec<Pid> = Vec::with_capacity(commands.len());
        let mut last_launched = false;
        // 上一阶段管道的读端
        let mut prev_read: Option<OwnedFd> = None;

        // 避免子进程重复输出父进程缓冲区里的内容
        let _ = io::stdout().flush();

        for (index, command) in commands.iter().enumerate() {
            let pipe_fds = if index < last {
                match pipe() {
                    Ok(fds) => Some(fds),
                    Err(e) => {
                        self.report(&ShellError::sys("pipe")(e));
                        break;
                    }
                }
            } else {
                None
            };

            let stage = resolve(command, ctx);
            debug!("启动第 {} 个阶段: {:?} -> {:?}", index + 1, command.tokens, stage);

            // SAFETY: 子进程只做 fd 操作、内建命令或 exec，然后立即退出
            match unsafe { fork() } {
                Ok(ForkResult::Child) => {
                    let code = run_stage(&self.name, command, &stage, prev_read, pipe_fds, ctx);
                    process::exit(code);
                }
                Ok(ForkResult::Parent { child }) => {
                    pids.push(child);
                    last_launched = index == last;
                }
                Err(e) => {
                    self.report(&ShellError::sys("fork")(e));
                }
            }

            // 父进程不再需要上一个读端和当前写端
            prev_read = pipe_fds.map(|(read, _write)| read);
        }
        drop(prev_read);

        let result = wait_all(&pids);
        for (pid, status) in &result.statuses {
            if status.code() != 0 {
                debug!("阶段 {} 非零退出: {:?}", pid, status);
            }
        }
        if last_launched {
            result.status
        } else {
            1
        }
    }

    fn report(&self, e: &ShellError) -> i32 {
        error!("{}", e);
        eprintln!("{}: {}", self.name, e);
        e.exit_status()
    }
}

fn resolve(command: &Command, ctx: &ShellContext) -> Stage {
    let program = command.program();
    if program.is_empty() {
        Stage::Empty
    } else if builtins::is_builtin(program) {
        Stage::Builtin
    } else {
        find_executable(&ctx.path_dirs, program).map_or(Stage::Missing, Stage::External)
    }
}

fn open_target(redirection: &Redirection) -> Result<File, ShellError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).mode(0o644);
    match redirection.mode {
        WriteMode::Truncate => options.truncate(true),
        WriteMode::Append => options.append(true),
    };
    options
        .open(&redirection.path)
        .map_err(|source| ShellError::Redirect {
            path: redirection.path.clone(),
            source,
        })
}

/// 直接写 fd 的 writer，绕过 std 的缓冲
fn fd_writer(fd: RawFd) -> ManuallyDrop<File> {
    // SAFETY: 0/1/2 在进程生命周期内有效，ManuallyDrop 保证不会被关闭
    ManuallyDrop::new(unsafe { File::from_raw_fd(fd) })
}

/// Body of a forked stage; the return value is the process exit code.
fn run_stage(
    name: &str,
    command: &Command,
    stage: &Stage,
    stdin: Option<OwnedFd>,
    pipe_fds: Option<(OwnedFd, OwnedFd)>,
    ctx: &mut ShellContext,
) -> i32 {
    signals::restore_default_signals();

    let mut err = fd_writer(libc::STDERR_FILENO);
    if let Err(e) = wire_stage(command, stdin, pipe_fds) {
        let _ = writeln!(err, "{}: {}", name, e);
        return e.exit_status();
    }

    match stage {
        Stage::Empty => 0,
        Stage::Builtin => {
            let mut out = fd_writer(libc::STDOUT_FILENO);
            builtins::run(
                command.program(),
                command.arguments(),
                ctx,
                &mut *out,
                &mut *err,
            )
        }
        Stage::Missing => {
            let e = ShellError::NotFound(command.program().to_string());
            let _ = writeln!(err, "{}", e);
            e.exit_status()
        }
        Stage::External(path) => {
            let e = exec_program(command, path);
            let _ = writeln!(err, "{}", e);
            e.exit_status()
        }
    }
}

/// Puts the stage's descriptors in place: the previous pipe on stdin, then
/// redirections, then the next pipe on stdout when stdout is not redirected.
/// Every pipe descriptor is closed before returning.
fn wire_stage(
    command: &Command,
    stdin: Option<OwnedFd>,
    pipe_fds: Option<(OwnedFd, OwnedFd)>,
) -> Result<(), ShellError> {
    if let Some(read) = &stdin {
        redirect_fd(read.as_raw_fd(), libc::STDIN_FILENO)?;
    }

    match (&command.stdout, &pipe_fds) {
        (Some(redirection), _) => {
            let file = open_target(redirection)?;
            redirect_fd(file.as_raw_fd(), libc::STDOUT_FILENO)?;
        }
        (None, Some((_read, write))) => redirect_fd(write.as_raw_fd(), libc::STDOUT_FILENO)?,
        (None, None) => {}
    }

    if let Some(redirection) = &command.stderr {
        let file = open_target(redirection)?;
        redirect_fd(file.as_raw_fd(), libc::STDERR_FILENO)?;
    }

    drop(stdin);
    drop(pipe_fds);
    Ok(())
}

fn redirect_fd(fd: RawFd, target: RawFd) -> Result<(), ShellError> {
    if fd != target {
        dup2(fd, target).map_err(ShellError::sys("dup2"))?;
    }
    Ok(())
}

/// Replaces the process image. Only returns on failure.
fn exec_program(command: &Command, path: &Path) -> ShellError {
    let program = command.program().to_string();
    let exec_error = |source| ShellError::Exec {
        program: program.clone(),
        source,
    };

    // C 字符串只在 exec 前这一刻生成
    let Ok(path) = CString::new(path.as_os_str().as_bytes()) else {
        return exec_error(Errno::EINVAL);
    };
    let Ok(argv) = command.argv() else {
        return exec_error(Errno::EINVAL);
    };

    match execv(&path, &argv) {
        Ok(never) => match never {},
        Err(e) => exec_error(e),
    }
}
