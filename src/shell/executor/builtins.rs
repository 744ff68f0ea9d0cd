use std::collections::BTreeSet;
use std::env;
use std::io::{self, Write};
use std::path::Path;

use log::debug;
use once_cell::sync::Lazy;

use crate::shell::context::ShellContext;
use crate::shell::error::os_error_text;
use crate::shell::parser::ast::Command;
use crate::utils::path::find_executable;

pub static BUILTINS: Lazy<BTreeSet<&'static str>> =
    Lazy::new(|| BTreeSet::from(["cd", "echo", "exit", "history", "pwd", "type"]));

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(name)
}

/// Builtins whose effect must land in the shell process itself.
pub fn is_state_mutating(command: &Command) -> bool {
    match command.program() {
        "cd" | "exit" => true,
        "history" => matches!(
            command.arguments().first().map(String::as_str),
            Some("-r" | "-w" | "-a")
        ),
        _ => false,
    }
}

/// 执行内建命令，返回退出码
pub fn run(
    name: &str,
    args: &[String],
    ctx: &mut ShellContext,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> i32 {
    debug!("执行内建命令: {} {:?}", name, args);
    let result = match name {
        "echo" => builtin_echo(args, out),
        "pwd" => builtin_pwd(ctx, out),
        "type" => builtin_type(args, ctx, out),
        "cd" => builtin_cd(args, ctx, err),
        "history" => builtin_history(args, ctx, out, err),
        "exit" => builtin_exit(args, ctx, err),
        _ => writeln!(out, "{}: not found", name).map(|_| 127),
    };
    let status = result.unwrap_or_else(|e| {
        debug!("内建命令 {} 输出失败: {}", name, e);
        1
    });
    let _ = out.flush();
    let _ = err.flush();
    status
}

fn builtin_echo(args: &[String], out: &mut dyn Write) -> io::Result<i32> {
    writeln!(out, "{}", args.join(" "))?;
    Ok(0)
}

fn builtin_pwd(ctx: &ShellContext, out: &mut dyn Write) -> io::Result<i32> {
    writeln!(out, "{}", ctx.cwd.display())?;
    Ok(0)
}

fn builtin_type(args: &[String], ctx: &ShellContext, out: &mut dyn Write) -> io::Result<i32> {
    let mut status = 0;
    for name in args {
        if is_builtin(name) {
            writeln!(out, "{} is a shell builtin", name)?;
        } else if let Some(path) = find_executable(&ctx.path_dirs, name) {
            writeln!(out, "{} is {}", name, path.display())?;
        } else {
            writeln!(out, "{}: not found", name)?;
            status = 1;
        }
    }
    Ok(status)
}

fn builtin_cd(args: &[String], ctx: &mut ShellContext, err: &mut dyn Write) -> io::Result<i32> {
    if args.len() > 1 {
        writeln!(err, "cd: too many arguments")?;
        return Ok(1);
    }
    let target = args.first().map(String::as_str).unwrap_or("~");
    let home = ctx.home.as_ref().and_then(|home| home.to_str());
    let expanded = shellexpand::tilde_with_context(target, || home);
    let path = ctx.cwd.join(Path::new(&*expanded));

    match env::set_current_dir(&path) {
        Ok(()) => {
            ctx.cwd = env::current_dir().unwrap_or(path);
            debug!("切换目录: {}", ctx.cwd.display());
            Ok(0)
        }
        Err(e) => {
            writeln!(err, "cd: {}: {}", target, os_error_text(&e))?;
            Ok(1)
        }
    }
}

fn builtin_history(
    args: &[String],
    ctx: &mut ShellContext,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> io::Result<i32> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let file_op = match args.as_slice() {
        [] => None,
        ["-r" | "-w" | "-a", file] => Some((args[0], Path::new(file))),
        ["-r" | "-w" | "-a"] => {
            writeln!(err, "history: {}: option requires an argument", args[0])?;
            return Ok(2);
        }
        [count] => {
            let Ok(count) = count.parse::<usize>() else {
                writeln!(err, "history: {}: numeric argument required", count)?;
                return Ok(2);
            };
            for entry in ctx.history.last(count) {
                writeln!(out, "{:>5}  {}", entry.position, entry.line())?;
            }
            return Ok(0);
        }
        _ => {
            writeln!(err, "history: too many arguments")?;
            return Ok(1);
        }
    };

    let Some((op, file)) = file_op else {
        for entry in ctx.history.entries() {
            writeln!(out, "{:>5}  {}", entry.position, entry.line())?;
        }
        return Ok(0);
    };

    let result = match op {
        "-r" => ctx.history.load(file).map(|_| ()),
        "-w" => ctx.history.save(file),
        _ => ctx.history.append_new_to_file(file),
    };
    match result {
        Ok(()) => Ok(0),
        Err(e) => {
            writeln!(err, "history: {}: {}", file.display(), os_error_text(&e))?;
            Ok(1)
        }
    }
}

fn builtin_exit(args: &[String], ctx: &mut ShellContext, err: &mut dyn Write) -> io::Result<i32> {
    let code = match args.first() {
        None => 0,
        Some(arg) => match arg.parse::<i32>() {
            Ok(code) => code,
            Err(_) => {
                writeln!(err, "exit: {}: numeric argument required", arg)?;
                2
            }
        },
    };
    ctx.exit_code = Some(code);
    Ok(code)
}
