use log::{debug, error, info, warn};
use std::error::Error;

use crate::shell::context::ShellContext;
use crate::shell::executor::Executor;
use crate::shell::parser::Parser;
use crate::shell::readline::ReadlineManager;
use crate::shell::signals;
use crate::utils::config::Config;

pub struct Shell<'a> {
    ctx: ShellContext,
    readline: ReadlineManager<'a>,
    executor: Executor,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            ctx: ShellContext::from_config(config),
            readline: ReadlineManager::new(config),
            executor: Executor::new(&config.name),
        }
    }

    /// Runs the session and returns the shell's exit code.
    pub fn run(&mut self) -> Result<i32, Box<dyn Error>> {
        debug!("初始化 kosh...");
        signals::ignore_interactive_signals();
        self.readline.load_history(&mut self.ctx);
        info!("kosh 准备就绪, 工作目录 {}", self.ctx.cwd.display());

        self.run_loop()?;
        self.readline.save_history(&self.ctx);

        let code = self.ctx.exit_code.unwrap_or(self.ctx.last_status);
        info!("退出 kosh, 退出码 {}", code);
        Ok(code)
    }

    fn run_loop(&mut self) -> Result<(), Box<dyn Error>> {
        loop {
            let line = match self.readline.readline(&self.ctx) {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("接收到 EOF，退出 kosh...");
                    break;
                }
                Err(err) => {
                    error!("读取输入失败: {}", err);
                    return Err(err.into());
                }
            };

            self.handle_input(&line);
            if self.ctx.should_exit() {
                break;
            }
        }
        Ok(())
    }

    /// Tokenizes, records and executes one submitted line.
    pub fn handle_input(&mut self, line: &str) -> i32 {
        let parser = Parser::new(line);
        if parser.tokens().is_empty() {
            return self.ctx.last_status;
        }

        // 整行作为一条历史记录，先记录再执行，`history` 能看到自己
        self.ctx.history.append(parser.tokens().to_vec());
        debug!("执行命令: {:?}", parser.tokens());

        let pipeline = parser.parse_pipeline();
        if pipeline.is_empty() {
            warn!("没有可执行的命令: {}", line);
            return self.ctx.last_status;
        }
        debug!("管道共 {} 个阶段", pipeline.len());
        self.executor.execute(&pipeline, &mut self.ctx)
    }
}
