use std::env;
use std::path::PathBuf;

use log::{debug, warn};

use crate::shell::executor::builtins::BUILTINS;
use crate::shell::history::History;
use crate::shell::readline::Trie;
use crate::utils::config::Config;
use crate::utils::path::executable_names;

/// Session-wide state, passed explicitly to every component that needs it.
#[derive(Debug, Clone)]
pub struct ShellContext {
    pub cwd: PathBuf,
    pub path_dirs: Vec<PathBuf>,
    pub home: Option<PathBuf>,
    pub history: History,
    pub trie: Trie,
    /// 上一条管道的退出码
    pub last_status: i32,
    /// `exit` 设置后，主循环在当前管道结束后退出
    pub exit_code: Option<i32>,
}

impl ShellContext {
    pub fn new(path_dirs: Vec<PathBuf>, home: Option<PathBuf>) -> Self {
        let cwd = match env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                warn!("无法获取当前目录: {}", e);
                home.clone().unwrap_or_else(|| PathBuf::from("/"))
            }
        };

        let mut trie = Trie::new();
        for name in BUILTINS.iter() {
            trie.insert(name);
        }

        Self {
            cwd,
            path_dirs,
            home,
            history: History::new(),
            trie,
            last_status: 0,
            exit_code: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut ctx = Self::new(config.path_dirs.clone(), config.home.clone());
        ctx.index_executables();
        ctx
    }

    /// 把搜索路径中的可执行文件加入补全树
    pub fn index_executables(&mut self) {
        let names = executable_names(&self.path_dirs);
        debug!("补全索引: {} 个可执行文件", names.len());
        for name in &names {
            self.trie.insert(name);
        }
    }

    pub fn should_exit(&self) -> bool {
        self.exit_code.is_some()
    }
}
