mod editor;
mod keys;
mod raw_mode;
mod trie;

pub use editor::{LineEditor, PROMPT};
pub use raw_mode::RawMode;
pub use trie::Trie;

use std::io::{self, BufRead, IsTerminal, Write};
use std::os::fd::AsFd;

use log::{debug, error, warn};

use crate::shell::context::ShellContext;
use crate::utils::config::Config;

pub struct ReadlineManager<'a> {
    config: &'a Config,
    editor: LineEditor,
}

impl<'a> ReadlineManager<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            editor: LineEditor::new(),
        }
    }

    pub fn load_history(&self, ctx: &mut ShellContext) {
        let Some(path) = &self.config.history_file else {
            return;
        };
        match ctx.history.load(path) {
            Ok(count) => debug!("历史记录加载成功: {} 条", count),
            Err(err) => warn!("无法加载历史记录: {} {}", path.display(), err),
        }
    }

    pub fn save_history(&self, ctx: &ShellContext) {
        let Some(path) = &self.config.history_file else {
            return;
        };
        if let Err(err) = ctx.history.save(path) {
            error!("保存历史记录失败: {}", err);
        } else {
            debug!("历史记录保存成功");
        }
    }

    /// Reads one line. `Ok(None)` means end of input.
    ///
    /// On a terminal the raw-mode editor is used; otherwise lines are read
    /// as-is so the shell can be driven from a pipe.
    pub fn readline(&mut self, ctx: &ShellContext) -> io::Result<Option<String>> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        if !stdin.is_terminal() {
            write!(stdout, "{}", PROMPT)?;
            stdout.flush()?;
            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                return Ok(None);
            }
            return Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()));
        }

        let _raw = RawMode::enable(stdin.as_fd()).map_err(io::Error::from)?;
        let mut input = stdin.lock();
        let mut output = stdout.lock();
        self.editor
            .read_line(&mut input, &mut output, &ctx.history, &ctx.trie)
    }
}
