use std::io::{self, Read, Write};

use log::debug;

use super::keys::{Key, Keys};
use super::trie::Trie;
use crate::shell::history::History;

pub const PROMPT: &str = "$ ";
const BELL: &str = "\x07";
const CLEAR_LINE: &str = "\r\x1b[K";

/// Keystroke-level line editor.
///
/// The buffer only grows at its end: characters are appended, Tab appends
/// completions, Backspace removes the last character and arrow keys replace
/// the whole buffer with a history entry.
#[derive(Debug, Default)]
pub struct LineEditor {
    buffer: String,
    /// 指向当前显示的历史记录；`history.len()` 表示还没有翻阅
    history_cursor: usize,
    /// 上一次 Tab 有多个候选且没有公共扩展
    pending_double_tab: bool,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prints the prompt and edits one line.
    ///
    /// Returns `Ok(None)` on Ctrl-D with an empty buffer, or when the input
    /// ends before anything was typed.
    pub fn read_line<R: Read, W: Write>(
        &mut self,
        input: &mut R,
        out: &mut W,
        history: &History,
        trie: &Trie,
    ) -> io::Result<Option<String>> {
        self.buffer.clear();
        self.history_cursor = history.len();
        self.pending_double_tab = false;

        let mut keys = Keys::new(input);
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        loop {
            let Some(key) = keys.next_key()? else {
                debug!("输入结束");
                return Ok((!self.buffer.is_empty()).then(|| std::mem::take(&mut self.buffer)));
            };

            if key != Key::Tab {
                self.pending_double_tab = false;
            }

            match key {
                Key::Enter => {
                    writeln!(out)?;
                    out.flush()?;
                    return Ok(Some(std::mem::take(&mut self.buffer)));
                }
                Key::Char(c) => {
                    self.buffer.push(c);
                    write!(out, "{}", c)?;
                }
                Key::Backspace => {
                    if self.buffer.pop().is_some() {
                        write!(out, "\x08 \x08")?;
                    }
                }
                Key::Tab => self.complete(out, trie)?,
                Key::Up => {
                    if !history.is_empty() {
                        self.history_cursor = self.history_cursor.saturating_sub(1);
                        self.recall(out, history)?;
                    }
                }
                Key::Down => {
                    if !history.is_empty() {
                        self.history_cursor = (self.history_cursor + 1).min(history.len() - 1);
                        self.recall(out, history)?;
                    }
                }
                Key::CtrlC => {
                    write!(out, "^C\n{}", PROMPT)?;
                    self.buffer.clear();
                    self.history_cursor = history.len();
                }
                Key::CtrlD => {
                    if self.buffer.is_empty() {
                        writeln!(out)?;
                        out.flush()?;
                        return Ok(None);
                    }
                }
                Key::Unknown => {}
            }
            out.flush()?;
        }
    }

    fn complete<W: Write>(&mut self, out: &mut W, trie: &Trie) -> io::Result<()> {
        let completion = trie.auto_complete(&self.buffer);

        match completion.words.len() {
            0 => {
                write!(out, "{}", BELL)?;
            }
            1 => {
                let suffix = format!("{} ", completion.extension);
                self.buffer.push_str(&suffix);
                write!(out, "{}", suffix)?;
            }
            _ if !completion.extension.is_empty() => {
                self.buffer.push_str(&completion.extension);
                write!(out, "{}", completion.extension)?;
            }
            _ if self.pending_double_tab => {
                self.pending_double_tab = false;
                write!(out, "\n{}\n", completion.words.join("  "))?;
                self.redraw(out)?;
            }
            _ => {
                self.pending_double_tab = true;
                write!(out, "{}", BELL)?;
            }
        }
        Ok(())
    }

    fn recall<W: Write>(&mut self, out: &mut W, history: &History) -> io::Result<()> {
        if let Some(entry) = history.get(self.history_cursor) {
            self.buffer = entry.line();
            self.redraw(out)?;
        }
        Ok(())
    }

    fn redraw<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{}{}{}", CLEAR_LINE, PROMPT, self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(lines: &[&str]) -> History {
        let mut history = History::new();
        for line in lines {
            history.append(line.split_whitespace().map(String::from).collect());
        }
        history
    }

    fn commands() -> Trie {
        ["echo", "exit", "export", "history", "xyz_foo", "xyz_foo_bar"]
            .into_iter()
            .collect()
    }

    fn run(input: &[u8], history: &History, trie: &Trie) -> (Option<String>, String) {
        let mut editor = LineEditor::new();
        let mut input = input;
        let mut out = Vec::new();
        let line = editor
            .read_line(&mut input, &mut out, history, trie)
            .unwrap_or_default();
        (line, String::from_utf8_lossy(&out).into_owned())
    }

    #[test]
    fn test_typing_and_enter() {
        let (line, out) = run(b"echo hi\r", &History::new(), &Trie::new());
        assert_eq!(line.as_deref(), Some("echo hi"));
        assert_eq!(out, "$ echo hi\n");
    }

    #[test]
    fn test_backspace() {
        let (line, out) = run(b"lss\x7f -l\r", &History::new(), &Trie::new());
        assert_eq!(line.as_deref(), Some("ls -l"));
        assert!(out.contains("\x08 \x08"));
    }

    #[test]
    fn test_unique_completion_adds_space() {
        let (line, out) = run(b"ech\tx\r", &History::new(), &commands());
        assert_eq!(line.as_deref(), Some("echo x"));
        assert_eq!(out, "$ echo x\n");
    }

    #[test]
    fn test_shared_extension() {
        let (line, _) = run(b"xy\t\r", &History::new(), &commands());
        assert_eq!(line.as_deref(), Some("xyz_foo"));
    }

    #[test]
    fn test_no_match_rings_bell() {
        let (line, out) = run(b"zz\t\r", &History::new(), &commands());
        assert_eq!(line.as_deref(), Some("zz"));
        assert!(out.contains(BELL));
    }

    #[test]
    fn test_double_tab_lists_candidates() {
        let (line, out) = run(b"ex\t\t\r", &History::new(), &commands());
        assert_eq!(line.as_deref(), Some("ex"));
        assert!(out.contains(BELL));
        assert!(out.contains("\nexit  export\n"));
        assert!(out.ends_with(&format!("{}$ ex\n", CLEAR_LINE)));
    }

    #[test]
    fn test_double_tab_needs_consecutive_tabs() {
        let (_, out) = run(b"ex\ti\x7f\t\r", &History::new(), &commands());
        assert!(!out.contains("exit  export"));
        assert_eq!(out.matches(BELL).count(), 2);
    }

    #[test]
    fn test_history_recall() {
        let history = history(&["echo one", "echo two", "echo three"]);

        let (line, _) = run(b"\x1b[A\r", &history, &Trie::new());
        assert_eq!(line.as_deref(), Some("echo three"));

        let (line, _) = run(b"\x1b[A\x1b[A\r", &history, &Trie::new());
        assert_eq!(line.as_deref(), Some("echo two"));

        // Down 在最新一条处停住，不回到空行：Up, Up, Down 得到最新的一条，
        // 而不是"倒数第二条"
        let (line, out) = run(b"\x1b[A\x1b[A\x1b[B\r", &history, &Trie::new());
        assert_eq!(line.as_deref(), Some("echo three"));
        assert!(out.contains(&format!("{}$ echo two", CLEAR_LINE)));
    }

    #[test]
    fn test_history_recall_clamps() {
        let history = history(&["first", "second"]);

        let (line, _) = run(b"\x1b[A\x1b[A\x1b[A\x1b[A\r", &history, &Trie::new());
        assert_eq!(line.as_deref(), Some("first"));

        let (line, _) = run(b"\x1b[A\x1b[B\x1b[B\r", &history, &Trie::new());
        assert_eq!(line.as_deref(), Some("second"));

        let (line, _) = run(b"\x1b[A\r", &History::new(), &Trie::new());
        assert_eq!(line.as_deref(), Some(""));
    }

    #[test]
    fn test_lone_escape_is_ignored() {
        let (line, _) = run(b"\x1bls\r", &History::new(), &Trie::new());
        assert_eq!(line.as_deref(), Some("ls"));
    }

    #[test]
    fn test_ctrl_c_discards_buffer() {
        let (line, out) = run(b"abc\x03pwd\r", &History::new(), &Trie::new());
        assert_eq!(line.as_deref(), Some("pwd"));
        assert!(out.contains("^C\n$ "));
    }

    #[test]
    fn test_ctrl_d_and_eof() {
        let (line, _) = run(b"\x04", &History::new(), &Trie::new());
        assert_eq!(line, None);

        let (line, _) = run(b"ls\x04\r", &History::new(), &Trie::new());
        assert_eq!(line.as_deref(), Some("ls"));

        let (line, _) = run(b"", &History::new(), &Trie::new());
        assert_eq!(line, None);

        let (line, _) = run(b"partial", &History::new(), &Trie::new());
        assert_eq!(line.as_deref(), Some("partial"));
    }
}
