use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use log::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// 从 1 开始的序号
    pub position: usize,
    pub tokens: Vec<String>,
}

impl HistoryEntry {
    pub fn line(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Append-only session log of submitted command lines.
#[derive(Debug, Default, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    /// `append_new_to_file` 已经写出到的位置
    appended: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, tokens: Vec<String>) {
        let position = self.entries.len() + 1;
        self.entries.push(HistoryEntry { position, tokens });
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 最后 `n` 条记录
    pub fn last(&self, n: usize) -> &[HistoryEntry] {
        &self.entries[self.entries.len().saturating_sub(n)..]
    }

    /// Reads one whitespace-tokenized command per line, skipping blank lines.
    pub fn load(&mut self, path: &Path) -> io::Result<usize> {
        let content = fs::read_to_string(path)?;
        let before = self.entries.len();
        for line in content.lines() {
            let tokens: Vec<String> = line.split_whitespace().map(String::from).collect();
            if !tokens.is_empty() {
                self.append(tokens);
            }
        }
        let loaded = self.entries.len() - before;
        debug!("从 {} 读取了 {} 条历史记录", path.display(), loaded);
        Ok(loaded)
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let mut file = fs::File::create(path)?;
        write_entries(&mut file, &self.entries)?;
        debug!("写入 {} 条历史记录到 {}", self.entries.len(), path.display());
        Ok(())
    }

    pub fn append_to_file(&self, path: &Path, from: usize) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let from = from.min(self.entries.len());
        write_entries(&mut file, &self.entries[from..])
    }

    /// Appends the entries added since the previous call, then moves the cursor.
    pub fn append_new_to_file(&mut self, path: &Path) -> io::Result<()> {
        self.append_to_file(path, self.appended)?;
        self.appended = self.entries.len();
        Ok(())
    }
}

fn write_entries(writer: &mut impl Write, entries: &[HistoryEntry]) -> io::Result<()> {
    for entry in entries {
        writeln!(writer, "{}", entry.line())?;
    }
    writer.flush()
}
