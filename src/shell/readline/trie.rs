use std::collections::BTreeMap;

/// 前缀树节点。子节点按字符排序，遍历顺序确定。
#[derive(Debug, Default, Clone)]
pub struct TrieNode {
    children: BTreeMap<char, TrieNode>,
    terminal: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Characters every completion shares beyond the prefix.
    pub extension: String,
    pub words: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct Trie {
    root: TrieNode,
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, word: &str) {
        let mut node = &mut self.root;
        for c in word.chars() {
            node = node.children.entry(c).or_default();
        }
        node.terminal = true;
    }

    #[cfg(test)]
    pub fn contains(&self, word: &str) -> bool {
        self.find(word).is_some_and(|node| node.terminal)
    }

    pub fn auto_complete(&self, prefix: &str) -> Completion {
        let Some(node) = self.find(prefix) else {
            return Completion::default();
        };

        let mut words = Vec::new();
        let mut current = prefix.to_string();
        collect_words(node, &mut current, &mut words);

        let extension = common_extension(&words, prefix.len());
        Completion { extension, words }
    }

    fn find(&self, prefix: &str) -> Option<&TrieNode> {
        prefix
            .chars()
            .try_fold(&self.root, |node, c| node.children.get(&c))
    }
}

impl<S: AsRef<str>> FromIterator<S> for Trie {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut trie = Trie::new();
        for word in iter {
            trie.insert(word.as_ref());
        }
        trie
    }
}

fn collect_words(node: &TrieNode, current: &mut String, words: &mut Vec<String>) {
    if node.terminal {
        words.push(current.clone());
    }
    for (c, child) in &node.children {
        current.push(*c);
        collect_words(child, current, words);
        current.pop();
    }
}

/// 所有候选在前缀之后的最长公共部分
fn common_extension(words: &[String], prefix_len: usize) -> String {
    let Some((first, rest)) = words.split_first() else {
        return String::new();
    };
    let mut common = &first[prefix_len..];
    for word in rest {
        let shared: usize = common
            .chars()
            .zip(word[prefix_len..].chars())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a.len_utf8())
            .sum();
        common = &common[..shared];
    }
    common.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Trie {
        ["echo", "exit", "export"].into_iter().collect()
    }

    #[test]
    fn test_insert_and_contains() {
        let trie = sample();
        assert!(trie.contains("echo"));
        assert!(trie.contains("export"));
        assert!(!trie.contains("ex"));
        assert!(!trie.contains("exports"));
    }

    #[test]
    fn test_ambiguous_completion() {
        let completion = sample().auto_complete("ex");
        assert_eq!(completion.extension, "");
        assert_eq!(completion.words, vec!["exit", "export"]);
    }

    #[test]
    fn test_unique_completion() {
        let completion = sample().auto_complete("ech");
        assert_eq!(completion.extension, "o");
        assert_eq!(completion.words, vec!["echo"]);
    }

    #[test]
    fn test_shared_extension() {
        let trie: Trie = ["xyz_foo", "xyz_foo_bar", "xyz_foo_bar_baz"].into_iter().collect();
        let completion = trie.auto_complete("xy");
        assert_eq!(completion.extension, "z_foo");
        assert_eq!(completion.words.len(), 3);

        let completion = trie.auto_complete("xyz_foo_");
        assert_eq!(completion.extension, "bar");
    }

    #[test]
    fn test_missing_prefix() {
        let completion = sample().auto_complete("ls");
        assert_eq!(completion, Completion::default());
    }

    #[test]
    fn test_empty_prefix_enumerates_sorted() {
        let completion = sample().auto_complete("");
        assert_eq!(completion.words, vec!["echo", "exit", "export"]);
        assert_eq!(completion.extension, "e");
    }

    #[test]
    fn test_exact_word_is_a_completion() {
        let completion = sample().auto_complete("echo");
        assert_eq!(completion.words, vec!["echo"]);
        assert_eq!(completion.extension, "");
    }

    #[test]
    fn test_non_ascii_words() {
        let trie: Trie = ["über", "übel"].into_iter().collect();
        let completion = trie.auto_complete("ü");
        assert_eq!(completion.extension, "be");
    }
}
