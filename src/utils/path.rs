use std::collections::BTreeSet;
use std::fs::{self, read_dir};
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use log::error;

/// 可执行的普通文件（任意执行位）
pub fn is_executable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

/// Resolves a program name against the search directories, in order.
///
/// A name containing `/` is not searched; it resolves to itself when it
/// points at an executable file.
pub fn find_executable(dirs: &[PathBuf], name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    if name.contains('/') {
        let path = PathBuf::from(name);
        return is_executable(&path).then_some(path);
    }
    dirs.iter()
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

/// 列出搜索路径中所有可执行文件的名字，用于补全
pub fn executable_names(dirs: &[PathBuf]) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for dir in dirs {
        let list = match read_dir(dir) {
            Ok(list) => list,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    error!("kosh: fs read_dir error: {}: {}", dir.display(), e);
                }
                continue;
            }
        };
        for entry in list.flatten() {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if is_executable(&entry.path()) {
                names.insert(name);
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[allow(clippy::unwrap_used)]
    fn make_file(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_find_executable_respects_directory_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        make_file(first.path(), "tool", 0o644);
        let expected = make_file(second.path(), "tool", 0o755);
        make_file(first.path(), "other", 0o755);

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(find_executable(&dirs, "tool"), Some(expected));
        assert_eq!(find_executable(&dirs, "missing"), None);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_find_executable_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();
        let dirs = vec![dir.path().to_path_buf()];
        assert_eq!(find_executable(&dirs, "subdir"), None);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_find_executable_with_slash() {
        let dir = tempfile::tempdir().unwrap();
        let path = make_file(dir.path(), "script", 0o755);
        let name = path.to_str().unwrap();
        assert_eq!(find_executable(&[], name), Some(path.clone()));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_executable_names() {
        let dir = tempfile::tempdir().unwrap();
        make_file(dir.path(), "b-tool", 0o755);
        make_file(dir.path(), "a-tool", 0o700);
        make_file(dir.path(), "data.txt", 0o644);
        let dirs = vec![dir.path().to_path_buf(), PathBuf::from("/does/not/exist")];
        let names: Vec<String> = executable_names(&dirs).into_iter().collect();
        assert_eq!(names, vec!["a-tool".to_string(), "b-tool".to_string()]);
    }
}
