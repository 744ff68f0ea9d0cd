use dotenv::dotenv;
use std::env;
use std::path::PathBuf;

pub struct Config {
    pub name: String,
    pub config_dir: PathBuf,
    pub path_dirs: Vec<PathBuf>,
    pub home: Option<PathBuf>,
    pub history_file: Option<PathBuf>,
    pub logger_level: String,
    pub logger_dir: PathBuf,
    pub logger_stderr: bool,
}

impl Config {
    fn get_config_dir() -> PathBuf {
        if let Ok(home) = env::var("HOME") {
            PathBuf::from(home).join(".config/kosh")
        } else {
            PathBuf::from("tmp")
        }
    }

    fn default() -> Self {
        let config_dir = Self::get_config_dir();
        Config {
            name: String::from("kosh"),
            logger_dir: config_dir.join("logs"),
            config_dir,
            path_dirs: Vec::new(),
            home: None,
            history_file: None,
            logger_level: String::from("warn"),
            logger_stderr: false,
        }
    }

    pub fn new() -> Self {
        // 优先加载环境变量
        if cfg!(debug_assertions) {
            dotenv::from_filename(".env.development").ok();
        } else {
            dotenv().ok();
        }

        let mut config = Config::default();

        if let Ok(path) = env::var("PATH") {
            config.path_dirs = split_search_path(&path);
        }

        if let Ok(home) = env::var("HOME") {
            config.home = Some(PathBuf::from(home));
        }

        if let Ok(history) = env::var("HISTFILE") {
            if !history.is_empty() {
                config.history_file = Some(PathBuf::from(history));
            }
        }

        if let Ok(level) = env::var("KOSH_LOG_LEVEL") {
            config.logger_level = level;
        }

        if let Ok(dir) = env::var("KOSH_LOG_DIR") {
            config.logger_dir = PathBuf::from(dir);
        }

        config.logger_stderr = env::var("KOSH_LOG_STDERR").is_ok_and(|v| v == "1");

        config
    }
}

/// Splits a `PATH`-style value into directories, skipping empty entries.
pub fn split_search_path(value: &str) -> Vec<PathBuf> {
    value
        .split(':')
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .collect()
}
