//! # 任务收集器
//!
//! 根据输入模式枚举待上传的 (文件, 目标键) 列表。
//!
//! ## 功能
//! - 单文件模式：目标键 = 前缀 + 文件名
//! - 多文件模式：shell glob 展开，目标键 = 前缀 + 文件名
//! - 递归模式：遍历目录（跳过隐藏项），目标键 = 前缀 + 相对路径
//!
//! ## 依赖关系
//! - 被 `commands/upload.rs` 调用
//! - 使用 `glob` 展开模式，`walkdir` 遍历目录

use crate::error::{Result, UploadError};
use crate::models::{join_key, UploadTask};
use crate::utils::output;

use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// 输入模式（每次调用只能选择一种）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// 单个文件
    Single(PathBuf),
    /// 一个或多个 glob 模式
    Multiple(Vec<String>),
    /// 根目录 + 文件名过滤（逗号分隔的多模式）
    Recursive { root: PathBuf, filter: String },
}

/// 任务收集器
pub struct TaskCollector {
    mode: InputMode,
    prefix: String,
}

impl TaskCollector {
    /// 创建新的任务收集器
    pub fn new(mode: InputMode, prefix: impl Into<String>) -> Self {
        Self {
            mode,
            prefix: prefix.into(),
        }
    }

    /// 收集所有任务
    ///
    /// 可重复调用，目录未变化时结果相同。
    pub fn collect(&self) -> Result<Vec<UploadTask>> {
        match &self.mode {
            InputMode::Single(path) => self.collect_single(path),
            InputMode::Multiple(patterns) => self.collect_multiple(patterns),
            InputMode::Recursive { root, filter } => self.collect_recursive(root, filter),
        }
    }

    fn collect_single(&self, path: &Path) -> Result<Vec<UploadTask>> {
        if !path.is_file() {
            return Err(UploadError::LocalFileNotFound {
                path: path.display().to_string(),
            });
        }

        Ok(vec![self.keyed_by_name(path)])
    }

    fn collect_multiple(&self, patterns: &[String]) -> Result<Vec<UploadTask>> {
        // 与 shell 一致：以 . 开头的文件名必须显式匹配
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        };

        let mut tasks = Vec::new();
        for pattern in patterns {
            // shell 已展开的现有文件按字面处理，文件名中的 [ ] * ? 不再当作模式
            let literal = Path::new(pattern);
            if literal.is_file() {
                tasks.push(self.keyed_by_name(literal));
                continue;
            }

            let paths =
                glob::glob_with(pattern, options).map_err(|e| UploadError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;

            for entry in paths {
                match entry {
                    Ok(path) if path.is_file() => tasks.push(self.keyed_by_name(&path)),
                    Ok(_) => {}
                    Err(e) => output::print_warning(&format!("Skipping unreadable path: {}", e)),
                }
            }
        }

        if tasks.is_empty() {
            return Err(UploadError::NoGlobMatches {
                pattern: patterns.join(" "),
            });
        }

        Ok(tasks)
    }

    fn collect_recursive(&self, root: &Path, filter: &str) -> Result<Vec<UploadTask>> {
        if !root.is_dir() {
            return Err(UploadError::RootNotFound {
                path: root.display().to_string(),
            });
        }

        let patterns = parse_filter(filter)?;

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e));

        let mut tasks = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    output::print_warning(&format!("Skipping unreadable entry: {}", e));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(name) = entry.file_name().to_str() else {
                output::print_warning(&format!(
                    "Skipping file with non UTF-8 name: {}",
                    entry.path().display()
                ));
                continue;
            };

            if !matches_any(&patterns, name) {
                continue;
            }

            let relative = relative_key(root, entry.path());
            tasks.push(UploadTask::new(
                entry.path(),
                join_key(&self.prefix, &relative),
            ));
        }

        if tasks.is_empty() {
            return Err(UploadError::NoRecursiveMatches {
                root: root.display().to_string(),
                filter: filter.to_string(),
            });
        }

        Ok(tasks)
    }

    /// 以文件名为目标键（不保留目录结构）
    fn keyed_by_name(&self, path: &Path) -> UploadTask {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        UploadTask::new(path, join_key(&self.prefix, &name))
    }
}

/// 解析过滤模式（逗号分隔的多模式，空则匹配全部）
fn parse_filter(filter: &str) -> Result<Vec<Pattern>> {
    let mut patterns: Vec<&str> = filter
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if patterns.is_empty() {
        patterns = vec!["*"];
    }

    patterns
        .into_iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| UploadError::InvalidPattern {
                pattern: p.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// 检查文件名是否匹配任一模式
fn matches_any(patterns: &[Pattern], filename: &str) -> bool {
    patterns.iter().any(|p| p.matches(filename))
}

/// 隐藏项（名称以 . 开头）；根目录本身不参与判断
fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

/// 相对于根目录的路径，统一使用 `/` 分隔
fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"data").unwrap();
    }

    fn keys(tasks: &[UploadTask]) -> Vec<&str> {
        tasks.iter().map(|t| t.destination_key()).collect()
    }

    #[test]
    fn test_recursive_filter_skips_hidden_and_unmatched() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a/x.nc");
        touch(dir.path(), "a/.hidden.nc");
        touch(dir.path(), "b/y.tif");

        let collector = TaskCollector::new(
            InputMode::Recursive {
                root: dir.path().to_path_buf(),
                filter: "*.nc".to_string(),
            },
            "P",
        );
        let tasks = collector.collect().unwrap();

        assert_eq!(keys(&tasks), vec!["P/a/x.nc"]);
        assert_eq!(tasks[0].source_path(), dir.path().join("a/x.nc"));
    }

    #[test]
    fn test_recursive_preserves_relative_paths() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "2024/01/product.tif");
        touch(dir.path(), "2024/02/product.tif");
        touch(dir.path(), "top.tif");

        let collector = TaskCollector::new(
            InputMode::Recursive {
                root: dir.path().to_path_buf(),
                filter: "*".to_string(),
            },
            "HRL/v1/",
        );
        let tasks = collector.collect().unwrap();

        assert_eq!(
            keys(&tasks),
            vec![
                "HRL/v1/2024/01/product.tif",
                "HRL/v1/2024/02/product.tif",
                "HRL/v1/top.tif"
            ]
        );
    }

    #[test]
    fn test_recursive_prunes_hidden_directories() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), ".git/config.nc");
        touch(dir.path(), "data/.cache/tmp.nc");
        touch(dir.path(), "data/keep.nc");

        let collector = TaskCollector::new(
            InputMode::Recursive {
                root: dir.path().to_path_buf(),
                filter: String::new(),
            },
            "P",
        );
        let tasks = collector.collect().unwrap();

        assert_eq!(keys(&tasks), vec!["P/data/keep.nc"]);
    }

    #[test]
    fn test_recursive_comma_separated_filter() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.nc");
        touch(dir.path(), "b.tif");
        touch(dir.path(), "c.json");

        let collector = TaskCollector::new(
            InputMode::Recursive {
                root: dir.path().to_path_buf(),
                filter: "*.nc, *.tif".to_string(),
            },
            "P",
        );
        let tasks = collector.collect().unwrap();

        assert_eq!(keys(&tasks), vec!["P/a.nc", "P/b.tif"]);
    }

    #[test]
    fn test_recursive_enumeration_is_repeatable() {
        let dir = TempDir::new().unwrap();
        for name in ["z.nc", "m/a.nc", "m/b.nc", "c.nc"] {
            touch(dir.path(), name);
        }

        let collector = TaskCollector::new(
            InputMode::Recursive {
                root: dir.path().to_path_buf(),
                filter: "*.nc".to_string(),
            },
            "P",
        );

        assert_eq!(collector.collect().unwrap(), collector.collect().unwrap());
    }

    #[test]
    fn test_recursive_missing_root() {
        let dir = TempDir::new().unwrap();
        let collector = TaskCollector::new(
            InputMode::Recursive {
                root: dir.path().join("missing"),
                filter: "*".to_string(),
            },
            "P",
        );

        let err = collector.collect().unwrap_err();
        assert!(matches!(err, UploadError::RootNotFound { .. }));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_recursive_no_matches() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a/y.tif");

        let collector = TaskCollector::new(
            InputMode::Recursive {
                root: dir.path().to_path_buf(),
                filter: "*.nc".to_string(),
            },
            "P",
        );

        let err = collector.collect().unwrap_err();
        assert!(matches!(err, UploadError::NoRecursiveMatches { .. }));
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn test_single_uses_base_name() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "deep/nested/file.nc");

        let collector = TaskCollector::new(
            InputMode::Single(dir.path().join("deep/nested/file.nc")),
            "P/2024",
        );
        let tasks = collector.collect().unwrap();

        assert_eq!(keys(&tasks), vec!["P/2024/file.nc"]);
    }

    #[test]
    fn test_single_missing_file() {
        let dir = TempDir::new().unwrap();
        let collector = TaskCollector::new(InputMode::Single(dir.path().join("nope.nc")), "P");

        let err = collector.collect().unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_multiple_uses_base_name_and_skips_dirs() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "sub/a.nc");
        touch(dir.path(), "sub/b.nc");
        fs::create_dir_all(dir.path().join("sub/dir.nc")).unwrap();

        let pattern = format!("{}/sub/*.nc", dir.path().display());
        let collector = TaskCollector::new(InputMode::Multiple(vec![pattern]), "P");
        let tasks = collector.collect().unwrap();

        assert_eq!(keys(&tasks), vec!["P/a.nc", "P/b.nc"]);
    }

    #[test]
    fn test_multiple_accepts_shell_expanded_paths() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.nc");
        touch(dir.path(), "b.nc");

        let patterns = vec![
            dir.path().join("a.nc").display().to_string(),
            dir.path().join("b.nc").display().to_string(),
        ];
        let collector = TaskCollector::new(InputMode::Multiple(patterns), "P");

        assert_eq!(keys(&collector.collect().unwrap()), vec!["P/a.nc", "P/b.nc"]);
    }

    #[test]
    fn test_multiple_takes_existing_bracketed_name_literally() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "prod[1].nc");
        touch(dir.path(), "prod1.nc");

        let patterns = vec![dir.path().join("prod[1].nc").display().to_string()];
        let collector = TaskCollector::new(InputMode::Multiple(patterns), "P");

        assert_eq!(keys(&collector.collect().unwrap()), vec!["P/prod[1].nc"]);
    }

    #[test]
    fn test_multiple_still_expands_brackets_without_literal_file() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "prod1.nc");

        let patterns = vec![format!("{}/prod[1].nc", dir.path().display())];
        let collector = TaskCollector::new(InputMode::Multiple(patterns), "P");

        assert_eq!(keys(&collector.collect().unwrap()), vec!["P/prod1.nc"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_recursive_skips_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        touch(dir.path(), "good.nc");
        fs::write(dir.path().join(OsStr::from_bytes(b"bad\xff.nc")), b"data").unwrap();

        let collector = TaskCollector::new(
            InputMode::Recursive {
                root: dir.path().to_path_buf(),
                filter: "*".to_string(),
            },
            "P",
        );

        assert_eq!(keys(&collector.collect().unwrap()), vec!["P/good.nc"]);
    }

    #[test]
    fn test_multiple_no_matches() {
        let dir = TempDir::new().unwrap();
        let pattern = format!("{}/*.nc", dir.path().display());
        let collector = TaskCollector::new(InputMode::Multiple(vec![pattern]), "P");

        let err = collector.collect().unwrap_err();
        assert!(matches!(err, UploadError::NoGlobMatches { .. }));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_multiple_invalid_pattern() {
        let collector = TaskCollector::new(InputMode::Multiple(vec!["[".to_string()]), "P");
        let err = collector.collect().unwrap_err();
        assert!(matches!(err, UploadError::InvalidPattern { .. }));
    }
}
