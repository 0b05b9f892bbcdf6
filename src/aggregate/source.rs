//! # 计算输出来源
//!
//! 解析核心只处理已经读出的文本。`OutputSource` 负责提供日志内容、
//! 输出目录下的文件列表和单个文件内容。
//!
//! ## 实现
//! - `LocalOutput`: 磁盘上的计算目录（`output.log` + `Output/`）
//! - `InMemoryOutput`: 内存中的文件表，用于测试或嵌入调用
//!
//! ## 依赖关系
//! - 被 `aggregate/mod.rs` 和 `commands/parse.rs` 使用
//! - 使用 `walkdir` 遍历目录

use crate::error::{ReportError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 默认日志文件名
pub const DEFAULT_LOG_NAME: &str = "output.log";

/// 默认输出子目录
pub const DEFAULT_OUTPUT_DIR: &str = "Output";

/// 已读出的输出文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
}

/// 计算输出来源
pub trait OutputSource {
    /// 读取日志全文
    fn log_content(&self) -> Result<String>;

    /// 输出目录下的所有文件名（相对路径，`/` 分隔）
    fn list_files(&self) -> Result<Vec<String>>;

    /// 读取单个输出文件
    fn read_file(&self, name: &str) -> Result<String>;
}

/// 磁盘上的计算目录
#[derive(Debug, Clone)]
pub struct LocalOutput {
    /// 计算目录
    root: PathBuf,
    /// 日志文件名（相对 root）
    log_name: String,
    /// 输出子目录（相对 root）
    output_dir: String,
}

impl LocalOutput {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            log_name: DEFAULT_LOG_NAME.to_string(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
        }
    }

    pub fn with_log_name(mut self, log_name: &str) -> Self {
        self.log_name = log_name.to_string();
        self
    }

    pub fn with_output_dir(mut self, output_dir: &str) -> Self {
        self.output_dir = output_dir.to_string();
        self
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join(&self.log_name)
    }

    pub fn output_path(&self) -> PathBuf {
        self.root.join(&self.output_dir)
    }
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| ReportError::UnreadableFile {
        path: path.display().to_string(),
        source: e,
    })
}

impl OutputSource for LocalOutput {
    fn log_content(&self) -> Result<String> {
        let path = self.log_path();
        if !path.is_file() {
            return Err(ReportError::MissingSource {
                what: "output log".to_string(),
                path: path.display().to_string(),
            });
        }
        read_text(&path)
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let dir = self.output_path();
        if !dir.is_dir() {
            return Err(ReportError::MissingSource {
                what: "output directory".to_string(),
                path: dir.display().to_string(),
            });
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&dir) {
            let entry = entry.map_err(|e| ReportError::UnreadableFile {
                path: e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| dir.display().to_string()),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(&dir) {
                let name = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    fn read_file(&self, name: &str) -> Result<String> {
        read_text(&self.output_path().join(name))
    }
}

/// 内存中的计算输出
#[derive(Debug, Clone, Default)]
pub struct InMemoryOutput {
    log: Option<String>,
    files: BTreeMap<String, String>,
}

impl InMemoryOutput {
    pub fn new(log: impl Into<String>) -> Self {
        Self {
            log: Some(log.into()),
            files: BTreeMap::new(),
        }
    }

    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(name.into(), content.into());
        self
    }
}

impl OutputSource for InMemoryOutput {
    fn log_content(&self) -> Result<String> {
        self.log.clone().ok_or_else(|| ReportError::MissingSource {
            what: "output log".to_string(),
            path: "<memory>".to_string(),
        })
    }

    fn list_files(&self) -> Result<Vec<String>> {
        Ok(self.files.keys().cloned().collect())
    }

    fn read_file(&self, name: &str) -> Result<String> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| ReportError::UnreadableFile {
                path: name.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            })
    }
}
