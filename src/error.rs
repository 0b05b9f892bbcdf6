//! # 统一错误处理模块
//!
//! 定义 supercell-report 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误策略
//! - 所有错误都是致命的：流水线要么返回完整报告，要么返回单个错误
//! - 日志中无法识别的行不是错误，直接跳过
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// 出错的处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// 扫描 output.log
    LogScan,
    /// 汇总 Coulomb 能量文件
    EnergyFiles,
    /// 汇总结构文件
    StructureFiles,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::LogScan => write!(f, "log scan"),
            Stage::EnergyFiles => write!(f, "energy files"),
            Stage::StructureFiles => write!(f, "structure files"),
        }
    }
}

/// supercell-report 统一错误类型
#[derive(Error, Debug)]
pub enum ReportError {
    // ─────────────────────────────────────────────────────────────
    // 输入源错误
    // ─────────────────────────────────────────────────────────────
    #[error("Missing {what}: {path}")]
    MissingSource { what: String, path: String },

    #[error("Failed to read file: {path}")]
    UnreadableFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Malformed field '{field}' during {stage} ({input})\nReason: {reason}")]
    MalformedField {
        stage: Stage,
        input: String,
        field: &'static str,
        reason: String,
    },

    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Symmetry search failed for {structure}\nReason: {reason}")]
    SymmetryError { structure: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // 输出错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl ReportError {
    /// 构造 MalformedField 错误
    pub fn malformed(
        stage: Stage,
        input: impl Into<String>,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        ReportError::MalformedField {
            stage,
            input: input.into(),
            field,
            reason: reason.into(),
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, ReportError>;
