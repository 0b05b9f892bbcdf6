//! # 输出文件命名约定
//!
//! supercell 以 `-o <prefix>` 运行时写出的文件：
//! ```text
//! <prefix>_<label>_w<degeneracy>.cif          每个构型的结构文件
//! <prefix>_coulomb_energy_<method>.txt        Coulomb 能量（仅在要求计算时存在）
//! ```
//! 能量文件每行为 `<结构文件名> <能量>`。
//!
//! 标签是按下划线切分后固定位置的片段，位置由前缀本身包含的片段数决定。
//! 结构文件与能量文件必须使用同一个 `LabelRule`，否则两边的标签无法对齐。
//!
//! ## 依赖关系
//! - 被 `aggregate/energy.rs`, `aggregate/structures.rs`, `aggregate/mod.rs` 使用
//! - 使用 `models/report.rs` 的 `Label`

use crate::error::{ReportError, Result};
use crate::models::Label;
use std::path::Path;

/// 默认输出前缀
pub const DEFAULT_PREFIX: &str = "supercell_out";

/// 默认结构文件扩展名
pub const DEFAULT_STRUCTURE_EXTENSION: &str = "cif";

/// 能量文件标记（接在前缀之后）
const ENERGY_MARKER_SUFFIX: &str = "coulomb_energy_";

/// 从文件名中取标签和简并度的位置规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelRule {
    /// 标签所在的下划线片段下标（从 0 开始）
    pub segment: usize,
    /// 简并度片段前的字符数，如 `w3` 中的 `w`
    pub degeneracy_prefix_len: usize,
}

impl LabelRule {
    /// 按前缀推导：标签紧跟在前缀的所有片段之后
    pub fn for_prefix(prefix: &str) -> Self {
        LabelRule {
            segment: prefix.split('_').count(),
            degeneracy_prefix_len: 1,
        }
    }

    /// 从文件名（或能量文件中的结构名）提取标签
    pub fn label(&self, name: &str) -> Option<Label> {
        basename(name)
            .split('_')
            .nth(self.segment)
            .filter(|s| !s.is_empty())
            .map(Label::new)
    }

    /// 从结构文件名提取简并度片段：最后一个下划线片段，去扩展名，去前导字符
    pub fn degeneracy_token<'a>(&self, name: &'a str) -> Option<&'a str> {
        let segments: Vec<&str> = basename(name).split('_').collect();
        if segments.len() <= self.segment + 1 {
            return None;
        }
        let last = segments[segments.len() - 1];
        let stem = last.split('.').next().unwrap_or(last);
        stem.char_indices()
            .nth(self.degeneracy_prefix_len)
            .map(|(i, _)| &stem[i..])
    }
}

/// 命名约定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConvention {
    pub prefix: String,
    pub structure_extension: String,
    pub rule: LabelRule,
}

impl Default for NamingConvention {
    fn default() -> Self {
        NamingConvention {
            prefix: DEFAULT_PREFIX.to_string(),
            structure_extension: DEFAULT_STRUCTURE_EXTENSION.to_string(),
            rule: LabelRule::for_prefix(DEFAULT_PREFIX),
        }
    }
}

impl NamingConvention {
    /// 创建并校验命名约定
    pub fn new(prefix: &str, structure_extension: &str) -> Result<Self> {
        if prefix.is_empty() || prefix.split('_').any(str::is_empty) {
            return Err(ReportError::InvalidArgument(format!(
                "Output prefix '{}' must be non-empty and must not contain empty '_' segments",
                prefix
            )));
        }

        let ext = structure_extension.trim_start_matches('.');
        if ext.is_empty() || ext.contains('.') {
            return Err(ReportError::InvalidArgument(format!(
                "Invalid structure extension: '{}'",
                structure_extension
            )));
        }

        Ok(NamingConvention {
            prefix: prefix.to_string(),
            structure_extension: ext.to_lowercase(),
            rule: LabelRule::for_prefix(prefix),
        })
    }

    /// 能量文件名中的标记子串
    pub fn energy_marker(&self) -> String {
        format!("{}_{}", self.prefix, ENERGY_MARKER_SUFFIX)
    }

    pub fn is_energy_file(&self, name: &str) -> bool {
        basename(name).contains(&self.energy_marker())
    }

    pub fn is_structure_file(&self, name: &str) -> bool {
        Path::new(basename(name))
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.structure_extension))
    }
}

/// 去掉目录部分
fn basename(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}
