//! # 解析器模块
//!
//! 提供 supercell 日志解析器和结构文件解析器。
//!
//! ## 依赖关系
//! - 被 `aggregate/` 和 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: supercell_log, cif

pub mod cif;
pub mod supercell_log;

use crate::error::{ReportError, Result};
use crate::models::Crystal;

/// 支持的结构文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureFormat {
    Cif,
}

impl StructureFormat {
    /// 从扩展名推断格式
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_lowercase().as_str() {
            "cif" => Ok(StructureFormat::Cif),
            other => Err(ReportError::InvalidArgument(format!(
                "Unsupported structure extension: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for StructureFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StructureFormat::Cif => write!(f, "cif"),
        }
    }
}

/// 结构解析协作者
pub trait StructureParser {
    /// 将文件内容解析为结构对象，`name` 用作缺省结构名和错误信息
    fn parse_structure(&self, content: &str, format: StructureFormat, name: &str)
        -> Result<Crystal>;
}

/// 内置结构解析器
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeStructureParser;

impl StructureParser for NativeStructureParser {
    fn parse_structure(
        &self,
        content: &str,
        format: StructureFormat,
        name: &str,
    ) -> Result<Crystal> {
        match format {
            StructureFormat::Cif => cif::parse_cif_content(content, name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            StructureFormat::from_extension("CIF").unwrap(),
            StructureFormat::Cif
        );
        assert!(StructureFormat::from_extension("res").is_err());
    }

    #[test]
    fn test_parse_error_names_format() {
        let err = NativeStructureParser
            .parse_structure("data_empty\n", StructureFormat::Cif, "supercell_out_A1_d3.cif")
            .unwrap_err();
        match err {
            ReportError::ParseError { format, path, .. } => {
                assert_eq!(format, StructureFormat::Cif.to_string());
                assert_eq!(format, "cif");
                assert_eq!(path, "supercell_out_A1_d3.cif");
            }
            other => panic!("expected ParseError, got {:?}", other),
        }
    }
}
