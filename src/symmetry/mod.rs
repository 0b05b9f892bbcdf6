//! # 对称性分类
//!
//! 结构文件汇总器通过 `SymmetryClassifier` 获取晶系、晶格类型和空间群符号。
//!
//! ## 实现
//! - `SpacegroupSearch`: 对结构做空间群搜索（默认）
//! - `DeclaredSymmetry`: 只报告结构文件自身声明的空间群
//!
//! ## 依赖关系
//! - 被 `aggregate/structures.rs` 和 `commands/parse.rs` 使用
//! - 使用 `models/structure.rs`
//! - 子模块: search, space_groups

pub mod search;
pub mod space_groups;

pub use search::SpacegroupSearch;

use crate::error::{ReportError, Result};
use crate::models::Crystal;

/// 对称性分类结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymmetryInfo {
    pub crystal_system: Option<String>,
    pub lattice_type: Option<String>,
    pub space_group_symbol: Option<String>,
}

/// 对称性分类协作者
pub trait SymmetryClassifier {
    fn classify_symmetry(&self, crystal: &Crystal) -> Result<SymmetryInfo>;
}

/// 按结构文件声明的空间群分类
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclaredSymmetry;

/// 菱方晶格的三方空间群编号
const RHOMBOHEDRAL_GROUPS: [u16; 7] = [146, 148, 155, 160, 161, 166, 167];

/// 国际表编号 -> 晶系
pub fn crystal_system(number: u16) -> Option<&'static str> {
    let system = match number {
        1..=2 => "triclinic",
        3..=15 => "monoclinic",
        16..=74 => "orthorhombic",
        75..=142 => "tetragonal",
        143..=167 => "trigonal",
        168..=194 => "hexagonal",
        195..=230 => "cubic",
        _ => return None,
    };
    Some(system)
}

/// 国际表编号 -> 晶格类型（三方晶系细分为菱方 / 六方）
pub fn lattice_type(number: u16) -> Option<&'static str> {
    if RHOMBOHEDRAL_GROUPS.contains(&number) {
        Some("rhombohedral")
    } else if (143..=167).contains(&number) {
        Some("hexagonal")
    } else {
        crystal_system(number)
    }
}

impl SymmetryClassifier for DeclaredSymmetry {
    fn classify_symmetry(&self, crystal: &Crystal) -> Result<SymmetryInfo> {
        let mut info = SymmetryInfo {
            space_group_symbol: crystal
                .space_group
                .as_ref()
                .map(|s| s.split_whitespace().collect::<String>())
                .filter(|s| !s.is_empty()),
            ..Default::default()
        };

        if let Some(number) = crystal.space_group_number {
            let system = crystal_system(number).ok_or_else(|| ReportError::ParseError {
                format: "cif".to_string(),
                path: crystal.name.clone(),
                reason: format!("Space group number {} is outside 1-230", number),
            })?;
            info.crystal_system = Some(system.to_string());
            info.lattice_type = lattice_type(number).map(str::to_string);
        }

        Ok(info)
    }
}
