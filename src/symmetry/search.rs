//! # 空间群搜索
//!
//! supercell 把每个构型都写成 `P 1`，文件声明的空间群没有信息量。
//! `SpacegroupSearch` 用 `moyo` 在晶格、分数坐标和元素上做对称性搜索，
//! 再按搜索得到的国际表编号查出晶系、晶格类型和 Hermann-Mauguin 符号。
//!
//! ## 依赖关系
//! - 被 `symmetry/mod.rs` 导出，`commands/parse.rs` 默认使用
//! - 使用 `moyo` + `nalgebra`

use super::space_groups::short_symbol;
use super::{crystal_system, lattice_type, SymmetryClassifier, SymmetryInfo};
use crate::error::{ReportError, Result};
use crate::models::Crystal;

use moyo::base::{AngleTolerance, Cell, Lattice};
use moyo::data::Setting;
use moyo::MoyoDataset;
use nalgebra::{Matrix3, Vector3};
use std::collections::BTreeMap;
use tracing::debug;

/// 默认位置容差（Å）
pub const DEFAULT_SYMPREC: f64 = 0.01;

/// 基于 moyo 的对称性搜索
#[derive(Debug, Clone, Copy)]
pub struct SpacegroupSearch {
    pub symprec: f64,
}

impl Default for SpacegroupSearch {
    fn default() -> Self {
        SpacegroupSearch {
            symprec: DEFAULT_SYMPREC,
        }
    }
}

impl SpacegroupSearch {
    pub fn new(symprec: f64) -> Self {
        SpacegroupSearch { symprec }
    }

    fn error(crystal: &Crystal, reason: impl Into<String>) -> ReportError {
        ReportError::SymmetryError {
            structure: crystal.name.clone(),
            reason: reason.into(),
        }
    }
}

/// Crystal -> moyo Cell，元素按首次出现编号
fn to_cell(crystal: &Crystal) -> Cell {
    let [a, b, c] = crystal.lattice.matrix;
    // 行向量为 a, b, c
    let lattice = Lattice::new(Matrix3::new(
        a[0], a[1], a[2], b[0], b[1], b[2], c[0], c[1], c[2],
    ));

    let mut species: BTreeMap<&str, i32> = BTreeMap::new();
    let mut numbers = Vec::with_capacity(crystal.atoms.len());
    let mut positions = Vec::with_capacity(crystal.atoms.len());
    for atom in &crystal.atoms {
        let next = species.len() as i32;
        numbers.push(*species.entry(atom.element.as_str()).or_insert(next));
        positions.push(Vector3::new(
            atom.position[0],
            atom.position[1],
            atom.position[2],
        ));
    }

    Cell::new(lattice, positions, numbers)
}

impl SymmetryClassifier for SpacegroupSearch {
    fn classify_symmetry(&self, crystal: &Crystal) -> Result<SymmetryInfo> {
        if crystal.atoms.is_empty() {
            return Err(Self::error(crystal, "structure has no atoms"));
        }
        if self.symprec.is_nan() || self.symprec <= 0.0 {
            return Err(Self::error(
                crystal,
                format!("symprec must be positive, got {}", self.symprec),
            ));
        }

        let dataset = MoyoDataset::new(
            &to_cell(crystal),
            self.symprec,
            AngleTolerance::Default,
            Setting::Standard,
        )
        .map_err(|e| Self::error(crystal, format!("{:?}", e)))?;

        let number = u16::try_from(dataset.number)
            .ok()
            .filter(|n| crystal_system(*n).is_some())
            .ok_or_else(|| {
                Self::error(
                    crystal,
                    format!("space group number {} is outside 1-230", dataset.number),
                )
            })?;
        debug!("{}: space group #{}", crystal.name, number);

        Ok(SymmetryInfo {
            crystal_system: crystal_system(number).map(str::to_string),
            lattice_type: lattice_type(number).map(str::to_string),
            space_group_symbol: short_symbol(number).map(str::to_string),
        })
    }
}
