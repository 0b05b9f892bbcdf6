//! # Coulomb 能量文件汇总
//!
//! 能量文件只在要求计算 Coulomb 能量时存在，每行格式：
//! ```text
//! supercell_out_i01_w3.cif   -1234.5678
//! ```
//! 没有能量文件时既没有能量表也没有单位，这不是错误。
//!
//! ## 依赖关系
//! - 被 `aggregate/mod.rs` 使用
//! - 使用 `aggregate/naming.rs` 的 `LabelRule`

use super::naming::NamingConvention;
use super::source::SourceFile;
use crate::error::{ReportError, Result, Stage};
use crate::models::Label;
use std::collections::BTreeMap;
use tracing::debug;

/// supercell 输出的 Coulomb 能量单位
pub const COULOMB_ENERGY_UNIT: &str = "eV";

/// 标签 -> Coulomb 能量
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyTable {
    pub unit: String,
    pub energies: BTreeMap<Label, f64>,
}

/// 汇总所有能量文件；没有能量文件时返回 `None`
pub fn collect_energies(
    files: &[SourceFile],
    naming: &NamingConvention,
) -> Result<Option<EnergyTable>> {
    let energy_files: Vec<&SourceFile> = files
        .iter()
        .filter(|f| naming.is_energy_file(&f.name))
        .collect();

    if energy_files.is_empty() {
        debug!("No Coulomb energy files found");
        return Ok(None);
    }

    let mut energies = BTreeMap::new();
    for file in &energy_files {
        for (idx, line) in file.content.lines().enumerate() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }

            let input = || format!("{}: line {}: {}", file.name, idx + 1, line.trim());

            if parts.len() < 2 {
                return Err(ReportError::malformed(
                    Stage::EnergyFiles,
                    input(),
                    "coulombic_energy",
                    "expected '<structure> <energy>'",
                ));
            }

            let label = naming.rule.label(parts[0]).ok_or_else(|| {
                ReportError::malformed(
                    Stage::EnergyFiles,
                    input(),
                    "label",
                    format!("no label segment in '{}'", parts[0]),
                )
            })?;
            let energy: f64 = parts[1].parse().map_err(|_| {
                ReportError::malformed(
                    Stage::EnergyFiles,
                    input(),
                    "coulombic_energy",
                    format!("'{}' is not a valid number", parts[1]),
                )
            })?;

            energies.entry(label).or_insert(energy);
        }
    }

    debug!(
        "Collected {} Coulomb energies from {} file(s)",
        energies.len(),
        energy_files.len()
    );

    Ok(Some(EnergyTable {
        unit: COULOMB_ENERGY_UNIT.to_string(),
        energies,
    }))
}
