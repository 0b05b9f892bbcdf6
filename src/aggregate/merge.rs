//! # 报告合并
//!
//! 将日志扫描得到的报告骨架与两个汇总器的结果按标签合并。
//! 合并按字段叠加：缺省值永远不会覆盖已有值，因此结果与合并顺序无关。
//!
//! ## 依赖关系
//! - 被 `aggregate/mod.rs` 使用
//! - 使用 `aggregate/energy.rs`, `models/report.rs`

use super::energy::EnergyTable;
use crate::models::{Label, Report, StructureRecord};
use std::collections::BTreeMap;
use tracing::warn;

/// 报告合并器，独占正在构建的报告直到 `finish`
pub struct ReportMerger {
    report: Report,
}

impl ReportMerger {
    pub fn new(skeleton: Report) -> Self {
        ReportMerger { report: skeleton }
    }

    /// 合并 Coulomb 能量及其单位
    pub fn with_energies(&mut self, table: EnergyTable) -> &mut Self {
        if self.report.coulombic_energy_unit.is_none() {
            self.report.coulombic_energy_unit = Some(table.unit);
        }
        for (label, energy) in table.energies {
            self.merge_record(
                label,
                StructureRecord {
                    coulombic_energy: Some(energy),
                    ..Default::default()
                },
            );
        }
        self
    }

    /// 合并结构文件得到的简并度与对称性
    pub fn with_structures(&mut self, records: BTreeMap<Label, StructureRecord>) -> &mut Self {
        for (label, record) in records {
            self.merge_record(label, record);
        }
        self
    }

    fn merge_record(&mut self, label: Label, record: StructureRecord) {
        self.report
            .structures_info
            .entry(label)
            .or_default()
            .merge(record);
    }

    pub fn finish(self) -> Report {
        self.report
    }
}

/// 记录只出现在一个来源中的标签
pub fn warn_unmatched_labels(energies: &EnergyTable, records: &BTreeMap<Label, StructureRecord>) {
    for label in energies.energies.keys().filter(|l| !records.contains_key(*l)) {
        warn!("Coulomb energy for '{}' has no matching structure file", label);
    }
    for label in records.keys().filter(|l| !energies.energies.contains_key(*l)) {
        warn!("Structure '{}' has no Coulomb energy", label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReportBuilder;

    fn energies() -> EnergyTable {
        EnergyTable {
            unit: "eV".to_string(),
            energies: BTreeMap::from([(Label::new("A1"), -12.4), (Label::new("B2"), -3.0)]),
        }
    }

    fn records() -> BTreeMap<Label, StructureRecord> {
        BTreeMap::from([(
            Label::new("A1"),
            StructureRecord {
                degeneracy: Some(3),
                crystal_system: Some("cubic".to_string()),
                lattice_type: Some("cubic".to_string()),
                space_group_symbol: Some("Pm-3m".to_string()),
                coulombic_energy: None,
            },
        )])
    }

    #[test]
    fn test_merge_is_order_independent() {
        let mut first = ReportMerger::new(ReportBuilder::new().build());
        first.with_energies(energies()).with_structures(records());

        let mut second = ReportMerger::new(ReportBuilder::new().build());
        second.with_structures(records()).with_energies(energies());

        let first = first.finish();
        let second = second.finish();
        assert_eq!(first, second);

        let a1 = &first.structures_info[&Label::new("A1")];
        assert_eq!(a1.degeneracy, Some(3));
        assert_eq!(a1.crystal_system.as_deref(), Some("cubic"));
        assert_eq!(a1.coulombic_energy, Some(-12.4));
        assert_eq!(first.coulombic_energy_unit.as_deref(), Some("eV"));
    }

    #[test]
    fn test_energy_only_labels_are_kept() {
        let mut merger = ReportMerger::new(ReportBuilder::new().build());
        merger.with_energies(energies()).with_structures(records());
        let report = merger.finish();

        let b2 = &report.structures_info[&Label::new("B2")];
        assert_eq!(b2.coulombic_energy, Some(-3.0));
        assert_eq!(b2.degeneracy, None);
        assert_eq!(b2.crystal_system, None);
    }

    #[test]
    fn test_skeleton_scalars_survive_merge() {
        let mut builder = ReportBuilder::new();
        builder.random_seed(42).total_charge(1);
        let mut merger = ReportMerger::new(builder.build());
        merger.with_structures(records());
        let report = merger.finish();

        assert_eq!(report.random_seed, Some(42));
        assert!(report.charge_warning);
        assert_eq!(report.coulombic_energy_unit, None);
        assert_eq!(report.structures_info.len(), 1);
    }
}
