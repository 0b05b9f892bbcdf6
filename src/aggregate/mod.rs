//! # 输出汇总模块
//!
//! 完整的解析流水线：
//! ```text
//! output.log ──► supercell_log::scan_log ─────────────┐
//! Output/*coulomb_energy_* ──► energy::collect_energies ─┼─► merge::ReportMerger ─► (Report, 结构表)
//! Output/*.cif ──► structures::collect_structures ───┘
//! ```
//! 任一阶段出错即整体失败，不返回部分结果。
//!
//! ## 依赖关系
//! - 被 `commands/parse.rs` 使用
//! - 使用 `parsers/`, `symmetry/`, `models/`
//! - 子模块: naming, source, energy, structures, merge, export

pub mod energy;
pub mod export;
pub mod merge;
pub mod naming;
pub mod source;
pub mod structures;

pub use merge::ReportMerger;
pub use naming::NamingConvention;
pub use source::{InMemoryOutput, LocalOutput, OutputSource, SourceFile};

use crate::error::Result;
use crate::models::{Crystal, Label, Report};
use crate::parsers::supercell_log::scan_log;
use crate::parsers::StructureParser;
use crate::symmetry::SymmetryClassifier;
use std::collections::BTreeMap;
use tracing::debug;

/// 运行完整流水线，返回报告和按标签索引的结构
pub fn parse_outputs(
    source: &dyn OutputSource,
    naming: &NamingConvention,
    parser: &dyn StructureParser,
    classifier: &dyn SymmetryClassifier,
) -> Result<(Report, BTreeMap<Label, Crystal>)> {
    let skeleton = scan_log(&source.log_content()?)?;

    // 只读取两类相关文件，按名称排序保证结果确定
    let mut names = source.list_files()?;
    names.sort();
    let mut files = Vec::new();
    for name in names {
        if naming.is_energy_file(&name) || naming.is_structure_file(&name) {
            let content = source.read_file(&name)?;
            files.push(SourceFile { name, content });
        }
    }
    debug!("Read {} auxiliary output files", files.len());

    let energies = energy::collect_energies(&files, naming)?;
    let structures = structures::collect_structures(&files, naming, parser, classifier)?;

    let mut merger = ReportMerger::new(skeleton);
    if let Some(table) = energies {
        merge::warn_unmatched_labels(&table, &structures.records);
        merger.with_energies(table);
    }
    merger.with_structures(structures.records);

    Ok((merger.finish(), structures.structures))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ReportError, Stage};
    use crate::parsers::NativeStructureParser;
    use crate::symmetry::DeclaredSymmetry;

    const LOG: &str = "\
Random SEED: 99
Chemical Formula: Cs1 Cl1
Chemical formula of the supercell: Cs2 Cl2
Site group #1: Cs1 (occupancy 0.5) is distributed over 1 of the total 2 sites (actual 0.5)
Total charge of supercell = 0
The total number of combinations is 2(~2e0)
48 symmetry operation found for supercell.
Combinations after merge: 2
";

    const CIF: &str = "data_x
_symmetry_space_group_name_H-M 'P m -3 m'
_symmetry_Int_Tables_number 221
_cell_length_a 4.1
_cell_length_b 4.1
_cell_length_c 4.1
_cell_angle_alpha 90
_cell_angle_beta 90
_cell_angle_gamma 90
loop_
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
Cl 0.5 0.5 0.5
Cs 0.0 0.0 0.0
";

    fn run(source: &InMemoryOutput) -> Result<(Report, BTreeMap<Label, Crystal>)> {
        run_with(source)
    }

    fn run_with(source: &dyn OutputSource) -> Result<(Report, BTreeMap<Label, Crystal>)> {
        parse_outputs(
            source,
            &NamingConvention::default(),
            &NativeStructureParser,
            &DeclaredSymmetry,
        )
    }

    fn full_source() -> InMemoryOutput {
        InMemoryOutput::new(LOG)
            .with_file("supercell_out_i02_w1.cif", CIF)
            .with_file("supercell_out_A1_d3.cif", CIF)
            .with_file(
                "supercell_out_coulomb_energy_ewald.txt",
                "supercell_out_A1_d3.cif -12.4\nsupercell_out_i02_w1.cif -11.9\n",
            )
            .with_file("README", "not an output")
    }

    #[test]
    fn test_full_pipeline() {
        let (report, structures) = run(&full_source()).unwrap();

        assert_eq!(report.random_seed, Some(99));
        assert_eq!(report.total_combinations, Some(2));
        assert_eq!(report.site_groups.len(), 1);
        assert_eq!(report.coulombic_energy_unit.as_deref(), Some("eV"));

        let a1 = &report.structures_info[&Label::new("A1")];
        assert_eq!(a1.degeneracy, Some(3));
        assert_eq!(a1.crystal_system.as_deref(), Some("cubic"));
        assert_eq!(a1.lattice_type.as_deref(), Some("cubic"));
        assert_eq!(a1.space_group_symbol.as_deref(), Some("Pm-3m"));
        assert_eq!(a1.coulombic_energy, Some(-12.4));

        assert_eq!(structures.len(), 2);
        assert_eq!(structures[&Label::new("i02")].atoms[0].element, "Cl");
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let source = full_source();
        let first = run(&source).unwrap().0.to_json().unwrap();
        let second = run(&source).unwrap().0.to_json().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_without_energy_files() {
        let source = InMemoryOutput::new(LOG).with_file("supercell_out_A1_d3.cif", CIF);
        let (report, _) = run(&source).unwrap();

        assert_eq!(report.coulombic_energy_unit, None);
        assert!(report
            .structures_info
            .values()
            .all(|r| r.coulombic_energy.is_none()));

        let json = report.to_json().unwrap();
        assert!(!json.contains("coulombic_energy"));
    }

    #[test]
    fn test_malformed_log_aborts_pipeline() {
        let source = InMemoryOutput::new("Total charge of supercell = ?\n")
            .with_file("supercell_out_A1_d3.cif", CIF);
        assert!(matches!(
            run(&source),
            Err(ReportError::MalformedField {
                stage: Stage::LogScan,
                ..
            })
        ));
    }

    /// 列出文件但读取失败的来源
    struct UnreadableListing {
        inner: InMemoryOutput,
        broken: &'static str,
    }

    impl OutputSource for UnreadableListing {
        fn log_content(&self) -> Result<String> {
            self.inner.log_content()
        }

        fn list_files(&self) -> Result<Vec<String>> {
            let mut names = self.inner.list_files()?;
            names.push(self.broken.to_string());
            Ok(names)
        }

        fn read_file(&self, name: &str) -> Result<String> {
            if name == self.broken {
                return Err(ReportError::UnreadableFile {
                    path: name.to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::PermissionDenied,
                        "permission denied",
                    ),
                });
            }
            self.inner.read_file(name)
        }
    }

    #[test]
    fn test_unreadable_listed_file_aborts_pipeline() {
        let source = UnreadableListing {
            inner: full_source(),
            broken: "supercell_out_B7_w2.cif",
        };
        match run_with(&source) {
            Err(ReportError::UnreadableFile { path, .. }) => {
                assert_eq!(path, "supercell_out_B7_w2.cif")
            }
            other => panic!("expected UnreadableFile, got {:?}", other.map(|(r, _)| r)),
        }
    }

    #[test]
    fn test_unreadable_unrelated_file_is_not_read() {
        let source = UnreadableListing {
            inner: full_source(),
            broken: "notes.md",
        };
        let (report, _) = run_with(&source).unwrap();
        assert_eq!(report.structures_info.len(), 2);
    }

    #[test]
    fn test_missing_log_is_missing_source() {
        assert!(matches!(
            run(&InMemoryOutput::default()),
            Err(ReportError::MissingSource { .. })
        ));
    }
}
