//! # 结构文件汇总
//!
//! 对每个 `<prefix>_<label>_w<degeneracy>.cif`：
//! - 从文件名取标签和简并度
//! - 调用 `StructureParser` 解析结构并将原子排成规范顺序
//! - 调用 `SymmetryClassifier` 取晶系、晶格类型、空间群符号
//!
//! 结构对象单独返回，不放进报告。
//!
//! ## 依赖关系
//! - 被 `aggregate/mod.rs` 使用
//! - 使用 `parsers/` 的 `StructureParser`, `symmetry/` 的 `SymmetryClassifier`

use super::naming::NamingConvention;
use super::source::SourceFile;
use crate::error::{ReportError, Result, Stage};
use crate::models::{Crystal, Label, StructureRecord};
use crate::parsers::{StructureFormat, StructureParser};
use crate::symmetry::SymmetryClassifier;
use std::collections::BTreeMap;
use tracing::debug;

/// 结构文件汇总结果
#[derive(Debug, Clone, Default)]
pub struct StructureTable {
    /// 标签 -> 简并度与对称性
    pub records: BTreeMap<Label, StructureRecord>,
    /// 标签 -> 结构对象
    pub structures: BTreeMap<Label, Crystal>,
}

/// 汇总所有结构文件
pub fn collect_structures(
    files: &[SourceFile],
    naming: &NamingConvention,
    parser: &dyn StructureParser,
    classifier: &dyn SymmetryClassifier,
) -> Result<StructureTable> {
    let format = StructureFormat::from_extension(&naming.structure_extension)?;
    let mut table = StructureTable::default();

    for file in files.iter().filter(|f| naming.is_structure_file(&f.name)) {
        let label = naming.rule.label(&file.name).ok_or_else(|| {
            ReportError::malformed(
                Stage::StructureFiles,
                file.name.clone(),
                "label",
                "no label segment in file name",
            )
        })?;

        let token = naming.rule.degeneracy_token(&file.name).ok_or_else(|| {
            ReportError::malformed(
                Stage::StructureFiles,
                file.name.clone(),
                "degeneracy",
                "no degeneracy segment in file name",
            )
        })?;
        let degeneracy: u64 = token.parse().map_err(|_| {
            ReportError::malformed(
                Stage::StructureFiles,
                file.name.clone(),
                "degeneracy",
                format!("'{}' is not a valid integer", token),
            )
        })?;

        if table.structures.contains_key(&label) {
            debug!("Ignoring duplicate structure file {} for {}", file.name, label);
            continue;
        }

        let mut crystal = parser.parse_structure(&file.content, format, label.as_str())?;
        crystal.sort_atoms();
        let symmetry = classifier.classify_symmetry(&crystal)?;
        debug!("{}: {} ({} atoms)", label, crystal.formula(), crystal.atoms.len());

        table.records.insert(
            label.clone(),
            StructureRecord {
                degeneracy: Some(degeneracy),
                crystal_system: symmetry.crystal_system,
                lattice_type: symmetry.lattice_type,
                space_group_symbol: symmetry.space_group_symbol,
                coulombic_energy: None,
            },
        );
        table.structures.insert(label, crystal);
    }

    debug!("Collected {} structures", table.structures.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::NativeStructureParser;
    use crate::symmetry::{DeclaredSymmetry, SpacegroupSearch};

    const CUBIC_CIF: &str = "data_cubic
_symmetry_space_group_name_H-M 'P m -3 m'
_symmetry_Int_Tables_number 221
_cell_length_a 4.0
_cell_length_b 4.0
_cell_length_c 4.0
_cell_angle_alpha 90
_cell_angle_beta 90
_cell_angle_gamma 90
loop_
_atom_site_label
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
_atom_site_occupancy
O1 O 0.5 0.5 0.0 1
Cs1 Cs 0.0 0.0 0.0 1
";

    fn file(name: &str, content: &str) -> SourceFile {
        SourceFile {
            name: name.to_string(),
            content: content.to_string(),
        }
    }

    fn collect(files: &[SourceFile]) -> Result<StructureTable> {
        collect_structures(
            files,
            &NamingConvention::default(),
            &NativeStructureParser,
            &DeclaredSymmetry,
        )
    }

    #[test]
    fn test_label_and_degeneracy() {
        let table = collect(&[file("supercell_out_A1_d3.cif", CUBIC_CIF)]).unwrap();
        let record = &table.records[&Label::new("A1")];

        assert_eq!(record.degeneracy, Some(3));
        assert_eq!(record.crystal_system.as_deref(), Some("cubic"));
        assert_eq!(record.lattice_type.as_deref(), Some("cubic"));
        assert_eq!(record.space_group_symbol.as_deref(), Some("Pm-3m"));
        assert_eq!(record.coulombic_energy, None);
    }

    #[test]
    fn test_p1_structure_gets_searched_symmetry() {
        let p1 = CUBIC_CIF
            .replace("'P m -3 m'", "'P 1'")
            .replace("number 221", "number 1")
            .replace("O1 O 0.5 0.5 0.0 1", "Cl1 Cl 0.5 0.5 0.5 1");
        let table = collect_structures(
            &[file("supercell_out_A1_d3.cif", &p1)],
            &NamingConvention::default(),
            &NativeStructureParser,
            &SpacegroupSearch::default(),
        )
        .unwrap();
        let record = &table.records[&Label::new("A1")];

        assert_eq!(record.crystal_system.as_deref(), Some("cubic"));
        assert_eq!(record.lattice_type.as_deref(), Some("cubic"));
        assert_eq!(record.space_group_symbol.as_deref(), Some("Pm-3m"));
    }

    #[test]
    fn test_atoms_are_sorted() {
        let table = collect(&[file("supercell_out_A1_d3.cif", CUBIC_CIF)]).unwrap();
        let crystal = &table.structures[&Label::new("A1")];

        assert_eq!(crystal.atoms[0].element, "Cs");
        assert_eq!(crystal.atoms[1].element, "O");
    }

    #[test]
    fn test_non_structure_files_ignored() {
        let table = collect(&[
            file("supercell_out_coulomb_energy_ewald.txt", "x 1.0"),
            file("notes.md", "hello"),
        ])
        .unwrap();
        assert!(table.records.is_empty());
        assert!(table.structures.is_empty());
    }

    #[test]
    fn test_bad_degeneracy_is_fatal() {
        let err = collect(&[file("supercell_out_A1_dx.cif", CUBIC_CIF)]).unwrap_err();
        assert!(matches!(
            err,
            ReportError::MalformedField {
                stage: Stage::StructureFiles,
                field: "degeneracy",
                ..
            }
        ));
    }

    #[test]
    fn test_unparseable_structure_is_fatal() {
        let err = collect(&[file("supercell_out_A1_d3.cif", "data_empty\n")]).unwrap_err();
        assert!(matches!(err, ReportError::ParseError { .. }));
    }
}
