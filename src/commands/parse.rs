//! # parse 命令实现
//!
//! 解析 supercell 计算目录，生成报告与结构文件。
//!
//! ## 功能
//! - 扫描 output.log
//! - 汇总 Output/ 下的结构文件与 Coulomb 能量文件
//! - 写出 JSON 报告、每个标签一个 CIF、可选 CSV
//! - 终端显示构型汇总表
//!
//! 对称性默认由空间群搜索得到，`--declared-symmetry` 改为采用文件声明的空间群。
//!
//! ## 依赖关系
//! - 使用 `cli/parse.rs` 定义的参数
//! - 使用 `aggregate/`, `parsers/`, `symmetry/`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::aggregate::{self, export, LocalOutput, NamingConvention};
use crate::cli::parse::ParseArgs;
use crate::error::{ReportError, Result};
use crate::models::{Crystal, Label, Report};
use crate::parsers::cif::to_cif_string;
use crate::parsers::NativeStructureParser;
use crate::symmetry::{DeclaredSymmetry, SpacegroupSearch, SymmetryClassifier};
use crate::utils::{output, progress};

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tabled::{Table, Tabled};

/// 构型汇总表格行
#[derive(Debug, Clone, Tabled)]
struct StructureRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Degeneracy")]
    degeneracy: String,
    #[tabled(rename = "Crystal system")]
    crystal_system: String,
    #[tabled(rename = "Space group")]
    space_group: String,
    #[tabled(rename = "Coulomb energy")]
    energy: String,
}

/// 执行 parse 命令
pub fn execute(args: ParseArgs) -> Result<()> {
    output::print_header("Parsing supercell output");

    if !args.dir.is_dir() {
        return Err(ReportError::DirectoryNotFound {
            path: args.dir.display().to_string(),
        });
    }

    let naming = NamingConvention::new(&args.prefix, &args.structure_ext)?;
    let source = LocalOutput::new(args.dir.clone())
        .with_log_name(&args.log)
        .with_output_dir(&args.output_dir);

    output::print_info(&format!(
        "Reading '{}' and '{}'",
        source.log_path().display(),
        source.output_path().display()
    ));

    let classifier: Box<dyn SymmetryClassifier> = if args.declared_symmetry {
        Box::new(DeclaredSymmetry)
    } else {
        Box::new(SpacegroupSearch::new(args.symprec))
    };

    let spinner = progress::create_spinner("Parsing");
    let parsed = aggregate::parse_outputs(
        &source,
        &naming,
        &NativeStructureParser,
        classifier.as_ref(),
    );
    spinner.finish_and_clear();
    let (report, structures) = parsed?;

    super::scan::print_summary(&report);

    // JSON 报告
    write_text(&args.report, &report.to_json()?)?;
    output::print_success(&format!("Report saved to '{}'", args.report.display()));

    // 每个标签一个结构文件
    if !args.no_structures && !structures.is_empty() {
        write_structures(&structures, &args.structures_dir)?;
        output::print_success(&format!(
            "{} structures saved to '{}'",
            structures.len(),
            args.structures_dir.display()
        ));
    }

    if let Some(ref csv_path) = args.csv {
        export::records_to_csv(&report, csv_path)?;
        output::print_success(&format!("Configuration table saved to '{}'", csv_path.display()));
    }

    if report.structures_info.is_empty() {
        output::print_warning("No configuration files found in the output folder.");
    } else {
        let rows = summary_rows(&report, args.top);
        output::print_header(&format!(
            "Top {} of {} configurations",
            rows.len(),
            report.structures_info.len()
        ));
        println!("{}", Table::new(&rows));
    }

    output::print_done(&format!(
        "Parsed {} configurations, {} site groups",
        report.structures_info.len(),
        report.site_groups.len()
    ));

    Ok(())
}

fn write_text(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| ReportError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 按标签写出 `<label>.cif`
fn write_structures(structures: &BTreeMap<Label, Crystal>, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| ReportError::FileWriteError {
        path: dir.display().to_string(),
        source: e,
    })?;

    for (label, crystal) in structures {
        let mut crystal = crystal.clone();
        crystal.name = label.to_string();
        write_text(&dir.join(format!("{}.cif", label)), &to_cif_string(&crystal))?;
    }
    Ok(())
}

/// 汇总表：有 Coulomb 能量时按能量升序，否则按标签
fn summary_rows(report: &Report, top: usize) -> Vec<StructureRow> {
    let mut entries: Vec<_> = report.structures_info.iter().collect();
    entries.sort_by(|(la, a), (lb, b)| {
        match (a.coulombic_energy, b.coulombic_energy) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
        .then_with(|| la.cmp(lb))
    });

    let dash = || "-".to_string();
    entries
        .into_iter()
        .take(top)
        .map(|(label, record)| StructureRow {
            label: label.to_string(),
            degeneracy: record.degeneracy.map(|d| d.to_string()).unwrap_or_else(dash),
            crystal_system: record.crystal_system.clone().unwrap_or_else(dash),
            space_group: record.space_group_symbol.clone().unwrap_or_else(dash),
            energy: record
                .coulombic_energy
                .map(|e| format!("{:.6}", e))
                .unwrap_or_else(dash),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReportBuilder, StructureRecord};

    const LOG: &str = "Random SEED: 5\nTotal charge of supercell = 0\n";

    const CIF: &str = "data_x
_symmetry_space_group_name_H-M 'P 1'
_symmetry_Int_Tables_number 1
_cell_length_a 3.0
_cell_length_b 3.0
_cell_length_c 3.0
_cell_angle_alpha 90
_cell_angle_beta 90
_cell_angle_gamma 90
loop_
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
Fe 0.0 0.0 0.0
";

    fn args(dir: &Path) -> ParseArgs {
        ParseArgs {
            dir: dir.to_path_buf(),
            log: "output.log".to_string(),
            output_dir: "Output".to_string(),
            prefix: "supercell_out".to_string(),
            structure_ext: "cif".to_string(),
            report: dir.join("report.json"),
            structures_dir: dir.join("structures"),
            no_structures: false,
            csv: Some(dir.join("structures.csv")),
            symprec: 0.01,
            declared_symmetry: false,
            top: 5,
        }
    }

    fn calculation_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("Output");
        fs::create_dir_all(&out).unwrap();
        fs::write(dir.path().join("output.log"), LOG).unwrap();
        fs::write(out.join("supercell_out_i01_w4.cif"), CIF).unwrap();
        fs::write(
            out.join("supercell_out_coulomb_energy_ewald.txt"),
            "supercell_out_i01_w4.cif -2.5\n",
        )
        .unwrap();
        dir
    }

    fn read_report(dir: &Path) -> Report {
        let json = fs::read_to_string(dir.join("report.json")).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_execute_writes_outputs() {
        let dir = calculation_dir();
        execute(args(dir.path())).unwrap();

        let report = read_report(dir.path());
        let record = &report.structures_info[&Label::new("i01")];
        assert_eq!(record.degeneracy, Some(4));
        // 文件声明 P 1，搜索得到真实的立方对称性
        assert_eq!(record.crystal_system.as_deref(), Some("cubic"));
        assert_eq!(record.space_group_symbol.as_deref(), Some("Pm-3m"));
        assert_eq!(record.coulombic_energy, Some(-2.5));
        assert_eq!(report.random_seed, Some(5));

        let cif = fs::read_to_string(dir.path().join("structures").join("i01.cif")).unwrap();
        assert!(cif.starts_with("data_i01"));
        assert!(dir.path().join("structures.csv").is_file());
    }

    #[test]
    fn test_execute_with_declared_symmetry() {
        let dir = calculation_dir();
        let mut args = args(dir.path());
        args.declared_symmetry = true;
        execute(args).unwrap();

        let report = read_report(dir.path());
        let record = &report.structures_info[&Label::new("i01")];
        assert_eq!(record.crystal_system.as_deref(), Some("triclinic"));
        assert_eq!(record.space_group_symbol.as_deref(), Some("P1"));
    }

    #[test]
    fn test_execute_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            execute(args(&missing)),
            Err(ReportError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn test_summary_rows_order() {
        let mut report = ReportBuilder::new().build();
        let energy = |e: Option<f64>| StructureRecord {
            coulombic_energy: e,
            ..Default::default()
        };
        report.structures_info.insert(Label::new("a"), energy(None));
        report.structures_info.insert(Label::new("b"), energy(Some(-1.0)));
        report.structures_info.insert(Label::new("c"), energy(Some(-3.0)));

        let rows = summary_rows(&report, 10);
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["c", "b", "a"]);
        assert_eq!(rows[2].energy, "-");

        assert_eq!(summary_rows(&report, 1).len(), 1);
    }
}
