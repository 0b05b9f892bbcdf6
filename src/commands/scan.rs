//! # scan 命令实现
//!
//! 只运行日志扫描，打印全局字段和位点分组表。
//!
//! ## 依赖关系
//! - 使用 `cli/scan.rs` 定义的参数
//! - 使用 `parsers/supercell_log.rs`
//! - 使用 `utils/output.rs`

use crate::cli::scan::ScanArgs;
use crate::error::{ReportError, Result};
use crate::models::{Report, SiteType};
use crate::parsers::supercell_log::scan_log;
use crate::utils::output;

use std::fs;
use tabled::{Table, Tabled};

/// 位点表格行
#[derive(Debug, Clone, Tabled)]
struct SiteRow {
    #[tabled(rename = "Group")]
    group: u32,
    #[tabled(rename = "Site")]
    site: u32,
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Type")]
    site_type: String,
    #[tabled(rename = "Initial occ.")]
    initial: String,
    #[tabled(rename = "Actual occ.")]
    actual: String,
}

/// 执行 scan 命令
pub fn execute(args: ScanArgs) -> Result<()> {
    if !args.log.is_file() {
        return Err(ReportError::MissingSource {
            what: "output log".to_string(),
            path: args.log.display().to_string(),
        });
    }

    let content = fs::read_to_string(&args.log).map_err(|e| ReportError::UnreadableFile {
        path: args.log.display().to_string(),
        source: e,
    })?;

    let report = scan_log(&content)?;

    if args.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    output::print_header(&format!("Scanned '{}'", args.log.display()));
    print_summary(&report);
    print_site_groups(&report);
    Ok(())
}

/// 打印全局字段
pub fn print_summary(report: &Report) {
    output::print_field("Random seed", report.random_seed.map(|v| v.to_string()));
    output::print_field(
        "Chemical formula",
        report.chemical_formula.initial.clone(),
    );
    output::print_field(
        "Supercell formula",
        report.chemical_formula.supercell.clone(),
    );
    output::print_field("Total charge", report.total_charge.map(|v| v.to_string()));
    output::print_field(
        "Symmetry operations",
        report.symmetry_operation_count.map(|v| v.to_string()),
    );
    output::print_field(
        "Total combinations",
        report.total_combinations.map(|v| v.to_string()),
    );
    output::print_field(
        "Symmetrically distinct",
        report.symmetrically_distinct.map(|v| v.to_string()),
    );
    println!();

    if report.charge_warning {
        output::print_warning("Supercell is NOT charge balanced!");
    }
}

fn site_rows(report: &Report) -> Vec<SiteRow> {
    report
        .site_groups
        .iter()
        .flat_map(|group| {
            group.sites.iter().map(move |(site, attrs)| SiteRow {
                group: group.index,
                site: *site,
                symbol: attrs.symbol.clone(),
                site_type: match attrs.site_type {
                    SiteType::Discrete => "discrete".to_string(),
                    SiteType::Distributed {
                        considered_sites,
                        total_sites,
                    } => format!("distributed {}/{}", considered_sites, total_sites),
                },
                initial: format!("{:.3}", attrs.initial_occupancy),
                actual: format!("{:.3}", attrs.actual_occupancy),
            })
        })
        .collect()
}

/// 打印位点分组表
pub fn print_site_groups(report: &Report) {
    let rows = site_rows(report);
    if rows.is_empty() {
        output::print_info("No site groups reported in the log.");
        return;
    }
    println!("{}", Table::new(&rows));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_rows_flatten_groups() {
        let log = "\
Site group #1: Al1 (occupancy 0.5) is distributed over 2 of the total 4 sites (actual 0.5)
Site group #2: Si1 (occupancy 1.0) is fixed at 1 of the total 1 sites (actual 1.0)
Site group #1: O1 (occupancy 1.0) is fixed at 1 of the total 1 sites (actual 1.0)
";
        let report = scan_log(log).unwrap();
        let rows = site_rows(&report);

        assert_eq!(rows.len(), 3);
        assert_eq!((rows[0].group, rows[0].site), (1, 1));
        assert_eq!(rows[0].site_type, "distributed 2/4");
        assert_eq!((rows[1].group, rows[1].site), (1, 2));
        assert_eq!(rows[1].site_type, "discrete");
        assert_eq!((rows[2].group, rows[2].symbol.as_str()), (2, "O1"));
    }

    #[test]
    fn test_missing_log_file() {
        let args = ScanArgs {
            log: "/nonexistent/output.log".into(),
            json: false,
        };
        assert!(matches!(
            execute(args),
            Err(ReportError::MissingSource { .. })
        ));
    }
}
