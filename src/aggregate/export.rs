//! # 构型表导出
//!
//! 将报告的 `structures_info` 导出为 CSV，每个标签一行，缺省字段留空。
//!
//! ## 依赖关系
//! - 被 `commands/parse.rs` 调用
//! - 使用 `csv` 库写入 CSV 文件

use crate::error::{ReportError, Result};
use crate::models::Report;

use std::io::Write;
use std::path::Path;

const HEADER: [&str; 6] = [
    "label",
    "degeneracy",
    "crystal_system",
    "lattice_type",
    "space_group_symbol",
    "coulombic_energy",
];

/// 写入任意 writer
pub fn write_records_csv<W: Write>(report: &Report, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;

    for (label, record) in &report.structures_info {
        wtr.write_record(&[
            label.to_string(),
            record.degeneracy.map(|d| d.to_string()).unwrap_or_default(),
            record.crystal_system.clone().unwrap_or_default(),
            record.lattice_type.clone().unwrap_or_default(),
            record.space_group_symbol.clone().unwrap_or_default(),
            record
                .coulombic_energy
                .map(|e| format!("{:.6}", e))
                .unwrap_or_default(),
        ])?;
    }

    wtr.flush().map_err(|e| ReportError::FileWriteError {
        path: "<csv>".to_string(),
        source: e,
    })?;
    Ok(())
}

/// 导出到 CSV 文件
pub fn records_to_csv(report: &Report, output_path: &Path) -> Result<()> {
    let file = std::fs::File::create(output_path).map_err(|e| ReportError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;
    write_records_csv(report, file)
}
