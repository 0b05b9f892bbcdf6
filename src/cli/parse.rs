//! # parse 子命令 CLI 定义
//!
//! 解析 supercell 计算目录并输出报告
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/parse.rs`

use crate::aggregate::naming::{DEFAULT_PREFIX, DEFAULT_STRUCTURE_EXTENSION};
use crate::aggregate::source::{DEFAULT_LOG_NAME, DEFAULT_OUTPUT_DIR};
use crate::symmetry::search::DEFAULT_SYMPREC;
use clap::Args;
use std::path::PathBuf;

/// parse 子命令参数
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Calculation directory containing the log and the output folder
    pub dir: PathBuf,

    /// Log file name, relative to the calculation directory
    #[arg(long, default_value = DEFAULT_LOG_NAME)]
    pub log: String,

    /// Output folder with structure and energy files, relative to the calculation directory
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: String,

    /// Output file prefix passed to supercell with -o
    #[arg(long, env = "SCREPORT_PREFIX", default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Extension of the per-configuration structure files
    #[arg(long, env = "SCREPORT_STRUCTURE_EXT", default_value = DEFAULT_STRUCTURE_EXTENSION)]
    pub structure_ext: String,

    /// Where to write the JSON report
    #[arg(long, default_value = "report.json")]
    pub report: PathBuf,

    /// Directory receiving one CIF per configuration label
    #[arg(long, default_value = "structures")]
    pub structures_dir: PathBuf,

    /// Do not write the per-label structure files
    #[arg(long, default_value_t = false)]
    pub no_structures: bool,

    /// Also export the per-label table as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Position tolerance (Å) of the space-group search
    #[arg(long, default_value_t = DEFAULT_SYMPREC)]
    pub symprec: f64,

    /// Report the space group declared in each structure file instead of searching
    #[arg(long, default_value_t = false)]
    pub declared_symmetry: bool,

    /// Number of configurations shown in the summary table
    #[arg(short = 'n', long, default_value_t = 20)]
    pub top: usize,
}
