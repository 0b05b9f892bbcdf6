//! # scan 子命令 CLI 定义
//!
//! 只扫描 output.log
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/scan.rs`

use clap::Args;
use std::path::PathBuf;

/// scan 子命令参数
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Path to the supercell output.log
    pub log: PathBuf,

    /// Print the scanned fields as JSON instead of tables
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
