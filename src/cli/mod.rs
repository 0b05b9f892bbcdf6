//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `parse`: 解析完整的 supercell 计算目录，输出报告与结构
//! - `scan`: 只扫描 output.log
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: parse, scan

pub mod parse;
pub mod scan;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// screport - supercell 枚举结果报告工具
#[derive(Parser)]
#[command(name = "screport")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Turn supercell enumeration output into a structured report", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Show debug diagnostics
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// 根据 -v/-q 选择诊断日志级别
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        }
    }

    /// 诊断日志过滤器：`RUST_LOG` 可解析时优先，否则按 -v/-q
    pub fn log_filter(&self, rust_log: Option<&str>) -> EnvFilter {
        rust_log
            .and_then(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::default().add_directive(self.log_level().into()))
    }
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Parse a supercell calculation directory (log + Output/ files)
    Parse(parse::ParseArgs),

    /// Scan a supercell output.log and print its global fields and site groups
    Scan(scan::ScanArgs),
}
