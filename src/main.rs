//! # screport - supercell 枚举结果报告工具
//!
//! 读取 supercell 程序的计算目录（`output.log` 与 `Output/` 下的结构、
//! Coulomb 能量文件），整理成一份结构化报告。
//!
//! ## 子命令
//! - `parse` - 解析完整计算目录，写出 JSON 报告、CIF 结构和可选 CSV
//! - `scan`  - 只扫描 output.log
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── aggregate/ (输出汇总流水线)
//!   │     ├── parsers/   (日志与 CIF 解析器)
//!   │     ├── symmetry/  (对称性分类)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod aggregate;
mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod symmetry;
mod utils;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    // 诊断日志写到 stderr，stdout 留给报告与表格；RUST_LOG 优先于 -v/-q
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(cli.log_filter(rust_log.as_deref()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
