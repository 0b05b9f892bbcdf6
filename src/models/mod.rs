//! # 数据模型模块
//!
//! 定义晶体结构与枚举报告的数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `symmetry/`, `aggregate/` 和 `commands/` 使用
//! - 子模块: structure, report

pub mod report;
pub mod structure;

pub use report::{Label, Report, ReportBuilder, SiteAttributes, SiteType, StructureRecord};
pub use structure::{Atom, Crystal, Lattice};
