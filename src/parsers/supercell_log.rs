//! # supercell output.log 解析器
//!
//! 逐行扫描 supercell 程序的日志，提取全局标量和晶体学位点分组表。
//!
//! ## 识别的行
//! ```text
//! Random SEED: 1528473
//! Chemical Formula: Ca2 Al2 Si1 O7
//! Chemical formula of the supercell: Ca4 Al4 Si2 O14
//! Total charge of supercell = 0
//! The total number of combinations is 120(~1.2e2)
//! 48 symmetry operation found for supercell.
//! Combinations after merge: 12
//! Site group #1: Al1 (occupancy 0.500) is distributed over 2 of the total 4 sites (actual 0.500)
//! ```
//!
//! 每一行都会依次交给规则表中的所有规则，不在第一次命中后停止。
//! 未命中任何规则的行直接跳过；命中规则但缺少字段或数值非法时整个扫描失败。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 和 `aggregate/mod.rs` 使用
//! - 使用 `models/report.rs`

use crate::error::{ReportError, Result, Stage};
use crate::models::{Report, ReportBuilder, SiteAttributes, SiteType};
use std::str::FromStr;
use tracing::debug;

/// 新分组的第一个位点标记
const FIRST_SITE_MARKER: &str = "#1:";

const COMBINATIONS_TRIGGER: &str = "The total number of combinations is";

/// 单行上下文
struct ScanLine<'a> {
    number: usize,
    text: &'a str,
    tokens: Vec<&'a str>,
}

impl<'a> ScanLine<'a> {
    fn new(number: usize, text: &'a str) -> Self {
        ScanLine {
            number,
            text,
            tokens: text.split_whitespace().collect(),
        }
    }

    fn malformed(&self, field: &'static str, reason: impl Into<String>) -> ReportError {
        ReportError::malformed(
            Stage::LogScan,
            format!("line {}: {}", self.number, self.text.trim()),
            field,
            reason,
        )
    }

    fn token(&self, idx: usize, field: &'static str) -> Result<&'a str> {
        self.tokens
            .get(idx)
            .copied()
            .ok_or_else(|| self.malformed(field, format!("missing token {}", idx)))
    }

    fn first(&self, field: &'static str) -> Result<&'a str> {
        self.token(0, field)
    }

    fn last(&self, field: &'static str) -> Result<&'a str> {
        self.tokens
            .last()
            .copied()
            .ok_or_else(|| self.malformed(field, "empty line"))
    }

    /// 从 `start` 开始的所有 token 拼接（去掉空白）
    fn joined_from(&self, start: usize, field: &'static str) -> Result<String> {
        if self.tokens.len() <= start {
            return Err(self.malformed(field, format!("missing token {}", start)));
        }
        Ok(self.tokens[start..].concat())
    }

    fn parse<T: FromStr>(&self, raw: &str, field: &'static str) -> Result<T> {
        raw.parse()
            .map_err(|_| self.malformed(field, format!("'{}' is not a valid number", raw)))
    }
}

/// 规则：谓词 + 提取器
struct LineRule {
    matches: fn(&str) -> bool,
    extract: fn(&ScanLine<'_>, &mut ReportBuilder) -> Result<()>,
}

fn rules() -> [LineRule; 8] {
    [
        LineRule {
            matches: |line| line.contains("Random SEED:"),
            extract: |line, report| {
                let seed = line.parse(line.last("random_seed")?, "random_seed")?;
                report.random_seed(seed);
                Ok(())
            },
        },
        LineRule {
            // 大小写敏感，超胞化学式行使用小写 "formula"，不会命中
            matches: |line| line.contains("Chemical Formula"),
            extract: |line, report| {
                report.initial_formula(line.joined_from(2, "chemical_formula.initial")?);
                Ok(())
            },
        },
        LineRule {
            matches: |line| line.contains("Chemical formula of the supercell"),
            extract: |line, report| {
                report.supercell_formula(line.joined_from(5, "chemical_formula.supercell")?);
                Ok(())
            },
        },
        LineRule {
            matches: |line| line.contains("Total charge of supercell"),
            extract: |line, report| {
                let charge = line.parse(line.last("total_charge")?, "total_charge")?;
                report.total_charge(charge);
                Ok(())
            },
        },
        LineRule {
            matches: |line| line.contains(COMBINATIONS_TRIGGER),
            extract: extract_total_combinations,
        },
        LineRule {
            matches: |line| line.contains("symmetry operation found for supercell"),
            extract: |line, report| {
                let count = line.parse(
                    line.first("symmetry_operation_count")?,
                    "symmetry_operation_count",
                )?;
                report.symmetry_operation_count(count);
                Ok(())
            },
        },
        LineRule {
            matches: |line| line.contains("Combinations after merge"),
            extract: |line, report| {
                let count =
                    line.parse(line.last("symmetrically_distinct")?, "symmetrically_distinct")?;
                report.symmetrically_distinct(count);
                Ok(())
            },
        },
        LineRule {
            matches: |line| line.contains("Site"),
            extract: extract_site,
        },
    ]
}

/// "The total number of combinations is 120(~1.2e2)"
///
/// 计数紧跟在触发短语之后，括号内的科学计数近似值被丢弃。
fn extract_total_combinations(line: &ScanLine<'_>, report: &mut ReportBuilder) -> Result<()> {
    const FIELD: &str = "total_combinations";

    let rest = line
        .text
        .find(COMBINATIONS_TRIGGER)
        .map(|pos| &line.text[pos + COMBINATIONS_TRIGGER.len()..])
        .unwrap_or_default();
    let raw = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| line.malformed(FIELD, "missing combination count"))?;
    let count = raw.split('(').next().unwrap_or(raw);

    report.total_combinations(line.parse(count, FIELD)?);
    Ok(())
}

/// "Site group #1: Al1 (occupancy 0.500) is distributed over 2 of the total 4 sites (actual 0.500)"
fn extract_site(line: &ScanLine<'_>, report: &mut ReportBuilder) -> Result<()> {
    let marker = line.token(2, "site_marker")?;
    let site: u32 = marker
        .strip_prefix('#')
        .and_then(|m| m.strip_suffix(':'))
        .and_then(|m| m.parse().ok())
        .ok_or_else(|| line.malformed("site_marker", format!("'{}' is not a site marker", marker)))?;

    let symbol = line.token(3, "symbol")?.to_string();

    let site_type = if line.token(7, "site_type")? == "distributed" {
        SiteType::Distributed {
            considered_sites: line.parse(line.token(9, "considered_sites")?, "considered_sites")?,
            total_sites: line.parse(line.token(13, "total_sites")?, "total_sites")?,
        }
    } else {
        SiteType::Discrete
    };

    let initial_occupancy = line.parse(
        line.token(5, "initial_occupancy")?.trim_end_matches(')'),
        "initial_occupancy",
    )?;
    let actual_occupancy = line.parse(
        line.last("actual_occupancy")?
            .trim_end_matches(|c: char| matches!(c, ')' | ']' | '}')),
        "actual_occupancy",
    )?;

    if marker == FIRST_SITE_MARKER {
        report.begin_group();
    }

    let attrs = SiteAttributes {
        symbol,
        site_type,
        initial_occupancy,
        actual_occupancy,
    };
    if !report.insert_site(site, attrs) {
        return Err(line.malformed("site_marker", "site listed before the first group marker"));
    }
    Ok(())
}

/// 解析 output.log 内容，返回报告骨架（`structures_info` 为空）
pub fn scan_log(content: &str) -> Result<Report> {
    let rules = rules();
    let mut report = ReportBuilder::new();
    let mut matched = 0usize;

    for (idx, text) in content.lines().enumerate() {
        let line = ScanLine::new(idx + 1, text);
        for rule in &rules {
            if (rule.matches)(text) {
                (rule.extract)(&line, &mut report)?;
                matched += 1;
            }
        }
    }

    let report = report.build();
    debug!(
        "Scanned {} lines ({} matched), {} site groups",
        content.lines().count(),
        matched,
        report.site_groups.len()
    );
    Ok(report)
}
