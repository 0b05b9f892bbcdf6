//! # 枚举结果报告数据模型
//!
//! 一次解析生成一份 `Report`：全局标量、晶体学位点分组表，以及按构型标签
//! 合并的简并度 / 对称性 / Coulomb 能量表。
//!
//! 所有可选字段默认缺省（`None`），序列化时省略，不使用哨兵值，
//! 也不会出现空的嵌套对象。
//!
//! ## 依赖关系
//! - 被 `parsers/supercell_log.rs` 和 `aggregate/` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 构型标签，结构文件与能量文件共享的键
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(label: impl Into<String>) -> Self {
        Label(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 化学式（初始结构 / 超胞）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChemicalFormula {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supercell: Option<String>,
}

/// 位点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SiteType {
    /// 单一位点
    Discrete,
    /// 占位分布在 `total_sites` 个等价位点中的 `considered_sites` 个上
    Distributed { considered_sites: u32, total_sites: u32 },
}

/// 单个位点的属性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteAttributes {
    pub symbol: String,
    pub site_type: SiteType,
    pub initial_occupancy: f64,
    pub actual_occupancy: f64,
}

/// 晶体学位点分组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteGroup {
    /// 从 1 开始，按日志中出现的顺序递增
    pub index: u32,
    pub sites: BTreeMap<u32, SiteAttributes>,
}

/// 单个构型的合并记录
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degeneracy: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crystal_system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lattice_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_group_symbol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coulombic_energy: Option<f64>,
}

impl StructureRecord {
    /// 逐字段合并：只填充尚缺省的字段，已有值不会被覆盖
    pub fn merge(&mut self, other: StructureRecord) {
        fill(&mut self.degeneracy, other.degeneracy);
        fill(&mut self.crystal_system, other.crystal_system);
        fill(&mut self.lattice_type, other.lattice_type);
        fill(&mut self.space_group_symbol, other.space_group_symbol);
        fill(&mut self.coulombic_energy, other.coulombic_energy);
    }
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

/// 最终报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<i64>,

    pub chemical_formula: ChemicalFormula,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_charge: Option<i64>,

    /// 超胞电荷不平衡时为 true
    pub charge_warning: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_combinations: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symmetrically_distinct: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symmetry_operation_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coulombic_energy_unit: Option<String>,

    pub site_groups: Vec<SiteGroup>,

    pub structures_info: BTreeMap<Label, StructureRecord>,
}

impl Report {
    /// 序列化为格式化 JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// `Report` 构建器，每次解析新建一个
#[derive(Debug, Default)]
pub struct ReportBuilder {
    random_seed: Option<i64>,
    chemical_formula: ChemicalFormula,
    total_charge: Option<i64>,
    total_combinations: Option<u64>,
    symmetrically_distinct: Option<u64>,
    symmetry_operation_count: Option<u64>,
    site_groups: Vec<SiteGroup>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn random_seed(&mut self, seed: i64) -> &mut Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn initial_formula(&mut self, formula: String) -> &mut Self {
        self.chemical_formula.initial = Some(formula);
        self
    }

    pub fn supercell_formula(&mut self, formula: String) -> &mut Self {
        self.chemical_formula.supercell = Some(formula);
        self
    }

    pub fn total_charge(&mut self, charge: i64) -> &mut Self {
        self.total_charge = Some(charge);
        self
    }

    pub fn total_combinations(&mut self, count: u64) -> &mut Self {
        self.total_combinations = Some(count);
        self
    }

    pub fn symmetrically_distinct(&mut self, count: u64) -> &mut Self {
        self.symmetrically_distinct = Some(count);
        self
    }

    pub fn symmetry_operation_count(&mut self, count: u64) -> &mut Self {
        self.symmetry_operation_count = Some(count);
        self
    }

    /// 开始新的位点分组，返回其编号
    pub fn begin_group(&mut self) -> u32 {
        let index = self.site_groups.len() as u32 + 1;
        self.site_groups.push(SiteGroup {
            index,
            sites: BTreeMap::new(),
        });
        index
    }

    /// 在当前分组中记录位点；尚无分组时返回 false
    pub fn insert_site(&mut self, site: u32, attrs: SiteAttributes) -> bool {
        match self.site_groups.last_mut() {
            Some(group) => {
                group.sites.insert(site, attrs);
                true
            }
            None => false,
        }
    }

    /// 构建报告骨架：`structures_info` 为空，由汇总器填充
    pub fn build(self) -> Report {
        Report {
            random_seed: self.random_seed,
            chemical_formula: self.chemical_formula,
            total_charge: self.total_charge,
            charge_warning: self.total_charge.is_some_and(|c| c != 0),
            total_combinations: self.total_combinations,
            symmetrically_distinct: self.symmetrically_distinct,
            symmetry_operation_count: self.symmetry_operation_count,
            coulombic_energy_unit: None,
            site_groups: self.site_groups,
            structures_info: BTreeMap::new(),
        }
    }
}
