//! # CIF 格式解析与写出
//!
//! 读取 supercell 为每个构型写出的 CIF 文件，并能将结构写回 CIF。
//!
//! ## 支持的内容
//! ```text
//! data_name
//! _symmetry_space_group_name_H-M    'P 1'
//! _symmetry_Int_Tables_number       1
//! _cell_length_a    5.123(4)
//! ...
//! loop_
//! _atom_site_label
//! _atom_site_type_symbol
//! _atom_site_fract_x
//! _atom_site_fract_y
//! _atom_site_fract_z
//! _atom_site_occupancy
//! Ca1 Ca 0.0 0.0 0.0 1.0
//! ```
//!
//! 只读取文件中列出的原子，不做对称操作展开。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/structure.rs`
//! - 使用 `regex` 解析带不确定度的数值

use super::StructureFormat;
use crate::error::{ReportError, Result};
use crate::models::{Atom, Crystal, Lattice};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// 数值，可带括号不确定度，如 `5.123(4)`
fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)(?:\(\d+\))?$").unwrap())
}

/// 元素符号，如 `Ca2+` -> `Ca`
fn element_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Z][a-z]?)").unwrap())
}

/// 解析 CIF 数值（去掉不确定度）
fn parse_cif_number(raw: &str) -> Option<f64> {
    number_regex()
        .captures(raw.trim())
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// 按空白切分，保留引号内的空格
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.trim().chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '\'' || c == '"' {
            chars.next();
            let mut token = String::new();
            for ch in chars.by_ref() {
                if ch == c {
                    break;
                }
                token.push(ch);
            }
            tokens.push(token);
        } else {
            let mut token = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                token.push(ch);
                chars.next();
            }
            tokens.push(token);
        }
    }

    tokens
}

/// 单个 loop_ 块
struct CifLoop {
    headers: Vec<String>,
    values: Vec<String>,
}

impl CifLoop {
    fn column(&self, tag: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == tag)
    }

    fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.values.chunks_exact(self.headers.len().max(1))
    }
}

/// 从字符串内容解析 CIF（只读取第一个 data_ 块）
pub fn parse_cif_content(content: &str, default_name: &str) -> Result<Crystal> {
    let err = |reason: String| ReportError::ParseError {
        format: StructureFormat::Cif.to_string(),
        path: default_name.to_string(),
        reason,
    };

    let mut name = default_name.to_string();
    let mut tags: HashMap<String, String> = HashMap::new();
    let mut loops: Vec<CifLoop> = Vec::new();
    let mut seen_data_block = false;

    let lines: Vec<&str> = content.lines().collect();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();

        if line.is_empty() || line.starts_with('#') {
            i += 1;
            continue;
        }

        // 多行文本字段 ;...;
        if line.starts_with(';') {
            i += 1;
            while i < lines.len() && !lines[i].starts_with(';') {
                i += 1;
            }
            i += 1;
            continue;
        }

        if let Some(block) = line.strip_prefix("data_") {
            if seen_data_block {
                break;
            }
            seen_data_block = true;
            if !block.trim().is_empty() {
                name = block.trim().to_string();
            }
            i += 1;
            continue;
        }

        if line.eq_ignore_ascii_case("loop_") {
            i += 1;
            let mut cif_loop = CifLoop {
                headers: Vec::new(),
                values: Vec::new(),
            };
            while i < lines.len() && lines[i].trim_start().starts_with('_') {
                cif_loop.headers.push(lines[i].trim().to_lowercase());
                i += 1;
            }
            while i < lines.len() {
                let row = lines[i].trim();
                if row.starts_with('_')
                    || row.eq_ignore_ascii_case("loop_")
                    || row.starts_with("data_")
                {
                    break;
                }
                if !row.starts_with('#') {
                    cif_loop.values.extend(tokenize(row));
                }
                i += 1;
            }
            loops.push(cif_loop);
            continue;
        }

        if line.starts_with('_') {
            let tokens = tokenize(line);
            if tokens.len() >= 2 {
                tags.insert(tokens[0].to_lowercase(), tokens[1..].join(" "));
            }
        }

        i += 1;
    }

    // 晶格参数
    let cell_param = |tag: &str| -> Result<f64> {
        tags.get(tag)
            .and_then(|v| parse_cif_number(v))
            .ok_or_else(|| err(format!("Missing or invalid {}", tag)))
    };
    let lattice = Lattice::from_parameters(
        cell_param("_cell_length_a")?,
        cell_param("_cell_length_b")?,
        cell_param("_cell_length_c")?,
        cell_param("_cell_angle_alpha")?,
        cell_param("_cell_angle_beta")?,
        cell_param("_cell_angle_gamma")?,
    );

    // 原子位置
    let site_loop = loops
        .iter()
        .find(|l| l.column("_atom_site_fract_x").is_some())
        .ok_or_else(|| err("Missing _atom_site_fract_* loop".to_string()))?;

    let col = |tag: &str| {
        site_loop
            .column(tag)
            .ok_or_else(|| err(format!("Missing {} column", tag)))
    };
    let (x_col, y_col, z_col) = (
        col("_atom_site_fract_x")?,
        col("_atom_site_fract_y")?,
        col("_atom_site_fract_z")?,
    );
    let label_col = site_loop.column("_atom_site_label");
    let symbol_col = site_loop.column("_atom_site_type_symbol");
    let occ_col = site_loop.column("_atom_site_occupancy");

    if site_loop.values.len() % site_loop.headers.len() != 0 {
        return Err(err("Incomplete row in _atom_site loop".to_string()));
    }

    let mut atoms = Vec::new();
    for row in site_loop.rows() {
        let species = symbol_col
            .or(label_col)
            .map(|c| row[c].as_str())
            .ok_or_else(|| err("Missing _atom_site_type_symbol and _atom_site_label".to_string()))?;
        let element = element_regex()
            .captures(species)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| err(format!("Cannot determine element from '{}'", species)))?;

        let coord = |c: usize| {
            parse_cif_number(&row[c])
                .ok_or_else(|| err(format!("Invalid fractional coordinate '{}'", row[c])))
        };
        let mut atom = Atom::new(element, [coord(x_col)?, coord(y_col)?, coord(z_col)?]);
        if let Some(c) = label_col {
            atom = atom.with_label(row[c].clone());
        }
        if let Some(occ) = occ_col.and_then(|c| parse_cif_number(&row[c])) {
            atom = atom.with_occupancy(occ);
        }
        atoms.push(atom);
    }

    let mut crystal = Crystal::new(name, lattice, atoms);
    crystal.space_group = ["_symmetry_space_group_name_h-m", "_space_group_name_h-m_alt"]
        .iter()
        .find_map(|t| tags.get(*t))
        .cloned();
    crystal.space_group_number = ["_symmetry_int_tables_number", "_space_group_it_number"]
        .iter()
        .find_map(|t| tags.get(*t))
        .and_then(|v| v.trim().parse().ok());

    Ok(crystal)
}

/// 将 Crystal 转换为 CIF 格式字符串
pub fn to_cif_string(crystal: &Crystal) -> String {
    let (a, b, c, alpha, beta, gamma) = crystal.lattice.parameters();

    let mut result = String::new();
    result.push_str(&format!("data_{}\n", crystal.name.replace(' ', "_")));
    result.push_str(&format!(
        "_symmetry_space_group_name_H-M    '{}'\n",
        crystal.space_group.as_deref().unwrap_or("P 1")
    ));
    result.push_str(&format!(
        "_symmetry_Int_Tables_number       {}\n\n",
        crystal.space_group_number.unwrap_or(1)
    ));

    result.push_str(&format!("_cell_length_a    {:.6}\n", a));
    result.push_str(&format!("_cell_length_b    {:.6}\n", b));
    result.push_str(&format!("_cell_length_c    {:.6}\n", c));
    result.push_str(&format!("_cell_angle_alpha {:.4}\n", alpha));
    result.push_str(&format!("_cell_angle_beta  {:.4}\n", beta));
    result.push_str(&format!("_cell_angle_gamma {:.4}\n", gamma));
    result.push_str(&format!("_cell_volume      {:.4}\n\n", crystal.lattice.volume().abs()));

    result.push_str("loop_\n");
    result.push_str("_atom_site_label\n");
    result.push_str("_atom_site_type_symbol\n");
    result.push_str("_atom_site_fract_x\n");
    result.push_str("_atom_site_fract_y\n");
    result.push_str("_atom_site_fract_z\n");
    result.push_str("_atom_site_occupancy\n");

    for (i, atom) in crystal.atoms.iter().enumerate() {
        let label = atom
            .label
            .clone()
            .unwrap_or_else(|| format!("{}{}", atom.element, i + 1));
        result.push_str(&format!(
            "{} {} {:.10} {:.10} {:.10} {}\n",
            label, atom.element, atom.position[0], atom.position[1], atom.position[2], atom.occupancy
        ));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CIF: &str = r#"# generated by supercell
data_supercell_out_i01_w3
_symmetry_space_group_name_H-M    'P 4/m m m'
_symmetry_Int_Tables_number       123
_cell_length_a    3.905(2)
_cell_length_b    3.905(2)
_cell_length_c    7.810
_cell_angle_alpha 90
_cell_angle_beta  90
_cell_angle_gamma 90.000

loop_
_symmetry_equiv_pos_as_xyz
  'x, y, z'

loop_
_atom_site_label
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
_atom_site_occupancy
Sr1 Sr2+ 0.5 0.5 0.25 1
Ti1 Ti4+ 0.0 0.0 0.0 1.0
O1 O2- 0.5 0.0 0.0 1
"#;

    #[test]
    fn test_parse_cif_basic() {
        let crystal = parse_cif_content(SAMPLE_CIF, "fallback").unwrap();

        assert_eq!(crystal.name, "supercell_out_i01_w3");
        assert_eq!(crystal.atoms.len(), 3);
        assert_eq!(crystal.atoms[0].element, "Sr");
        assert_eq!(crystal.atoms[0].label.as_deref(), Some("Sr1"));
        assert_eq!(crystal.atoms[2].position, [0.5, 0.0, 0.0]);
        assert_eq!(crystal.space_group.as_deref(), Some("P 4/m m m"));
        assert_eq!(crystal.space_group_number, Some(123));

        let (a, _, c, _, _, gamma) = crystal.lattice.parameters();
        assert!((a - 3.905).abs() < 1e-6);
        assert!((c - 7.81).abs() < 1e-6);
        assert!((gamma - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_cif_number_with_uncertainty() {
        assert_eq!(parse_cif_number("3.905(2)"), Some(3.905));
        assert_eq!(parse_cif_number("-0.25"), Some(-0.25));
        assert_eq!(parse_cif_number("1e-3"), Some(0.001));
        assert_eq!(parse_cif_number("?"), None);
    }

    #[test]
    fn test_tokenize_quoted() {
        assert_eq!(
            tokenize("_symmetry_space_group_name_H-M 'P 1'"),
            vec!["_symmetry_space_group_name_H-M".to_string(), "P 1".to_string()]
        );
    }

    #[test]
    fn test_parse_cif_missing_cell() {
        let content = "data_x\nloop_\n_atom_site_fract_x\n_atom_site_fract_y\n_atom_site_fract_z\n0 0 0\n";
        assert!(matches!(
            parse_cif_content(content, "x"),
            Err(ReportError::ParseError { .. })
        ));
    }

    #[test]
    fn test_cif_write_then_read() {
        let crystal = parse_cif_content(SAMPLE_CIF, "fallback").unwrap();
        let parsed = parse_cif_content(&to_cif_string(&crystal), "again").unwrap();

        assert_eq!(parsed.name, crystal.name);
        assert_eq!(parsed.atoms.len(), 3);
        assert_eq!(parsed.space_group_number, Some(123));
        assert!((parsed.atoms[0].position[2] - 0.25).abs() < 1e-9);
    }
}
