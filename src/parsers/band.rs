//! # 能带本征值文件解析与重排
//!
//! 驱动脚本写出的 `<name>-3-Result-Band.dat` 为块格式：每条能带一个块，
//! 块内每行 `k ε-E_F`，块之间以空行分隔。绘图工具通常需要列格式：
//! 每个 k 点一行，第一列为 k 索引，随后按能带序号依次排列本征值。
//!
//! ## 块格式
//! ```text
//! 0 -5.12        <- band 0
//! 1 -5.08
//!
//! 0 -1.93        <- band 1
//! 1 -1.87
//!
//! ```
//!
//! ## 列格式
//! ```text
//! 0 -5.12 -1.93
//! 1 -5.08 -1.87
//! ```
//!
//! 数值按原文本搬运，重排前后数字的书写完全一致。
//!
//! ## 依赖关系
//! - 被 `commands/band.rs`, `commands/post.rs`, `commands/analyze.rs` 使用
//! - 使用 `models/bands.rs`

use crate::error::{GpawFlowError, Result};
use crate::models::{BandBlocks, BandCharacter, BandGap};
use std::fs;
use std::path::Path;

/// 判定占据/空带时允许的费米能级容差 (eV)
const FERMI_TOL: f64 = 0.01;

/// 读取块格式文件
pub fn read_blocks_file(path: &Path, expected: Option<(usize, usize)>) -> Result<BandBlocks> {
    let content = fs::read_to_string(path).map_err(|e| GpawFlowError::read(path, e))?;
    parse_blocks_content(&content, &path.display().to_string(), expected)
}

/// 读取列格式文件
pub fn read_columns_file(path: &Path) -> Result<BandBlocks> {
    let content = fs::read_to_string(path).map_err(|e| GpawFlowError::read(path, e))?;
    parse_columns_content(&content, &path.display().to_string())
}

fn parse_error(source: &str, format: &str, reason: String) -> GpawFlowError {
    GpawFlowError::ParseError {
        format: format.to_string(),
        path: source.to_string(),
        reason,
    }
}

/// 解析块格式
///
/// `expected` 为 (能带数 B, k 点数 K)，给出时必须与文件完全一致。
pub fn parse_blocks_content(
    content: &str,
    source: &str,
    expected: Option<(usize, usize)>,
) -> Result<BandBlocks> {
    let mut blocks: Vec<Vec<(&str, &str)>> = Vec::new();
    let mut current: Vec<(&str, &str)> = Vec::new();

    for (lineno, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            // 空行结束当前块；连续空行视为一个
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let (k, value) = match (parts.next(), parts.next()) {
            (Some(k), Some(v)) => (k, v),
            _ => {
                return Err(parse_error(
                    source,
                    "band blocks",
                    format!("line {}: expected 'k value', got '{}'", lineno + 1, line),
                ))
            }
        };
        check_number(k, source, "band blocks", lineno)?;
        check_number(value, source, "band blocks", lineno)?;
        current.push((k, value));
    }

    if !current.is_empty() {
        blocks.push(current);
    }

    if blocks.is_empty() {
        return Err(parse_error(
            source,
            "band blocks",
            "no band data found".to_string(),
        ));
    }

    let kpoints = blocks[0].len();
    let k_labels: Vec<String> = blocks[0].iter().map(|(k, _)| k.to_string()).collect();

    for (b, block) in blocks.iter().enumerate() {
        if block.len() != kpoints {
            return Err(GpawFlowError::ShapeMismatch(format!(
                "band {} has {} k-points, band 0 has {}",
                b,
                block.len(),
                kpoints
            )));
        }
        for (k, ((label, _), reference)) in block.iter().zip(k_labels.iter()).enumerate() {
            if !same_number(label, reference) {
                return Err(GpawFlowError::ShapeMismatch(format!(
                    "band {} line {} has k index '{}', band 0 has '{}'",
                    b, k, label, reference
                )));
            }
        }
    }

    let blocks_out = BandBlocks {
        k_labels,
        values: blocks
            .iter()
            .map(|block| block.iter().map(|(_, v)| v.to_string()).collect())
            .collect(),
    };

    if let Some((bands, kpts)) = expected {
        if blocks_out.band_count() != bands || blocks_out.kpoint_count() != kpts {
            return Err(GpawFlowError::ShapeMismatch(format!(
                "expected {} bands x {} k-points, found {} x {}",
                bands,
                kpts,
                blocks_out.band_count(),
                blocks_out.kpoint_count()
            )));
        }
    }

    Ok(blocks_out)
}

/// 解析列格式
pub fn parse_columns_content(content: &str, source: &str) -> Result<BandBlocks> {
    let mut k_labels = Vec::new();
    let mut values: Vec<Vec<String>> = Vec::new();

    for (lineno, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 2 {
            return Err(parse_error(
                source,
                "band columns",
                format!("line {}: expected k index and at least one band", lineno + 1),
            ));
        }
        for f in &fields {
            check_number(f, source, "band columns", lineno)?;
        }

        let bands = fields.len() - 1;
        if values.is_empty() {
            values = vec![Vec::new(); bands];
        } else if values.len() != bands {
            return Err(GpawFlowError::ShapeMismatch(format!(
                "line {} has {} bands, first row has {}",
                lineno + 1,
                bands,
                values.len()
            )));
        }

        k_labels.push(fields[0].to_string());
        for (band, v) in values.iter_mut().zip(fields[1..].iter()) {
            band.push(v.to_string());
        }
    }

    if k_labels.is_empty() {
        return Err(parse_error(
            source,
            "band columns",
            "no band data found".to_string(),
        ));
    }

    Ok(BandBlocks { k_labels, values })
}

fn check_number(token: &str, source: &str, format: &str, lineno: usize) -> Result<()> {
    token.parse::<f64>().map(|_| ()).map_err(|_| {
        parse_error(
            source,
            format,
            format!("line {}: '{}' is not a number", lineno + 1, token),
        )
    })
}

fn same_number(a: &str, b: &str) -> bool {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) if !x.is_nan() && !y.is_nan() => x == y,
        _ => a.eq_ignore_ascii_case(b),
    }
}

/// 转换为列格式：K 行，每行 `k v_0 v_1 ... v_{B-1}`
pub fn to_columns_string(bands: &BandBlocks) -> String {
    let mut result = String::new();

    for (k, label) in bands.k_labels.iter().enumerate() {
        result.push_str(label);
        for band in &bands.values {
            result.push(' ');
            result.push_str(&band[k]);
        }
        result.push('\n');
    }

    result
}

/// 转换为块格式：每条能带一个块，每个块后跟一个空行
pub fn to_blocks_string(bands: &BandBlocks) -> String {
    let mut result = String::new();

    for band in &bands.values {
        for (label, value) in bands.k_labels.iter().zip(band.iter()) {
            result.push_str(&format!("{} {}\n", label, value));
        }
        result.push('\n');
    }

    result
}

/// 根据相对费米能级的本征值判断金属/带隙
pub fn classify_bands(bands: &BandBlocks) -> Result<BandCharacter> {
    let energies = bands
        .energies()
        .map_err(|reason| parse_error("<band data>", "band blocks", reason))?;

    let mut vbm: Option<(f64, usize)> = None;
    let mut cbm: Option<(f64, usize)> = None;

    for band in &energies {
        let (min_k, min) = extremum(band, |a, b| a < b);
        let (max_k, max) = extremum(band, |a, b| a > b);

        if max <= FERMI_TOL {
            if vbm.map_or(true, |(e, _)| max > e) {
                vbm = Some((max, max_k));
            }
        } else if min >= -FERMI_TOL {
            if cbm.map_or(true, |(e, _)| min < e) {
                cbm = Some((min, min_k));
            }
        } else {
            return Ok(BandCharacter::Metallic);
        }
    }

    match (vbm, cbm) {
        (Some((vbm_energy, vbm_k)), Some((cbm_energy, cbm_k))) => {
            let gap = cbm_energy - vbm_energy;
            if gap <= FERMI_TOL {
                Ok(BandCharacter::Metallic)
            } else {
                Ok(BandCharacter::Gapped(BandGap {
                    value: gap,
                    is_direct: vbm_k == cbm_k,
                    vbm_k,
                    cbm_k,
                    vbm_energy,
                    cbm_energy,
                }))
            }
        }
        _ => Ok(BandCharacter::Undetermined),
    }
}

/// 返回 (索引, 值)；`better(a, b)` 为真时 a 取代 b
fn extremum<F>(values: &[f64], better: F) -> (usize, f64)
where
    F: Fn(f64, f64) -> bool,
{
    let mut best = (0, values.first().copied().unwrap_or(0.0));
    for (i, &v) in values.iter().enumerate().skip(1) {
        if better(v, best.1) {
            best = (i, v);
        }
    }
    best
}
