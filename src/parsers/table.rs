//! # 收敛扫描表解析器
//!
//! 扫描脚本以追加模式写表，重复运行会留下重复的表头：
//!
//! ```text
//! Cut-off_Energy  Total_Energy
//! 200.0  -10.60
//! 250.0  -10.80
//! K-points  Total_Energy
//! 5x5x1  -18.40
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/converge.rs` 使用
//! - 使用 `models/bands.rs` 的 `ConvergenceTable`

use crate::error::{GpawFlowError, Result};
use crate::models::{ConvergenceTable, ScanParameter};
use std::fs;
use std::path::Path;

const HEADERS: [ScanParameter; 3] = [
    ScanParameter::Cutoff,
    ScanParameter::Kpoints,
    ScanParameter::Lattice,
];

/// 读取扫描表文件
pub fn read_table_file(path: &Path, parameter: ScanParameter) -> Result<ConvergenceTable> {
    let content = fs::read_to_string(path).map_err(|e| GpawFlowError::read(path, e))?;
    parse_table_content(&content, parameter, &path.display().to_string())
}

/// 解析扫描表内容
pub fn parse_table_content(
    content: &str,
    parameter: ScanParameter,
    source: &str,
) -> Result<ConvergenceTable> {
    let mut rows = Vec::new();

    for (lineno, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if HEADERS.iter().any(|p| p.column_header() == fields[0]) {
            continue;
        }

        let energy = match fields.as_slice() {
            [_, energy, ..] => energy.parse::<f64>().ok(),
            _ => None,
        };
        match energy {
            Some(e) => rows.push((fields[0].to_string(), e)),
            None => {
                return Err(GpawFlowError::ParseError {
                    format: "convergence table".to_string(),
                    path: source.to_string(),
                    reason: format!("line {}: expected 'value  energy', got '{}'", lineno + 1, line),
                })
            }
        }
    }

    Ok(ConvergenceTable { parameter, rows })
}
