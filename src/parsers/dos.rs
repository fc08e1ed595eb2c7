//! # 态密度文件读写
//!
//! `<name>-2-Result-DOS.txt`：每行 `energy, dos`，逗号分隔，无表头。
//!
//! ## 依赖关系
//! - 被 `commands/post.rs`, `commands/analyze.rs` 使用
//! - 使用 `csv` 读取，`models/bands.rs` 的 `DosCurve`

use crate::error::{GpawFlowError, Result};
use crate::models::DosCurve;
use std::io::Read;
use std::path::Path;

/// 读取 DOS 文件
pub fn read_dos_file(path: &Path) -> Result<DosCurve> {
    let file = std::fs::File::open(path).map_err(|e| GpawFlowError::read(path, e))?;
    read_dos(file, &path.display().to_string())
}

/// 从任意读取器解析 DOS 数据
pub fn read_dos<R: Read>(reader: R, source: &str) -> Result<DosCurve> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut curve = DosCurve::default();

    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        if record.len() == 1 && record[0].is_empty() {
            continue;
        }
        if record.len() < 2 {
            return Err(GpawFlowError::ParseError {
                format: "dos".to_string(),
                path: source.to_string(),
                reason: format!("record {}: expected 'energy, dos'", i + 1),
            });
        }

        let parse = |field: &str| {
            field.parse::<f64>().map_err(|_| GpawFlowError::ParseError {
                format: "dos".to_string(),
                path: source.to_string(),
                reason: format!("record {}: '{}' is not a number", i + 1, field),
            })
        };
        curve.energies.push(parse(&record[0])?);
        curve.weights.push(parse(&record[1])?);
    }

    if curve.is_empty() {
        return Err(GpawFlowError::ParseError {
            format: "dos".to_string(),
            path: source.to_string(),
            reason: "no data points".to_string(),
        });
    }

    Ok(curve)
}
