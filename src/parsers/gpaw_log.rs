//! # GPAW 文本日志解析器
//!
//! 从 `txt=` 日志中提取能量、费米能级、能带数和是否正常结束。
//! 弛豫过程中每个离子步都会打印一次能量，取最后一次出现的值。
//!
//! ## 日志片段
//! ```text
//! Free energy:    -18.400000
//! Extrapolated:   -18.401211
//!
//! Fermi level: -2.26547
//! Fermi levels: -2.10000, -2.30000        (自旋极化)
//! Number of bands in calculation: 16
//! ...
//! Total:                                    123.456 100.0%
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/analyze.rs`, `commands/post.rs` 使用
//! - 使用 `regex`

use crate::error::{GpawFlowError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const NUMBER: &str = r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?";

/// 日志摘要
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpawLogSummary {
    /// 外推到零展宽的总能量 (eV)
    pub energy: Option<f64>,
    /// 自由能 (eV)
    pub free_energy: Option<f64>,
    /// 费米能级 (eV)，自旋分裂时取平均
    pub fermi_level: Option<f64>,
    /// 计算中的能带数
    pub bands: Option<usize>,
    pub is_finished: bool,
}

struct LogPatterns {
    extrapolated: Regex,
    free_energy: Regex,
    fermi: Regex,
    bands: Regex,
    total: Regex,
    number: Regex,
}

impl LogPatterns {
    fn compile() -> Result<Self> {
        let build = |re: String| {
            Regex::new(&re).map_err(|e| GpawFlowError::Other(format!("bad log pattern: {}", e)))
        };
        Ok(LogPatterns {
            extrapolated: build(format!(r"^\s*Extrapolated:\s+({})", NUMBER))?,
            free_energy: build(format!(r"^\s*Free energy:\s+({})", NUMBER))?,
            fermi: build(r"^\s*Fermi levels?:\s*(.+)$".to_string())?,
            bands: build(r"Number of bands in calculation:\s+(\d+)".to_string())?,
            total: build(format!(r"^Total:\s+{}", NUMBER))?,
            number: build(NUMBER.to_string())?,
        })
    }

    fn capture_f64(re: &Regex, line: &str) -> Option<f64> {
        re.captures(line)?.get(1)?.as_str().parse().ok()
    }
}

/// 解析 GPAW 日志文件
pub fn parse_gpaw_log(path: &Path) -> Result<GpawLogSummary> {
    let content = fs::read_to_string(path).map_err(|e| GpawFlowError::read(path, e))?;
    parse_gpaw_log_content(&content)
}

/// 从字符串内容解析
pub fn parse_gpaw_log_content(content: &str) -> Result<GpawLogSummary> {
    let patterns = LogPatterns::compile()?;
    let mut summary = GpawLogSummary::default();
    for line in content.lines() {
        scan_line(&patterns, line, &mut summary);
    }
    Ok(summary)
}

fn scan_line(patterns: &LogPatterns, line: &str, summary: &mut GpawLogSummary) {
    if let Some(e) = LogPatterns::capture_f64(&patterns.extrapolated, line) {
        summary.energy = Some(e);
    } else if let Some(e) = LogPatterns::capture_f64(&patterns.free_energy, line) {
        summary.free_energy = Some(e);
    } else if let Some(caps) = patterns.fermi.captures(line) {
        let levels: Vec<f64> = caps
            .get(1)
            .map(|m| {
                patterns
                    .number
                    .find_iter(m.as_str())
                    .filter_map(|n| n.as_str().parse().ok())
                    .collect()
            })
            .unwrap_or_default();
        if !levels.is_empty() {
            summary.fermi_level = Some(levels.iter().sum::<f64>() / levels.len() as f64);
        }
    } else if let Some(caps) = patterns.bands.captures(line) {
        summary.bands = caps.get(1).and_then(|m| m.as_str().parse().ok());
    } else if patterns.total.is_match(line) {
        summary.is_finished = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUND_LOG: &str = "\
Number of bands in calculation: 16
Energy contributions relative to reference atoms: (reference = -2055.256231)

Kinetic:        +20.375437
Free energy:    -18.350000
Extrapolated:   -18.351211

Fermi level: -2.26547

Free energy:    -18.400000
Extrapolated:   -18.401211

Fermi level: -2.20000

Timing:                              incl.     excl.
-----------------------------------------------------
SCF-cycle:                          95.120    95.120  77.1%
-----------------------------------------------------
Total:                                        123.456 100.0%
";

    #[test]
    fn test_last_values_win() {
        let summary = parse_gpaw_log_content(GROUND_LOG).unwrap();
        assert_eq!(summary.energy, Some(-18.401211));
        assert_eq!(summary.free_energy, Some(-18.4));
        assert_eq!(summary.fermi_level, Some(-2.2));
        assert_eq!(summary.bands, Some(16));
        assert!(summary.is_finished);
    }

    #[test]
    fn test_spin_split_fermi_levels() {
        let summary = parse_gpaw_log_content("Fermi levels: -2.10000, -2.30000\n").unwrap();
        let ef = summary.fermi_level.unwrap();
        assert!((ef + 2.2).abs() < 1e-12);
    }

    #[test]
    fn test_unfinished_run() {
        let summary = parse_gpaw_log_content("Extrapolated:   -5.0\n").unwrap();
        assert_eq!(summary.energy, Some(-5.0));
        assert!(!summary.is_finished);
        assert_eq!(summary.fermi_level, None);
    }

    #[test]
    fn test_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Si-1-Log-Ground.txt");
        std::fs::write(&path, GROUND_LOG).unwrap();
        assert_eq!(parse_gpaw_log(&path).unwrap().bands, Some(16));

        assert!(parse_gpaw_log(&dir.path().join("missing.txt")).is_err());
    }
}
