//! # 电子结构结果数据模型
//!
//! 能带、态密度和收敛扫描表的数据容器。
//!
//! ## 依赖关系
//! - 被 `parsers/band.rs`, `parsers/dos.rs`, `parsers/table.rs` 填充
//! - 被 `commands/`, `export/plot.rs` 使用

use serde::{Deserialize, Serialize};

/// 能带本征值矩阵
///
/// 数值以原始文本保存，重排时不会改变数字的书写形式。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandBlocks {
    /// 每个 k 点的索引文本（第一列）
    pub k_labels: Vec<String>,

    /// `values[band][k]`：ε - E_F 的原始文本
    pub values: Vec<Vec<String>>,
}

impl BandBlocks {
    /// 能带数 B
    pub fn band_count(&self) -> usize {
        self.values.len()
    }

    /// k 点数 K
    pub fn kpoint_count(&self) -> usize {
        self.k_labels.len()
    }

    /// 将文本矩阵转换为数值矩阵 `[band][k]`
    pub fn energies(&self) -> std::result::Result<Vec<Vec<f64>>, String> {
        self.values
            .iter()
            .enumerate()
            .map(|(b, band)| {
                band.iter()
                    .enumerate()
                    .map(|(k, v)| {
                        v.parse::<f64>()
                            .map_err(|_| format!("band {} k-point {}: '{}' is not a number", b, k, v))
                    })
                    .collect()
            })
            .collect()
    }
}

/// 带隙信息（能量相对于费米能级）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandGap {
    /// 带隙 (eV)
    pub value: f64,
    /// 是否为直接带隙
    pub is_direct: bool,
    /// 价带顶所在 k 点索引
    pub vbm_k: usize,
    /// 导带底所在 k 点索引
    pub cbm_k: usize,
    /// 价带顶能量 (eV)
    pub vbm_energy: f64,
    /// 导带底能量 (eV)
    pub cbm_energy: f64,
}

/// 能带分析结论
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BandCharacter {
    /// 有能带穿过费米能级
    Metallic,
    /// 存在带隙
    Gapped(BandGap),
    /// 价带顶与导带底无法同时确定（例如能带数不足）
    Undetermined,
}

/// 态密度曲线
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DosCurve {
    /// 能量 (eV)
    pub energies: Vec<f64>,
    /// 态密度 (1/eV)
    pub weights: Vec<f64>,
}

impl DosCurve {
    pub fn len(&self) -> usize {
        self.energies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }

    /// 能量范围 (min, max)
    pub fn energy_range(&self) -> Option<(f64, f64)> {
        let min = self.energies.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = self.energies.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if min.is_finite() && max.is_finite() {
            Some((min, max))
        } else {
            None
        }
    }

    /// 态密度最大处的 (能量, 态密度)
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.energies
            .iter()
            .zip(self.weights.iter())
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(e, w)| (*e, *w))
    }

    /// 梯形积分，得到总态数
    pub fn integrate(&self) -> f64 {
        self.energies
            .windows(2)
            .zip(self.weights.windows(2))
            .map(|(e, w)| 0.5 * (w[0] + w[1]) * (e[1] - e[0]))
            .sum()
    }
}

/// 收敛扫描参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanParameter {
    /// 平面波截断能
    Cutoff,
    /// k 点网格密度
    Kpoints,
    /// 晶格缩放
    Lattice,
}

impl ScanParameter {
    /// 扫描表文件名后缀
    pub fn table_suffix(&self) -> &'static str {
        match self {
            ScanParameter::Cutoff => "0-Table-CutOff.txt",
            ScanParameter::Kpoints => "0-Table-Kpoints.txt",
            ScanParameter::Lattice => "0-Table-Lattice.txt",
        }
    }

    /// 扫描表第一列标题
    pub fn column_header(&self) -> &'static str {
        match self {
            ScanParameter::Cutoff => "Cut-off_Energy",
            ScanParameter::Kpoints => "K-points",
            ScanParameter::Lattice => "Lattice_Scale",
        }
    }
}

impl std::fmt::Display for ScanParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanParameter::Cutoff => write!(f, "cutoff"),
            ScanParameter::Kpoints => write!(f, "kpoints"),
            ScanParameter::Lattice => write!(f, "lattice"),
        }
    }
}

/// 收敛扫描表：(参数值文本, 总能 eV)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceTable {
    pub parameter: ScanParameter,
    pub rows: Vec<(String, f64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_blocks_energies() {
        let blocks = BandBlocks {
            k_labels: vec!["0".into(), "1".into()],
            values: vec![vec!["-1.5".into(), "-1.0".into()], vec!["2.0".into(), "x".into()]],
        };
        assert_eq!(blocks.band_count(), 2);
        assert_eq!(blocks.kpoint_count(), 2);
        let err = blocks.energies().unwrap_err();
        assert!(err.contains("band 1 k-point 1"));
    }

    #[test]
    fn test_dos_integrate_and_peak() {
        let dos = DosCurve {
            energies: vec![0.0, 1.0, 2.0],
            weights: vec![0.0, 2.0, 0.0],
        };
        assert!((dos.integrate() - 2.0).abs() < 1e-12);
        assert_eq!(dos.peak(), Some((1.0, 2.0)));
        assert_eq!(dos.energy_range(), Some((0.0, 2.0)));
    }

    #[test]
    fn test_empty_dos_has_no_range() {
        let dos = DosCurve::default();
        assert!(dos.is_empty());
        assert_eq!(dos.energy_range(), None);
        assert_eq!(dos.peak(), None);
    }
}
