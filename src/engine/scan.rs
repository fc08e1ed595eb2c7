//! # 收敛扫描
//!
//! 截断能、k 点网格和晶格缩放三种扫描的取值生成，以及扫描表的收敛分析。
//!
//! ## 依赖关系
//! - 被 `engine/script.rs`, `commands/converge.rs` 使用
//! - 使用 `models/bands.rs` 的 `ConvergenceTable`

use crate::config::{CalcMode, DeckConfig};
use crate::error::{GpawFlowError, Result};
use crate::models::{ConvergenceTable, ScanParameter};

/// 一次扫描允许的最大点数
pub const MAX_SCAN_POINTS: usize = 10_000;

/// 扫描取值
#[derive(Debug, Clone, PartialEq)]
pub enum ScanValues {
    /// 截断能 (eV)
    Cutoff(Vec<f64>),
    /// Monkhorst-Pack 网格
    Kpoints(Vec<[u32; 3]>),
    /// 晶格缩放因子 1 + eps
    Lattice(Vec<f64>),
}

impl ScanValues {
    pub fn len(&self) -> usize {
        match self {
            ScanValues::Cutoff(v) => v.len(),
            ScanValues::Kpoints(v) => v.len(),
            ScanValues::Lattice(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 一次扫描的计划
#[derive(Debug, Clone)]
pub struct ScanPlan {
    parameter: ScanParameter,
    values: ScanValues,
}

impl ScanPlan {
    /// 构建扫描计划
    ///
    /// - cutoff: `min..=max`，步长 `step` (eV)
    /// - kpoints: `min..=max`，步长 `step`；卡片中为 1 的方向保持 1（片层）
    /// - lattice: 应变 `min..=max` 等分为 `step` 个点
    pub fn new(
        parameter: ScanParameter,
        min: f64,
        max: f64,
        step: f64,
        deck: &DeckConfig,
    ) -> Result<Self> {
        for (flag, x) in [("--min", min), ("--max", max), ("--step", step)] {
            if !x.is_finite() {
                return Err(GpawFlowError::InvalidArgument(format!(
                    "{} must be a finite number, got {}",
                    flag, x
                )));
            }
        }
        if max < min {
            return Err(GpawFlowError::InvalidArgument(format!(
                "--max ({}) must not be below --min ({})",
                max, min
            )));
        }

        let values = match parameter {
            ScanParameter::Cutoff => {
                if !matches!(deck.calculation.mode, CalcMode::Pw | CalcMode::PwExx) {
                    return Err(GpawFlowError::InvalidArgument(format!(
                        "cut-off scan needs a plane-wave mode, deck uses {}",
                        deck.calculation.mode
                    )));
                }
                if min <= 0.0 || step <= 0.0 {
                    return Err(GpawFlowError::InvalidArgument(
                        "cut-off scan needs positive --min and --step".to_string(),
                    ));
                }
                let count = ((max - min) / step + 1e-9).floor() + 1.0;
                check_point_count(count)?;
                let values = (0..count as usize)
                    .map(|i| min + step * i as f64)
                    .collect();
                ScanValues::Cutoff(values)
            }
            ScanParameter::Kpoints => {
                let lo = as_count(min, "--min")?;
                let hi = as_count(max, "--max")?;
                let st = as_count(step, "--step")?;
                check_point_count(((hi - lo) / st) as f64 + 1.0)?;
                let base = deck.calculation.kpts;
                let meshes = (lo..=hi)
                    .step_by(st as usize)
                    .map(|k| {
                        let mut mesh = [k; 3];
                        for (axis, b) in mesh.iter_mut().zip(base.iter()) {
                            if *b == 1 {
                                *axis = 1;
                            }
                        }
                        mesh
                    })
                    .collect();
                ScanValues::Kpoints(meshes)
            }
            ScanParameter::Lattice => {
                let n = as_count(step, "--step")? as usize;
                check_point_count(n as f64)?;
                if min <= -1.0 {
                    return Err(GpawFlowError::InvalidArgument(
                        "lattice strain must stay above -1".to_string(),
                    ));
                }
                let scales = if n == 1 {
                    vec![1.0 + min]
                } else {
                    (0..n)
                        .map(|i| 1.0 + min + (max - min) * i as f64 / (n - 1) as f64)
                        .collect()
                };
                ScanValues::Lattice(scales)
            }
        };

        Ok(ScanPlan { parameter, values })
    }

    pub fn parameter(&self) -> ScanParameter {
        self.parameter
    }

    pub fn values(&self) -> &ScanValues {
        &self.values
    }
}

fn check_point_count(count: f64) -> Result<()> {
    if count > MAX_SCAN_POINTS as f64 {
        return Err(GpawFlowError::InvalidArgument(format!(
            "scan would have {} points, the limit is {}",
            count, MAX_SCAN_POINTS
        )));
    }
    Ok(())
}

fn as_count(x: f64, flag: &str) -> Result<u32> {
    if x < 1.0 || x.fract() != 0.0 {
        return Err(GpawFlowError::InvalidArgument(format!(
            "{} must be a positive integer here, got {}",
            flag, x
        )));
    }
    Ok(x as u32)
}

// ─────────────────────────────────────────────────────────────
// 扫描表分析
// ─────────────────────────────────────────────────────────────

/// 扫描表中的一行
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRow {
    pub label: String,
    pub energy: f64,
    /// 相对最后一行（最收敛）的每原子能量差 (eV/atom)
    pub delta_per_atom: f64,
}

/// 扫描分析结果
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSummary {
    pub rows: Vec<ScanRow>,
    /// 从该行起所有后续行都在容差内
    pub converged: Option<usize>,
    /// 能量最低的行
    pub minimum: Option<usize>,
}

/// 分析扫描表
pub fn analyze_table(table: &ConvergenceTable, natoms: usize, tolerance: f64) -> ScanSummary {
    let natoms = natoms.max(1) as f64;
    let reference = table.rows.last().map(|(_, e)| *e);

    let rows: Vec<ScanRow> = table
        .rows
        .iter()
        .map(|(label, energy)| ScanRow {
            label: label.clone(),
            energy: *energy,
            delta_per_atom: reference.map(|r| (energy - r) / natoms).unwrap_or(0.0),
        })
        .collect();

    // 从后往前找最长的容差内后缀
    let mut converged = None;
    for (i, row) in rows.iter().enumerate().rev() {
        if row.delta_per_atom.abs() <= tolerance {
            converged = Some(i);
        } else {
            break;
        }
    }

    let minimum = rows
        .iter()
        .enumerate()
        .min_by(|a, b| {
            a.1.energy
                .partial_cmp(&b.1.energy)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i);

    ScanSummary {
        rows,
        converged,
        minimum,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_deck;
    use crate::config::presets::{starter_deck, Preset};

    fn deck(preset: Preset) -> DeckConfig {
        parse_deck(&starter_deck(preset, "t"), "t").unwrap()
    }

    #[test]
    fn test_cutoff_values_inclusive() {
        let plan = ScanPlan::new(ScanParameter::Cutoff, 200.0, 400.0, 50.0, &deck(Preset::Silicon))
            .unwrap();
        assert_eq!(
            plan.values(),
            &ScanValues::Cutoff(vec![200.0, 250.0, 300.0, 350.0, 400.0])
        );
    }

    #[test]
    fn test_non_finite_bounds_rejected() {
        let d = deck(Preset::Silicon);
        for (min, max, step) in [
            (200.0, f64::INFINITY, 50.0),
            (200.0, f64::NAN, 50.0),
            (f64::NEG_INFINITY, 400.0, 50.0),
            (200.0, 400.0, f64::NAN),
        ] {
            let err = ScanPlan::new(ScanParameter::Cutoff, min, max, step, &d).unwrap_err();
            assert!(matches!(err, GpawFlowError::InvalidArgument(_)));
        }
        assert!(ScanPlan::new(ScanParameter::Lattice, -0.02, f64::INFINITY, 5.0, &d).is_err());
    }

    #[test]
    fn test_point_count_capped() {
        let d = deck(Preset::Silicon);
        assert!(ScanPlan::new(ScanParameter::Cutoff, 1.0, 1e12, 1.0, &d).is_err());
        assert!(ScanPlan::new(ScanParameter::Kpoints, 1.0, 1e9, 1.0, &d).is_err());
        assert!(ScanPlan::new(ScanParameter::Lattice, -0.02, 0.02, 1e9, &d).is_err());

        let plan = ScanPlan::new(ScanParameter::Cutoff, 1.0, 10_000.0, 1.0, &d).unwrap();
        assert_eq!(plan.values().len(), MAX_SCAN_POINTS);
    }

    #[test]
    fn test_cutoff_rejects_lcao() {
        let mut d = deck(Preset::Silicon);
        d.calculation.mode = CalcMode::Lcao;
        assert!(ScanPlan::new(ScanParameter::Cutoff, 200.0, 400.0, 50.0, &d).is_err());
    }

    #[test]
    fn test_kpoint_meshes_keep_slab_axis() {
        // graphene: kpts = [5, 5, 1]
        let plan =
            ScanPlan::new(ScanParameter::Kpoints, 3.0, 9.0, 2.0, &deck(Preset::Graphene)).unwrap();
        assert_eq!(
            plan.values(),
            &ScanValues::Kpoints(vec![[3, 3, 1], [5, 5, 1], [7, 7, 1], [9, 9, 1]])
        );
    }

    #[test]
    fn test_kpoints_reject_fractional() {
        assert!(
            ScanPlan::new(ScanParameter::Kpoints, 2.5, 9.0, 2.0, &deck(Preset::Silicon)).is_err()
        );
    }

    #[test]
    fn test_lattice_linspace() {
        let plan =
            ScanPlan::new(ScanParameter::Lattice, -0.02, 0.02, 5.0, &deck(Preset::Silicon)).unwrap();
        match plan.values() {
            ScanValues::Lattice(v) => {
                let expected = [0.98, 0.99, 1.0, 1.01, 1.02];
                assert_eq!(v.len(), 5);
                for (a, b) in v.iter().zip(expected.iter()) {
                    assert!((a - b).abs() < 1e-12);
                }
            }
            other => panic!("unexpected values {:?}", other),
        }
    }

    #[test]
    fn test_min_above_max_rejected() {
        assert!(
            ScanPlan::new(ScanParameter::Cutoff, 400.0, 200.0, 50.0, &deck(Preset::Silicon))
                .is_err()
        );
    }

    #[test]
    fn test_analyze_table_converged_suffix() {
        let table = ConvergenceTable {
            parameter: ScanParameter::Cutoff,
            rows: vec![
                ("200".into(), -10.60),
                ("250".into(), -10.80),
                ("300".into(), -10.8025),
                ("350".into(), -10.8030),
                ("400".into(), -10.8035),
            ],
        };
        let summary = analyze_table(&table, 2, 0.001);

        assert_eq!(summary.converged, Some(2));
        assert_eq!(summary.minimum, Some(4));
        assert!((summary.rows[0].delta_per_atom - 0.10175).abs() < 1e-9);
        assert_eq!(summary.rows[4].delta_per_atom, 0.0);
    }

    #[test]
    fn test_analyze_empty_table() {
        let table = ConvergenceTable {
            parameter: ScanParameter::Lattice,
            rows: vec![],
        };
        let summary = analyze_table(&table, 2, 0.001);
        assert!(summary.rows.is_empty());
        assert_eq!(summary.converged, None);
        assert_eq!(summary.minimum, None);
    }
}
