//! # converge 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/converge.rs`

use crate::models::ScanParameter;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 扫描参数选择
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ScanArg {
    /// Plane-wave cut-off energy (eV)
    Cutoff,
    /// Monkhorst-Pack mesh density
    Kpoints,
    /// Uniform lattice scaling
    Lattice,
}

impl From<ScanArg> for ScanParameter {
    fn from(arg: ScanArg) -> Self {
        match arg {
            ScanArg::Cutoff => ScanParameter::Cutoff,
            ScanArg::Kpoints => ScanParameter::Kpoints,
            ScanArg::Lattice => ScanParameter::Lattice,
        }
    }
}

/// converge 子命令参数
#[derive(Args, Debug)]
pub struct ConvergeArgs {
    /// Input deck (TOML)
    pub deck: PathBuf,

    /// Parameter to scan
    #[arg(long, value_enum)]
    pub parameter: ScanArg,

    /// First value (eV for cutoff, mesh size for kpoints, strain for lattice)
    #[arg(long, allow_negative_numbers = true)]
    pub min: f64,

    /// Last value (inclusive)
    #[arg(long, allow_negative_numbers = true)]
    pub max: f64,

    /// Step (number of points for lattice)
    #[arg(long)]
    pub step: f64,

    /// Convergence tolerance in eV/atom
    #[arg(long, default_value_t = 0.001)]
    pub tolerance: f64,

    /// Working directory (defaults to the deck's directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Number of cores, overrides [parallel].cores
    #[arg(short = 'n', long)]
    pub cores: Option<u32>,

    /// Write the scan script without running it
    #[arg(long)]
    pub dry_run: bool,

    /// Only analyze an existing table
    #[arg(long, conflicts_with = "dry_run")]
    pub analyze_only: bool,
}
