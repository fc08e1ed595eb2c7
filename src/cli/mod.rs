//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `init`: 写出起始输入卡片
//! - `generate`: 校验卡片并生成 GPAW 驱动脚本
//! - `run`: 生成、运行引擎并后处理（可选 Slurm）
//! - `post`: 对已有输出做后处理
//! - `band`: 能带文件重排（嵌套子命令）
//!   - `columns`: 块格式 -> 列格式
//!   - `blocks`: 列格式 -> 块格式
//! - `cif`: 导出 CIF
//! - `converge`: 截断能 / k 点 / 晶格收敛扫描
//! - `analyze`: 结果汇总
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: analyze, band, cif, converge, generate, init, post, run

pub mod analyze;
pub mod band;
pub mod cif;
pub mod converge;
pub mod generate;
pub mod init;
pub mod post;
pub mod run;

use clap::{Parser, Subcommand};

/// gpawflow - GPAW 电子结构计算流程工具
#[derive(Parser)]
#[command(name = "gpawflow")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Drive GPAW ground-state, DOS and band-structure workflows from a TOML deck", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Write a commented starter deck
    Init(init::InitArgs),

    /// Validate a deck and write the GPAW driver script
    Generate(generate::GenerateArgs),

    /// Generate the driver script, run GPAW and post-process the results
    Run(run::RunArgs),

    /// Post-process existing outputs (band columns, CIF, graphs)
    Post(post::PostArgs),

    /// Reshape band eigenvalue files between block and column layouts
    Band(band::BandArgs),

    /// Export a structure from a deck or POSCAR to CIF
    Cif(cif::CifArgs),

    /// Run a cut-off, k-point or lattice convergence scan
    Converge(converge::ConvergeArgs),

    /// Summarize the results of a finished run
    Analyze(analyze::AnalyzeArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_band_columns_arguments() {
        let cli = Cli::try_parse_from([
            "gpawflow",
            "band",
            "columns",
            "Si-3-Result-Band.dat",
            "--bands",
            "8",
            "--kpoints",
            "40",
        ])
        .unwrap();
        match cli.command {
            Commands::Band(args) => match args.command {
                band::BandCommands::Columns(c) => {
                    assert_eq!(c.bands, Some(8));
                    assert_eq!(c.kpoints, Some(40));
                    assert_eq!(c.jobs, 0);
                }
                _ => panic!("expected columns"),
            },
            _ => panic!("expected band"),
        }
    }

    #[test]
    fn test_bands_requires_kpoints() {
        assert!(Cli::try_parse_from(["gpawflow", "band", "columns", "x.dat", "--bands", "8"]).is_err());
    }

    #[test]
    fn test_converge_arguments() {
        let cli = Cli::try_parse_from([
            "gpawflow", "converge", "Si.toml", "--parameter", "kpoints", "--min", "3", "--max",
            "9", "--step", "2", "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Commands::Converge(args) => {
                assert_eq!(args.parameter, converge::ScanArg::Kpoints);
                assert!(args.dry_run);
                assert_eq!(args.tolerance, 0.001);
            }
            _ => panic!("expected converge"),
        }
    }
}
