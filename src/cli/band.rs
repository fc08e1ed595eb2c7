//! # band 子命令 CLI 定义
//!
//! - `columns`: 块格式 -> 列格式，目录输入时并行批量处理
//! - `blocks`: 列格式 -> 块格式
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/band.rs`

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// band 主命令参数
#[derive(Args, Debug)]
pub struct BandArgs {
    #[command(subcommand)]
    pub command: BandCommands,
}

/// band 子命令
#[derive(Subcommand, Debug)]
pub enum BandCommands {
    /// Convert block-per-band files to one row per k-point
    Columns(ColumnsArgs),

    /// Convert a column file back to block-per-band layout
    Blocks(BlocksArgs),
}

/// columns 子命令参数
#[derive(Args, Debug)]
pub struct ColumnsArgs {
    /// Band file or directory of band files
    pub input: PathBuf,

    /// Output file (single-file input only; defaults to <stem>-withColumns.dat)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// File name pattern(s) for directory input (comma-separated)
    #[arg(long, default_value = "*-3-Result-Band.dat")]
    pub pattern: String,

    /// Search directories recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Number of parallel jobs (0 = all cores)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Expected number of bands
    #[arg(long, requires = "kpoints")]
    pub bands: Option<usize>,

    /// Expected number of k-points
    #[arg(long, requires = "bands")]
    pub kpoints: Option<usize>,

    /// Overwrite existing output files
    #[arg(long)]
    pub overwrite: bool,
}

/// blocks 子命令参数
#[derive(Args, Debug)]
pub struct BlocksArgs {
    /// Column-layout band file
    pub input: PathBuf,

    /// Output file (defaults to <stem>-blocks.dat)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Overwrite an existing output file
    #[arg(long)]
    pub overwrite: bool,
}
