//! # run 子命令 CLI 定义
//!
//! 本地直接运行，或生成 sbatch 脚本交给 Slurm。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/run.rs`

use clap::Args;
use std::path::PathBuf;

/// run 子命令参数
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Input deck (TOML)
    pub deck: PathBuf,

    /// Working directory (defaults to the deck's directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Number of cores, overrides [parallel].cores
    #[arg(short = 'n', long)]
    pub cores: Option<u32>,

    /// Write the script and print the launch command without running it
    #[arg(long)]
    pub dry_run: bool,

    /// Skip post-processing after the engine finishes
    #[arg(long)]
    pub no_post: bool,

    // ─────────────────────────────────────────────────────────────
    // Slurm options
    // ─────────────────────────────────────────────────────────────
    /// Write <name>.sbatch instead of running locally
    #[arg(long)]
    pub slurm: bool,

    /// Submit the sbatch script with sbatch
    #[arg(long, requires = "slurm")]
    pub submit: bool,

    /// Slurm partition
    #[arg(long, default_value = "cpu")]
    pub partition: String,

    /// Slurm node constraint
    #[arg(long)]
    pub constraint: Option<String>,

    /// Number of nodes
    #[arg(long, default_value_t = 1)]
    pub nodes: u32,

    /// Wall time limit
    #[arg(long, default_value = "24:00:00")]
    pub time: String,

    /// Memory per CPU
    #[arg(long, default_value = "2G")]
    pub mem_per_cpu: String,

    /// Modules to load (comma-separated)
    #[arg(long, default_value = "")]
    pub modules: String,
}
