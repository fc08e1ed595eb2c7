//! # generate 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/generate.rs`

use clap::Args;
use std::path::PathBuf;

/// generate 子命令参数
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Input deck (TOML)
    pub deck: PathBuf,

    /// Output directory for the driver script (defaults to the deck's directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Print the script to stdout instead of writing it
    #[arg(long)]
    pub stdout: bool,
}
