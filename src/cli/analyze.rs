//! # analyze 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/analyze.rs`

use clap::Args;
use std::path::PathBuf;

/// analyze 子命令参数
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Input deck(s) (TOML)
    #[arg(required = true)]
    pub decks: Vec<PathBuf>,

    /// Directory holding the run outputs (defaults to each deck's directory)
    #[arg(short = 'd', long)]
    pub dir: Option<PathBuf>,

    /// Write the summary to a CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,
}
