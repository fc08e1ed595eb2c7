//! # post 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/post.rs`

use clap::Args;
use std::path::PathBuf;

/// post 子命令参数
#[derive(Args, Debug)]
pub struct PostArgs {
    /// Input deck (TOML)
    pub deck: PathBuf,

    /// Directory holding the run outputs (defaults to the deck's directory)
    #[arg(short = 'd', long)]
    pub dir: Option<PathBuf>,

    /// Draw DOS and band graphs even if [output].draw-graphs is false
    #[arg(long)]
    pub graphs: bool,
}
