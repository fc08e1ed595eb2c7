//! # cif 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/cif.rs`

use clap::Args;
use std::path::PathBuf;

/// cif 子命令参数
#[derive(Args, Debug)]
pub struct CifArgs {
    /// Deck (.toml, initial structure) or POSCAR (relaxed structure)
    pub input: PathBuf,

    /// Output CIF file (defaults to <name>-4-FinalBulk.cif next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
