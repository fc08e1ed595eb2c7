//! # init 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/init.rs`

use crate::config::presets::Preset;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 起始结构选择
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum PresetArg {
    /// 8-atom graphene sheet with vacuum along z
    Graphene,
    /// Bulk silicon primitive cell
    Silicon,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Graphene => Preset::Graphene,
            PresetArg::Silicon => Preset::Silicon,
        }
    }
}

/// init 子命令参数
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path of the deck to write (e.g. graphene.toml)
    pub deck: PathBuf,

    /// Starting structure
    #[arg(long, value_enum, default_value = "graphene")]
    pub preset: PresetArg,

    /// Structure name used as output prefix (defaults to the file stem)
    #[arg(long)]
    pub name: Option<String>,

    /// Overwrite an existing deck
    #[arg(long)]
    pub overwrite: bool,
}
