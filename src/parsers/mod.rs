//! # 解析器模块
//!
//! 读取驱动脚本产生的各类输出文件，以及结构输入。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: band, dos, gpaw_log, poscar, table

pub mod band;
pub mod dos;
pub mod gpaw_log;
pub mod poscar;
pub mod table;

use crate::config;
use crate::error::Result;
use crate::models::Crystal;
use std::path::Path;

/// 从文件路径推断格式并读取结构
///
/// `.toml` 按输入卡片读取初始结构，其余按 POSCAR 读取。
pub fn read_structure_file(path: &Path) -> Result<Crystal> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "toml" => Ok(config::load_deck(path)?.crystal()),
        _ => poscar::parse_poscar_file(path),
    }
}
