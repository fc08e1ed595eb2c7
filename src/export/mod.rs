//! # 导出模块
//!
//! 结构导出 (CIF) 与结果图表 (DOS、能带、收敛扫描)。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/`, `config/`, `engine/scan.rs`
//! - 子模块: cif, plot

pub mod cif;
pub mod plot;

pub use cif::{to_cif_string, write_cif_file};
