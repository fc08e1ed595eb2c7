//! # 数据模型模块
//!
//! 定义晶体结构和电子结构结果的数据模型。
//!
//! ## 依赖关系
//! - 被 `config/`, `parsers/`, `export/` 和 `commands/` 使用
//! - 子模块: structure, bands

pub mod bands;
pub mod structure;

pub use bands::{BandBlocks, BandCharacter, BandGap, ConvergenceTable, DosCurve, ScanParameter};
pub use structure::{Atom, Crystal, Lattice};
