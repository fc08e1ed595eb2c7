//! # 批量处理模块
//!
//! 对目录中的多个能带文件并行执行块/列重排。
//!
//! ## 依赖关系
//! - 被 `commands/band.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{BatchResult, BatchRunner, ProcessResult};
