//! # 外部引擎接口模块
//!
//! 所有物理计算都由 GPAW 完成；本模块只负责生成驱动脚本、规划收敛扫描、
//! 约定输出文件名以及启动引擎进程。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `config/`, `models/`, `utils/`
//! - 子模块: files, launcher, scan, script

pub mod files;
pub mod launcher;
pub mod scan;
pub mod script;

pub use files::StageFiles;
pub use launcher::LaunchCommand;
pub use scan::{analyze_table, ScanPlan, ScanSummary, ScanValues};
