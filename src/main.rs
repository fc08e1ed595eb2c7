//! # gpawflow - GPAW 第一性原理计算工作流工具
//!
//! 用一份 TOML 输入卡片描述一次 GPAW 计算（弛豫、基态、DOS、能带），
//! 生成驱动脚本并运行，随后整理输出：能带数据转置、CIF 导出、绘图、收敛扫描分析。
//!
//! ## 子命令
//! - `init`     - 从预设模板生成输入卡片
//! - `generate` - 生成 GPAW 驱动脚本
//! - `run`      - 运行计算（本地 MPI 或 Slurm）
//! - `post`     - 计算后处理
//! - `band`     - 能带数据格式转换
//!   - `columns` - 块格式 -> 列格式
//!   - `blocks`  - 列格式 -> 块格式
//! - `cif`      - 结构导出为 CIF
//! - `converge` - 截断能 / k 点 / 晶格常数收敛扫描
//! - `analyze`  - 汇总计算结果
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── config/    (输入卡片)
//!   │     ├── engine/    (脚本生成与启动)
//!   │     ├── parsers/   (输出文件解析)
//!   │     ├── export/    (CIF 与绘图)
//!   │     ├── batch/     (批量处理)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod config;
mod engine;
mod error;
mod export;
mod models;
mod parsers;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
