//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `config/`, `engine/`, `parsers/`, `export/`, `utils/`
//! - 子模块: analyze, band, cif, converge, generate, init, post, run

pub mod analyze;
pub mod band;
pub mod cif;
pub mod converge;
pub mod generate;
pub mod init;
pub mod post;
pub mod run;

use crate::cli::Commands;
use crate::error::{GpawFlowError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init(args) => init::execute(args),
        Commands::Generate(args) => generate::execute(args),
        Commands::Run(args) => run::execute(args),
        Commands::Post(args) => post::execute(args),
        Commands::Band(args) => band::execute(args),
        Commands::Cif(args) => cif::execute(args),
        Commands::Converge(args) => converge::execute(args),
        Commands::Analyze(args) => analyze::execute(args),
    }
}

/// 工作目录：显式给出的目录，否则为卡片所在目录
pub(crate) fn work_dir(deck: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(dir) => dir.to_path_buf(),
        None => match deck.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        },
    }
}

/// 创建目录（含父目录）
pub(crate) fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| GpawFlowError::write(dir, e))
}

/// 写文件并把 I/O 错误带上路径
pub(crate) fn write_text(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| GpawFlowError::write(path, e))
}
