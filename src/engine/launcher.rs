//! # 引擎进程启动
//!
//! 把卡片的 `[parallel]` 设置翻译成启动命令，并在工作目录中运行。
//!
//! ```text
//! mpirun -n 4 gpaw python graphene.py
//! mpirun --use-hwthread-cpus -n 8 gpaw python graphene.py
//! gpaw -P8 python graphene.py
//! gpaw python graphene.py            (单核)
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/run.rs`, `commands/converge.rs` 使用
//! - 使用 `utils/progress.rs` 显示 spinner

use crate::config::deck::ParallelConfig;
use crate::config::Launcher;
use crate::error::{GpawFlowError, Result};
use crate::utils::progress;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

/// 一条待执行的外部命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl LaunchCommand {
    /// 生成启动命令；`cores` 覆盖卡片中的核数
    pub fn for_script(parallel: &ParallelConfig, cores: Option<u32>, script: &str) -> Self {
        let cores = cores.unwrap_or(parallel.cores).max(1);
        let engine = parallel.engine.clone();

        if cores == 1 {
            return LaunchCommand {
                program: engine,
                args: vec!["python".to_string(), script.to_string()],
            };
        }

        match parallel.launcher {
            Launcher::Mpirun => {
                let mut args = Vec::new();
                if parallel.hwthreads {
                    args.push("--use-hwthread-cpus".to_string());
                }
                args.extend([
                    "-n".to_string(),
                    cores.to_string(),
                    engine,
                    "python".to_string(),
                    script.to_string(),
                ]);
                LaunchCommand {
                    program: "mpirun".to_string(),
                    args,
                }
            }
            Launcher::Gpaw => LaunchCommand {
                program: engine,
                args: vec![
                    format!("-P{}", cores),
                    "python".to_string(),
                    script.to_string(),
                ],
            },
        }
    }

    /// 完整命令行，用于日志和 sbatch 脚本
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    /// 在 `workdir` 中运行，标准输出写入 `stdout_log`
    pub fn run(&self, workdir: &Path, stdout_log: &Path) -> Result<()> {
        let spinner = progress::create_spinner(&format!("Running: {}", self.command_line()));

        let result = Command::new(&self.program)
            .args(&self.args)
            .current_dir(workdir)
            .output();

        spinner.finish_and_clear();

        let output = match result {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(GpawFlowError::CommandNotFound {
                    command: self.program.clone(),
                })
            }
            Err(e) => {
                return Err(GpawFlowError::CommandFailed {
                    command: self.command_line(),
                    stderr: e.to_string(),
                })
            }
        };

        fs::write(stdout_log, &output.stdout).map_err(|e| GpawFlowError::write(stdout_log, e))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(GpawFlowError::CommandFailed {
                command: self.command_line(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            })
        }
    }
}
