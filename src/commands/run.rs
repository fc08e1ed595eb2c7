//! # run 命令实现
//!
//! 生成驱动脚本后：
//! - 本地：启动 GPAW，结束后自动后处理
//! - `--slurm`：写出 `<name>.sbatch`，可选 `--submit` 交给 sbatch
//!
//! ## 依赖关系
//! - 使用 `cli/run.rs` 定义的参数
//! - 使用 `engine/launcher.rs`, `utils/slurm.rs`
//! - 复用 `commands/generate.rs`, `commands/post.rs`

use crate::cli::run::RunArgs;
use crate::commands::{ensure_dir, generate, post, work_dir, write_text};
use crate::config::{load_deck, DeckConfig};
use crate::engine::{LaunchCommand, StageFiles};
use crate::error::{GpawFlowError, Result};
use crate::utils::output;
use crate::utils::slurm::{generate_sbatch_script, parse_module_list, SlurmConfig};

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 执行 run 命令
pub fn execute(args: RunArgs) -> Result<()> {
    let deck = load_deck(&args.deck)?;
    let dir = work_dir(&args.deck, args.output_dir.as_deref());

    output::print_header(&format!("Running '{}'", deck.name));
    let files = generate::write_inputs(&deck, &dir)?;
    generate::print_deck_summary(&deck);
    output::print_written("driver script", &files.driver_script());

    let script_name = format!("{}.py", deck.name);
    let command = LaunchCommand::for_script(&deck.parallel, args.cores, &script_name);

    if args.slurm {
        return slurm_job(&args, &deck, &files, &command);
    }

    if args.dry_run {
        output::print_info(&format!("[DRY] {}", command.command_line()));
        return Ok(());
    }

    output::print_info(&format!("Launching: {}", command.command_line()));
    command.run(files.dir(), &files.run_stdout())?;
    output::print_success(&format!(
        "GPAW finished, stdout in {}",
        files.run_stdout().display()
    ));

    if args.no_post {
        return Ok(());
    }
    post::post_process(&deck, &files, false)
}

fn slurm_job(args: &RunArgs, deck: &DeckConfig, files: &StageFiles, command: &LaunchCommand) -> Result<()> {
    let config = SlurmConfig {
        job_name: deck.name.clone(),
        partition: args.partition.clone(),
        constraint: args.constraint.clone(),
        nodes: args.nodes,
        ntasks: args.cores.unwrap_or(deck.parallel.cores).max(1),
        cpus_per_task: 1,
        mem_per_cpu: args.mem_per_cpu.clone(),
        time_limit: args.time.clone(),
        modules: parse_module_list(&args.modules),
    };

    let post_cmd = if args.no_post {
        None
    } else {
        Some(format!("gpawflow post \"{}\"", absolute(&args.deck).display()))
    };

    let workdir = absolute(files.dir());
    let script = generate_sbatch_script(&config, &workdir, &command.command_line(), post_cmd.as_deref());
    let sbatch_path = files.sbatch_script();
    write_text(&sbatch_path, &script)?;
    ensure_dir(&files.dir().join("slurm_logs"))?;
    output::print_written("sbatch script", &sbatch_path);

    if !args.submit || args.dry_run {
        output::print_info(&format!("[DRY] sbatch {}", sbatch_path.display()));
        return Ok(());
    }

    let result = Command::new("sbatch")
        .arg(&sbatch_path)
        .current_dir(files.dir())
        .output();

    match result {
        Ok(out) if out.status.success() => {
            output::print_success(&format!(
                "Submitted: {}",
                String::from_utf8_lossy(&out.stdout).trim()
            ));
            Ok(())
        }
        Ok(out) => Err(GpawFlowError::CommandFailed {
            command: format!("sbatch {}", sbatch_path.display()),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(GpawFlowError::CommandNotFound {
            command: "sbatch".to_string(),
        }),
        Err(e) => Err(GpawFlowError::CommandFailed {
            command: "sbatch".to_string(),
            stderr: e.to_string(),
        }),
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
