//! # Slurm 脚本生成工具
//!
//! 为引擎运行生成 sbatch 提交脚本。
//!
//! ## 依赖关系
//! - 被 `commands/run.rs` 使用
//! - 无外部模块依赖

use std::path::Path;

/// Slurm 作业配置
#[derive(Debug, Clone)]
pub struct SlurmConfig {
    pub job_name: String,
    pub partition: String,
    pub constraint: Option<String>,
    pub nodes: u32,
    pub ntasks: u32,
    pub cpus_per_task: u32,
    pub mem_per_cpu: String,
    pub time_limit: String,
    pub modules: Vec<String>,
}

impl Default for SlurmConfig {
    fn default() -> Self {
        SlurmConfig {
            job_name: "gpaw".to_string(),
            partition: "cpu".to_string(),
            constraint: None,
            nodes: 1,
            ntasks: 4,
            cpus_per_task: 1,
            mem_per_cpu: "2G".to_string(),
            time_limit: "24:00:00".to_string(),
            modules: vec![],
        }
    }
}

/// 解析逗号分隔的模块列表
pub fn parse_module_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// 生成 sbatch 脚本内容
///
/// `exec_cmd` 为引擎启动命令，`post_cmd` 为运行结束后的后处理命令。
pub fn generate_sbatch_script(
    config: &SlurmConfig,
    workdir: &Path,
    exec_cmd: &str,
    post_cmd: Option<&str>,
) -> String {
    let mut script = String::from("#!/bin/bash\n");

    if let Some(constraint) = &config.constraint {
        script.push_str(&format!("#SBATCH --constraint \"{}\"\n", constraint));
    }
    script.push_str(&format!("#SBATCH --partition {}\n", config.partition));
    script.push_str(&format!("#SBATCH --nodes={}\n", config.nodes));
    script.push_str(&format!("#SBATCH --mem-per-cpu {}\n", config.mem_per_cpu));
    script.push_str(&format!("#SBATCH --time {}\n", config.time_limit));
    script.push_str(&format!("#SBATCH -c {}\n", config.cpus_per_task));
    script.push_str(&format!("#SBATCH -n {}\n", config.ntasks));
    script.push_str(&format!("#SBATCH -J {}\n", config.job_name));
    script.push_str("#SBATCH -o slurm_logs/%x.out\n");
    script.push_str("#SBATCH -e slurm_logs/%x.err\n\n");

    script.push_str("set -euo pipefail\n\n");

    if !config.modules.is_empty() {
        script.push_str("module purge 2>&1\n");
        for m in &config.modules {
            script.push_str(&format!("module load {}\n", m));
        }
        script.push('\n');
    }

    script.push_str(&format!("cd \"{}\"\n", workdir.display()));
    script.push_str("echo \"PWD=$(pwd)\"\n");
    script.push_str(&format!("echo \"Running: {}\"\n", exec_cmd));
    script.push_str(&format!("{}\n", exec_cmd));

    if let Some(post) = post_cmd {
        script.push_str(&format!("\n{}\n", post));
    }

    script.push_str("\necho \"Timings:\"\n");
    script.push_str("sacct -o JobID,Submit,Start,End,CPUTime,State -j $SLURM_JOBID\n");
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sbatch_script_contents() {
        let config = SlurmConfig {
            job_name: "graphene".to_string(),
            ntasks: 8,
            modules: parse_module_list("gpaw/24.1, openmpi/4.1 ,"),
            ..SlurmConfig::default()
        };
        let script = generate_sbatch_script(
            &config,
            Path::new("/scratch/graphene"),
            "srun gpaw python graphene.py",
            Some("gpawflow post graphene.toml"),
        );

        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("#SBATCH -n 8\n"));
        assert!(script.contains("#SBATCH -J graphene\n"));
        assert!(!script.contains("--constraint"));
        assert!(script.contains("module load gpaw/24.1\nmodule load openmpi/4.1\n"));
        assert!(script.contains("cd \"/scratch/graphene\""));
        assert!(script.contains("srun gpaw python graphene.py\n"));
        assert!(script.contains("gpawflow post graphene.toml"));
    }

    #[test]
    fn test_module_list_parsing() {
        assert!(parse_module_list(" , ").is_empty());
        assert_eq!(parse_module_list("a,b"), vec!["a", "b"]);
    }
}
