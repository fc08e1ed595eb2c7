//! # cif 命令实现
//!
//! 卡片 (.toml) 导出初始结构，POSCAR 导出弛豫后的结构。
//!
//! ## 依赖关系
//! - 使用 `cli/cif.rs` 定义的参数
//! - 使用 `parsers/mod.rs`, `export/cif.rs`

use crate::cli::cif::CifArgs;
use crate::engine::files::FINAL_CIF;
use crate::error::{GpawFlowError, Result};
use crate::export::cif;
use crate::parsers;
use crate::utils::output;

use std::path::{Path, PathBuf};

/// 执行 cif 命令
pub fn execute(args: CifArgs) -> Result<()> {
    if !args.input.exists() {
        return Err(GpawFlowError::FileNotFound {
            path: args.input.display().to_string(),
        });
    }

    let crystal = parsers::read_structure_file(&args.input)?;

    let is_deck = crystal.source_format.as_deref() == Some("deck");
    let target = args
        .output
        .unwrap_or_else(|| default_target(&args.input, &crystal.name, is_deck));
    cif::write_cif_file(&crystal, &target)?;

    output::print_conversion(&args.input, &target);
    output::print_kv(
        "Formula",
        &format!("{} ({} atoms)", crystal.formula(), crystal.atoms.len()),
    );
    Ok(())
}

/// `<name>-4-FinalBulk.cif`：卡片取结构名，弛豫 POSCAR 去掉阶段后缀
fn default_target(input: &Path, name: &str, is_deck: bool) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or(name);

    let base = if is_deck {
        name
    } else {
        stem.strip_suffix("-1-Result-Ground").unwrap_or(stem)
    };
    input.with_file_name(format!("{}-{}", base, FINAL_CIF))
}
