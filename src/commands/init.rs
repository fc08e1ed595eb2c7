//! # init 命令实现
//!
//! 写出带注释的起始卡片，默认拒绝覆盖已有文件。
//!
//! ## 依赖关系
//! - 使用 `cli/init.rs` 定义的参数
//! - 使用 `config/presets.rs`

use crate::cli::init::InitArgs;
use crate::commands::write_text;
use crate::config::{parse_deck, presets};
use crate::error::{GpawFlowError, Result};
use crate::utils::output;

/// 执行 init 命令
pub fn execute(args: InitArgs) -> Result<()> {
    if args.deck.exists() && !args.overwrite {
        return Err(GpawFlowError::AlreadyExists {
            path: args.deck.display().to_string(),
        });
    }

    let name = match args.name {
        Some(name) => name,
        None => args
            .deck
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                GpawFlowError::InvalidArgument(format!(
                    "cannot derive a structure name from '{}', use --name",
                    args.deck.display()
                ))
            })?,
    };

    let text = presets::starter_deck(args.preset.into(), &name);

    // 模板本身必须能通过校验
    parse_deck(&text, &name).map_err(|reason| GpawFlowError::ConfigError {
        path: args.deck.display().to_string(),
        reason,
    })?;

    if let Some(parent) = args.deck.parent() {
        if !parent.as_os_str().is_empty() {
            crate::commands::ensure_dir(parent)?;
        }
    }
    write_text(&args.deck, &text)?;

    output::print_written("deck", &args.deck);
    output::print_info(&format!(
        "Next: gpawflow run {}",
        args.deck.display()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::init::PresetArg;
    use crate::config::load_deck;

    fn init_args(deck: std::path::PathBuf, overwrite: bool) -> InitArgs {
        InitArgs {
            deck,
            preset: PresetArg::Silicon,
            name: None,
            overwrite,
        }
    }

    #[test]
    fn test_init_writes_loadable_deck() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decks").join("Si.toml");

        execute(init_args(path.clone(), false)).unwrap();
        let deck = load_deck(&path).unwrap();
        assert_eq!(deck.name, "Si");
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Si.toml");
        std::fs::write(&path, "keep me").unwrap();

        let err = execute(init_args(path.clone(), false)).unwrap_err();
        assert!(matches!(err, GpawFlowError::AlreadyExists { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");

        execute(init_args(path.clone(), true)).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("[structure]"));
    }
}
