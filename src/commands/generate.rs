//! # generate 命令实现
//!
//! 校验卡片，写出 `<name>.py` 驱动脚本和 `<name>-0-Initial.POSCAR`。
//!
//! ## 依赖关系
//! - 使用 `cli/generate.rs` 定义的参数
//! - 使用 `config/`, `engine/script.rs`, `parsers/poscar.rs`
//! - 被 `commands/run.rs` 复用

use crate::cli::generate::GenerateArgs;
use crate::commands::{ensure_dir, work_dir, write_text};
use crate::config::{load_deck, DeckConfig};
use crate::engine::script::generate_driver_script;
use crate::engine::StageFiles;
use crate::error::Result;
use crate::parsers::poscar;
use crate::utils::output;

use std::path::Path;

/// 执行 generate 命令
pub fn execute(args: GenerateArgs) -> Result<()> {
    let deck = load_deck(&args.deck)?;

    if args.stdout {
        print!("{}", generate_driver_script(&deck));
        return Ok(());
    }

    let dir = work_dir(&args.deck, args.output_dir.as_deref());
    output::print_header(&format!("Generating '{}'", deck.name));
    let files = write_inputs(&deck, &dir)?;
    print_deck_summary(&deck);
    output::print_written("driver script", &files.driver_script());
    output::print_written("structure", &files.initial_poscar());
    Ok(())
}

/// 写出驱动脚本和初始结构，返回该结构的输出文件集合
pub(crate) fn write_inputs(deck: &DeckConfig, dir: &Path) -> Result<StageFiles> {
    ensure_dir(dir)?;
    let files = StageFiles::new(dir, deck.name.clone());

    write_text(&files.driver_script(), &generate_driver_script(deck))?;
    poscar::write_poscar_file(&deck.crystal(), &files.initial_poscar())?;

    Ok(files)
}

pub(crate) fn print_deck_summary(deck: &DeckConfig) {
    let crystal = deck.crystal();
    let calc = &deck.calculation;

    output::print_kv("Structure", &format!("{} ({} atoms)", crystal.formula(), crystal.atoms.len()));
    if let Some(v) = crystal.volume_per_atom() {
        output::print_kv("Volume / atom", &format!("{:.3} Å³", v));
    }
    output::print_kv("Mode / XC", &format!("{} / {}", calc.mode, calc.xc));
    output::print_kv(
        "k-points",
        &format!("{}x{}x{}", calc.kpts[0], calc.kpts[1], calc.kpts[2]),
    );
    let mut stages = vec!["ground"];
    if deck.relax.enabled {
        stages[0] = "ground+relax";
    }
    if deck.dos.enabled {
        stages.push("dos");
    }
    if deck.band.enabled {
        stages.push("band");
    }
    if deck.output.density {
        stages.push("density");
    }
    output::print_kv("Stages", &stages.join(", "));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_deck;
    use crate::config::presets::{starter_deck, Preset};
    use std::fs;

    #[test]
    fn test_write_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let deck = parse_deck(&starter_deck(Preset::Graphene, "graphene"), "x").unwrap();

        let files = write_inputs(&deck, &dir.path().join("run")).unwrap();

        let script = fs::read_to_string(files.driver_script()).unwrap();
        assert!(script.contains("graphene-1-Result-Ground.gpw"));
        let initial = poscar::parse_poscar_file(&files.initial_poscar()).unwrap();
        assert_eq!(initial.atoms.len(), 8);
    }

    #[test]
    fn test_execute_next_to_deck() {
        let dir = tempfile::tempdir().unwrap();
        let deck_path = dir.path().join("Si.toml");
        fs::write(&deck_path, starter_deck(Preset::Silicon, "Si")).unwrap();

        execute(GenerateArgs {
            deck: deck_path,
            output_dir: None,
            stdout: false,
        })
        .unwrap();
        assert!(dir.path().join("Si.py").exists());
        assert!(dir.path().join("Si-0-Initial.POSCAR").exists());
    }
}
