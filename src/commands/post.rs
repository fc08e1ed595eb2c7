//! # post 命令实现
//!
//! 引擎结束后的本地后处理：
//! - 能带块格式 -> 列格式 (`<name>-3-Result-Band-withColumns.dat`)
//! - 弛豫结构 -> CIF (`<name>-4-FinalBulk.cif`)
//! - DOS / 能带图（`draw-graphs` 或 `--graphs`）
//!
//! 缺失的输出文件只提示跳过，不视为错误。
//!
//! ## 依赖关系
//! - 使用 `cli/post.rs` 定义的参数
//! - 使用 `parsers/`, `export/`, `engine/files.rs`
//! - 被 `commands/run.rs` 复用

use crate::cli::post::PostArgs;
use crate::commands::{work_dir, write_text};
use crate::config::{load_deck, DeckConfig};
use crate::engine::files::BAND_LOG;
use crate::engine::StageFiles;
use crate::error::Result;
use crate::export::{cif, plot};
use crate::models::{BandBlocks, BandCharacter};
use crate::parsers::{band, dos, gpaw_log, poscar};
use crate::utils::output;

/// 执行 post 命令
pub fn execute(args: PostArgs) -> Result<()> {
    let deck = load_deck(&args.deck)?;
    let dir = work_dir(&args.deck, args.dir.as_deref());
    let files = StageFiles::new(dir, deck.name.clone());

    output::print_header(&format!("Post-processing '{}'", deck.name));
    post_process(&deck, &files, args.graphs)
}

/// 对一次运行的输出做后处理
pub(crate) fn post_process(deck: &DeckConfig, files: &StageFiles, force_graphs: bool) -> Result<()> {
    let bands = reshape_bands(deck, files)?;

    if deck.output.cif_export {
        export_cif(deck, files)?;
    }

    if deck.output.draw_graphs || force_graphs {
        draw_graphs(deck, files, bands.as_ref())?;
    }

    output::print_done(&format!("Post-processing of '{}' finished", deck.name));
    Ok(())
}

fn reshape_bands(deck: &DeckConfig, files: &StageFiles) -> Result<Option<BandBlocks>> {
    let band_dat = files.band_dat();
    if !band_dat.exists() {
        output::print_skip(&format!("No band file: {}", band_dat.display()));
        return Ok(None);
    }

    // 能带数以能带阶段日志为准，k 点数来自卡片
    let band_log = files.file(BAND_LOG);
    let expected = if band_log.exists() {
        gpaw_log::parse_gpaw_log(&band_log)?
            .bands
            .map(|b| (b, deck.band.npoints as usize))
    } else {
        None
    };

    let bands = band::read_blocks_file(&band_dat, expected)?;
    let columns = files.band_columns();
    write_text(&columns, &band::to_columns_string(&bands))?;
    output::print_conversion(&band_dat, &columns);
    output::print_kv(
        "Bands x k-points",
        &format!("{} x {}", bands.band_count(), bands.kpoint_count()),
    );

    match band::classify_bands(&bands)? {
        BandCharacter::Gapped(gap) => output::print_kv(
            "Band gap",
            &format!(
                "{:.3} eV ({})",
                gap.value,
                if gap.is_direct { "direct" } else { "indirect" }
            ),
        ),
        BandCharacter::Metallic => output::print_kv("Band gap", "none (metallic)"),
        BandCharacter::Undetermined => output::print_kv("Band gap", "undetermined"),
    }

    Ok(Some(bands))
}

fn export_cif(deck: &DeckConfig, files: &StageFiles) -> Result<()> {
    let relaxed = files.relaxed_poscar();
    let crystal = if relaxed.exists() {
        let mut crystal = poscar::parse_poscar_file(&relaxed)?;
        crystal.name = deck.name.clone();
        crystal
    } else {
        if deck.relax.enabled {
            output::print_warning(&format!(
                "No relaxed structure at {}, exporting the deck structure",
                relaxed.display()
            ));
        }
        deck.crystal()
    };

    let target = files.final_cif();
    cif::write_cif_file(&crystal, &target)?;
    output::print_written("CIF", &target);
    Ok(())
}

fn draw_graphs(deck: &DeckConfig, files: &StageFiles, bands: Option<&BandBlocks>) -> Result<()> {
    let format = deck.output.plot_format;

    let dos_txt = files.dos_txt();
    if dos_txt.exists() {
        let curve = dos::read_dos_file(&dos_txt)?;
        output::print_kv("DOS integral", &format!("{:.3}", curve.integrate()));
        let target = files.dos_graph(format);
        plot::plot_dos(&curve, &target, &format!("{} DOS", deck.name), format)?;
        output::print_written("DOS graph", &target);
    } else {
        output::print_skip(&format!("No DOS file: {}", dos_txt.display()));
    }

    if let Some(bands) = bands {
        let target = files.band_graph(format);
        plot::plot_bands(
            bands,
            deck.band.energy_max,
            &target,
            &format!("{} band structure ({})", deck.name, deck.band.path),
            format,
        )?;
        output::print_written("band graph", &target);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_deck;
    use crate::config::presets::{starter_deck, Preset};
    use std::fs;

    fn silicon() -> DeckConfig {
        parse_deck(&starter_deck(Preset::Silicon, "Si"), "Si").unwrap()
    }

    #[test]
    fn test_post_with_band_file_and_relaxed_structure() {
        let dir = tempfile::tempdir().unwrap();
        let deck = silicon();
        let files = StageFiles::new(dir.path(), "Si");

        fs::write(files.band_dat(), "0 -1.0\n1 -0.5\n\n0 1.0\n1 0.7\n\n").unwrap();
        poscar::write_poscar_file(&deck.crystal(), &files.relaxed_poscar()).unwrap();

        post_process(&deck, &files, false).unwrap();

        assert_eq!(
            fs::read_to_string(files.band_columns()).unwrap(),
            "0 -1.0 1.0\n1 -0.5 0.7\n"
        );
        let cif_text = fs::read_to_string(files.final_cif()).unwrap();
        assert!(cif_text.starts_with("data_Si\n"));
    }

    #[test]
    fn test_band_count_checked_against_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut deck = silicon();
        deck.band.npoints = 2;
        let files = StageFiles::new(dir.path(), "Si");

        fs::write(files.band_dat(), "0 -1.0\n1 -0.5\n\n").unwrap();
        fs::write(files.file(BAND_LOG), "Number of bands in calculation: 2\n").unwrap();

        assert!(post_process(&deck, &files, false).is_err());
        assert!(!files.band_columns().exists());
    }

    #[test]
    fn test_missing_outputs_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut deck = silicon();
        deck.output.cif_export = false;
        let files = StageFiles::new(dir.path(), "Si");

        post_process(&deck, &files, false).unwrap();
        assert!(!files.band_columns().exists());
    }
}
