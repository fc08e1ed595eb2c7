//! # analyze 命令实现
//!
//! 汇总一个或多个运行目录的结果：总能量、费米能级、能带数、带隙、DOS 范围。
//! 终端输出 `tabled` 表格，可选写出 CSV。
//!
//! ## 依赖关系
//! - 使用 `cli/analyze.rs` 定义的参数
//! - 使用 `parsers/gpaw_log.rs`, `parsers/band.rs`, `parsers/dos.rs`

use crate::cli::analyze::AnalyzeArgs;
use crate::commands::work_dir;
use crate::config::load_deck;
use crate::engine::StageFiles;
use crate::error::{GpawFlowError, Result};
use crate::models::BandCharacter;
use crate::parsers::{band, dos, gpaw_log};
use crate::utils::output;

use std::path::Path;
use tabled::{Table, Tabled};

/// 单个结构的结果汇总
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub name: String,
    pub finished: bool,
    pub energy: Option<f64>,
    pub fermi_level: Option<f64>,
    pub bands: Option<usize>,
    pub gap: Option<BandCharacter>,
    pub dos_range: Option<(f64, f64)>,
}

impl RunSummary {
    fn gap_text(&self) -> String {
        match &self.gap {
            Some(BandCharacter::Gapped(g)) => format!(
                "{:.3} ({})",
                g.value,
                if g.is_direct { "direct" } else { "indirect" }
            ),
            Some(BandCharacter::Metallic) => "metal".to_string(),
            Some(BandCharacter::Undetermined) => "?".to_string(),
            None => "-".to_string(),
        }
    }
}

/// 表格行
#[derive(Debug, Clone, Tabled)]
struct SummaryRow {
    #[tabled(rename = "Structure")]
    name: String,
    #[tabled(rename = "Done")]
    finished: String,
    #[tabled(rename = "Energy (eV)")]
    energy: String,
    #[tabled(rename = "E_F (eV)")]
    fermi: String,
    #[tabled(rename = "Bands")]
    bands: String,
    #[tabled(rename = "Gap (eV)")]
    gap: String,
    #[tabled(rename = "DOS window (eV)")]
    dos: String,
}

fn opt<T, F: Fn(&T) -> String>(value: &Option<T>, f: F) -> String {
    value.as_ref().map(f).unwrap_or_else(|| "-".to_string())
}

impl From<&RunSummary> for SummaryRow {
    fn from(s: &RunSummary) -> Self {
        SummaryRow {
            name: s.name.clone(),
            finished: if s.finished { "yes" } else { "no" }.to_string(),
            energy: opt(&s.energy, |e| format!("{:.6}", e)),
            fermi: opt(&s.fermi_level, |e| format!("{:.4}", e)),
            bands: opt(&s.bands, |b| b.to_string()),
            gap: s.gap_text(),
            dos: opt(&s.dos_range, |(lo, hi)| format!("{:.2} .. {:.2}", lo, hi)),
        }
    }
}

/// 执行 analyze 命令
pub fn execute(args: AnalyzeArgs) -> Result<()> {
    output::print_header("Run Summary");

    let mut summaries = Vec::new();
    for deck_path in &args.decks {
        let deck = load_deck(deck_path)?;
        let dir = work_dir(deck_path, args.dir.as_deref());
        let files = StageFiles::new(dir, deck.name.clone());
        summaries.push(summarize(&files)?);
    }

    let rows: Vec<SummaryRow> = summaries.iter().map(SummaryRow::from).collect();
    println!("{}", Table::new(&rows));

    let unfinished = summaries.iter().filter(|s| !s.finished).count();
    if unfinished > 0 {
        output::print_warning(&format!("{} run(s) have no finished ground-state log", unfinished));
    }

    if let Some(csv_path) = &args.csv {
        save_summary_csv(&summaries, csv_path)?;
        output::print_written("CSV", csv_path);
    }
    Ok(())
}

/// 汇总一个结构的输出文件；缺失的文件对应字段为空
pub fn summarize(files: &StageFiles) -> Result<RunSummary> {
    let mut summary = RunSummary {
        name: files.name().to_string(),
        ..RunSummary::default()
    };

    let log = files.ground_log();
    if log.exists() {
        let parsed = gpaw_log::parse_gpaw_log(&log)?;
        summary.finished = parsed.is_finished;
        summary.energy = parsed.energy.or(parsed.free_energy);
        summary.fermi_level = parsed.fermi_level;
        summary.bands = parsed.bands;
    }

    let band_dat = files.band_dat();
    if band_dat.exists() {
        let bands = band::read_blocks_file(&band_dat, None)?;
        summary.gap = Some(band::classify_bands(&bands)?);
    }

    let dos_txt = files.dos_txt();
    if dos_txt.exists() {
        summary.dos_range = dos::read_dos_file(&dos_txt)?.energy_range();
    }

    Ok(summary)
}

/// 保存汇总到 CSV
fn save_summary_csv(summaries: &[RunSummary], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record([
        "structure",
        "finished",
        "energy_eV",
        "fermi_level_eV",
        "bands",
        "gap_eV",
        "gap_direct",
        "dos_min_eV",
        "dos_max_eV",
    ])?;

    let num = |v: Option<f64>| v.map(|x| format!("{:.10}", x)).unwrap_or_default();

    for s in summaries {
        let (gap, direct) = match &s.gap {
            Some(BandCharacter::Gapped(g)) => (Some(g.value), g.is_direct.to_string()),
            Some(BandCharacter::Metallic) => (Some(0.0), String::new()),
            _ => (None, String::new()),
        };
        wtr.write_record([
            s.name.clone(),
            s.finished.to_string(),
            num(s.energy),
            num(s.fermi_level),
            s.bands.map(|b| b.to_string()).unwrap_or_default(),
            num(gap),
            direct,
            num(s.dos_range.map(|r| r.0)),
            num(s.dos_range.map(|r| r.1)),
        ])?;
    }

    wtr.flush().map_err(|e| GpawFlowError::write(output_path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::presets::{starter_deck, Preset};
    use std::fs;

    #[test]
    fn test_summarize_full_run() {
        let dir = tempfile::tempdir().unwrap();
        let files = StageFiles::new(dir.path(), "Si");
        fs::write(
            files.ground_log(),
            "Number of bands in calculation: 8\nExtrapolated:  -10.8\nFermi level: 5.6\nTotal:  12.0 100.0%\n",
        )
        .unwrap();
        fs::write(files.band_dat(), "0 -1.0\n1 -0.4\n\n0 0.2\n1 0.8\n\n").unwrap();
        fs::write(files.dos_txt(), "-15.0, 0.0\n10.0, 0.1\n").unwrap();

        let s = summarize(&files).unwrap();
        assert!(s.finished);
        assert_eq!(s.energy, Some(-10.8));
        assert_eq!(s.fermi_level, Some(5.6));
        assert_eq!(s.bands, Some(8));
        assert_eq!(s.dos_range, Some((-15.0, 10.0)));
        assert_eq!(s.gap_text(), "0.600 (indirect)");
    }

    #[test]
    fn test_summarize_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let s = summarize(&StageFiles::new(dir.path(), "Si")).unwrap();
        assert!(!s.finished);
        assert_eq!(SummaryRow::from(&s).energy, "-");
    }

    #[test]
    fn test_execute_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let deck = dir.path().join("Si.toml");
        fs::write(&deck, starter_deck(Preset::Silicon, "Si")).unwrap();
        let csv_path = dir.path().join("summary.csv");

        execute(AnalyzeArgs {
            decks: vec![deck],
            dir: None,
            csv: Some(csv_path.clone()),
        })
        .unwrap();

        let text = fs::read_to_string(&csv_path).unwrap();
        assert!(text.starts_with("structure,finished,energy_eV"));
        assert!(text.contains("\nSi,false,"));
    }
}
