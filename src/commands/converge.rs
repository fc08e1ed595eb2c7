//! # converge 命令实现
//!
//! 生成并运行收敛扫描脚本，然后分析扫描表：
//! 每原子能量差相对最后一行在容差内的第一行视为收敛，晶格扫描另报告能量最低点。
//!
//! ## 依赖关系
//! - 使用 `cli/converge.rs` 定义的参数
//! - 使用 `engine/scan.rs`, `engine/script.rs`, `parsers/table.rs`, `export/plot.rs`

use crate::cli::converge::ConvergeArgs;
use crate::commands::{ensure_dir, work_dir, write_text};
use crate::config::{load_deck, DeckConfig};
use crate::engine::script::generate_scan_script;
use crate::engine::{analyze_table, LaunchCommand, ScanPlan, ScanSummary, StageFiles};
use crate::error::Result;
use crate::export::plot;
use crate::models::ScanParameter;
use crate::parsers::table;
use crate::utils::output;

use tabled::{Table, Tabled};

/// 扫描表的一行
#[derive(Debug, Clone, Tabled)]
struct ScanTableRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Energy (eV)")]
    energy: String,
    #[tabled(rename = "ΔE (eV/atom)")]
    delta: String,
    #[tabled(rename = "")]
    mark: String,
}

/// 执行 converge 命令
pub fn execute(args: ConvergeArgs) -> Result<()> {
    let deck = load_deck(&args.deck)?;
    let dir = work_dir(&args.deck, args.output_dir.as_deref());
    let files = StageFiles::new(&dir, deck.name.clone());
    let parameter: ScanParameter = args.parameter.into();

    output::print_header(&format!("{} convergence scan of '{}'", parameter, deck.name));

    if !args.analyze_only {
        let plan = ScanPlan::new(parameter, args.min, args.max, args.step, &deck)?;
        ensure_dir(&dir)?;

        let script_path = files.scan_script(parameter);
        write_text(&script_path, &generate_scan_script(&deck, &plan))?;
        output::print_written("scan script", &script_path);
        output::print_kv("Points", &plan.values().len().to_string());

        let script_name = script_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let command = LaunchCommand::for_script(&deck.parallel, args.cores, &script_name);

        if args.dry_run {
            output::print_info(&format!("[DRY] {}", command.command_line()));
            return Ok(());
        }

        output::print_info(&format!("Launching: {}", command.command_line()));
        command.run(&dir, &files.scan_stdout(parameter))?;
    }

    let table_path = files.scan_table(parameter);
    let table = table::read_table_file(&table_path, parameter)?;
    let summary = analyze_table(&table, deck.structure.atoms.len(), args.tolerance);

    report(&summary, parameter, args.tolerance);

    if deck.output.draw_graphs && !summary.rows.is_empty() {
        draw(&deck, &files, parameter, &summary)?;
    }
    Ok(())
}

fn report(summary: &ScanSummary, parameter: ScanParameter, tolerance: f64) {
    if summary.rows.is_empty() {
        output::print_warning("Scan table has no data rows");
        return;
    }

    let rows: Vec<ScanTableRow> = summary
        .rows
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let mut mark = String::new();
            if summary.converged == Some(i) {
                mark.push_str("converged");
            }
            if parameter == ScanParameter::Lattice && summary.minimum == Some(i) {
                if !mark.is_empty() {
                    mark.push_str(", ");
                }
                mark.push_str("minimum");
            }
            ScanTableRow {
                index: i + 1,
                value: r.label.clone(),
                energy: format!("{:.6}", r.energy),
                delta: format!("{:+.6}", r.delta_per_atom),
                mark,
            }
        })
        .collect();

    println!("{}", Table::new(&rows));

    match summary.converged {
        // 只有最后一行自身满足容差时，说明扫描范围还不够
        Some(i) if i + 1 < summary.rows.len() => output::print_success(&format!(
            "Converged within {} eV/atom from {} = {}",
            tolerance, parameter, summary.rows[i].label
        )),
        _ => output::print_warning(&format!(
            "Not converged within {} eV/atom, extend the {} range",
            tolerance, parameter
        )),
    }

    if parameter == ScanParameter::Lattice {
        if let Some(i) = summary.minimum {
            output::print_kv("Lowest energy scale", &summary.rows[i].label);
        }
    }
}

fn draw(deck: &DeckConfig, files: &StageFiles, parameter: ScanParameter, summary: &ScanSummary) -> Result<()> {
    let format = deck.output.plot_format;
    let target = files.scan_graph(parameter, format);
    plot::plot_convergence(
        summary,
        parameter.column_header(),
        &target,
        &format!("{} {} convergence", deck.name, parameter),
        format,
    )?;
    output::print_written("scan graph", &target);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::converge::ScanArg;
    use crate::config::presets::{starter_deck, Preset};
    use std::fs;
    use std::path::{Path, PathBuf};

    fn args(deck: PathBuf, parameter: ScanArg) -> ConvergeArgs {
        ConvergeArgs {
            deck,
            parameter,
            min: 200.0,
            max: 400.0,
            step: 50.0,
            tolerance: 0.001,
            output_dir: None,
            cores: None,
            dry_run: true,
            analyze_only: false,
        }
    }

    fn write_deck(dir: &Path) -> PathBuf {
        let path = dir.join("Si.toml");
        fs::write(&path, starter_deck(Preset::Silicon, "Si")).unwrap();
        path
    }

    #[test]
    fn test_dry_run_writes_scan_script() {
        let dir = tempfile::tempdir().unwrap();
        execute(args(write_deck(dir.path()), ScanArg::Cutoff)).unwrap();

        let script = fs::read_to_string(dir.path().join("Si-0-Optimize-cutoff.py")).unwrap();
        assert!(script.contains("Si-0-Table-CutOff.txt"));
    }

    #[test]
    fn test_analyze_existing_table() {
        let dir = tempfile::tempdir().unwrap();
        let deck = write_deck(dir.path());
        fs::write(
            dir.path().join("Si-0-Table-CutOff.txt"),
            "Cut-off_Energy  Total_Energy\n200.0  -10.60\n300.0  -10.8025\n400.0  -10.8035\n",
        )
        .unwrap();

        let mut a = args(deck, ScanArg::Cutoff);
        a.dry_run = false;
        a.analyze_only = true;
        execute(a).unwrap();
    }

    #[test]
    fn test_analyze_without_table_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = args(write_deck(dir.path()), ScanArg::Kpoints);
        a.dry_run = false;
        a.analyze_only = true;
        assert!(execute(a).is_err());
    }
}
