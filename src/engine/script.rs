//! # 引擎驱动脚本生成
//!
//! 根据输入卡片生成由 `gpaw python` 执行的驱动脚本。脚本按固定顺序执行：
//! 基态（可选弛豫）→ DOS → 能带 → 全电子密度，并把弛豫后的结构写成 POSCAR
//! 交还给本工具做 CIF 导出。
//!
//! 只做字符串生成，不做任何 I/O。
//!
//! ## 依赖关系
//! - 被 `commands/generate.rs`, `commands/run.rs`, `commands/converge.rs` 使用
//! - 使用 `config/`, `engine/files.rs`, `engine/scan.rs`

use crate::config::{CalcMode, DeckConfig, Minimizer};
use crate::engine::files::{self, StageFiles};
use crate::engine::scan::{ScanPlan, ScanValues};

// ─────────────────────────────────────────────────────────────
// Python 字面量
// ─────────────────────────────────────────────────────────────

/// Python 浮点字面量（`{:?}` 总是带小数点或指数）
pub fn py_float(x: f64) -> String {
    format!("{:?}", x)
}

pub fn py_bool(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

/// 单引号 Python 字符串字面量
pub fn py_str(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

fn py_vec3(v: [f64; 3]) -> String {
    format!("({}, {}, {})", py_float(v[0]), py_float(v[1]), py_float(v[2]))
}

fn py_list<T, F>(items: &[T], f: F) -> String
where
    F: Fn(&T) -> String,
{
    let parts: Vec<String> = items.iter().map(f).collect();
    format!("[{}]", parts.join(", "))
}

// ─────────────────────────────────────────────────────────────
// 主驱动脚本
// ─────────────────────────────────────────────────────────────

/// 生成完整计算的驱动脚本
pub fn generate_driver_script(deck: &DeckConfig) -> String {
    let files = StageFiles::new(".", deck.name.clone());
    let mut out = String::new();

    write_header(&mut out, deck, "electronic structure workflow");
    write_imports(&mut out, deck);
    write_structure(&mut out, deck);
    write_ground_state(&mut out, deck, &files);

    if deck.dos.enabled {
        write_dos_stage(&mut out, deck, &files);
    }
    if deck.band.enabled {
        write_band_stage(&mut out, deck, &files);
    }
    if deck.output.density {
        write_density_stage(&mut out, deck, &files);
    }

    out.push_str("parprint('gpawflow: all stages finished')\n");
    out
}

fn write_header(out: &mut String, deck: &DeckConfig, purpose: &str) {
    out.push_str(&format!(
        "# {} - {} generated by gpawflow\n",
        deck.name, purpose
    ));
    out.push_str("# Regenerate from the deck instead of editing this file.\n");
    out.push_str(&format!(
        "# mode={} xc={} cutoff={} eV kpts={:?}\n\n",
        deck.calculation.mode,
        deck.calculation.xc,
        deck.calculation.cutoff_energy,
        deck.calculation.kpts
    ));
}

fn write_imports(out: &mut String, deck: &DeckConfig) {
    out.push_str("import numpy as np\n");
    out.push_str("from ase import Atoms\n");
    out.push_str("from ase.io import write\n");
    out.push_str("from ase.parallel import paropen, parprint\n");
    out.push_str("from gpaw import GPAW, PW\n");

    if deck.relax.enabled {
        match deck.relax.minimizer {
            Minimizer::Lbfgs => out.push_str("from ase.optimize.lbfgs import LBFGS\n"),
            Minimizer::Fire => out.push_str("from ase.optimize.fire import FIRE\n"),
        }
        if deck.relax.strain_mask.iter().any(|&m| m) {
            out.push_str("try:\n");
            out.push_str("    from ase.filters import UnitCellFilter\n");
            out.push_str("except ImportError:\n");
            out.push_str("    from ase.constraints import UnitCellFilter\n");
        }
        if deck.relax.fix_symmetry {
            out.push_str("from ase.constraints import FixSymmetry\n");
        }
    }
    if deck.dos.enabled {
        out.push_str("from ase.dft.dos import DOS\n");
    }
    if deck.output.density {
        out.push_str("from ase.units import Bohr\n");
    }
    out.push('\n');
}

fn write_structure(out: &mut String, deck: &DeckConfig) {
    let s = &deck.structure;

    out.push_str("# -------------------------------------------------------------\n");
    out.push_str("# Bulk configuration\n");
    out.push_str("# -------------------------------------------------------------\n");
    out.push_str("atoms = Atoms(\n");
    out.push_str(&format!(
        "    symbols={},\n",
        py_list(&s.atoms, |a| py_str(&a.element))
    ));
    out.push_str("    positions=[\n");
    for site in &s.atoms {
        out.push_str(&format!("        {},\n", py_vec3(site.position)));
    }
    out.push_str("    ],\n");
    out.push_str(&format!(
        "    cell=[{}, {}, {}],\n",
        py_vec3(s.cell[0]),
        py_vec3(s.cell[1]),
        py_vec3(s.cell[2])
    ));
    let pbc = s.pbc.axes();
    out.push_str(&format!(
        "    pbc=[{}, {}, {}],\n",
        py_bool(pbc[0]),
        py_bool(pbc[1]),
        py_bool(pbc[2])
    ));
    out.push_str(")\n");

    if deck.calculation.spin_polarized {
        out.push_str(&format!(
            "atoms.set_initial_magnetic_moments([{}] * len(atoms))\n",
            py_float(deck.calculation.magmom_per_atom)
        ));
    }
    out.push('\n');
}

/// 平面波/LCAO/FD 模式表达式
fn mode_expr(mode: CalcMode, ecut: &str) -> String {
    match mode {
        CalcMode::Pw => format!("PW({})", ecut),
        CalcMode::PwExx => format!("PW({}, force_complex_dtype=True)", ecut),
        CalcMode::Lcao => "'lcao'".to_string(),
        CalcMode::Fd => "'fd'".to_string(),
    }
}

fn xc_expr(deck: &DeckConfig) -> String {
    if deck.calculation.mode == CalcMode::PwExx {
        format!(
            "{{'name': {}, 'backend': 'pw'}}",
            py_str(&deck.calculation.xc)
        )
    } else {
        py_str(&deck.calculation.xc)
    }
}

fn kpts_expr(kpts: [u32; 3], gamma: bool) -> String {
    format!(
        "{{'size': ({}, {}, {}), 'gamma': {}}}",
        kpts[0],
        kpts[1],
        kpts[2],
        py_bool(gamma)
    )
}

/// 基态计算器的关键字参数
///
/// `ecut`、`kpts` 为 Python 表达式，扫描脚本会传入循环变量。
fn calculator_args(deck: &DeckConfig, ecut: &str, kpts: &str, txt: &str) -> Vec<String> {
    let calc = &deck.calculation;
    let mut args = vec![
        format!("mode={}", mode_expr(calc.mode, ecut)),
        format!("xc={}", xc_expr(deck)),
        format!("kpts={}", kpts),
    ];

    if calc.mode == CalcMode::Lcao {
        args.push("basis='dzp'".to_string());
    }
    if let Some(occ) = &calc.occupation {
        args.push(format!(
            "occupations={{'name': {}, 'width': {}}}",
            py_str(&occ.name),
            py_float(occ.width)
        ));
    }
    if let Some(conv) = &calc.convergence {
        let mut items = Vec::new();
        if let Some(e) = conv.energy {
            items.push(format!("'energy': {}", py_float(e)));
        }
        if let Some(e) = conv.eigenstates {
            items.push(format!("'eigenstates': {}", py_float(e)));
        }
        if let Some(d) = conv.density {
            items.push(format!("'density': {}", py_float(d)));
        }
        if !items.is_empty() {
            args.push(format!("convergence={{{}}}", items.join(", ")));
        }
    }
    if !calc.hubbard.is_empty() {
        let setups: Vec<String> = calc
            .hubbard
            .iter()
            .map(|(el, u)| format!("{}: {}", py_str(el), py_str(u)))
            .collect();
        args.push(format!("setups={{{}}}", setups.join(", ")));
    }
    if calc.spin_polarized {
        args.push("spinpol=True".to_string());
    }
    args.push(format!("txt={}", txt));
    args
}

fn push_call(out: &mut String, indent: &str, head: &str, args: &[String]) {
    out.push_str(&format!("{}{}(\n", indent, head));
    for arg in args {
        out.push_str(&format!("{}    {},\n", indent, arg));
    }
    out.push_str(&format!("{})\n", indent));
}

fn write_ground_state(out: &mut String, deck: &DeckConfig, files: &StageFiles) {
    let calc = &deck.calculation;
    let relax = &deck.relax;

    out.push_str("# -------------------------------------------------------------\n");
    out.push_str("# Step 1 - ground state\n");
    out.push_str("# -------------------------------------------------------------\n");

    let args = calculator_args(
        deck,
        &py_float(calc.cutoff_energy),
        &kpts_expr(calc.kpts, calc.gamma),
        &py_str(&files.file_name(files::GROUND_LOG)),
    );
    push_call(out, "", "calc = GPAW", &args);
    out.push_str("atoms.calc = calc\n");

    if relax.enabled {
        if relax.fix_symmetry {
            out.push_str("atoms.set_constraint(FixSymmetry(atoms))\n");
        }

        let target = if relax.strain_mask.iter().any(|&m| m) {
            out.push_str(&format!(
                "target = UnitCellFilter(atoms, mask={})\n",
                py_list(&relax.strain_mask, |&m| py_bool(m).to_string())
            ));
            "target"
        } else {
            "atoms"
        };

        let traj = py_str(&files.file_name(files::GROUND_TRAJ));
        match relax.minimizer {
            Minimizer::Lbfgs => out.push_str(&format!(
                "relax = LBFGS({}, trajectory={}, maxstep={}, alpha={}, damping={})\n",
                target,
                traj,
                py_float(relax.max_step),
                py_float(relax.alpha),
                py_float(relax.damping)
            )),
            Minimizer::Fire => out.push_str(&format!(
                "relax = FIRE({}, trajectory={}, maxstep={})\n",
                target,
                traj,
                py_float(relax.max_step)
            )),
        }
        out.push_str(&format!("relax.run(fmax={})\n", py_float(relax.fmax)));
    }

    out.push_str("energy = atoms.get_potential_energy()\n");
    out.push_str("parprint('Total energy:', energy)\n");
    out.push_str(&format!(
        "calc.write({})\n",
        py_str(&files.file_name(files::GROUND_GPW))
    ));
    out.push_str(&format!(
        "write({}, atoms, format='vasp', direct=True, vasp5=True)\n\n",
        py_str(&files.file_name(files::GROUND_POSCAR))
    ));
}

fn write_dos_stage(out: &mut String, deck: &DeckConfig, files: &StageFiles) {
    out.push_str("# -------------------------------------------------------------\n");
    out.push_str("# Step 2 - density of states\n");
    out.push_str("# -------------------------------------------------------------\n");
    out.push_str(&format!(
        "calc = GPAW({}, txt={})\n",
        py_str(&files.file_name(files::GROUND_GPW)),
        py_str(&files.file_name(files::DOS_LOG))
    ));
    out.push_str(&format!(
        "dos = DOS(calc, npts={}, width={})\n",
        deck.dos.npoints,
        py_float(deck.dos.width)
    ));
    out.push_str("energies = dos.get_energies()\n");
    out.push_str("weights = dos.get_dos()\n");
    out.push_str(&format!(
        "with paropen({}, 'w') as fd:\n",
        py_str(&files.file_name(files::DOS_TXT))
    ));
    out.push_str("    for x in zip(energies, weights):\n");
    out.push_str("        print(*x, sep=', ', file=fd)\n\n");
}

fn write_band_stage(out: &mut String, deck: &DeckConfig, files: &StageFiles) {
    let band = &deck.band;

    out.push_str("# -------------------------------------------------------------\n");
    out.push_str("# Step 3 - band structure\n");
    out.push_str("# -------------------------------------------------------------\n");

    let mut conv = vec![format!("'bands': {}", band.bands)];
    if let Some(e) = band.eigenstates {
        conv.push(format!("'eigenstates': {}", py_float(e)));
    }
    if let Some(d) = band.density {
        conv.push(format!("'density': {}", py_float(d)));
    }

    let args = vec![
        format!("txt={}", py_str(&files.file_name(files::BAND_LOG))),
        "symmetry='off'".to_string(),
        format!(
            "kpts={{'path': {}, 'npoints': {}}}",
            py_str(&band.path),
            band.npoints
        ),
        format!("convergence={{{}}}", conv.join(", ")),
    ];
    push_call(
        out,
        "",
        &format!(
            "calc = GPAW({}).fixed_density",
            py_str(&files.file_name(files::GROUND_GPW))
        ),
        &args,
    );

    out.push_str("calc.get_potential_energy()\n");
    out.push_str("ef = calc.get_fermi_level()\n");
    out.push_str("num_of_bands = calc.get_number_of_bands()\n");
    out.push_str("parprint('Num of bands:' + str(num_of_bands))\n");
    out.push_str(&format!(
        "calc.write({})\n",
        py_str(&files.file_name(files::BAND_GPW))
    ));
    out.push_str("num_of_kpts = len(calc.get_ibz_k_points())\n");
    out.push_str(
        "eps_kn = np.array([calc.get_eigenvalues(kpt=k, spin=0) for k in range(num_of_kpts)]) - ef\n",
    );
    out.push_str(&format!(
        "with paropen({}, 'w') as f:\n",
        py_str(&files.file_name(files::BAND_DAT))
    ));
    out.push_str("    for n in range(num_of_bands):\n");
    out.push_str("        for k in range(num_of_kpts):\n");
    out.push_str("            print(k, eps_kn[k, n], file=f)\n");
    out.push_str("        print(file=f)\n\n");
}

fn write_density_stage(out: &mut String, deck: &DeckConfig, files: &StageFiles) {
    out.push_str("# -------------------------------------------------------------\n");
    out.push_str("# Step 5 - all-electron density\n");
    out.push_str("# -------------------------------------------------------------\n");
    out.push_str(&format!(
        "calc = GPAW({}, txt=None)\n",
        py_str(&files.file_name(files::GROUND_GPW))
    ));
    out.push_str(&format!(
        "density = calc.get_all_electron_density(gridrefinement={})\n",
        deck.output.gridref
    ));
    out.push_str(&format!(
        "write({}, atoms, data=density * Bohr**3)\n\n",
        py_str(&files.file_name(files::DENSITY_CUBE))
    ));
}

// ─────────────────────────────────────────────────────────────
// 收敛扫描脚本
// ─────────────────────────────────────────────────────────────

/// 生成收敛扫描脚本：每个取值做一次单点能计算并追加到扫描表
pub fn generate_scan_script(deck: &DeckConfig, plan: &ScanPlan) -> String {
    let files = StageFiles::new(".", deck.name.clone());
    let calc = &deck.calculation;
    let table = py_str(&files.file_name(plan.parameter().table_suffix()));
    let mut out = String::new();

    write_header(
        &mut out,
        deck,
        &format!("{} convergence scan", plan.parameter()),
    );
    out.push_str("from ase import Atoms\n");
    out.push_str("from ase.parallel import paropen, parprint\n");
    out.push_str("from gpaw import GPAW, PW\n\n");
    write_structure(&mut out, deck);

    out.push_str("cell0 = atoms.get_cell()\n");
    out.push_str(&format!("with paropen({}, 'w') as f:\n", table));
    out.push_str(&format!(
        "    f.write('{}  Total_Energy\\n')\n\n",
        plan.parameter().column_header()
    ));

    let log_prefix = files.file_name(&format!("0-Optimize-{}", plan.parameter()));
    let base_ecut = py_float(calc.cutoff_energy);
    let base_kpts = kpts_expr(calc.kpts, calc.gamma);

    let (loop_head, ecut, kpts) = match plan.values() {
        ScanValues::Cutoff(values) => (
            format!("for value in {}:", py_list(values, |v| py_float(*v))),
            "value".to_string(),
            base_kpts,
        ),
        ScanValues::Kpoints(meshes) => (
            format!(
                "for value in {}:",
                py_list(meshes, |m| format!("({}, {}, {})", m[0], m[1], m[2]))
            ),
            base_ecut,
            format!("{{'size': value, 'gamma': {}}}", py_bool(calc.gamma)),
        ),
        ScanValues::Lattice(scales) => (
            format!("for value in {}:", py_list(scales, |v| py_float(*v))),
            base_ecut,
            base_kpts,
        ),
    };

    out.push_str(&loop_head);
    out.push('\n');
    if matches!(plan.values(), ScanValues::Lattice(_)) {
        out.push_str("    atoms.set_cell(cell0 * value, scale_atoms=True)\n");
    }
    // (5, 5, 1) -> 5x5x1
    out.push_str(
        "    label = str(value).replace(' ', '').replace('(', '').replace(')', '').replace(',', 'x')\n",
    );

    let mut args = calculator_args(
        deck,
        &ecut,
        &kpts,
        &format!("{} + '-' + label + '.txt'", py_str(&log_prefix)),
    );
    let basis = "basis='dzp'".to_string();
    if !args.contains(&basis) {
        args.insert(args.len() - 1, basis);
    }
    args.insert(args.len() - 1, "parallel={'band': 1}".to_string());
    push_call(&mut out, "    ", "atoms.calc = GPAW", &args);

    out.push_str("    energy = atoms.get_potential_energy()\n");
    out.push_str(&format!(
        "    parprint('{}:', label, 'energy:', energy)\n",
        plan.parameter()
    ));
    out.push_str(&format!("    with paropen({}, 'a') as f:\n", table));
    out.push_str("        f.write(label + '  ' + repr(energy) + '\\n')\n");

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_deck;
    use crate::config::presets::{starter_deck, Preset};
    use crate::models::ScanParameter;

    fn graphene() -> DeckConfig {
        parse_deck(&starter_deck(Preset::Graphene, "graphene"), "x").unwrap()
    }

    #[test]
    fn test_py_literals() {
        assert_eq!(py_float(340.0), "340.0");
        assert_eq!(py_float(0.05), "0.05");
        assert_eq!(py_bool(true), "True");
        assert_eq!(py_str("it's"), "'it\\'s'");
    }

    #[test]
    fn test_driver_contains_all_stage_files() {
        let script = generate_driver_script(&graphene());

        assert!(script.contains("txt='graphene-1-Log-Ground.txt'"));
        assert!(script.contains("calc.write('graphene-1-Result-Ground.gpw')"));
        assert!(script.contains("trajectory='graphene-1-Result-Ground.traj'"));
        assert!(script.contains("'graphene-1-Result-Ground.POSCAR'"));
        assert!(script.contains("paropen('graphene-2-Result-DOS.txt', 'w')"));
        assert!(script.contains("print(*x, sep=', ', file=fd)"));
        assert!(script.contains("paropen('graphene-3-Result-Band.dat', 'w')"));
        assert!(script.contains("kpts={'path': 'GMKG', 'npoints': 40}"));
        assert!(script.contains("convergence={'bands': 8}"));
        assert!(!script.contains("Bohr"));
    }

    #[test]
    fn test_driver_relaxation_settings() {
        let script = generate_driver_script(&graphene());

        assert!(script.contains("mode=PW(340.0)"));
        assert!(script.contains("kpts={'size': (5, 5, 1), 'gamma': False}"));
        assert!(script.contains(
            "target = UnitCellFilter(atoms, mask=[True, True, False, False, False, False])"
        ));
        assert!(script.contains("relax = LBFGS(target,"));
        assert!(script.contains("relax.run(fmax=0.05)"));
        assert_eq!(script.matches("        (").count(), 8);
    }

    #[test]
    fn test_driver_skips_disabled_stages() {
        let mut deck = graphene();
        deck.dos.enabled = false;
        deck.band.enabled = false;
        deck.relax.enabled = false;

        let script = generate_driver_script(&deck);
        assert!(!script.contains("DOS("));
        assert!(!script.contains("fixed_density"));
        assert!(!script.contains("LBFGS"));
        assert!(script.contains("energy = atoms.get_potential_energy()"));
    }

    #[test]
    fn test_hybrid_and_extras() {
        let mut deck = graphene();
        deck.calculation.mode = CalcMode::PwExx;
        deck.calculation.xc = "HSE06".to_string();
        deck.calculation.spin_polarized = true;
        deck.calculation
            .hubbard
            .insert("N".to_string(), ":p,6.0".to_string());
        deck.relax.minimizer = Minimizer::Fire;
        deck.relax.fix_symmetry = true;
        deck.output.density = true;

        let script = generate_driver_script(&deck);
        assert!(script.contains("mode=PW(340.0, force_complex_dtype=True)"));
        assert!(script.contains("xc={'name': 'HSE06', 'backend': 'pw'}"));
        assert!(script.contains("setups={'N': ':p,6.0'}"));
        assert!(script.contains("spinpol=True"));
        assert!(script.contains("set_initial_magnetic_moments([1.0] * len(atoms))"));
        assert!(script.contains("relax = FIRE(target,"));
        assert!(script.contains("atoms.set_constraint(FixSymmetry(atoms))"));
        assert!(script.contains("gridrefinement=4"));
        assert!(script.contains("'graphene-5-Result-Density.cube'"));
    }

    #[test]
    fn test_cutoff_scan_script() {
        let deck = graphene();
        let plan = ScanPlan::new(ScanParameter::Cutoff, 200.0, 400.0, 50.0, &deck).unwrap();
        let script = generate_scan_script(&deck, &plan);

        assert!(script.contains("for value in [200.0, 250.0, 300.0, 350.0, 400.0]:"));
        assert!(script.contains("mode=PW(value)"));
        assert!(script.contains("parallel={'band': 1}"));
        assert_eq!(script.matches("basis='dzp'").count(), 1);
        assert!(script.contains("f.write('Cut-off_Energy  Total_Energy\\n')"));
        assert!(script.contains("paropen('graphene-0-Table-CutOff.txt', 'a')"));
    }

    #[test]
    fn test_lattice_scan_script_rescales_cell() {
        let deck = graphene();
        let plan = ScanPlan::new(ScanParameter::Lattice, -0.02, 0.02, 5.0, &deck).unwrap();
        let script = generate_scan_script(&deck, &plan);

        assert!(script.contains("atoms.set_cell(cell0 * value, scale_atoms=True)"));
        assert!(script.contains("Lattice_Scale  Total_Energy"));
    }
}
